use std::f64::consts::FRAC_PI_4;

use choropleth_geometry::Granularity;

/// Web-Mercator latitude limit; beyond it the projection diverges.
const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// How longitude/latitude become planar coordinates before fitting to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Conformal; suited to a contiguous landmass such as one country's states.
    Mercator,
    /// Equirectangular with x scaled by cos(mid-latitude); stable across the whole globe.
    Quickmap,
}

impl Projection {
    pub fn for_granularity(granularity: Granularity) -> Self {
        match granularity {
            Granularity::World => Projection::Quickmap,
            Granularity::State | Granularity::County => Projection::Mercator,
        }
    }

    /// Planar `(x, y)` with y pointing north. `reference_lat` is the mid-latitude of the extent.
    pub fn project(&self, lon: f64, lat: f64, reference_lat: f64) -> (f64, f64) {
        match self {
            Projection::Mercator => {
                let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
                (lon.to_radians(), (FRAC_PI_4 + lat / 2.0).tan().ln())
            }
            Projection::Quickmap => {
                let aspect = reference_lat.to_radians().cos().max(1e-6);
                (lon * aspect, lat)
            }
        }
    }
}
