use crate::render::style::{Color, StyleConfig};

/// Diverging low / mid / high gradient with a separate color for missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub low: Color,
    pub mid: Color,
    pub high: Color,
    pub missing: Color,
    pub min: f64,
    pub max: f64,
    pub midpoint: f64,
}

impl ColorScale {
    /// Range comes from `style.limits` when set, else from the finite values given.
    pub fn from_values<I>(style: &StyleConfig, values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = match style.limits {
            Some([a, b]) => (a.min(b), a.max(b)),
            None => values
                .into_iter()
                .filter(|value| value.is_finite())
                .fold(None, |range: Option<(f64, f64)>, value| match range {
                    Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
                    None => Some((value, value)),
                })
                .unwrap_or((0.0, 0.0)),
        };
        let midpoint = style
            .midpoint
            .unwrap_or((min + max) / 2.0)
            .clamp(min, max);

        Self {
            low: style.low,
            mid: style.mid,
            high: style.high,
            missing: style.missing,
            min,
            max,
            midpoint,
        }
    }

    pub fn color_for(&self, value: Option<f64>) -> Color {
        let Some(value) = value.filter(|value| value.is_finite()) else {
            return self.missing;
        };

        if value <= self.midpoint {
            let span = self.midpoint - self.min;
            if span <= 0.0 {
                return self.mid;
            }
            self.low.lerp(self.mid, (value - self.min) / span)
        } else {
            let span = self.max - self.midpoint;
            if span <= 0.0 {
                return self.mid;
            }
            self.mid.lerp(self.high, (value - self.midpoint) / span)
        }
    }
}
