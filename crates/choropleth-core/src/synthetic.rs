use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::values::ValueRecord;

pub const SYNTHETIC_MIN: f64 = 0.0;
pub const SYNTHETIC_MAX: f64 = 100.0;

/// One uniform value in `[0, 100]` per distinct region name, in first-seen order.
///
/// The same names and seed always produce the same table.
pub fn generate_synthetic_values<I, S>(region_names: I, seed: u64) -> Vec<ValueRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rng = StdRng::seed_from_u64(seed);
    generate_with_rng(region_names, &mut rng)
}

pub fn generate_with_rng<I, S, R>(region_names: I, rng: &mut R) -> Vec<ValueRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    R: Rng,
{
    let mut seen = HashSet::new();
    region_names
        .into_iter()
        .filter(|name| seen.insert(name.as_ref().to_string()))
        .map(|name| {
            ValueRecord::new(
                name.as_ref(),
                rng.random_range(SYNTHETIC_MIN..=SYNTHETIC_MAX),
            )
        })
        .collect()
}
