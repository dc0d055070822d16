use choropleth_geometry::Granularity;

/// Normalizes a raw region name to the geometry provider's key convention.
///
/// State and county providers key on lowercase names. World keys are country names in their
/// original casing, so they only lose surrounding whitespace. Lowercasing them would drop every
/// row from the join.
pub fn normalize_key(raw: &str, granularity: Granularity) -> String {
    let trimmed = raw.trim();
    if granularity.lowercases_keys() {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn case_folded(key: &str) -> String {
    key.to_lowercase()
}
