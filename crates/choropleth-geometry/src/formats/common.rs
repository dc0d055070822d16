use crate::errors::GeometryError;

pub(crate) fn parse_required_f64(
    format: &'static str,
    value: &str,
    line_index: usize,
    column: &str,
) -> Result<f64, GeometryError> {
    let trimmed = value.trim();
    let parsed = trimmed.parse::<f64>().map_err(|err| GeometryError::DataRow {
        format,
        line_index,
        message: format!("failed to parse column '{column}' as float: {err}"),
    })?;

    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(GeometryError::DataRow {
            format,
            line_index,
            message: format!("column '{column}' must be finite, got '{trimmed}'"),
        })
    }
}

/// Group and order ids are integers, but R-style exports sometimes write them as `12.0`.
pub(crate) fn parse_group_id(
    format: &'static str,
    value: &str,
    line_index: usize,
    column: &str,
) -> Result<i64, GeometryError> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(parsed);
    }

    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.fract() == 0.0 && parsed.is_finite() => Ok(parsed as i64),
        _ => Err(GeometryError::DataRow {
            format,
            line_index,
            message: format!("failed to parse column '{column}' as integer: '{trimmed}'"),
        }),
    }
}

/// Empty cells and `NA` are missing labels.
pub(crate) fn parse_optional_label(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "NA" {
        None
    } else {
        Some(trimmed)
    }
}
