use regex::Regex;

use crate::error::HarvestError;

pub const MAX_SEARCH_LENGTH: usize = 100;
pub const MAX_FILTER_LENGTH: usize = 200;

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, HarvestError> {
    if input.len() > max_len {
        return Err(HarvestError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(HarvestError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a free-text search string.
pub fn validate_search(input: &str) -> Result<String, HarvestError> {
    sanitize_text(input, MAX_SEARCH_LENGTH)
}

/// Validate a listing filter value such as a subject or PID system.
pub fn validate_filter_value(input: &str) -> Result<String, HarvestError> {
    sanitize_text(input, MAX_FILTER_LENGTH)
}

/// Validate a re3data repository identifier: `r3d` followed by nine digits.
pub fn validate_repository_id(input: &str) -> Result<String, HarvestError> {
    let trimmed = input.trim();
    let re = Regex::new(r"^r3d\d{9}$")
        .map_err(|e| HarvestError::InvalidInput(format!("regex compile error: {}", e)))?;
    if re.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(HarvestError::InvalidInput(format!(
            "invalid repository id '{}'. Expected r3d followed by 9 digits (e.g. r3d100010134)",
            input
        )))
    }
}

/// Validate an ISO 3166-1 alpha-3 country code, uppercased.
pub fn validate_country(input: &str) -> Result<String, HarvestError> {
    let upper = input.trim().to_uppercase();
    if upper.len() == 3 && upper.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(upper)
    } else {
        Err(HarvestError::InvalidInput(format!(
            "invalid country code '{}'. Use ISO 3166-1 alpha-3 (e.g. DEU, USA)",
            input
        )))
    }
}

/// Validate a document limit (must be >= 1).
pub fn validate_limit(limit: usize) -> Result<usize, HarvestError> {
    if limit == 0 {
        return Err(HarvestError::InvalidInput(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(limit)
}

/// Check that `column` is one of `columns`.
pub fn validate_column(column: &str, columns: &[String]) -> Result<String, HarvestError> {
    let trimmed = column.trim();
    if columns.iter().any(|c| c == trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(HarvestError::InvalidInput(format!(
            "unknown column '{}'. Available columns: {}",
            column,
            columns.join(", ")
        )))
    }
}

/// Parse a `key=value` filter argument.
pub fn parse_filter_pair(input: &str) -> Result<(String, String), HarvestError> {
    let (key, value) = input.split_once('=').ok_or_else(|| {
        HarvestError::InvalidInput(format!("filter '{}' must have the form key=value", input))
    })?;
    let key = sanitize_text(key, MAX_FILTER_LENGTH)?;
    let value = validate_filter_value(value)?;
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_chars() {
        assert_eq!(sanitize_text("  ocean\u{7}\n ", 50).unwrap(), "ocean");
        assert!(sanitize_text("\n\t", 50).is_err());
        assert!(sanitize_text(&"x".repeat(51), 50).is_err());
    }

    #[test]
    fn repository_ids() {
        assert_eq!(
            validate_repository_id(" r3d100010134 ").unwrap(),
            "r3d100010134"
        );
        assert!(validate_repository_id("r3d10001013").is_err());
        assert!(validate_repository_id("R3D100010134").is_err());
        assert!(validate_repository_id("r3d100010134x").is_err());
    }

    #[test]
    fn countries() {
        assert_eq!(validate_country("deu").unwrap(), "DEU");
        assert!(validate_country("DE").is_err());
        assert!(validate_country("D1U").is_err());
    }

    #[test]
    fn limits() {
        assert_eq!(validate_limit(5).unwrap(), 5);
        assert!(validate_limit(0).is_err());
    }

    #[test]
    fn columns() {
        let columns = vec!["id".to_string(), "api_type".to_string()];
        assert_eq!(validate_column("api_type", &columns).unwrap(), "api_type");
        let err = validate_column("apiType", &columns).unwrap_err();
        assert!(err.to_string().contains("id, api_type"));
    }

    #[test]
    fn filter_pairs() {
        assert_eq!(
            parse_filter_pair("dataLicenses[]=CC0").unwrap(),
            ("dataLicenses[]".to_string(), "CC0".to_string())
        );
        assert!(parse_filter_pair("no-equals").is_err());
        assert!(parse_filter_pair("key=").is_err());
    }
}
