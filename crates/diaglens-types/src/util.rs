use sha2::{Digest, Sha256};

/// Parse a percentage token ("85", "85%", "85.2") to a float.
pub fn parse_percent(value: &str) -> Option<f64> {
    let trimmed = value.trim().trim_end_matches('%');
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parse a float token, tolerating surrounding whitespace.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parse an integer token, tolerating thousands separators ("1,234").
pub fn parse_u64(value: &str) -> Option<u64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<u64>().ok()
}

/// Parse a human-readable size ("10gb", "500mb", "1.5tb") to gigabytes.
pub fn parse_size_to_gb(value: &str) -> Option<f64> {
    let s = value.trim().to_ascii_lowercase().replace(' ', "");
    let (digits, factor) = if let Some(rest) = s.strip_suffix("tb") {
        (rest, 1024.0)
    } else if let Some(rest) = s.strip_suffix("gb") {
        (rest, 1.0)
    } else if let Some(rest) = s.strip_suffix("mb") {
        (rest, 1.0 / 1024.0)
    } else if let Some(rest) = s.strip_suffix("kb") {
        (rest, 1.0 / (1024.0 * 1024.0))
    } else if let Some(rest) = s.strip_suffix('b') {
        (rest, 1.0 / (1024.0 * 1024.0 * 1024.0))
    } else {
        return None;
    };
    digits.parse::<f64>().ok().map(|v| v * factor)
}

/// Format a byte count as a short human-readable size ("1.5gb").
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["b", "kb", "mb", "gb", "tb", "pb"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", size, UNITS[unit])
}

/// Derive a stable synthetic node id from a node name.
///
/// Used when a node appears only in a tabular source and no JSON identity
/// is available. Hash-derived so repeated runs over the same bundle agree.
pub fn synthetic_node_id(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    format!("synthetic-{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("85"), Some(85.0));
        assert_eq!(parse_percent("85.5%"), Some(85.5));
        assert_eq!(parse_percent(""), None);
        assert_eq!(parse_percent("n/a"), None);
    }

    #[test]
    fn test_parse_u64_strips_separators() {
        assert_eq!(parse_u64("1,234,567"), Some(1_234_567));
        assert_eq!(parse_u64(" 42 "), Some(42));
        assert_eq!(parse_u64("-"), None);
    }

    #[test]
    fn test_parse_size_to_gb() {
        assert_eq!(parse_size_to_gb("10gb"), Some(10.0));
        assert_eq!(parse_size_to_gb("1tb"), Some(1024.0));
        assert_eq!(parse_size_to_gb("512mb"), Some(0.5));
        assert_eq!(parse_size_to_gb("banana"), None);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512.0b");
        assert_eq!(format_bytes(1536 * 1024 * 1024), "1.5gb");
    }

    #[test]
    fn test_synthetic_node_id_is_stable() {
        let a = synthetic_node_id("node-1");
        let b = synthetic_node_id("node-1");
        assert_eq!(a, b);
        assert!(a.starts_with("synthetic-"));
        assert_ne!(a, synthetic_node_id("node-2"));
    }
}
