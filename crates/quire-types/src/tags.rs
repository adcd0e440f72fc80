//! Tag strings

/// Split a tag string: on commas when it contains one, otherwise on whitespace.
/// Pieces are trimmed and empty ones dropped.
pub fn parse_tags(value: &str) -> Vec<String> {
    let pieces: Vec<&str> = if value.contains(',') {
        value.split(',').collect()
    } else {
        value.split_whitespace().collect()
    };

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated() {
        assert_eq!(parse_tags("rust, web dev ,db"), vec!["rust", "web dev", "db"]);
    }

    #[test]
    fn test_whitespace_separated() {
        assert_eq!(parse_tags("rust  python\tc"), vec!["rust", "python", "c"]);
    }

    #[test]
    fn test_empty_pieces_dropped() {
        assert!(parse_tags("").is_empty());
        assert_eq!(parse_tags("a,,b,"), vec!["a", "b"]);
    }
}
