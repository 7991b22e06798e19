//! Shared helper functions for CLI commands

use console::style;
use miette::{miette, Result};

use crate::core::filter::FilterSet;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Collect repeated `--filter key=value` arguments
pub fn parse_filters(pairs: &[String]) -> Result<FilterSet> {
    pairs
        .iter()
        .map(|raw| FilterSet::parse_pair(raw).map_err(|e| miette!("{}", e)))
        .collect()
}

/// Split `a,b , c` into trimmed, non-empty column keys
pub fn split_columns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Recoverable problem, reported on stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), style(message).yellow());
}

pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Peña Nieto", 6), "Peñ...");
    }

    #[test]
    fn test_parse_filters() {
        let filters = parse_filters(&["gender=F".to_string(), "age=40".to_string()]).unwrap();
        assert_eq!(filters.get("gender"), Some("F"));
        assert_eq!(filters.get("age"), Some("40"));
        assert!(parse_filters(&["gender".to_string()]).is_err());
    }

    #[test]
    fn test_split_columns() {
        assert_eq!(split_columns("voter_id, gender,,age "), vec!["voter_id", "gender", "age"]);
        assert!(split_columns(" , ").is_empty());
    }
}
