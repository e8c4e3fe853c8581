//! Terminal output utilities.
//!
//! Provides formatting helpers for terminal output.

use colored::{ColoredString, Colorize};

/// Format a value as a left-aligned, fixed-width column.
///
/// Values longer than `width` are cut and end with `~`.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The width of the column
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let len = value_str.chars().count();

    if len > width && width > 1 {
        let cut: String = value_str.chars().take(width - 1).collect();
        format!("{cut}~")
    } else {
        format!("{value_str:<width$}")
    }
}

/// Colour a status word: green when healthy, red when failed, yellow otherwise.
pub fn color_status(status: &str) -> ColoredString {
    match status.trim().to_ascii_lowercase().as_str() {
        "created" | "running" | "succeeded" | "readyrole" => status.green(),
        "failed" | "deleting" | "suspended" | "stoppedvm" => status.red(),
        _ => status.yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "test      ");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("test", 4), "test");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "long~");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 4), "42  ");
    }

    #[test]
    fn test_color_status_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(color_status("Running").to_string(), "Running");
    }
}
