//! Common validation and input normalization utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::{ValidateEmail, ValidationError};

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref IMAGE_MIME: Regex = Regex::new(r"^image/.+").unwrap();
}

/// Splits a comma-separated setting value into trimmed, non-empty items.
pub fn split_comma_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits multi-line input into trimmed, non-empty lines.
pub fn split_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a newline-separated list of addresses.
pub fn parse_email_lines(input: &str) -> Vec<String> {
    split_lines(input)
}

/// Removes markup from user-supplied display text.
pub fn strip_html_tags(input: &str) -> String {
    HTML_TAG.replace_all(input, "").trim().to_string()
}

/// Returns true when the MIME type denotes an image.
pub fn is_image_mime(mime: &str) -> bool {
    IMAGE_MIME.is_match(mime)
}

/// Validates that every line of a newline-separated list is an email address.
pub fn validate_email_lines(input: &str) -> Result<(), ValidationError> {
    let lines = parse_email_lines(input);
    if lines.is_empty() {
        let mut err = ValidationError::new("email_list_empty");
        err.message = Some("At least one email address is required".into());
        return Err(err);
    }

    if let Some(bad) = lines.iter().find(|line| !line.validate_email()) {
        let mut err = ValidationError::new("email_list_invalid");
        err.message = Some(format!("Invalid email address: {}", bad).into());
        return Err(err);
    }

    Ok(())
}

/// Validates a page path pattern such as `/team/*`.
pub fn validate_path_pattern(pattern: &str) -> Result<(), ValidationError> {
    if pattern.starts_with('/') {
        Ok(())
    } else {
        let mut err = ValidationError::new("path_pattern");
        err.message = Some("Path pattern must start with '/'".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_comma_list_trims_items() {
        assert_eq!(
            split_comma_list(" iframe, script ,video"),
            vec!["iframe", "script", "video"]
        );
    }

    #[test]
    fn test_split_comma_list_drops_empty_items() {
        assert_eq!(split_comma_list("a,,b, ,"), vec!["a", "b"]);
        assert!(split_comma_list("").is_empty());
    }

    #[test]
    fn test_parse_email_lines() {
        let lines = parse_email_lines("a@example.com\r\n\n  b@example.com  \n");
        assert_eq!(lines, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<b>Dev</b> team"), "Dev team");
        assert_eq!(
            strip_html_tags("<script>alert(1)</script>ops"),
            "alert(1)ops"
        );
        assert_eq!(strip_html_tags("  plain  "), "plain");
    }

    #[test]
    fn test_is_image_mime() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("image/svg+xml"));
        assert!(!is_image_mime("image/"));
        assert!(!is_image_mime("application/pdf"));
        assert!(!is_image_mime("text/image/png"));
    }

    #[test]
    fn test_validate_email_lines() {
        assert!(validate_email_lines("a@example.com\nb@example.com").is_ok());

        let err = validate_email_lines("a@example.com\nnot-an-email").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Invalid email address: not-an-email"
        );

        let err = validate_email_lines("\n  \n").unwrap_err();
        assert_eq!(err.code, "email_list_empty");
    }

    #[test]
    fn test_validate_path_pattern() {
        assert!(validate_path_pattern("/").is_ok());
        assert!(validate_path_pattern("/team/*").is_ok());
        assert!(validate_path_pattern("team").is_err());
        assert!(validate_path_pattern("").is_err());
    }
}
