//! Input validators shared by the conversation flows.
//!
//! Each validator is a pure parse: `Some(normalized)` lets the flow advance,
//! `None` is a guard failure and the step re-prompts without changing state.

/// Parse a numeric amount (price, weight). Accepts anything `f64` accepts,
/// rejecting NaN/infinity.
pub fn parse_amount(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A full name must carry at least two whitespace-separated tokens
/// (name + surname, or name + handle). Returns the trimmed text verbatim.
pub fn parse_full_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.split_whitespace().count() >= 2 {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Free-text phone numbers only need 6+ characters after trimming; contact
/// shares bypass this entirely.
pub fn parse_phone(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() >= 6 {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Pickup addresses just need non-empty trimmed content.
pub fn parse_address(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Case-insensitive yes/no token for the insurance step.
pub fn parse_yes_no(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_numbers() {
        assert_eq!(parse_amount("100"), Some(100.0));
        assert_eq!(parse_amount(" 2.5 "), Some(2.5));
        assert_eq!(parse_amount("-3"), Some(-3.0));
    }

    #[test]
    fn amount_rejects_garbage() {
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("12,5"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn full_name_needs_two_tokens() {
        assert_eq!(
            parse_full_name("Ivan Petrov").as_deref(),
            Some("Ivan Petrov")
        );
        assert_eq!(
            parse_full_name("  Ivan Petrov @ivan  ").as_deref(),
            Some("Ivan Petrov @ivan")
        );
        assert_eq!(parse_full_name("Ivan"), None);
        assert_eq!(parse_full_name("   "), None);
        assert_eq!(parse_full_name(""), None);
    }

    #[test]
    fn phone_minimum_length() {
        assert_eq!(parse_phone("123456").as_deref(), Some("123456"));
        assert_eq!(parse_phone("+7 999 123-45-67").as_deref(), Some("+7 999 123-45-67"));
        assert_eq!(parse_phone("12345"), None);
        assert_eq!(parse_phone("  123  "), None);
    }

    #[test]
    fn address_non_empty() {
        assert_eq!(parse_address(" Main St 1 ").as_deref(), Some("Main St 1"));
        assert_eq!(parse_address("   "), None);
        assert_eq!(parse_address(""), None);
    }

    #[test]
    fn yes_no_case_insensitive() {
        assert_eq!(parse_yes_no("Yes"), Some(true));
        assert_eq!(parse_yes_no("YES"), Some(true));
        assert_eq!(parse_yes_no(" no "), Some(false));
        assert_eq!(parse_yes_no("nope"), None);
        assert_eq!(parse_yes_no(""), None);
    }
}
