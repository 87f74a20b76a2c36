use std::sync::OnceLock;

use regex::Regex;

fn digit_run() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

/// Map free-form user input to the canonical well key.
///
/// The first run of digits wins: "WELL 100", "well-100" and "100" all map to
/// `"well 100"`. Input without digits is only lowercased and trimmed, which
/// keeps datasets with named (non-numeric) wells addressable.
pub fn normalize_well_id(input: &str) -> String {
    match digit_run().find(input) {
        Some(digits) => format!("well {}", digits.as_str()),
        None => input.trim().to_lowercase(),
    }
}
