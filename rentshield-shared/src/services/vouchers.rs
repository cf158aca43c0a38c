//! Voucher catalogue and code generation

use rand::{rngs::OsRng, RngCore};

/// Known voucher types and their display labels
pub const VOUCHER_LABELS: &[(&str, &str)] = &[
    ("amazon_10", "Amazon £10"),
    ("cinema_10", "Cinema £10"),
    ("coffee_5", "Coffee £5"),
];

/// Random bytes behind each code
const CODE_BYTES: usize = 8;

/// Length of a voucher code
pub const VOUCHER_CODE_LENGTH: usize = CODE_BYTES * 2;

/// Display label for a voucher type; unknown types pass through unchanged
pub fn voucher_label(voucher_type: &str) -> String {
    VOUCHER_LABELS
        .iter()
        .find(|(key, _)| *key == voucher_type)
        .map_or_else(|| voucher_type.to_string(), |(_, label)| label.to_string())
}

/// Generates a voucher code: 8 bytes from the OS RNG as 16 uppercase hex chars
///
/// Uniqueness is enforced by the store; callers retry on a code conflict.
pub fn generate_voucher_code() -> String {
    let mut bytes = [0u8; CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_labels() {
        assert_eq!(voucher_label("amazon_10"), "Amazon £10");
        assert_eq!(voucher_label("cinema_10"), "Cinema £10");
        assert_eq!(voucher_label("coffee_5"), "Coffee £5");
    }

    #[test]
    fn test_unknown_type_passes_through() {
        assert_eq!(voucher_label("spa_day"), "spa_day");
    }

    #[test]
    fn test_code_shape() {
        let code = generate_voucher_code();
        assert_eq!(code.len(), VOUCHER_CODE_LENGTH);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_codes_do_not_repeat() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_voucher_code()).collect();
        assert_eq!(codes.len(), 1000);
    }
}
