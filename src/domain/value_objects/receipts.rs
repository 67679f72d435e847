use chrono::Utc;
use rand::Rng;

/// Human-facing receipt identifiers: `REC-<unixMillis>-<random suffix>`.
/// The suffix is 4 zero-padded digits; collision handling widens it to 8
/// digits before giving up.
pub const RECEIPT_PREFIX: &str = "REC";

pub const NARROW_SUFFIX_ATTEMPTS: u32 = 5;
pub const WIDE_SUFFIX_ATTEMPTS: u32 = 3;

pub fn generate_receipt_number() -> String {
    let suffix = rand::thread_rng().gen_range(0..10_000u32);
    format!(
        "{}-{}-{:04}",
        RECEIPT_PREFIX,
        Utc::now().timestamp_millis(),
        suffix
    )
}

/// Fallback generator with a wider random space, used once the 4-digit
/// suffix keeps colliding.
pub fn generate_wide_receipt_number() -> String {
    let suffix = rand::thread_rng().gen_range(0..100_000_000u32);
    format!(
        "{}-{}-{:08}",
        RECEIPT_PREFIX,
        Utc::now().timestamp_millis(),
        suffix
    )
}

pub fn is_receipt_number(value: &str) -> bool {
    let mut parts = value.splitn(3, '-');
    let (Some(prefix), Some(millis), Some(suffix)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == RECEIPT_PREFIX
        && !millis.is_empty()
        && millis.bytes().all(|b| b.is_ascii_digit())
        && (suffix.len() == 4 || suffix.len() == 8)
        && suffix.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_numbers_match_the_receipt_format() {
        let receipt = generate_receipt_number();
        assert!(is_receipt_number(&receipt), "bad receipt: {receipt}");

        let suffix = receipt.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
    }

    #[test]
    fn wide_numbers_use_an_eight_digit_suffix() {
        let receipt = generate_wide_receipt_number();
        assert!(is_receipt_number(&receipt), "bad receipt: {receipt}");

        let suffix = receipt.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 8);
    }

    #[test]
    fn rejects_foreign_identifiers() {
        assert!(!is_receipt_number("pi_3abc"));
        assert!(!is_receipt_number("REC-abc-0001"));
        assert!(!is_receipt_number("REC-1700000000000-12"));
        assert!(!is_receipt_number(""));
    }
}
