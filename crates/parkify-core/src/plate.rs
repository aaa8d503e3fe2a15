//! License plate normalization

use crate::error::{ParkingError, Result};

/// Longest plate the record store accepts.
pub const MAX_PLATE_LEN: usize = 10;

/// Trim and uppercase raw operator input without validating it.
pub fn canonicalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalize a plate for registration.
///
/// Rejects empty input, plates longer than [`MAX_PLATE_LEN`] and anything
/// that is not ASCII letters or digits.
pub fn normalize(raw: &str) -> Result<String> {
    let plate = canonicalize(raw);

    if plate.is_empty() {
        return Err(ParkingError::EmptyInput);
    }

    let len = plate.chars().count();
    if len > MAX_PLATE_LEN {
        return Err(ParkingError::invalid_format(
            &plate,
            format!("{} characters, at most {} allowed", len, MAX_PLATE_LEN),
        ));
    }

    if let Some(bad) = plate.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(ParkingError::invalid_format(
            &plate,
            format!("unexpected character '{}'", bad),
        ));
    }

    Ok(plate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_uppercases_and_trims() {
        assert_eq!(normalize("  ab12 ").unwrap(), "AB12");
        assert_eq!(normalize("ka01ab1234").unwrap(), "KA01AB1234");
    }

    #[test]
    fn test_empty_and_blank_rejected() {
        assert!(matches!(normalize(""), Err(ParkingError::EmptyInput)));
        assert!(matches!(normalize("   "), Err(ParkingError::EmptyInput)));
        assert!(matches!(normalize("\t\n"), Err(ParkingError::EmptyInput)));
    }

    #[test]
    fn test_length_limit() {
        assert!(normalize("ABCDEFGHIJ").is_ok());
        assert!(matches!(
            normalize("TOOLONGPLATE123"),
            Err(ParkingError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_non_alphanumeric_rejected() {
        assert!(matches!(
            normalize("KA 01"),
            Err(ParkingError::InvalidFormat { .. })
        ));
        assert!(matches!(
            normalize("AB-12"),
            Err(ParkingError::InvalidFormat { .. })
        ));
    }
}
