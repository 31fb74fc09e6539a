//! Validation helpers for DTOs.

use validator::ValidationError;

const PHONE_COUNTRY_PREFIX: &str = "+351";
const MOBILE_NETWORK_DIGITS: [char; 4] = ['1', '2', '3', '6'];

/// Remove every whitespace character from a phone number as typed by the user.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Validates a Portuguese mobile number: optional `+351`, then `9`, a network digit
/// (1, 2, 3 or 6) and seven more digits. Whitespace is ignored.
///
/// # Examples
///
/// ```ignore
/// validate_phone("912345678")      // Ok
/// validate_phone("+351 93 123 45 67") // Ok
/// validate_phone("951234567")      // Err - unknown network
/// ```
pub fn validate_phone(raw: &str) -> Result<(), ValidationError> {
    let phone = normalize_phone(raw);
    let national = phone.strip_prefix(PHONE_COUNTRY_PREFIX).unwrap_or(&phone);
    let mut digits = national.chars();

    let valid = national.len() == 9
        && national.chars().all(|c| c.is_ascii_digit())
        && digits.next() == Some('9')
        && digits
            .next()
            .is_some_and(|c| MOBILE_NETWORK_DIGITS.contains(&c));

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must be a Portuguese mobile number".into());
        Err(err)
    }
}

/// Validates a display name: 2 to 50 characters once trimmed.
pub fn validate_person_name(name: &str) -> Result<(), ValidationError> {
    validate_trimmed_length(name, 2, 50, "name_length", "Name")
}

/// Validates a group name: 1 to 50 characters once trimmed.
pub fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    validate_trimmed_length(name, 1, 50, "group_name_length", "Group name")
}

/// Validates a field name: 1 to 100 characters once trimmed.
pub fn validate_field_name(name: &str) -> Result<(), ValidationError> {
    validate_trimmed_length(name, 1, 100, "field_name_length", "Field name")
}

/// Validates a weekday index (0 = Sunday).
pub fn validate_weekday(day: u8) -> Result<(), ValidationError> {
    if day <= 6 {
        return Ok(());
    }
    let mut err = ValidationError::new("weekday_range");
    err.message = Some(format!("Day of week must be between 0 and 6 (got {day})").into());
    Err(err)
}

fn validate_trimmed_length(
    value: &str,
    min: usize,
    max: usize,
    code: &'static str,
    label: &str,
) -> Result<(), ValidationError> {
    let length = value.trim().chars().count();
    if (min..=max).contains(&length) {
        return Ok(());
    }
    let mut err = ValidationError::new(code);
    err.message =
        Some(format!("{label} must be between {min} and {max} characters (got {length})").into());
    Err(err)
}
