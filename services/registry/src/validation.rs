//! Input validation for person payloads
//!
//! Validators are explicit functions returning `Result<(), String>`; the
//! `validate_create`/`validate_update` collectors run every field check and
//! surface the failures as one field-error map, so a request is rejected
//! before any storage call is made.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;

use crate::models::{CreatePersonRequest, UpdatePersonRequest};

/// Field name to failure reason, one entry per failing field.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Minimum age, in full years, accepted at registration and update.
pub const MINIMUM_AGE: u32 = 18;

/// Earliest accepted birth year.
const MINIMUM_BIRTH_YEAR: i32 = 1900;

/// Strip CPF formatting (`.` and `-`) and surrounding whitespace.
pub fn normalize_cpf(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != '.' && *c != '-').collect()
}

/// Validate a CPF candidate. Absence is a caller policy: `required` decides
/// whether a missing value fails or passes.
pub fn validate_cpf(value: Option<&str>, required: bool) -> Result<(), String> {
    let Some(raw) = value else {
        return if required {
            Err("CPF is required.".to_string())
        } else {
            Ok(())
        };
    };

    let cpf = normalize_cpf(raw);

    if cpf.len() != 11 || !cpf.bytes().all(|b| b.is_ascii_digit()) {
        return Err(
            "CPF must contain 11 numeric digits, optionally formatted as XXX.XXX.XXX-XX."
                .to_string(),
        );
    }

    let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();

    // Degenerate sequences such as 00000000000 satisfy the checksum but are
    // not valid registry numbers.
    if digits.iter().all(|&d| d == digits[0]) {
        return Err("CPF is invalid.".to_string());
    }

    if !checksum_matches(&digits) {
        return Err("CPF is invalid.".to_string());
    }

    Ok(())
}

/// Weighted mod-11 check digit over `digits`, with weights descending from
/// `first_weight` down to 2.
fn check_digit(digits: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();

    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

fn checksum_matches(digits: &[u32]) -> bool {
    let first = check_digit(&digits[..9], 10);

    let mut prefix = digits[..9].to_vec();
    prefix.push(first);
    let second = check_digit(&prefix, 11);

    digits[9] == first && digits[10] == second
}

/// Parse a `YYYY-MM-DD` birth date string.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| "Birth date is invalid.".to_string())
}

/// Validate a birth date. Rules are checked in order and the first failure
/// wins: presence (per caller policy), not in the future, year bound, then
/// minimum age where a birthday not yet reached this year counts one year
/// less.
pub fn validate_birth_date(
    value: Option<NaiveDate>,
    minimum_age: Option<u32>,
    required: bool,
) -> Result<(), String> {
    let Some(birth_date) = value else {
        return if required {
            Err("Birth date is required.".to_string())
        } else {
            Ok(())
        };
    };

    let today = Utc::now().date_naive();

    if birth_date > today {
        return Err("Birth date cannot be in the future.".to_string());
    }

    if birth_date.year() < MINIMUM_BIRTH_YEAR {
        return Err("Birth date must be on or after 1900-01-01.".to_string());
    }

    if let Some(minimum) = minimum_age {
        let mut age = today.year() - birth_date.year();
        if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
            age -= 1;
        }

        if age < minimum as i32 {
            return Err(format!("Minimum age is {} years.", minimum));
        }
    }

    Ok(())
}

/// Validate an email address when one is present.
pub fn validate_email(value: Option<&str>) -> Result<(), String> {
    let Some(email) = value else {
        return Ok(());
    };

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long.".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format.".to_string());
    }

    Ok(())
}

pub fn validate_name(value: Option<&str>) -> Result<(), String> {
    match value {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err("Name is required.".to_string()),
    }
}

pub fn validate_password(value: Option<&str>) -> Result<(), String> {
    match value {
        Some(password) if !password.is_empty() => Ok(()),
        _ => Err("Password is required.".to_string()),
    }
}

/// Validated field set for a registration, ready to persist.
#[derive(Debug, Clone)]
pub struct PersonFields {
    pub name: String,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub birth_date: NaiveDate,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub cpf: String,
}

/// Validated field set for a partial update; `None` leaves the stored value
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct PersonPatch {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub cpf: Option<String>,
}

/// Validate a registration payload, collecting one reason per failing field.
/// Returns the validated fields and the plaintext password to hash.
pub fn validate_create(req: &CreatePersonRequest) -> Result<(PersonFields, String), FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Err(reason) = validate_name(req.name.as_deref()) {
        errors.insert("name", reason);
    }
    if let Err(reason) = validate_email(req.email.as_deref()) {
        errors.insert("email", reason);
    }
    if let Err(reason) = validate_cpf(req.cpf.as_deref(), true) {
        errors.insert("cpf", reason);
    }
    if let Err(reason) = validate_password(req.password.as_deref()) {
        errors.insert("password", reason);
    }

    let birth_date = checked_birth_date(req.birth_date.as_deref(), true, &mut errors);

    match (&req.name, birth_date, &req.cpf, &req.password) {
        (Some(name), Some(birth_date), Some(cpf), Some(password)) if errors.is_empty() => Ok((
            PersonFields {
                name: name.clone(),
                gender: req.gender.clone(),
                email: req.email.clone(),
                birth_date,
                nationality: req.nationality.clone(),
                place_of_birth: req.place_of_birth.clone(),
                cpf: normalize_cpf(cpf),
            },
            password.clone(),
        )),
        _ => Err(errors),
    }
}

/// Validate a partial-update payload. Only supplied fields are checked; a
/// supplied CPF or birth date goes through the same rules as registration.
pub fn validate_update(req: &UpdatePersonRequest) -> Result<PersonPatch, FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(name) = req.name.as_deref() {
        if let Err(reason) = validate_name(Some(name)) {
            errors.insert("name", reason);
        }
    }
    if let Err(reason) = validate_email(req.email.as_deref()) {
        errors.insert("email", reason);
    }
    if let Err(reason) = validate_cpf(req.cpf.as_deref(), false) {
        errors.insert("cpf", reason);
    }

    let birth_date = checked_birth_date(req.birth_date.as_deref(), false, &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(PersonPatch {
        name: req.name.clone(),
        gender: req.gender.clone(),
        email: req.email.clone(),
        birth_date,
        nationality: req.nationality.clone(),
        place_of_birth: req.place_of_birth.clone(),
        cpf: req.cpf.as_deref().map(normalize_cpf),
    })
}

fn checked_birth_date(
    raw: Option<&str>,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<NaiveDate> {
    match raw {
        None => {
            if required {
                errors.insert("birthDate", "Birth date is required.".to_string());
            }
            None
        }
        Some(raw) => match parse_birth_date(raw) {
            Ok(date) => match validate_birth_date(Some(date), Some(MINIMUM_AGE), required) {
                Ok(()) => Some(date),
                Err(reason) => {
                    errors.insert("birthDate", reason);
                    None
                }
            },
            Err(reason) => {
                errors.insert("birthDate", reason);
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    #[test]
    fn known_good_cpf_passes() {
        assert!(validate_cpf(Some("11144477735"), true).is_ok());
    }

    #[test]
    fn formatted_cpf_passes() {
        assert!(validate_cpf(Some(" 111.444.777-35 "), true).is_ok());
    }

    #[test]
    fn degenerate_cpf_fails() {
        assert!(validate_cpf(Some("00000000000"), true).is_err());
        assert!(validate_cpf(Some("11111111111"), true).is_err());
    }

    #[test]
    fn short_cpf_fails() {
        assert!(validate_cpf(Some("123"), true).is_err());
    }

    #[test]
    fn wrong_check_digits_fail() {
        assert!(validate_cpf(Some("11144477734"), true).is_err());
        assert!(validate_cpf(Some("11144477745"), true).is_err());
    }

    #[test]
    fn absent_cpf_follows_caller_policy() {
        assert!(validate_cpf(None, true).is_err());
        assert!(validate_cpf(None, false).is_ok());
    }

    #[test]
    fn birth_date_exactly_at_minimum_age_passes() {
        let today = Utc::now().date_naive();
        let boundary = today
            .checked_sub_months(Months::new(12 * MINIMUM_AGE))
            .unwrap();

        assert!(validate_birth_date(Some(boundary), Some(MINIMUM_AGE), true).is_ok());
    }

    #[test]
    fn birth_date_one_day_under_minimum_age_fails() {
        let today = Utc::now().date_naive();
        let boundary = today
            .checked_sub_months(Months::new(12 * MINIMUM_AGE))
            .unwrap();
        let one_day_short = boundary.succ_opt().unwrap();

        let result = validate_birth_date(Some(one_day_short), Some(MINIMUM_AGE), true);
        assert_eq!(result.unwrap_err(), "Minimum age is 18 years.");
    }

    #[test]
    fn future_birth_date_fails() {
        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        let result = validate_birth_date(Some(tomorrow), None, true);
        assert_eq!(result.unwrap_err(), "Birth date cannot be in the future.");
    }

    #[test]
    fn birth_date_before_1900_fails() {
        let date = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        assert!(validate_birth_date(Some(date), None, true).is_err());
    }

    #[test]
    fn absent_birth_date_follows_caller_policy() {
        assert!(validate_birth_date(None, Some(MINIMUM_AGE), true).is_err());
        assert!(validate_birth_date(None, Some(MINIMUM_AGE), false).is_ok());
    }

    #[test]
    fn email_is_optional_but_shape_checked() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("ana@example.com")).is_ok());
        assert!(validate_email(Some("not-an-email")).is_err());
    }

    #[test]
    fn create_collects_one_reason_per_failing_field() {
        let req = CreatePersonRequest {
            name: None,
            gender: None,
            email: Some("broken".to_string()),
            birth_date: Some("not-a-date".to_string()),
            nationality: None,
            place_of_birth: None,
            cpf: Some("123".to_string()),
            password: None,
        };

        let errors = validate_create(&req).unwrap_err();
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec!["birthDate", "cpf", "email", "name", "password"]
        );
    }

    #[test]
    fn create_normalizes_the_cpf() {
        let req = CreatePersonRequest {
            name: Some("Ana".to_string()),
            gender: None,
            email: None,
            birth_date: Some("1990-05-20".to_string()),
            nationality: None,
            place_of_birth: None,
            cpf: Some("111.444.777-35".to_string()),
            password: Some("secret".to_string()),
        };

        let (fields, password) = validate_create(&req).unwrap();
        assert_eq!(fields.cpf, "11144477735");
        assert_eq!(password, "secret");
    }

    #[test]
    fn update_accepts_an_empty_patch() {
        let patch = validate_update(&UpdatePersonRequest::default()).unwrap();
        assert!(patch.name.is_none());
        assert!(patch.birth_date.is_none());
        assert!(patch.cpf.is_none());
    }

    #[test]
    fn update_rejects_a_supplied_invalid_cpf() {
        let req = UpdatePersonRequest {
            cpf: Some("00000000000".to_string()),
            ..Default::default()
        };

        let errors = validate_update(&req).unwrap_err();
        assert!(errors.contains_key("cpf"));
    }

    #[test]
    fn update_rejects_blanking_the_name() {
        let req = UpdatePersonRequest {
            name: Some("   ".to_string()),
            ..Default::default()
        };

        let errors = validate_update(&req).unwrap_err();
        assert!(errors.contains_key("name"));
    }
}
