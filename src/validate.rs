//! Per-collection input validation.
//!
//! Input arrives either as a JSON body or as multipart form text fields,
//! so every rule accepts both JSON-typed values and their string forms.
//! Failures are accumulated so a single response names every offending
//! field. On success the validator returns the normalized document
//! fields, ready to be merged with the server-assigned ones.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::model::{
    CareerFields, ContactFields, EnrollCourseFields, EnrollFields, HomeContentFields,
    HomeCourseFields, HomeServiceFields, ServiceContentFields,
};

pub type Fields = Map<String, Value>;

/// Whether the input is creating a document or updating an existing one.
/// Optional fields get their defaults only on creation; an update that
/// omits them leaves the stored values alone.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Create,
    Update,
}

pub fn home_content(fields: &Fields, _mode: Mode) -> Result<Value, ApiError> {
    let mut errors = Vec::new();
    let title = required_string(fields, "title", &mut errors);
    finish(errors, HomeContentFields { title })
}

pub fn home_course(fields: &Fields, _mode: Mode) -> Result<Value, ApiError> {
    let mut errors = Vec::new();
    let title = required_string(fields, "title", &mut errors);
    let description = required_string(fields, "description", &mut errors);
    finish(errors, HomeCourseFields { title, description })
}

pub fn home_service(fields: &Fields, mode: Mode) -> Result<Value, ApiError> {
    let mut errors = Vec::new();
    let title = bounded_string(fields, "title", 100, &mut errors);
    let description = bounded_string(fields, "description", 500, &mut errors);
    let mut position = optional_number(fields, "position", &mut errors);
    let mut is_active = optional_bool(fields, "isActive", &mut errors);
    if mode == Mode::Create {
        position = position.or(Some(0));
        is_active = is_active.or(Some(true));
    }
    finish(
        errors,
        HomeServiceFields {
            title,
            description,
            position,
            is_active,
        },
    )
}

pub fn service_content(fields: &Fields, _mode: Mode) -> Result<Value, ApiError> {
    let mut errors = Vec::new();
    let title = required_string(fields, "title", &mut errors);
    let description = required_string(fields, "description", &mut errors);
    let points = points_field(fields, 4, &mut errors);
    finish(
        errors,
        ServiceContentFields {
            title,
            description,
            points,
        },
    )
}

pub fn career(fields: &Fields, _mode: Mode) -> Result<Value, ApiError> {
    let mut errors = Vec::new();
    let title = required_string(fields, "title", &mut errors);
    let description = required_string(fields, "description", &mut errors);
    let points = points_field(fields, 4, &mut errors);
    finish(
        errors,
        CareerFields {
            title,
            description,
            points,
        },
    )
}

pub fn contact(fields: &Fields, _mode: Mode) -> Result<Value, ApiError> {
    let mut errors = Vec::new();
    let name = required_string(fields, "name", &mut errors);
    let email = email_field(fields, &mut errors);
    let phone = contact_phone_field(fields, &mut errors);
    let message = required_string(fields, "message", &mut errors);
    finish(
        errors,
        ContactFields {
            name,
            email,
            phone,
            message,
        },
    )
}

pub fn enroll(fields: &Fields, _mode: Mode) -> Result<Value, ApiError> {
    let mut errors = Vec::new();
    let name = required_string(fields, "name", &mut errors);
    let email = email_field(fields, &mut errors);
    let phone = enroll_phone_field(fields, &mut errors);
    let course = required_string(fields, "course", &mut errors);
    let message = required_string(fields, "message", &mut errors);
    finish(
        errors,
        EnrollFields {
            name,
            email,
            phone,
            course,
            message,
        },
    )
}

pub fn enroll_course(fields: &Fields, mode: Mode) -> Result<Value, ApiError> {
    let mut errors = Vec::new();
    let course_name = required_string(fields, "courseName", &mut errors);
    let mut is_active = optional_bool(fields, "isActive", &mut errors);
    if mode == Mode::Create {
        is_active = is_active.or(Some(true));
    }
    finish(
        errors,
        EnrollCourseFields {
            course_name,
            is_active,
        },
    )
}

/// Stats update: every supplied value must be a non-negative number.
/// Returns the validated key/value pairs for the singleton merge.
pub fn stats_update(fields: &Fields) -> Result<Fields, ApiError> {
    let mut errors = Vec::new();
    let mut updates = Map::new();
    for (key, value) in fields {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match number {
            Some(n) if n >= 0.0 => {
                let stored = if n.fract() == 0.0 {
                    Value::from(n as u64)
                } else {
                    Value::from(n)
                };
                updates.insert(key.clone(), stored);
            }
            _ => errors.push(format!("{key} must be a non-negative number")),
        }
    }
    if errors.is_empty() {
        Ok(updates)
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn finish<T: Serialize>(errors: Vec<String>, value: T) -> Result<Value, ApiError> {
    if errors.is_empty() {
        Ok(serde_json::to_value(value)?)
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Required string field: present, a string, non-empty after trimming.
fn required_string(fields: &Fields, name: &str, errors: &mut Vec<String>) -> String {
    match fields.get(name).and_then(Value::as_str) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        Some(_) => {
            errors.push(format!("{name} must not be empty"));
            String::new()
        }
        None => {
            errors.push(format!("{name} is required"));
            String::new()
        }
    }
}

fn bounded_string(fields: &Fields, name: &str, max: usize, errors: &mut Vec<String>) -> String {
    let value = required_string(fields, name, errors);
    if value.chars().count() > max {
        errors.push(format!("{name} must be at most {max} characters"));
    }
    value
}

/// Optional non-negative number; multipart form values arrive as strings.
fn optional_number(fields: &Fields, name: &str, errors: &mut Vec<String>) -> Option<u32> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) if v <= u32::MAX as u64 => Some(v as u32),
            _ => {
                errors.push(format!("{name} must be a non-negative number"));
                None
            }
        },
        Some(Value::String(s)) => match s.trim().parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.push(format!("{name} must be a non-negative number"));
                None
            }
        },
        Some(_) => {
            errors.push(format!("{name} must be a non-negative number"));
            None
        }
    }
}

fn optional_bool(fields: &Fields, name: &str, errors: &mut Vec<String>) -> Option<bool> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                errors.push(format!("{name} must be true or false"));
                None
            }
        },
        Some(_) => {
            errors.push(format!("{name} must be true or false"));
            None
        }
    }
}

/// `points` may arrive as a JSON array or as a JSON-encoded string (the
/// only representation multipart text fields allow). Entries are trimmed
/// and empties dropped before the minimum count is checked, so a long raw
/// array of blanks does not satisfy the minimum.
fn points_field(fields: &Fields, min: usize, errors: &mut Vec<String>) -> Vec<String> {
    let raw = match fields.get("points") {
        None | Some(Value::Null) => {
            errors.push("points is required".to_string());
            return Vec::new();
        }
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                errors.push("points must be a JSON array".to_string());
                return Vec::new();
            }
            Err(_) => {
                errors.push("points must be valid JSON".to_string());
                return Vec::new();
            }
        },
        Some(_) => {
            errors.push("points must be an array".to_string());
            return Vec::new();
        }
    };

    let points: Vec<String> = raw
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if points.len() < min {
        errors.push(format!("points must contain at least {min} non-empty entries"));
    }
    points
}

/// Lenient address check; full RFC validation is not attempted.
fn email_field(fields: &Fields, errors: &mut Vec<String>) -> String {
    let value = required_string(fields, "email", errors).to_lowercase();
    if !value.is_empty() {
        let pattern = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
        if !pattern.is_match(&value) {
            errors.push("email is not a valid address".to_string());
        }
    }
    value
}

/// Contact phone policy: the raw value must look like a phone number and
/// carry at least ten digits.
fn contact_phone_field(fields: &Fields, errors: &mut Vec<String>) -> String {
    let value = required_string(fields, "phone", errors);
    if !value.is_empty() {
        let digits = value.chars().filter(char::is_ascii_digit).count();
        let shape = Regex::new(r"^[0-9+\-\s()]{10,15}$").unwrap();
        if digits < 10 || !shape.is_match(&value) {
            errors.push("phone must be a valid phone number".to_string());
        }
    }
    value
}

/// Enrollment phone policy: exactly ten digits once separators are
/// stripped. Intentionally different from the contact policy.
fn enroll_phone_field(fields: &Fields, errors: &mut Vec<String>) -> String {
    let value = required_string(fields, "phone", errors);
    if !value.is_empty() {
        let digits = value.chars().filter(char::is_ascii_digit).count();
        if digits != 10 {
            errors.push("phone must contain exactly 10 digits".to_string());
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be a JSON object"),
        }
    }

    #[test]
    fn test_required_string_trims() {
        let input = fields(json!({ "title": "  Banner  " }));
        let doc = home_content(&input, Mode::Create).unwrap();
        assert_eq!(doc["title"], "Banner");
    }

    #[test]
    fn test_all_failures_reported_together() {
        let input = fields(json!({ "title": "" }));
        let err = home_course(&input, Mode::Create).unwrap_err();
        match err {
            crate::error::ApiError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].contains("title"));
                assert!(errors[1].contains("description"));
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_home_service_defaults_only_on_create() {
        let input = fields(json!({ "title": "t", "description": "d" }));

        let created = home_service(&input, Mode::Create).unwrap();
        assert_eq!(created["position"], 0);
        assert_eq!(created["isActive"], true);

        // Updates must not resurrect the defaults over stored values.
        let updated = home_service(&input, Mode::Update).unwrap();
        assert!(updated.get("position").is_none());
        assert!(updated.get("isActive").is_none());
    }

    #[test]
    fn test_form_encoded_flags_are_parsed() {
        // Multipart text parts carry numbers and bools as strings.
        let input = fields(json!({
            "title": "t",
            "description": "d",
            "position": "3",
            "isActive": "false"
        }));
        let doc = home_service(&input, Mode::Create).unwrap();
        assert_eq!(doc["position"], 3);
        assert_eq!(doc["isActive"], false);
    }

    #[test]
    fn test_points_minimum_applies_after_filtering() {
        let input = fields(json!({
            "title": "t",
            "description": "d",
            "points": ["a", "", "  b  ", "c", "d"]
        }));
        let doc = career(&input, Mode::Create).unwrap();
        assert_eq!(doc["points"], json!(["a", "b", "c", "d"]));

        let input = fields(json!({
            "title": "t",
            "description": "d",
            "points": ["a", "", " ", "", "b"]
        }));
        assert!(career(&input, Mode::Create).is_err());
    }

    #[test]
    fn test_points_parse_failure_is_distinct_from_missing() {
        let missing = career(&fields(json!({ "title": "t", "description": "d" })), Mode::Create);
        let garbled = career(
            &fields(json!({ "title": "t", "description": "d", "points": "{oops" })),
            Mode::Create,
        );
        let missing_msg = format!("{:?}", missing.unwrap_err());
        let garbled_msg = format!("{:?}", garbled.unwrap_err());
        assert!(missing_msg.contains("required"));
        assert!(garbled_msg.contains("valid JSON"));
    }

    #[test]
    fn test_contact_phone_needs_shape_and_digit_count() {
        let base = json!({ "name": "n", "email": "a@b.c", "message": "m" });

        let mut ok = fields(base.clone());
        ok.insert("phone".into(), json!("123-456-7890"));
        assert!(contact(&ok, Mode::Create).is_ok());

        // Enough characters but too few digits.
        let mut padded = fields(base.clone());
        padded.insert("phone".into(), json!("12345     "));
        assert!(contact(&padded, Mode::Create).is_err());

        // Enough digits but a character outside the allowed set.
        let mut lettered = fields(base);
        lettered.insert("phone".into(), json!("12345abc67890"));
        assert!(contact(&lettered, Mode::Create).is_err());
    }

    #[test]
    fn test_enroll_phone_is_exactly_ten_digits() {
        let base = json!({ "name": "n", "email": "a@b.c", "course": "c", "message": "m" });

        for (phone, valid) in [
            ("9876543210", true),
            ("(987) 654-3210", true),
            ("987-654-321", false),
            ("98765432101", false),
        ] {
            let mut input = fields(base.clone());
            input.insert("phone".into(), json!(phone));
            assert_eq!(enroll(&input, Mode::Create).is_ok(), valid, "phone {phone}");
        }
    }

    #[test]
    fn test_email_is_lowercased() {
        let input = fields(json!({
            "name": "n",
            "email": "Asha@Example.COM",
            "phone": "123-456-7890",
            "message": "m"
        }));
        let doc = contact(&input, Mode::Create).unwrap();
        assert_eq!(doc["email"], "asha@example.com");
    }

    #[test]
    fn test_stats_update_accepts_form_strings_and_rejects_negatives() {
        let ok = stats_update(&fields(json!({ "customerCount": "30" }))).unwrap();
        assert_eq!(ok["customerCount"], 30);

        assert!(stats_update(&fields(json!({ "customerCount": -1 }))).is_err());
        assert!(stats_update(&fields(json!({ "customerCount": "lots" }))).is_err());
    }
}
