//! Form validation
//!
//! A [`Form`] wraps the submitted field values and collects field-level
//! errors as rules are applied. Rules never stop early; every failing
//! (field, rule) pair adds a message, so a field may carry several.

use std::collections::HashMap;

use serde::Serialize;
use validator::ValidateEmail;

/// Error messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(HashMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// First error message for a field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn all(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Submitted form values plus accumulated validation errors
#[derive(Debug, Clone, Default, Serialize)]
pub struct Form {
    values: HashMap<String, String>,
    errors: FormErrors,
}

impl Form {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self {
            values,
            errors: FormErrors::default(),
        }
    }

    /// Raw value of a field, empty when absent
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    /// True when the field was submitted with a non-blank value
    pub fn has(&self, field: &str) -> bool {
        !self.get(field).trim().is_empty()
    }

    pub fn required(&mut self, fields: &[&str]) -> &mut Self {
        for field in fields {
            if !self.has(field) {
                self.errors.add(field, "This field cannot be blank");
            }
        }
        self
    }

    pub fn min_length(&mut self, field: &str, length: usize) -> &mut Self {
        if self.get(field).trim().chars().count() < length {
            self.errors.add(
                field,
                format!("This field must be at least {length} characters long"),
            );
        }
        self
    }

    pub fn is_email(&mut self, field: &str) -> &mut Self {
        if !self.get(field).trim().validate_email() {
            self.errors.add(field, "Invalid email address");
        }
        self
    }

    /// True when no rule has failed
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Form {
        Form::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_valid_form() {
        let mut f = form(&[("a", "a"), ("b", "b")]);
        f.required(&["a", "b"]);
        assert!(f.valid());
        assert!(f.has("a"));
    }

    #[test]
    fn test_required_reports_each_missing_field() {
        let mut f = form(&[("a", "x"), ("b", "   ")]);
        f.required(&["a", "b", "c"]);
        assert!(!f.valid());
        assert_eq!(f.errors().get("b"), Some("This field cannot be blank"));
        assert_eq!(f.errors().get("c"), Some("This field cannot be blank"));
        assert_eq!(f.errors().get("a"), None);
    }

    #[test]
    fn test_min_length_counts_characters() {
        let mut f = form(&[("first_name", "Zoë"), ("last_name", "O")]);
        f.min_length("first_name", 3).min_length("last_name", 3);
        assert_eq!(f.errors().get("first_name"), None);
        assert_eq!(
            f.errors().get("last_name"),
            Some("This field must be at least 3 characters long")
        );
    }

    #[test]
    fn test_messages_accumulate_per_field() {
        let mut f = form(&[("first_name", "")]);
        f.required(&["first_name"]).min_length("first_name", 3);
        assert_eq!(f.errors().all("first_name").len(), 2);
        assert_eq!(f.errors().get("first_name"), Some("This field cannot be blank"));
    }

    #[test]
    fn test_is_email() {
        for good in ["omama@getnada.com", "a.b+c@mail.example.org"] {
            let mut f = form(&[("email", good)]);
            f.is_email("email");
            assert!(f.valid(), "{good} should be accepted");
        }
        for bad in [
            "",
            "x",
            "x@",
            "@y.com",
            "x@@y.com",
            "x y@z.com",
            "x@y..com",
            "<b>@x.com",
            "a,b@x.com",
            "a\"b@x.com",
            "x@-y.com",
        ] {
            let mut f = form(&[("email", bad)]);
            f.is_email("email");
            assert_eq!(f.errors().get("email"), Some("Invalid email address"), "{bad}");
        }
    }

    #[test]
    fn test_serializes_values_and_errors_for_templates() {
        let mut f = form(&[("first_name", "O")]);
        f.min_length("first_name", 3);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["values"]["first_name"], "O");
        assert_eq!(
            json["errors"]["first_name"][0],
            "This field must be at least 3 characters long"
        );
    }
}
