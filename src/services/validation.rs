//! Field-level validation messages
//!
//! Services collect every problem with an input before failing, keyed by
//! the payload field it belongs to. The HTTP layer returns the map as the
//! `details` of a `VALIDATION_ERROR`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const BLANK: &str = "This field may not be blank.";

/// Message for a field longer than `max` characters
pub fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

/// Messages per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single message for a single field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` if nothing was collected
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Check a required text field: trimmed, non-blank, at most `max` characters
    pub fn require_text(&mut self, field: &str, value: &str, max: Option<usize>) {
        let value = value.trim();
        if value.is_empty() {
            self.add(field, BLANK);
        } else if let Some(max) = max {
            if value.chars().count() > max {
                self.add(field, too_long(max));
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_messages() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.require_text("header", "   ", Some(10));
        errors.require_text("lead", "ok", Some(10));
        errors.require_text("main_text", "x".repeat(11).as_str(), Some(10));

        assert!(errors.contains("header"));
        assert!(!errors.contains("lead"));
        assert_eq!(errors.get("main_text").unwrap(), &[too_long(10)]);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_serializes_as_map() {
        let errors = FieldErrors::single("email", "Enter a valid email address.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"email": ["Enter a valid email address."]}));
        assert_eq!(errors.to_string(), "email: Enter a valid email address.");
    }
}
