// src/engine/form.rs

//! Form input as submitted by the presentation side.
//!
//! Values are kept raw; trimming happens at validation time. Checkbox fields
//! carry `on` when checked and an empty string otherwise.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Value a checked checkbox submits.
pub const CHECKED: &str = "on";

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form data must be a JSON object of field name to value")]
    NotAnObject,

    #[error("field '{0}' must be a string, boolean or number")]
    UnsupportedValue(String),

    #[error("field argument '{0}' must look like NAME=VALUE")]
    MalformedPair(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub name: String,
    pub raw_value: String,
}

/// Ordered set of field values. Setting an existing name replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormInput {
    fields: Vec<FieldValue>,
}

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        self.set(name, raw_value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, raw_value: impl Into<String>) {
        let name = name.into();
        let raw_value = raw_value.into();

        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.raw_value = raw_value,
            None => self.fields.push(FieldValue { name, raw_value }),
        }
    }

    pub fn set_checkbox(&mut self, name: impl Into<String>, checked: bool) {
        self.set(name, if checked { CHECKED } else { "" });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.raw_value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter()
    }

    /// Build from a JSON object. Booleans map to checkbox values, numbers to
    /// their decimal text, `null` to empty.
    pub fn from_json(value: &Value) -> Result<Self, FormError> {
        let obj = value.as_object().ok_or(FormError::NotAnObject)?;
        let mut form = Self::new();

        for (name, v) in obj {
            match v {
                Value::String(s) => form.set(name.as_str(), s.as_str()),
                Value::Bool(b) => form.set_checkbox(name.as_str(), *b),
                Value::Number(n) => form.set(name.as_str(), n.to_string()),
                Value::Null => form.set(name.as_str(), ""),
                _ => return Err(FormError::UnsupportedValue(name.clone())),
            }
        }

        Ok(form)
    }

    /// Apply a `NAME=VALUE` override. Only the first `=` splits.
    pub fn apply_pair(&mut self, pair: &str) -> Result<(), FormError> {
        let (name, value) = pair
            .split_once('=')
            .filter(|(name, _)| !name.trim().is_empty())
            .ok_or_else(|| FormError::MalformedPair(pair.to_string()))?;

        self.set(name.trim(), value);
        Ok(())
    }
}
