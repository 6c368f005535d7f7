use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::errors::AppError;

/// Key under which automation services sometimes nest the real payload.
pub const WRAPPER_KEY: &str = "JSON";

/// Field name (camelCase) to every message reported for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(to_camel_case(field))
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Adds the fields of `other` that are not reported here yet.
    pub fn extend_unreported(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_insert(messages);
        }
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut flat = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                flat.add(&field, message);
            }
        }
        flat
    }
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Parses a raw request body and strips the optional `JSON` wrapper. A
/// wrapped value may itself be a JSON-encoded string.
pub fn unwrap_payload(body: &[u8]) -> Result<Value, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("request body is not valid JSON: {e}")))?;

    match value {
        Value::Object(mut map) if map.contains_key(WRAPPER_KEY) => {
            match map.remove(WRAPPER_KEY).unwrap_or(Value::Null) {
                Value::String(raw) => serde_json::from_str(&raw).map_err(|e| {
                    AppError::BadRequest(format!("wrapped payload is not valid JSON: {e}"))
                }),
                inner => Ok(inner),
            }
        }
        other => Ok(other),
    }
}

/// The JSON shapes a lenient field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string or a number, see [`lenient_string`].
    Text,
    /// An integer or a numeric string, see [`lenient_i64`].
    Integer,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldKind::Text, Value::String(_) | Value::Number(_)) => true,
            (FieldKind::Integer, Value::Number(n)) => n.as_i64().is_some(),
            (FieldKind::Integer, Value::String(s)) => s.trim().parse::<i64>().is_ok(),
            _ => false,
        }
    }

    fn message(self) -> &'static str {
        match self {
            FieldKind::Text => "Must be a string or number",
            FieldKind::Integer => "Must be a whole number",
        }
    }
}

/// Request types whose fields are read leniently. Lists each JSON key with
/// the shape it accepts.
pub trait LenientFields {
    const FIELDS: &'static [(&'static str, FieldKind)];
}

/// Removes every listed field whose JSON shape is wrong, reporting each under
/// its own name.
fn take_type_errors(payload: &mut Value, fields: &[(&str, FieldKind)]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let Some(map) = payload.as_object_mut() else {
        return errors;
    };
    for &(name, kind) in fields {
        if map.get(name).is_some_and(|v| !kind.accepts(v)) {
            map.remove(name);
            errors.add(name, kind.message());
        }
    }
    errors
}

/// Deserializes `payload` into `T`. Fields with the wrong JSON shape are left
/// out of `T` and returned as field errors, so callers can merge them with
/// rule failures. Anything else serde rejects is reported under `body`.
pub fn deserialize_payload<T>(
    mut payload: Value,
    message: &'static str,
) -> Result<(T, FieldErrors), AppError>
where
    T: DeserializeOwned + LenientFields,
{
    if !payload.is_object() {
        let mut details = FieldErrors::new();
        details.add("body", "Expected a JSON object");
        return Err(AppError::validation(message, details));
    }

    let type_errors = take_type_errors(&mut payload, T::FIELDS);
    let parsed = serde_json::from_value(payload).map_err(|e| {
        let mut details = FieldErrors::new();
        details.add("body", e.to_string());
        AppError::validation(message, details)
    })?;
    Ok((parsed, type_errors))
}

/// Runs the declared rules of `value` and adds their failures to `errors`.
/// A field already reported keeps only its earlier messages, so a wrong-typed
/// field is not also flagged as missing.
pub fn collect_rule_errors<T: Validate>(value: &T, errors: &mut FieldErrors) {
    if let Err(e) = value.validate() {
        errors.extend_unreported(FieldErrors::from(&e));
    }
}

/// Deserializes and validates in one step, reporting every failing field at
/// once.
pub fn parse_and_validate<T>(payload: Value, message: &'static str) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate + LenientFields,
{
    let (parsed, mut errors): (T, _) = deserialize_payload(payload, message)?;
    collect_rule_errors(&parsed, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::validation(message, errors));
    }
    Ok(parsed)
}

/// Accepts a string or a number, trimming strings. `null` and absence map
/// to `None`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}

/// Accepts an integer or a numeric string.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got \"{s}\""))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected an integer, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_string")]
        #[validate(required(message = "Required"), length(min = 1, message = "Must not be empty"))]
        organization_id: Option<String>,
        #[serde(default, deserialize_with = "lenient_i64")]
        #[validate(range(min = 1, max = 10, message = "Out of range"))]
        count: Option<i64>,
    }

    impl LenientFields for Sample {
        const FIELDS: &'static [(&'static str, FieldKind)] = &[
            ("organizationId", FieldKind::Text),
            ("count", FieldKind::Integer),
        ];
    }

    #[test]
    fn test_unwrap_payload_plain_body() {
        let value = unwrap_payload(br#"{"a":1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_unwrap_payload_object_wrapper() {
        let value = unwrap_payload(br#"{"JSON":{"a":1}}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_unwrap_payload_string_wrapper() {
        let value = unwrap_payload(br#"{"JSON":"{\"a\":1}"}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_unwrap_payload_rejects_garbage() {
        assert!(matches!(
            unwrap_payload(b"not json"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            unwrap_payload(br#"{"JSON":"{broken"}"#),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_field_errors_use_camel_case_names() {
        let err = parse_and_validate::<Sample>(json!({"count": 50}), "bad").unwrap_err();
        let AppError::Validation { details, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(details.get("organizationId"), Some(&["Required".to_string()][..]));
        assert_eq!(details.get("count"), Some(&["Out of range".to_string()][..]));
    }

    #[test]
    fn test_lenient_fields_accept_numbers_and_strings() {
        let sample: Sample =
            parse_and_validate(json!({"organizationId": 42, "count": "7"}), "bad").unwrap();
        assert_eq!(sample.organization_id.as_deref(), Some("42"));
        assert_eq!(sample.count, Some(7));
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let err = parse_and_validate::<Sample>(json!([1, 2]), "bad").unwrap_err();
        let AppError::Validation { details, .. } = err else {
            panic!("expected validation error");
        };
        assert!(details.get("body").is_some());
    }

    #[test]
    fn test_wrong_types_are_reported_per_field() {
        let err = parse_and_validate::<Sample>(json!({"organizationId": true, "count": 2.5}), "bad")
            .unwrap_err();
        let AppError::Validation { details, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            details.get("organizationId"),
            Some(&["Must be a string or number".to_string()][..])
        );
        assert_eq!(details.get("count"), Some(&["Must be a whole number".to_string()][..]));
        assert!(details.get("body").is_none());
    }

    #[test]
    fn test_wrong_type_and_missing_field_are_both_named() {
        let err = parse_and_validate::<Sample>(json!({"count": {"n": 1}}), "bad").unwrap_err();
        let AppError::Validation { details, .. } = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = details.fields().collect();
        assert_eq!(fields, vec!["count", "organizationId"]);
        assert_eq!(details.get("organizationId"), Some(&["Required".to_string()][..]));
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("contact_phone"), "contactPhone");
        assert_eq!(to_camel_case("userId"), "userId");
        assert_eq!(to_camel_case("notes"), "notes");
    }
}
