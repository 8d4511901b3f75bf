//! Request body validation.
//!
//! Bodies arrive as raw JSON so every problem can be reported at once, with
//! a dotted field path, instead of failing on the first serde error.

use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldError};
use crate::pipeline::types::{DraftInput, Length, Seniority, ToneSettings};

const LEVEL_MIN: i64 = 1;
const LEVEL_MAX: i64 = 5;

/// Unwrap the extracted JSON body, reporting an unreadable body (bad syntax,
/// wrong content type) as a validation failure on the root path.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Validation(vec![FieldError::new("", rejection.body_text())]))
}

/// Validate a `/draft` body.
pub fn draft_input(body: &Value) -> Result<DraftInput, ApiError> {
    let mut errors = Vec::new();
    let input = parse_draft_input(body, &mut errors);
    match input {
        Some(input) if errors.is_empty() => Ok(input),
        _ => Err(ApiError::Validation(errors)),
    }
}

/// Validate a `/refine` body: a draft body plus optional `useLLM`.
pub fn refine_input(body: &Value) -> Result<(DraftInput, bool), ApiError> {
    let mut errors = Vec::new();
    let input = parse_draft_input(body, &mut errors);

    let use_llm = match body.get("useLLM") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            errors.push(FieldError::new("useLLM", "Expected boolean"));
            false
        }
    };

    match input {
        Some(input) if errors.is_empty() => Ok((input, use_llm)),
        _ => Err(ApiError::Validation(errors)),
    }
}

fn parse_draft_input(body: &Value, errors: &mut Vec<FieldError>) -> Option<DraftInput> {
    let Some(obj) = body.as_object() else {
        errors.push(FieldError::new("", "Expected object"));
        return None;
    };

    let text = match obj.get("text") {
        Some(Value::String(s)) if s.is_empty() => {
            errors.push(FieldError::new("text", "Text cannot be empty"));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::new("text", "Expected string"));
            None
        }
        None => {
            errors.push(FieldError::new("text", "Required"));
            None
        }
    };

    let tone = match obj.get("tone") {
        Some(Value::Object(tone)) => parse_tone(tone, errors),
        Some(_) => {
            errors.push(FieldError::new("tone", "Expected object"));
            None
        }
        None => {
            errors.push(FieldError::new("tone", "Required"));
            None
        }
    };

    let overrides = match obj.get("overrides") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => parse_overrides(map, errors),
        Some(_) => {
            errors.push(FieldError::new("overrides", "Expected object"));
            None
        }
    };

    Some(DraftInput {
        text: text?,
        tone: tone?,
        overrides,
    })
}

fn parse_tone(tone: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<ToneSettings> {
    let formality = level(tone, "formality", errors);
    let confidence = level(tone, "confidence", errors);
    let seniority = enum_field(tone, "seniority", errors, |s| match s {
        "student" => Some(Seniority::Student),
        "professional" => Some(Seniority::Professional),
        _ => None,
    });
    let length = enum_field(tone, "length", errors, |s| match s {
        "short" => Some(Length::Short),
        "medium" => Some(Length::Medium),
        "long" => Some(Length::Long),
        _ => None,
    });

    Some(ToneSettings {
        formality: formality?,
        confidence: confidence?,
        seniority: seniority?,
        length: length?,
    })
}

fn level(tone: &Map<String, Value>, key: &str, errors: &mut Vec<FieldError>) -> Option<u8> {
    let path = format!("tone.{key}");
    let Some(value) = tone.get(key) else {
        errors.push(FieldError::new(path, "Required"));
        return None;
    };
    let Some(n) = integer(value) else {
        let message = if value.is_number() {
            "Expected integer"
        } else {
            "Expected number"
        };
        errors.push(FieldError::new(path, message));
        return None;
    };
    if !(LEVEL_MIN..=LEVEL_MAX).contains(&n) {
        errors.push(FieldError::new(
            path,
            format!("Must be between {LEVEL_MIN} and {LEVEL_MAX}"),
        ));
        return None;
    }
    u8::try_from(n).ok()
}

/// Integral JSON numbers, including floats with no fractional part (`4.0`).
fn integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn enum_field<T>(
    tone: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<FieldError>,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let path = format!("tone.{key}");
    match tone.get(key) {
        Some(Value::String(s)) => {
            let parsed = parse(s);
            if parsed.is_none() {
                errors.push(FieldError::new(path, format!("Invalid value \"{s}\"")));
            }
            parsed
        }
        Some(_) => {
            errors.push(FieldError::new(path, "Expected string"));
            None
        }
        None => {
            errors.push(FieldError::new(path, "Required"));
            None
        }
    }
}

fn parse_overrides(
    map: &Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> Option<HashMap<String, String>> {
    let before = errors.len();
    let mut overrides = HashMap::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::String(s) => {
                overrides.insert(key.clone(), s.clone());
            }
            _ => errors.push(FieldError::new(format!("overrides.{key}"), "Expected string")),
        }
    }
    (errors.len() == before).then_some(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn field_paths(err: ApiError) -> Vec<String> {
        let ApiError::Validation(details) = err;
        details.into_iter().map(|d| d.path).collect()
    }

    fn tone() -> Value {
        json!({"formality": 3, "confidence": 3, "seniority": "student", "length": "medium"})
    }

    #[test]
    fn test_valid_body() {
        let input = draft_input(&json!({
            "text": "Coffee chat?",
            "tone": tone(),
            "overrides": {"recipient_name": "Sam"}
        }))
        .unwrap();
        assert_eq!(input.text, "Coffee chat?");
        assert_eq!(input.tone, ToneSettings::default());
        assert_eq!(input.overrides.unwrap()["recipient_name"], "Sam");
    }

    #[test]
    fn test_empty_text_rejected() {
        let err = draft_input(&json!({"text": "", "tone": tone()})).unwrap_err();
        assert_eq!(field_paths(err), vec!["text"]);
    }

    #[test]
    fn test_all_tone_errors_reported() {
        let err = draft_input(&json!({
            "text": "hi",
            "tone": {"formality": 6, "confidence": 2.5, "seniority": "intern", "length": 3}
        }))
        .unwrap_err();
        assert_eq!(
            field_paths(err),
            vec!["tone.formality", "tone.confidence", "tone.seniority", "tone.length"]
        );
    }

    #[test]
    fn test_whole_float_levels_accepted() {
        let input = draft_input(&json!({
            "text": "hi",
            "tone": {"formality": 4.0, "confidence": 2.0, "seniority": "professional", "length": "short"}
        }))
        .unwrap();
        assert_eq!(input.tone.formality, 4);
        assert_eq!(input.tone.confidence, 2);

        let err = draft_input(&json!({
            "text": "hi",
            "tone": {"formality": 6.0, "confidence": 3, "seniority": "student", "length": "medium"}
        }))
        .unwrap_err();
        assert_eq!(field_paths(err), vec!["tone.formality"]);
    }

    #[test]
    fn test_missing_fields() {
        let err = draft_input(&json!({})).unwrap_err();
        assert_eq!(field_paths(err), vec!["text", "tone"]);
        let err = draft_input(&json!("just a string")).unwrap_err();
        assert_eq!(field_paths(err), vec![""]);
    }

    #[test]
    fn test_non_string_override_rejected() {
        let err = draft_input(&json!({
            "text": "hi",
            "tone": tone(),
            "overrides": {"count": 3}
        }))
        .unwrap_err();
        assert_eq!(field_paths(err), vec!["overrides.count"]);
    }

    #[test]
    fn test_refine_flag() {
        let (_, use_llm) = refine_input(&json!({"text": "hi", "tone": tone()})).unwrap();
        assert!(!use_llm);
        let (_, use_llm) =
            refine_input(&json!({"text": "hi", "tone": tone(), "useLLM": true})).unwrap();
        assert!(use_llm);
        let err = refine_input(&json!({"text": "hi", "tone": tone(), "useLLM": "yes"})).unwrap_err();
        assert_eq!(field_paths(err), vec!["useLLM"]);
    }
}
