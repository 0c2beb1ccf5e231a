use serde::Deserialize;
use serde_json::Value;

use crate::engine::{CapsulePreferences, EngineError, OutfitFilters};

/// Body of `POST /api/analyze/compatibility`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityRequest {
    #[serde(default)]
    pub formality: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
}

impl CompatibilityRequest {
    pub fn filters(&self) -> Result<OutfitFilters, EngineError> {
        OutfitFilters::parse(self.formality.as_deref(), self.season.as_deref())
    }
}

/// Body of `POST /api/capsule/recommendations`. `desiredSize` stays loosely
/// typed so that numeric strings from form posts are accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsuleRequest {
    #[serde(default)]
    pub desired_size: Option<Value>,
    #[serde(default)]
    pub lifestyle: Option<String>,
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
}

impl CapsuleRequest {
    pub fn preferences(&self) -> Result<CapsulePreferences, EngineError> {
        CapsulePreferences::parse(
            self.lifestyle.as_deref(),
            self.climate.as_deref(),
            self.budget.as_deref(),
        )
    }

    pub fn desired_size(&self, default: i64) -> Result<i64, EngineError> {
        parse_desired_size(self.desired_size.as_ref(), default)
    }
}

/// Reads a capsule size from JSON. Integers, integral floats and numeric
/// strings are accepted; `null` or an absent field yields `default`. The sign
/// is left for the selector to judge.
pub fn parse_desired_size(raw: Option<&Value>, default: i64) -> Result<i64, EngineError> {
    let invalid = |value: &Value| EngineError::InvalidCapsuleSize(value.to_string());

    match raw {
        None | Some(Value::Null) => Ok(default),
        Some(value @ Value::Number(number)) => {
            if let Some(size) = number.as_i64() {
                return Ok(size);
            }
            match number.as_f64() {
                Some(size)
                    if size.is_finite()
                        && size.fract() == 0.0
                        && size >= i64::MIN as f64
                        && size <= i64::MAX as f64 =>
                {
                    Ok(size as i64)
                }
                _ => Err(invalid(value)),
            }
        }
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| EngineError::InvalidCapsuleSize(text.clone())),
        Some(other) => Err(invalid(other)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn desired_size_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_desired_size(None, 20), Ok(20));
        assert_eq!(parse_desired_size(Some(&Value::Null), 20), Ok(20));
        assert_eq!(parse_desired_size(Some(&json!(12)), 20), Ok(12));
        assert_eq!(parse_desired_size(Some(&json!(8.0)), 20), Ok(8));
        assert_eq!(parse_desired_size(Some(&json!(" 15 ")), 20), Ok(15));
        assert_eq!(parse_desired_size(Some(&json!(0)), 20), Ok(0));
    }

    #[test]
    fn desired_size_rejects_non_numeric_input() {
        assert_eq!(
            parse_desired_size(Some(&json!("a dozen")), 20),
            Err(EngineError::InvalidCapsuleSize("a dozen".to_string()))
        );
        assert!(parse_desired_size(Some(&json!(2.5)), 20).is_err());
        assert!(parse_desired_size(Some(&json!(true)), 20).is_err());
        assert!(parse_desired_size(Some(&json!([10])), 20).is_err());
    }

    #[test]
    fn capsule_request_reads_camel_case_fields() {
        let request: CapsuleRequest = serde_json::from_value(json!({
            "desiredSize": "10",
            "lifestyle": "casual",
        }))
        .expect("valid request");

        assert_eq!(request.desired_size(20), Ok(10));
        let preferences = request.preferences().expect("valid preferences");
        assert_eq!(preferences.lifestyle.label(), "casual");
        assert_eq!(preferences.budget.label(), "medium");
    }
}
