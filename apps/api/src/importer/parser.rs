//! Finds the JSON object inside free-form model output and maps it onto
//! `CreateApplicationInput`.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::application::{ApplicationStatus, CreateApplicationInput};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in extraction response")]
    MissingObject,

    #[error("extraction response is not a valid JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes the span from the first `{` to the last `}` of `raw`.
///
/// Field coercion: `companyName` falls back to `""`, `status` to `applied`,
/// `sourceUrl` to `fallback_url`; other fields become `None` unless they are strings.
/// Status is passed through unvalidated.
pub fn parse_extraction(raw: &str, fallback_url: &str) -> Result<CreateApplicationInput, ParseError> {
    let object = extract_object(raw)?;

    Ok(CreateApplicationInput {
        company_name: string_field(&object, "companyName").unwrap_or_default(),
        job_title: string_field(&object, "jobTitle"),
        location: string_field(&object, "location"),
        source_url: Some(
            string_field(&object, "sourceUrl").unwrap_or_else(|| fallback_url.to_string()),
        ),
        status: Some(
            string_field(&object, "status")
                .unwrap_or_else(|| ApplicationStatus::Applied.as_str().to_string()),
        ),
        apply_time: string_field(&object, "applyTime"),
        soft_skills: string_field(&object, "softSkills"),
        skills: string_field(&object, "skills"),
    })
}

fn extract_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let start = raw.find('{').ok_or(ParseError::MissingObject)?;
    let end = raw.rfind('}').ok_or(ParseError::MissingObject)?;
    if end < start {
        return Err(ParseError::MissingObject);
    }
    Ok(serde_json::from_str(&raw[start..=end])?)
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://jobs.example.com/123";

    #[test]
    fn test_parses_object_surrounded_by_noise() {
        let parsed = parse_extraction(
            r#"noise {"companyName":"Acme","skills":"Go,Rust"} trailing"#,
            URL,
        )
        .unwrap();
        assert_eq!(parsed.company_name, "Acme");
        assert_eq!(parsed.skills.as_deref(), Some("Go,Rust"));
    }

    #[test]
    fn test_applies_defaults_for_missing_fields() {
        let parsed = parse_extraction("{}", URL).unwrap();
        assert_eq!(parsed.company_name, "");
        assert_eq!(parsed.status.as_deref(), Some("applied"));
        assert_eq!(parsed.source_url.as_deref(), Some(URL));
        assert_eq!(parsed.job_title, None);
        assert_eq!(parsed.location, None);
        assert_eq!(parsed.apply_time, None);
        assert_eq!(parsed.soft_skills, None);
        assert_eq!(parsed.skills, None);
    }

    #[test]
    fn test_non_string_values_are_coerced_to_defaults() {
        let parsed = parse_extraction(
            r#"{"companyName": 42, "jobTitle": null, "skills": ["Rust"], "sourceUrl": false}"#,
            URL,
        )
        .unwrap();
        assert_eq!(parsed.company_name, "");
        assert_eq!(parsed.job_title, None);
        assert_eq!(parsed.skills, None);
        assert_eq!(parsed.source_url.as_deref(), Some(URL));
    }

    #[test]
    fn test_status_is_passed_through_unvalidated() {
        let parsed = parse_extraction(r#"{"companyName":"Acme","status":"offer"}"#, URL).unwrap();
        assert_eq!(parsed.status.as_deref(), Some("offer"));
    }

    #[test]
    fn test_handles_code_fences_and_nested_objects() {
        let raw = "```json\n{\"companyName\":\"Acme\",\"meta\":{\"x\":1},\"location\":\"Remote\"}\n```";
        let parsed = parse_extraction(raw, URL).unwrap();
        assert_eq!(parsed.company_name, "Acme");
        assert_eq!(parsed.location.as_deref(), Some("Remote"));
    }

    #[test]
    fn test_fails_without_opening_brace() {
        assert!(matches!(
            parse_extraction("I could not find anything", URL),
            Err(ParseError::MissingObject)
        ));
    }

    #[test]
    fn test_fails_on_inverted_braces() {
        assert!(matches!(
            parse_extraction("} oops {", URL),
            Err(ParseError::MissingObject)
        ));
    }

    #[test]
    fn test_fails_on_malformed_json() {
        assert!(matches!(
            parse_extraction(r#"{"companyName": "Acme",}"#, URL),
            Err(ParseError::Json(_))
        ));
    }
}
