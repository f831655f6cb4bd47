use serde::{Deserialize, Serialize};

use crate::{conf::settings, pkg::internal::pipeline::error::StageError};

#[derive(Serialize)]
struct ExtractionRequest<'a> {
    cv_url: &'a str,
    mode: &'a str,
    need_personal_data: bool,
}

/// The extraction service has carried the text under different field names
/// across revisions; all of them are accepted.
#[derive(Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl ExtractionResponse {
    fn into_text(self) -> Option<String> {
        self.result.or(self.text).or(self.content)
    }
}

/// Sends the signed file URL to the external extraction service and returns
/// the text exactly as extracted. No normalization and no accent-stripping
/// happen here: spelling analysis downstream depends on the original
/// characters. Retrying, if ever wanted, belongs to the caller.
pub async fn extract_text(
    http: &reqwest::Client,
    cv_url: &str,
) -> core::result::Result<String, StageError> {
    let payload = ExtractionRequest {
        cv_url,
        mode: &settings.extractor_mode,
        need_personal_data: settings.extractor_need_personal_data,
    };
    let response = http
        .post(&settings.extractor_endpoint)
        .json(&payload)
        .send()
        .await
        .map_err(|e| StageError::Extraction(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StageError::Extraction(format!(
            "extraction service returned {}: {}",
            status, body
        )));
    }
    let body: ExtractionResponse = response
        .json()
        .await
        .map_err(|e| StageError::Extraction(format!("malformed extraction response: {}", e)))?;
    if body.success == Some(false) {
        return Err(StageError::Extraction(
            body.error
                .unwrap_or_else(|| "unknown extraction failure".into()),
        ));
    }
    let text = body
        .into_text()
        .ok_or_else(|| StageError::Extraction("extraction service returned no text".into()))?;
    validate_extracted(text, settings.extract_min_chars)
}

/// Length gate: anything under the minimum reads as a scanned image rather
/// than selectable text and never reaches the model.
pub fn validate_extracted(
    text: String,
    min_chars: usize,
) -> core::result::Result<String, StageError> {
    let text = text.trim().to_string();
    let got = text.chars().count();
    if got < min_chars {
        return Err(StageError::InsufficientText {
            got,
            min: min_chars,
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_rejected_before_any_analysis() {
        let short = "a".repeat(40);
        match validate_extracted(short, 100) {
            Err(StageError::InsufficientText { got, min }) => {
                assert_eq!(got, 40);
                assert_eq!(min, 100);
            }
            other => panic!("expected InsufficientText, got {:?}", other),
        }
    }

    #[test]
    fn text_at_the_minimum_passes() {
        let text = "b".repeat(100);
        assert_eq!(validate_extracted(text.clone(), 100).unwrap(), text);
    }

    #[test]
    fn whitespace_padding_does_not_count_toward_the_minimum() {
        let padded = format!("  {}  \n", "c".repeat(50));
        assert!(matches!(
            validate_extracted(padded, 100),
            Err(StageError::InsufficientText { got: 50, .. })
        ));
    }

    #[test]
    fn accents_survive_validation_untouched() {
        let text = format!("Coordinación de operaciones en Ciudad de México. {}", "x".repeat(60));
        let validated = validate_extracted(text.clone(), 100).unwrap();
        assert!(validated.contains("Coordinación"));
        assert!(validated.contains("México"));
    }

    #[test]
    fn response_text_is_read_from_any_known_field() {
        for field in ["result", "text", "content"] {
            let raw = format!(r#"{{"success": true, "{}": "extracted body"}}"#, field);
            let parsed: ExtractionResponse = serde_json::from_str(&raw).unwrap();
            assert_eq!(parsed.into_text().as_deref(), Some("extracted body"));
        }
    }

    #[test]
    fn result_field_wins_over_the_older_names() {
        let raw = r#"{"result": "new", "text": "old", "content": "older"}"#;
        let parsed: ExtractionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("new"));
    }

    #[test]
    fn bodies_without_text_yield_none() {
        let parsed: ExtractionResponse =
            serde_json::from_str(r#"{"success": false, "error": "boom"}"#).unwrap();
        assert_eq!(parsed.into_text(), None);
    }
}
