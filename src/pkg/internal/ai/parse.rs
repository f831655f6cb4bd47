use crate::pkg::internal::{pipeline::error::StageError, rubric::score::ParsedAnalysis};

/// Parses the model completion into a structured analysis. Strict by
/// design: no repair heuristics, no retries. A completion that is not the
/// requested JSON object fails the run, with the raw text preserved for
/// diagnosis.
pub fn parse_analysis(raw: &str) -> core::result::Result<ParsedAnalysis, StageError> {
    let cleaned = strip_json_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| StageError::AnalysisParse {
        cause: e.to_string(),
        raw: raw.to_string(),
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences. Models occasionally
/// wrap their output in fences despite the instructions; removing the
/// wrapper is formatting cleanup, not output repair.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "score": 7,
        "feedback": "Solid profile overall.",
        "criteria": {
            "jobStability": {"passed": true, "message": "over a year in every role"},
            "seniority": {"passed": false, "message": "2 years total"}
        }
    }"#;

    #[test]
    fn valid_json_parses_into_an_analysis() {
        let analysis = parse_analysis(VALID).unwrap();
        assert_eq!(analysis.score, Some(7));
        assert_eq!(analysis.feedback, "Solid profile overall.");
        assert_eq!(analysis.criteria.len(), 2);
        assert!(analysis.criteria["jobStability"].passed);
        assert!(!analysis.criteria["seniority"].passed);
    }

    #[test]
    fn fenced_json_parses_after_cleanup() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert!(parse_analysis(&fenced).is_ok());
        let plain_fence = format!("```\n{}\n```", VALID);
        assert!(parse_analysis(&plain_fence).is_ok());
    }

    #[test]
    fn missing_score_is_not_a_parse_failure() {
        let raw = r#"{"feedback": "ok", "criteria": {}}"#;
        let analysis = parse_analysis(raw).unwrap();
        assert_eq!(analysis.score, None);
    }

    #[test]
    fn prose_wrapped_json_fails_and_keeps_the_raw_text() {
        let raw = "Sure, here is the evaluation you asked for: {\"feedback\": \"ok\"}";
        match parse_analysis(raw) {
            Err(StageError::AnalysisParse { raw: kept, .. }) => {
                assert_eq!(kept, raw);
            }
            other => panic!("expected AnalysisParse, got {:?}", other),
        }
    }

    #[test]
    fn truncated_json_fails() {
        let raw = r#"{"feedback": "ok", "criteria": {"jobStability": {"passed": true"#;
        assert!(parse_analysis(raw).is_err());
    }

    #[test]
    fn strip_json_fences_handles_all_variants() {
        assert_eq!(strip_json_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("{\"a\": 1}"), "{\"a\": 1}");
    }
}
