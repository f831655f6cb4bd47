use axum::http::StatusCode;
use standard_error::{StandardError, Status};
use thiserror::Error;

/// Classified failures of the scoring pipeline. Every stage raises exactly
/// one class; the lifecycle manager maps a class to the terminal record
/// state and to a single user-facing message.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("storage write failed: {0}")]
    Upload(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("extracted only {got} characters, minimum is {min}")]
    InsufficientText { got: usize, min: usize },

    #[error("model call failed: {0}")]
    ModelCall(String),

    /// Parse failure is fatal for the run. The raw completion is carried
    /// along so the failure can be diagnosed from the logs.
    #[error("completion is not valid JSON: {cause}")]
    AnalysisParse { cause: String, raw: String },

    #[error("analysis does not match the rubric: {0}")]
    Consistency(String),

    #[error("record write failed: {0}")]
    Persistence(String),
}

impl StageError {
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::Upload(_) => "upload",
            StageError::Extraction(_) | StageError::InsufficientText { .. } => "extraction",
            StageError::ModelCall(_) | StageError::AnalysisParse { .. } => "scoring",
            StageError::Consistency(_) => "consistency",
            StageError::Persistence(_) => "persistence",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StageError::Upload(_) => "ERR-UPLOAD-001",
            StageError::Extraction(_) => "ERR-EXTRACT-001",
            StageError::InsufficientText { .. } => "ERR-EXTRACT-002",
            StageError::ModelCall(_) => "ERR-SCORE-001",
            StageError::AnalysisParse { .. } => "ERR-SCORE-002",
            StageError::Consistency(_) => "ERR-SCORE-003",
            StageError::Persistence(_) => "ERR-DB-010",
        }
    }

    /// One human-readable message per failure class.
    pub fn user_message(&self) -> &'static str {
        match self {
            StageError::Upload(_) => "We could not store your file. Please try again.",
            StageError::Extraction(_) => "We could not read your PDF. Please try again.",
            StageError::InsufficientText { .. } => {
                "Your file had too little readable text. Please upload a CV where the text \
                 is selectable, not a scanned image."
            }
            StageError::ModelCall(_) | StageError::AnalysisParse { .. } => {
                "The analysis service failed. Please try again."
            }
            StageError::Consistency(_) => {
                "The analysis service returned an incomplete result. Please try again."
            }
            StageError::Persistence(_) => "We could not save the evaluation. Please try again.",
        }
    }
}

impl From<StageError> for StandardError {
    fn from(err: StageError) -> Self {
        let status = match &err {
            StageError::InsufficientText { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            StageError::Persistence(_) | StageError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        StandardError::new(&format!("{}: {}", err.code(), err.user_message())).code(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_class_has_a_distinct_user_message() {
        let insufficient = StageError::InsufficientText { got: 40, min: 100 };
        let scoring = StageError::ModelCall("503".into());
        let upload = StageError::Upload("bucket gone".into());
        assert_ne!(insufficient.user_message(), scoring.user_message());
        assert_ne!(insufficient.user_message(), upload.user_message());
        assert_ne!(scoring.user_message(), upload.user_message());
    }

    #[test]
    fn parse_failures_keep_the_raw_completion() {
        let err = StageError::AnalysisParse {
            cause: "expected value at line 1".into(),
            raw: "Sure! Here is the JSON you asked for".into(),
        };
        match err {
            StageError::AnalysisParse { raw, .. } => {
                assert!(raw.contains("Sure!"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn stages_classify_by_failure_boundary() {
        assert_eq!(StageError::Upload("x".into()).stage(), "upload");
        assert_eq!(
            StageError::InsufficientText { got: 1, min: 100 }.stage(),
            "extraction"
        );
        assert_eq!(
            StageError::AnalysisParse {
                cause: "x".into(),
                raw: "y".into()
            }
            .stage(),
            "scoring"
        );
        assert_eq!(StageError::Persistence("x".into()).stage(), "persistence");
    }
}
