use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use super::{CriterionVerdict, Rubric, ScoringMode};
use crate::pkg::internal::pipeline::error::StageError;

/// The model's completion, parsed. `score` is only present (and only
/// trusted) for model-asserted rubric versions.
#[derive(Debug, Deserialize)]
pub struct ParsedAnalysis {
    #[serde(default)]
    pub score: Option<i32>,
    pub feedback: String,
    pub criteria: BTreeMap<String, CriterionVerdict>,
}

#[derive(Debug)]
pub struct ScoredAnalysis {
    pub score: i32,
    pub feedback: String,
    pub criteria: BTreeMap<String, CriterionVerdict>,
}

/// Checks the parsed criteria keys against the rubric's key set.
///
/// Under the strict policy any divergence is a consistency failure. The
/// lenient policy reproduces the legacy behavior: missing keys are filled
/// with a failed "no analysis" verdict and unexpected keys are dropped.
pub fn reconcile_criteria(
    rubric: &Rubric,
    analysis: &mut ParsedAnalysis,
    strict: bool,
) -> Result<(), StageError> {
    let expected: BTreeSet<&str> = rubric.keys().collect();
    let missing: Vec<String> = rubric
        .keys()
        .filter(|key| !analysis.criteria.contains_key(*key))
        .map(String::from)
        .collect();
    let unexpected: Vec<String> = analysis
        .criteria
        .keys()
        .filter(|key| !expected.contains(key.as_str()))
        .cloned()
        .collect();
    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }
    if strict {
        return Err(StageError::Consistency(format!(
            "criteria keys diverge from rubric v{}: missing {:?}, unexpected {:?}",
            rubric.version, missing, unexpected
        )));
    }
    tracing::warn!(
        "patching criteria for rubric v{}: missing {:?}, unexpected {:?}",
        rubric.version,
        missing,
        unexpected
    );
    for key in missing {
        analysis.criteria.insert(
            key,
            CriterionVerdict {
                passed: false,
                message: "no analysis".into(),
            },
        );
    }
    analysis
        .criteria
        .retain(|key, _| expected.contains(key.as_str()));
    Ok(())
}

/// Produces the final score. Derived rubrics recompute it from the verdicts
/// so the score can never contradict the criteria; model-asserted rubrics
/// validate the model's own number against the scale.
pub fn aggregate(rubric: &Rubric, analysis: ParsedAnalysis) -> Result<ScoredAnalysis, StageError> {
    let score = match rubric.scoring_mode {
        ScoringMode::Derived => analysis.criteria.values().filter(|v| v.passed).count() as i32,
        ScoringMode::ModelAsserted => {
            let score = analysis.score.ok_or_else(|| {
                StageError::Consistency(format!(
                    "rubric v{} expects a model-asserted score, none was returned",
                    rubric.version
                ))
            })?;
            if !(1..=rubric.max_score).contains(&score) {
                return Err(StageError::Consistency(format!(
                    "model-asserted score {} is outside 1..={}",
                    score, rubric.max_score
                )));
            }
            score
        }
    };
    Ok(ScoredAnalysis {
        score,
        feedback: analysis.feedback,
        criteria: analysis.criteria,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::internal::rubric::{V12, V8};

    fn analysis_with(passes: usize, fails: usize) -> ParsedAnalysis {
        let mut criteria = BTreeMap::new();
        for (position, criterion) in V12.criteria.iter().enumerate() {
            criteria.insert(
                criterion.key.to_string(),
                CriterionVerdict {
                    passed: position < passes,
                    message: format!("verdict for {}", criterion.key),
                },
            );
        }
        assert_eq!(passes + fails, criteria.len());
        ParsedAnalysis {
            score: None,
            feedback: "summary".into(),
            criteria,
        }
    }

    #[test]
    fn derived_score_is_the_count_of_passes() {
        let scored = aggregate(&V12, analysis_with(9, 3)).unwrap();
        assert_eq!(scored.score, 9);
    }

    #[test]
    fn derived_score_always_matches_criteria() {
        for passes in 0..=12 {
            let scored = aggregate(&V12, analysis_with(passes, 12 - passes)).unwrap();
            let recount = scored.criteria.values().filter(|v| v.passed).count() as i32;
            assert_eq!(scored.score, recount);
        }
    }

    #[test]
    fn derived_mode_ignores_a_model_asserted_score() {
        let mut analysis = analysis_with(4, 8);
        analysis.score = Some(12);
        assert_eq!(aggregate(&V12, analysis).unwrap().score, 4);
    }

    #[test]
    fn model_asserted_mode_trusts_the_model_score() {
        let mut criteria = BTreeMap::new();
        for criterion in &V8.criteria {
            criteria.insert(
                criterion.key.to_string(),
                CriterionVerdict {
                    passed: false,
                    message: "failed".into(),
                },
            );
        }
        let analysis = ParsedAnalysis {
            score: Some(7),
            feedback: "summary".into(),
            criteria,
        };
        assert_eq!(aggregate(&V8, analysis).unwrap().score, 7);
    }

    #[test]
    fn model_asserted_mode_rejects_a_missing_or_out_of_range_score() {
        let missing = ParsedAnalysis {
            score: None,
            feedback: "summary".into(),
            criteria: BTreeMap::new(),
        };
        assert!(matches!(
            aggregate(&V8, missing),
            Err(StageError::Consistency(_))
        ));
        let out_of_range = ParsedAnalysis {
            score: Some(11),
            feedback: "summary".into(),
            criteria: BTreeMap::new(),
        };
        assert!(matches!(
            aggregate(&V8, out_of_range),
            Err(StageError::Consistency(_))
        ));
    }

    #[test]
    fn strict_policy_rejects_missing_and_unexpected_keys() {
        let mut analysis = analysis_with(6, 6);
        analysis.criteria.remove("spelling");
        let err = reconcile_criteria(&V12, &mut analysis, true).unwrap_err();
        assert!(matches!(err, StageError::Consistency(_)));
        assert!(err.to_string().contains("spelling"));

        let mut analysis = analysis_with(6, 6);
        analysis.criteria.insert(
            "astrology".into(),
            CriterionVerdict {
                passed: true,
                message: "unsolicited".into(),
            },
        );
        assert!(reconcile_criteria(&V12, &mut analysis, true).is_err());
    }

    #[test]
    fn lenient_policy_patches_gaps_and_drops_strays() {
        let mut analysis = analysis_with(6, 6);
        analysis.criteria.remove("spelling");
        analysis.criteria.insert(
            "astrology".into(),
            CriterionVerdict {
                passed: true,
                message: "unsolicited".into(),
            },
        );
        reconcile_criteria(&V12, &mut analysis, false).unwrap();
        assert_eq!(analysis.criteria.len(), 12);
        assert!(!analysis.criteria.contains_key("astrology"));
        let patched = &analysis.criteria["spelling"];
        assert!(!patched.passed);
        assert_eq!(patched.message, "no analysis");
    }

    #[test]
    fn matching_keys_pass_under_both_policies() {
        let mut analysis = analysis_with(12, 0);
        assert!(reconcile_criteria(&V12, &mut analysis, true).is_ok());
        assert!(reconcile_criteria(&V12, &mut analysis, false).is_ok());
    }
}
