use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use standard_error::StandardError;

use crate::prelude::Result;

pub mod feedback;
pub mod prompt;
pub mod score;

/// One criterion verdict as produced by the model and persisted on the
/// evaluation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionVerdict {
    pub passed: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Trust the score field the model asserts (legacy rubric).
    ModelAsserted,
    /// Ignore any model score; recompute as the count of passed criteria so
    /// score and criteria can never disagree.
    Derived,
}

/// One rubric entry. The pass/fail rules are natural-language policies sent
/// to the model as instructions, not code.
#[derive(Debug, Clone, Copy)]
pub struct CriterionDef {
    pub key: &'static str,
    pub label: &'static str,
    pub pass_rule: &'static str,
    pub fail_rule: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Band {
    Hire,
    Maybe,
    NoHire,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Hire => "HIRE",
            Band::Maybe => "MAYBE",
            Band::NoHire => "NO HIRE",
        }
    }
}

/// Inclusive lower thresholds, calibrated per rubric scale.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBands {
    pub hire: i32,
    pub maybe: i32,
}

/// A versioned rubric. Swapping versions never touches the pipeline; the
/// prompt is rendered from this data.
pub struct Rubric {
    pub version: u8,
    pub criteria: Vec<CriterionDef>,
    pub scoring_mode: ScoringMode,
    pub bands: ScoreBands,
    pub max_score: i32,
}

impl Rubric {
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.criteria.iter().map(|c| c.key)
    }

    pub fn classify(&self, score: i32) -> Band {
        if score >= self.bands.hire {
            Band::Hire
        } else if score >= self.bands.maybe {
            Band::Maybe
        } else {
            Band::NoHire
        }
    }
}

pub fn rubric(version: u8) -> Result<&'static Rubric> {
    match version {
        8 => Ok(&V8),
        10 => Ok(&V10),
        12 => Ok(&V12),
        _ => Err(StandardError::new(&format!(
            "ERR-RUBRIC-001: unknown rubric version {}",
            version
        ))),
    }
}

const JOB_STABILITY_V8: CriterionDef = CriterionDef {
    key: "jobStability",
    label: "Job Stability",
    pass_rule: "held each of the last 4 positions for a year or longer",
    fail_rule: "spent under 1 year in 2 or more of the last 4 positions",
};

// later revisions widened the window and stopped giving the benefit of the
// doubt when employment dates cannot be determined
const JOB_STABILITY: CriterionDef = CriterionDef {
    key: "jobStability",
    label: "Job Stability",
    pass_rule: "held their recent positions for a year or longer each",
    fail_rule: "spent under 1 year in 2 or more of the last 5 positions, or the employment dates cannot be determined",
};

const SENIORITY: CriterionDef = CriterionDef {
    key: "seniority",
    label: "Seniority",
    pass_rule: "has 3 or more years of total professional experience",
    fail_rule: "has under 3 years of total professional experience",
};

const EDUCATION: CriterionDef = CriterionDef {
    key: "education",
    label: "Education",
    pass_rule: "holds a completed university degree (Licenciatura/Engineering/Bachelor's or higher)",
    fail_rule: "has no completed university degree",
};

const LANGUAGE: CriterionDef = CriterionDef {
    key: "language",
    label: "English Level",
    pass_rule: "speaks English at B2/upper-intermediate level or better, or the CV itself is written in English",
    fail_rule: "shows no evidence of English at B2 level or better",
};

const CERTIFICATIONS: CriterionDef = CriterionDef {
    key: "certifications",
    label: "Certifications",
    pass_rule: "holds at least 1 certification or course relevant to their current position",
    fail_rule: "holds no certification or course relevant to their current position",
};

const CAREER_GROWTH: CriterionDef = CriterionDef {
    key: "careerGrowth",
    label: "Career Growth",
    pass_rule: "had at least 1 promotion in the last 6 years, or is already at C-level/Director/VP",
    fail_rule: "had no promotion in the last 6 years and is not at C-level/Director/VP",
};

const COMPANY_EXPERIENCE: CriterionDef = CriterionDef {
    key: "companyExperience",
    label: "Company Experience",
    pass_rule: "has worked at an international company, Fortune 500, Big Four, or tech startup",
    fail_rule: "has only worked at small traditional businesses",
};

const SPELLING: CriterionDef = CriterionDef {
    key: "spelling",
    label: "Spelling",
    pass_rule: "made 3 or fewer spelling mistakes across the CV",
    fail_rule: "made more than 3 spelling mistakes",
};

const ROLE_FIT: CriterionDef = CriterionDef {
    key: "roleFit",
    label: "Role Fit",
    pass_rule: "has experience and achievements that line up with the role requirements",
    fail_rule: "shows little overlap with the role requirements",
};

const COMPANY_FIT: CriterionDef = CriterionDef {
    key: "companyFit",
    label: "Company Fit",
    pass_rule: "has a background that fits the company stage and industry",
    fail_rule: "has a background that does not translate to this company or industry",
};

const TECHNICAL_SKILLS: CriterionDef = CriterionDef {
    key: "technicalSkills",
    label: "Technical Skills",
    pass_rule: "demonstrates the core technical skills the role calls for",
    fail_rule: "is missing core technical skills the role calls for",
};

const RISK_INDICATORS: CriterionDef = CriterionDef {
    key: "riskIndicators",
    label: "Risk Indicators",
    pass_rule: "shows no unexplained gaps, overlapping employment dates, or title downgrades",
    fail_rule: "shows unexplained gaps, overlapping employment dates, or title downgrades",
};

fn base_criteria(stability: CriterionDef) -> Vec<CriterionDef> {
    vec![
        stability,
        SENIORITY,
        EDUCATION,
        LANGUAGE,
        CERTIFICATIONS,
        CAREER_GROWTH,
        COMPANY_EXPERIENCE,
        SPELLING,
    ]
}

lazy_static! {
    pub static ref V8: Rubric = Rubric {
        version: 8,
        criteria: base_criteria(JOB_STABILITY_V8),
        scoring_mode: ScoringMode::ModelAsserted,
        bands: ScoreBands { hire: 8, maybe: 6 },
        max_score: 10,
    };
    pub static ref V10: Rubric = Rubric {
        version: 10,
        criteria: {
            let mut criteria = base_criteria(JOB_STABILITY);
            criteria.extend([ROLE_FIT, COMPANY_FIT]);
            criteria
        },
        scoring_mode: ScoringMode::Derived,
        bands: ScoreBands { hire: 8, maybe: 6 },
        max_score: 10,
    };
    pub static ref V12: Rubric = Rubric {
        version: 12,
        criteria: {
            let mut criteria = base_criteria(JOB_STABILITY);
            criteria.extend([ROLE_FIT, COMPANY_FIT, TECHNICAL_SKILLS, RISK_INDICATORS]);
            criteria
        },
        scoring_mode: ScoringMode::Derived,
        bands: ScoreBands { hire: 11, maybe: 8 },
        max_score: 12,
    };
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn versions_carry_their_criterion_count() {
        assert_eq!(V8.criteria.len(), 8);
        assert_eq!(V10.criteria.len(), 10);
        assert_eq!(V12.criteria.len(), 12);
        assert_eq!(V8.max_score, 10);
        assert_eq!(V12.max_score, 12);
    }

    #[test]
    fn criterion_keys_are_unique_per_version() {
        for rubric in [&*V8, &*V10, &*V12] {
            let keys: BTreeSet<_> = rubric.keys().collect();
            assert_eq!(keys.len(), rubric.criteria.len());
        }
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert!(rubric(9).is_err());
        assert!(rubric(0).is_err());
        assert_eq!(rubric(12).unwrap().version, 12);
    }

    #[test]
    fn twelve_point_bands_at_the_edges() {
        assert_eq!(V12.classify(12), Band::Hire);
        assert_eq!(V12.classify(11), Band::Hire);
        assert_eq!(V12.classify(10), Band::Maybe);
        assert_eq!(V12.classify(9), Band::Maybe);
        assert_eq!(V12.classify(8), Band::Maybe);
        assert_eq!(V12.classify(7), Band::NoHire);
        assert_eq!(V12.classify(0), Band::NoHire);
    }

    #[test]
    fn ten_point_bands_at_the_edges() {
        for rubric in [&*V8, &*V10] {
            assert_eq!(rubric.classify(10), Band::Hire);
            assert_eq!(rubric.classify(8), Band::Hire);
            assert_eq!(rubric.classify(7), Band::Maybe);
            assert_eq!(rubric.classify(6), Band::Maybe);
            assert_eq!(rubric.classify(5), Band::NoHire);
        }
    }
}
