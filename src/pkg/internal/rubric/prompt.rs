use super::{Rubric, ScoringMode};

pub const SYSTEM_PROMPT: &str = "You are a senior recruiter with deep technical expertise screening candidate CVs. Respond only in the requested JSON format, with no additional text.";

/// Renders the evaluation prompt for a rubric. Pure interpolation: identical
/// inputs always produce the identical prompt.
pub fn build(
    rubric: &Rubric,
    cv_text: &str,
    role_info: &str,
    company_info: &str,
    job_description: Option<&str>,
) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Analyze this CV and evaluate it against these {} criteria for the role and company below.\n\n",
        rubric.criteria.len()
    ));
    prompt.push_str(&format!("ROLE:\n{}\n\n", role_info));
    prompt.push_str(&format!("COMPANY / INDUSTRY:\n{}\n\n", company_info));
    if let Some(job_description) = job_description {
        prompt.push_str(&format!("FULL JOB DESCRIPTION:\n{}\n\n", job_description));
    }

    for (position, criterion) in rubric.criteria.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}: PASS if the candidate {}. RED FLAG if the candidate {}.\n",
            position + 1,
            criterion.label.to_uppercase(),
            criterion.pass_rule,
            criterion.fail_rule,
        ));
    }

    // guard against the model hallucinating missing temporal data
    prompt.push_str(
        "\nDATES: before judging job stability or risk criteria, explicitly list every date \
         and period you find in the CV. Never claim that no dates were found when any \
         year-like token is present in the text.\n\n",
    );

    prompt.push_str(&format!("CV TO ANALYZE:\n{}\n\n", cv_text));

    prompt.push_str("Respond EXACTLY in this JSON format:\n{\n");
    if rubric.scoring_mode == ScoringMode::ModelAsserted {
        prompt.push_str(&format!("  \"score\": [number from 1 to {}],\n", rubric.max_score));
    }
    prompt.push_str("  \"feedback\": \"[overall explanation of the result]\",\n");
    prompt.push_str("  \"criteria\": {\n");
    for (position, criterion) in rubric.criteria.iter().enumerate() {
        let trailing = if position + 1 < rubric.criteria.len() { "," } else { "" };
        prompt.push_str(&format!(
            "    \"{}\": {{\"passed\": [true/false], \"message\": \"[specific explanation]\"}}{}\n",
            criterion.key, trailing
        ));
    }
    prompt.push_str("  }\n}\n\n");

    prompt.push_str(
        "CRITICAL REQUIREMENTS:\n\
         - respond with valid JSON only, no markdown code blocks, no extra text\n\
         - every criteria key listed above must be present, none may be added\n\
         - each message must be a single line with no line breaks\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::internal::rubric::{V10, V12, V8};

    #[test]
    fn identical_inputs_render_identical_prompts() {
        for rubric in [&*V8, &*V10, &*V12] {
            let a = build(rubric, "cv text", "role", "company", Some("jd"));
            let b = build(rubric, "cv text", "role", "company", Some("jd"));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn prompt_lists_every_criterion_key() {
        let prompt = build(&V12, "cv", "role", "company", None);
        for criterion in &V12.criteria {
            assert!(prompt.contains(&format!("\"{}\"", criterion.key)));
        }
    }

    #[test]
    fn job_description_section_only_when_present() {
        let with = build(&V12, "cv", "role", "company", Some("the full jd"));
        let without = build(&V12, "cv", "role", "company", None);
        assert!(with.contains("FULL JOB DESCRIPTION:\nthe full jd"));
        assert!(!without.contains("FULL JOB DESCRIPTION"));
    }

    #[test]
    fn date_enumeration_guard_is_always_present() {
        for rubric in [&*V8, &*V10, &*V12] {
            let prompt = build(rubric, "cv", "role", "company", None);
            assert!(prompt.contains("list every date"));
            assert!(prompt.contains("no dates were found"));
        }
    }

    #[test]
    fn score_field_requested_only_for_model_asserted_rubrics() {
        let legacy = build(&V8, "cv", "role", "company", None);
        let derived = build(&V12, "cv", "role", "company", None);
        assert!(legacy.contains("\"score\": [number from 1 to 10]"));
        assert!(!derived.contains("\"score\""));
    }
}
