const POSITIVE_MARKERS: &[&str] = &[
    "highlight",
    "strength",
    "strong",
    "solid",
    "relevant experience",
    "good",
    "excellent",
    "appropriate",
];

const NEGATIVE_MARKERS: &[&str] = &[
    "alert",
    "concern",
    "missing",
    "lack",
    "weak",
    "risk",
    "problem",
    "insufficient",
    "red flag",
];

/// Splits model feedback into positive callouts and alerts by local keyword
/// classification. Derived presentation data, never model output.
pub fn split_feedback(feedback: &str) -> (String, String) {
    let mut highlights: Vec<&str> = Vec::new();
    let mut alerts: Vec<&str> = Vec::new();
    for line in feedback.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if POSITIVE_MARKERS.iter().any(|m| lower.contains(m)) {
            highlights.push(line);
        } else if NEGATIVE_MARKERS.iter().any(|m| lower.contains(m)) {
            alerts.push(line);
        } else {
            // lines that are neither clearly positive nor negative read as
            // neutral context and stay with the highlights
            highlights.push(line);
        }
    }
    let highlights = if highlights.is_empty() {
        "No specific highlights.".to_string()
    } else {
        highlights.join("\n")
    };
    let alerts = if alerts.is_empty() {
        "No specific alerts.".to_string()
    } else {
        alerts.join("\n")
    };
    (highlights, alerts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_and_negative_lines_are_separated() {
        let feedback = "Strong backend experience across fintech.\n\
                        Concern: only 8 months in the last position.\n\
                        Holds relevant experience with distributed systems.";
        let (highlights, alerts) = split_feedback(feedback);
        assert!(highlights.contains("Strong backend experience"));
        assert!(highlights.contains("relevant experience with distributed systems"));
        assert_eq!(alerts, "Concern: only 8 months in the last position.");
    }

    #[test]
    fn neutral_lines_default_to_highlights() {
        let (highlights, alerts) = split_feedback("Worked at three companies since 2019.");
        assert!(highlights.contains("three companies"));
        assert_eq!(alerts, "No specific alerts.");
    }

    #[test]
    fn empty_feedback_yields_placeholders() {
        let (highlights, alerts) = split_feedback("");
        assert_eq!(highlights, "No specific highlights.");
        assert_eq!(alerts, "No specific alerts.");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let (highlights, _) = split_feedback("\n\n  Good communication skills.  \n\n");
        assert_eq!(highlights, "Good communication skills.");
    }
}
