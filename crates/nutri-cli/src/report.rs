//! Human-readable rendering of analysis results

use colored::*;

use nutri_core::{AnalysisOutcome, AnalysisResult, AnalyzeResponse, ResultSource};

/// Wrap a result in the outbound `{ "analysis": ... }` envelope
pub fn to_response_json(result: &AnalysisResult, pretty: bool) -> anyhow::Result<String> {
    let response = AnalyzeResponse {
        analysis: result.clone(),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    Ok(json)
}

fn score_label(score: f64) -> ColoredString {
    let text = format!("{:.0}/100", score);
    if score >= 70.0 {
        text.green().bold()
    } else if score >= 40.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

fn source_note(source: ResultSource) -> Option<&'static str> {
    match source {
        ResultSource::Remote => None,
        ResultSource::Offline => Some("offline mode: canned result"),
        ResultSource::Heuristic => Some("service unavailable: local estimate"),
    }
}

/// Render an outcome as a short terminal report
pub fn render_report(outcome: &AnalysisOutcome) -> String {
    let result = &outcome.result;
    let mut lines = Vec::new();

    lines.push(format!("{} {}", "Nutrition score:".bold(), score_label(result.score)));
    if let Some(note) = source_note(outcome.source) {
        lines.push(format!("({})", note).dimmed().to_string());
    }
    lines.push(String::new());
    lines.push(result.summary.clone());

    if !result.concerns.is_empty() {
        lines.push(String::new());
        lines.push("Concerns:".red().bold().to_string());
        for concern in &result.concerns {
            lines.push(format!("  • {}", concern));
        }
    }

    if !result.suggestions.is_empty() {
        lines.push(String::new());
        lines.push("Suggestions:".green().bold().to_string());
        for suggestion in &result.suggestions {
            lines.push(format!("  • {}", suggestion));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn outcome(source: ResultSource) -> AnalysisOutcome {
        AnalysisOutcome {
            result: AnalysisResult {
                summary: "Mostly vegetables with some added fat.".to_string(),
                score: 68.0,
                concerns: vec!["Butter is high in saturated fat.".to_string()],
                suggestions: vec!["Use olive oil instead.".to_string()],
            },
            source,
            attempts: 1,
        }
    }

    #[test]
    fn test_response_envelope() {
        let json = to_response_json(&outcome(ResultSource::Remote).result, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["analysis"]["score"], 68.0);
        assert_eq!(value["analysis"]["concerns"][0], "Butter is high in saturated fat.");
    }

    #[test]
    fn test_report_plain_text() {
        colored::control::set_override(false);
        assert_snapshot!(render_report(&outcome(ResultSource::Heuristic)), @r###"
        Nutrition score: 68/100
        (service unavailable: local estimate)

        Mostly vegetables with some added fat.

        Concerns:
          • Butter is high in saturated fat.

        Suggestions:
          • Use olive oil instead.
        "###);
    }
}
