use anyhow::Result;

use crate::models::analysis::{Analysis, HistoryEntry, ImprovementDetail};

/// Renders one analysis as a plain-text report for download.
pub fn analysis_to_text(analysis: &Analysis) -> String {
    let mut out = format!("Resume Analysis\n\nScore: {}/100\n", analysis.score);
    if !analysis.summary.is_empty() {
        out.push_str(&format!("\n{}\n", analysis.summary));
    }

    if !analysis.strengths.is_empty() {
        out.push_str("\nStrengths\n");
        for strength in &analysis.strengths {
            out.push_str(&format!("  + {strength}\n"));
        }
    }

    if !analysis.improvements.is_empty() {
        out.push_str("\nAreas for Improvement\n");
        for improvement in &analysis.improvements {
            out.push_str(&format!("  - {}\n", improvement.headline()));
            if let ImprovementDetail::Structured {
                explanation,
                example,
                ..
            } = improvement
            {
                if !explanation.is_empty() {
                    out.push_str(&format!("      Why: {explanation}\n"));
                }
                if !example.is_empty() {
                    out.push_str(&format!("      Example: {example}\n"));
                }
            }
        }
    }

    if !analysis.keywords.is_empty() {
        out.push_str(&format!("\nKeywords: {}\n", analysis.keywords.join(", ")));
    }
    out
}

/// Every stored analysis, newest first, separated by a rule.
pub fn history_to_text(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(|entry| {
            format!(
                "Analyzed at {}\n{}",
                entry.timestamp.to_rfc3339(),
                analysis_to_text(&entry.analysis)
            )
        })
        .collect::<Vec<_>>()
        .join("\n----------------------------------------\n\n")
}

pub fn history_to_json(history: &[HistoryEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(history)?)
}
