#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

pub const MAX_SCORE: u8 = 100;

/// One improvement suggestion. Older service versions send plain strings,
/// newer ones send structured objects; both are accepted at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImprovementDetail {
    Structured {
        suggestion: String,
        #[serde(default)]
        explanation: String,
        #[serde(default)]
        example: String,
    },
    PlainText(String),
}

impl ImprovementDetail {
    /// The headline text shown in lists.
    pub fn headline(&self) -> &str {
        match self {
            ImprovementDetail::Structured { suggestion, .. } => suggestion,
            ImprovementDetail::PlainText(text) => text,
        }
    }
}

/// Structured feedback returned by the analysis service for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub score: u8,
    #[serde(alias = "rationale", default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<ImprovementDetail>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Analysis {
    /// Rejects payloads that deserialized but break the 0–100 score range.
    pub fn check(self) -> Result<Self, RequestError> {
        if self.score > MAX_SCORE {
            return Err(RequestError::InvalidResponse(format!(
                "score {} is outside 0-{MAX_SCORE}",
                self.score
            )));
        }
        Ok(self)
    }
}

/// An analysis retained client-side together with the moment it was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub analysis: Analysis,
}

impl HistoryEntry {
    pub fn now(analysis: Analysis) -> Self {
        Self {
            timestamp: Utc::now(),
            analysis,
        }
    }
}

/// In-progress user input. Lives only in controller memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDraft {
    pub resume_text: String,
    pub job_description: Option<String>,
    pub company_name: Option<String>,
}

impl RequestDraft {
    pub fn new(resume_text: impl Into<String>) -> Self {
        Self {
            resume_text: resume_text.into(),
            ..Default::default()
        }
    }
}

/// POST body for `/analyze`.
#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    pub resume_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<&'a str>,
}

impl<'a> AnalyzeRequest<'a> {
    pub fn from_draft(draft: &'a RequestDraft, session_id: &'a str) -> Self {
        Self {
            session_id: non_blank(Some(session_id)),
            resume_text: &draft.resume_text,
            job_description: non_blank(draft.job_description.as_deref()),
            company_name: non_blank(draft.company_name.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: Analysis,
    #[serde(default)]
    pub log: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
