/// Analysis Client — the single point of entry for calls to the remote analysis service.
///
/// One submission is one POST to `{API_BASE_URL}/analyze`. There is no retry and
/// no caching; the caller decides whether the user may resubmit.
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::errors::RequestError;
use crate::models::analysis::{Analysis, AnalyzeRequest, AnalyzeResponse, RequestDraft};

const ANALYZE_PATH: &str = "/analyze";

/// The network seam used by the session controller. Implement this to swap the
/// transport (or fake it in tests) without touching controller code.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, draft: &RequestDraft, session_id: &str)
        -> Result<Analysis, RequestError>;
}

/// HTTP implementation of [`Analyzer`] backed by `reqwest`.
#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    endpoint: String,
}

impl AnalysisClient {
    /// `base_url` must already be normalized (no trailing slash).
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("resume-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{base_url}{ANALYZE_PATH}"),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Makes exactly one call to the analysis service.
    pub async fn submit(
        &self,
        draft: &RequestDraft,
        session_id: &str,
    ) -> Result<Analysis, RequestError> {
        let body = AnalyzeRequest::from_draft(draft, session_id);

        info!(
            "Submitting resume for analysis ({} chars) to {}",
            draft.resume_text.chars().count(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                debug!("Analysis request failed to send: {e}");
                RequestError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Analysis service returned {}: {}", status, body);
            return Err(RequestError::HttpStatus(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RequestError::Transport(e.to_string()))?;

        parse_response(&text)
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(
        &self,
        draft: &RequestDraft,
        session_id: &str,
    ) -> Result<Analysis, RequestError> {
        self.submit(draft, session_id).await
    }
}

/// Decodes the `{ analysis, log? }` envelope and checks the score range.
fn parse_response(text: &str) -> Result<Analysis, RequestError> {
    let envelope: AnalyzeResponse = serde_json::from_str(text).map_err(|e| {
        debug!("Analysis response could not be parsed: {e}");
        RequestError::InvalidResponse(e.to_string())
    })?;

    if let Some(log) = envelope.log.as_deref() {
        debug!("Analysis service log: {log}");
    }

    let analysis = envelope.analysis.check()?;
    debug!(
        "Analysis received: score={}, strengths={}, improvements={}",
        analysis.score,
        analysis.strengths.len(),
        analysis.improvements.len()
    );
    Ok(analysis)
}
