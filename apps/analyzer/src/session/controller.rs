#![allow(dead_code)]

//! Session Controller — orchestrates validation, the analysis call and history
//! persistence, and owns the observable state the presentation layer renders.
//!
//! ```text
//! Idle ──submit (valid)──▶ Loading ──Ok──▶ Success
//!  ▲  └─submit (invalid): stays Idle      └──Err─▶ Error
//!  └──────────── edit / next submit ◀─────────────┘
//! ```
//!
//! At most one request is in flight. Event-loop front-ends can split a submit
//! into [`SessionController::begin_submit`] and [`SessionController::finish_submit`];
//! results for tickets issued before [`SessionController::teardown`] are dropped.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::analysis_client::Analyzer;
use crate::errors::{RequestError, SubmitError};
use crate::models::analysis::{Analysis, HistoryEntry, RequestDraft};
use crate::session::store::SessionStore;
use crate::validation::validate_resume;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControllerState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything the presentation layer needs to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub state: ControllerState,
    pub analysis: Option<Analysis>,
    pub history: Vec<HistoryEntry>,
    /// Validation or request failure message; one per failure.
    pub notice: Option<String>,
}

/// Ticket for an in-flight request, returned by `begin_submit`.
#[derive(Debug, Clone)]
pub struct Submission {
    generation: u64,
    pub draft: RequestDraft,
    pub session_id: String,
}

pub struct SessionController {
    analyzer: Arc<dyn Analyzer>,
    store: SessionStore,
    draft: RequestDraft,
    snapshot: ControllerSnapshot,
    show_first_run_help: bool,
    generation: u64,
    tx: watch::Sender<ControllerSnapshot>,
}

impl SessionController {
    /// Reads the first-visit flag once (then sets it) and loads stored history.
    pub fn new(analyzer: Arc<dyn Analyzer>, mut store: SessionStore) -> Self {
        let show_first_run_help = !store.has_visited();
        if show_first_run_help {
            store.mark_visited();
        }

        let snapshot = ControllerSnapshot {
            history: store.load_history(),
            ..Default::default()
        };
        let (tx, _rx) = watch::channel(snapshot.clone());

        Self {
            analyzer,
            store,
            draft: RequestDraft::default(),
            snapshot,
            show_first_run_help,
            generation: 0,
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> &ControllerSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> ControllerState {
        self.snapshot.state
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.snapshot.analysis.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.snapshot.history
    }

    pub fn notice(&self) -> Option<&str> {
        self.snapshot.notice.as_deref()
    }

    pub fn draft(&self) -> &RequestDraft {
        &self.draft
    }

    pub fn show_first_run_help(&self) -> bool {
        self.show_first_run_help
    }

    pub fn is_storage_degraded(&self) -> bool {
        self.store.is_degraded()
    }

    pub fn analyzer(&self) -> Arc<dyn Analyzer> {
        Arc::clone(&self.analyzer)
    }

    pub fn session_id(&mut self) -> String {
        self.store.get_or_create_session_id()
    }

    /// Submit is disabled while a request is in flight.
    pub fn can_submit(&self) -> bool {
        self.snapshot.state != ControllerState::Loading
    }

    pub fn set_resume_text(&mut self, text: impl Into<String>) {
        self.draft.resume_text = text.into();
        self.on_edit();
    }

    pub fn set_job_description(&mut self, text: Option<String>) {
        self.draft.job_description = text;
        self.on_edit();
    }

    pub fn set_company_name(&mut self, name: Option<String>) {
        self.draft.company_name = name;
        self.on_edit();
    }

    /// Validates the draft and moves to `Loading`.
    ///
    /// A validation failure leaves the controller `Idle` with the reason in
    /// `notice`; it is not a request failure.
    pub fn begin_submit(&mut self) -> Result<Submission, SubmitError> {
        if self.snapshot.state == ControllerState::Loading {
            return Err(SubmitError::Busy);
        }

        if let Err(e) = validate_resume(&self.draft.resume_text) {
            debug!("Submission rejected by validation: {e}");
            self.snapshot.state = ControllerState::Idle;
            self.snapshot.notice = Some(e.user_message());
            self.publish();
            return Err(e.into());
        }

        let session_id = self.store.get_or_create_session_id();
        self.snapshot.state = ControllerState::Loading;
        self.snapshot.analysis = None;
        self.snapshot.notice = None;
        self.publish();
        info!("Analysis started for session {session_id}");

        Ok(Submission {
            generation: self.generation,
            draft: self.draft.clone(),
            session_id,
        })
    }

    /// Applies the outcome of a request started by `begin_submit`.
    /// Returns `false` if the ticket was stale and the result was discarded.
    pub fn finish_submit(
        &mut self,
        submission: Submission,
        result: Result<Analysis, RequestError>,
    ) -> bool {
        if submission.generation != self.generation
            || self.snapshot.state != ControllerState::Loading
        {
            debug!("Discarding analysis result for a torn-down view");
            return false;
        }

        match result {
            Ok(analysis) => {
                info!("Analysis succeeded with score {}", analysis.score);
                let entry = HistoryEntry::now(analysis.clone());
                self.snapshot.history = self.store.append_history(entry);
                self.snapshot.analysis = Some(analysis);
                self.snapshot.state = ControllerState::Success;
            }
            Err(e) => {
                warn!("Analysis failed: {e}");
                self.snapshot.notice = Some(e.user_message());
                self.snapshot.state = ControllerState::Error;
            }
        }
        self.publish();
        true
    }

    /// Validates, performs the single network call and applies its outcome.
    /// Request failures are reported through the state, not the return value.
    pub async fn submit(&mut self) -> Result<ControllerState, SubmitError> {
        let submission = self.begin_submit()?;
        let analyzer = Arc::clone(&self.analyzer);
        let result = analyzer
            .analyze(&submission.draft, &submission.session_id)
            .await;
        self.finish_submit(submission, result);
        Ok(self.snapshot.state)
    }

    /// Stops observing outstanding requests. Their results are discarded.
    pub fn teardown(&mut self) {
        self.generation += 1;
        if self.snapshot.state == ControllerState::Loading {
            self.snapshot.state = ControllerState::Idle;
            self.publish();
        }
    }

    /// Clears persisted history and rotates the session token.
    pub fn clear_history(&mut self) {
        self.store.clear_all();
        self.snapshot.history.clear();
        self.snapshot.analysis = None;
        self.snapshot.notice = None;
        if self.snapshot.state != ControllerState::Loading {
            self.snapshot.state = ControllerState::Idle;
        }
        self.publish();
    }

    fn on_edit(&mut self) {
        match self.snapshot.state {
            ControllerState::Success | ControllerState::Error => {
                self.snapshot.state = ControllerState::Idle;
                self.snapshot.notice = None;
            }
            ControllerState::Idle => self.snapshot.notice = None,
            ControllerState::Loading => return,
        }
        self.publish();
    }

    fn publish(&self) {
        // No receivers is fine: the view may already be gone.
        self.tx.send_replace(self.snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    use super::*;
    use crate::analysis_client::AnalysisClient;
    use crate::session::storage::FileStorage;

    struct FakeAnalyzer {
        responses: Mutex<VecDeque<Result<Analysis, RequestError>>>,
        calls: AtomicUsize,
    }

    impl FakeAnalyzer {
        fn new(responses: Vec<Result<Analysis, RequestError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Analyzer for FakeAnalyzer {
        async fn analyze(
            &self,
            _draft: &RequestDraft,
            _session_id: &str,
        ) -> Result<Analysis, RequestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(RequestError::Transport("no response queued".into())))
        }
    }

    fn analysis(score: u8) -> Analysis {
        Analysis {
            score,
            summary: "Well structured".to_string(),
            strengths: vec!["Clear experience section".to_string()],
            improvements: vec![],
            keywords: vec!["rust".to_string()],
        }
    }

    fn valid_resume() -> String {
        let mut text = String::from(
            "Jane Doe. Experience: five years building distributed systems. Skills: Rust, Go.",
        );
        while text.len() < 300 {
            text.push_str(" Shipped reliable services.");
        }
        text
    }

    async fn spawn_mock(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn http_controller(app: Router) -> SessionController {
        let base = spawn_mock(app).await;
        let client = AnalysisClient::new(&base).unwrap();
        SessionController::new(Arc::new(client), SessionStore::in_memory())
    }

    fn controller(analyzer: Arc<FakeAnalyzer>) -> SessionController {
        SessionController::new(analyzer, SessionStore::in_memory())
    }

    #[tokio::test]
    async fn test_success_appends_one_history_entry() {
        let fake = FakeAnalyzer::new(vec![Ok(analysis(82))]);
        let mut ctl = controller(fake.clone());
        let rx = ctl.subscribe();
        ctl.set_resume_text(valid_resume());

        let before = ctl.history().len();
        let state = ctl.submit().await.unwrap();

        assert_eq!(state, ControllerState::Success);
        assert_eq!(ctl.analysis().map(|a| a.score), Some(82));
        assert_eq!(ctl.history().len(), before + 1);
        assert_eq!(fake.calls(), 1);

        let observed = rx.borrow().clone();
        assert_eq!(observed.state, ControllerState::Success);
        assert_eq!(observed.history.len(), 1);
    }

    #[tokio::test]
    async fn test_http_error_leaves_history_untouched() {
        let fake = FakeAnalyzer::new(vec![Err(RequestError::HttpStatus(500))]);
        let mut ctl = controller(fake);
        ctl.set_resume_text(valid_resume());

        let state = ctl.submit().await.unwrap();

        assert_eq!(state, ControllerState::Error);
        assert!(ctl.history().is_empty());
        assert!(ctl.analysis().is_none());
        assert!(ctl.notice().unwrap().contains("500"));

        ctl.set_resume_text(format!("{} Edited.", valid_resume()));
        assert_eq!(ctl.state(), ControllerState::Idle);
        assert!(ctl.notice().is_none());
    }

    #[tokio::test]
    async fn test_service_success_over_http_reaches_success() {
        let app = Router::new().route(
            "/analyze",
            post(|| async {
                Json(json!({
                    "analysis": {
                        "score": 82,
                        "summary": "Strong systems background",
                        "strengths": ["Concrete metrics"],
                        "improvements": [{
                            "suggestion": "Add a projects section",
                            "explanation": "Shows initiative",
                            "example": "Built a CLI in Rust"
                        }],
                        "keywords": ["rust"]
                    }
                }))
            }),
        );
        let mut ctl = http_controller(app).await;
        ctl.set_resume_text(valid_resume());
        let before = ctl.history().len();

        let state = ctl.submit().await.unwrap();

        assert_eq!(state, ControllerState::Success);
        assert_eq!(ctl.analysis().map(|a| a.score), Some(82));
        assert_eq!(ctl.history().len(), before + 1);

        ctl.set_resume_text(format!("{} Edited.", valid_resume()));
        assert_eq!(ctl.state(), ControllerState::Idle);
    }

    #[tokio::test]
    async fn test_service_500_over_http_reaches_error() {
        let app = Router::new().route(
            "/analyze",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let mut ctl = http_controller(app).await;
        ctl.set_resume_text(valid_resume());
        let before = ctl.history().len();

        let state = ctl.submit().await.unwrap();

        assert_eq!(state, ControllerState::Error);
        assert_eq!(ctl.history().len(), before);
        assert!(ctl.analysis().is_none());
        assert!(ctl.notice().unwrap().contains("500"));

        ctl.set_resume_text(format!("{} Edited.", valid_resume()));
        assert_eq!(ctl.state(), ControllerState::Idle);
        assert!(ctl.can_submit());
    }

    #[tokio::test]
    async fn test_retry_after_error_succeeds() {
        let fake = FakeAnalyzer::new(vec![
            Err(RequestError::Transport("connection reset".into())),
            Ok(analysis(75)),
        ]);
        let mut ctl = controller(fake);
        ctl.set_resume_text(valid_resume());

        assert_eq!(ctl.submit().await.unwrap(), ControllerState::Error);
        assert_eq!(ctl.submit().await.unwrap(), ControllerState::Success);
        assert_eq!(ctl.history().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_draft_stays_idle_without_calling_service() {
        let fake = FakeAnalyzer::new(vec![Ok(analysis(90))]);
        let mut ctl = controller(fake.clone());
        ctl.set_resume_text("too short");

        let r = ctl.submit().await;

        assert!(matches!(r, Err(SubmitError::Validation(_))));
        assert_eq!(ctl.state(), ControllerState::Idle);
        assert!(ctl.notice().is_some());
        assert_eq!(fake.calls(), 0);

        ctl.set_resume_text("still short");
        assert!(ctl.notice().is_none());
    }

    #[test]
    fn test_second_submit_while_loading_is_busy() {
        let mut ctl = controller(FakeAnalyzer::new(vec![]));
        ctl.set_resume_text(valid_resume());

        let _ticket = ctl.begin_submit().unwrap();
        assert!(!ctl.can_submit());
        assert_eq!(ctl.begin_submit().unwrap_err(), SubmitError::Busy);
        assert_eq!(ctl.state(), ControllerState::Loading);
    }

    #[test]
    fn test_edit_while_loading_keeps_loading() {
        let mut ctl = controller(FakeAnalyzer::new(vec![]));
        ctl.set_resume_text(valid_resume());
        let ticket = ctl.begin_submit().unwrap();

        ctl.set_company_name(Some("Acme".to_string()));
        assert_eq!(ctl.state(), ControllerState::Loading);
        assert_eq!(ticket.draft.company_name, None);
    }

    #[test]
    fn test_result_after_teardown_is_discarded() {
        let mut ctl = controller(FakeAnalyzer::new(vec![]));
        ctl.set_resume_text(valid_resume());
        let ticket = ctl.begin_submit().unwrap();

        ctl.teardown();
        let applied = ctl.finish_submit(ticket, Ok(analysis(88)));

        assert!(!applied);
        assert!(ctl.history().is_empty());
        assert_eq!(ctl.state(), ControllerState::Idle);
    }

    #[test]
    fn test_dropped_observer_does_not_break_publishing() {
        let mut ctl = controller(FakeAnalyzer::new(vec![]));
        drop(ctl.subscribe());
        ctl.set_resume_text(valid_resume());
        let ticket = ctl.begin_submit().unwrap();
        assert!(ctl.finish_submit(ticket, Ok(analysis(70))));
        assert_eq!(ctl.state(), ControllerState::Success);
    }

    #[tokio::test]
    async fn test_identical_submissions_are_not_deduplicated() {
        let fake = FakeAnalyzer::new(vec![Ok(analysis(80)), Ok(analysis(80))]);
        let mut ctl = controller(fake);
        ctl.set_resume_text(valid_resume());

        ctl.submit().await.unwrap();
        ctl.submit().await.unwrap();

        assert_eq!(ctl.history().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_history_rotates_session() {
        let fake = FakeAnalyzer::new(vec![Ok(analysis(65))]);
        let mut ctl = controller(fake);
        ctl.set_resume_text(valid_resume());
        ctl.submit().await.unwrap();
        let old_session = ctl.session_id();

        ctl.clear_history();

        assert!(ctl.history().is_empty());
        assert!(ctl.analysis().is_none());
        assert_eq!(ctl.state(), ControllerState::Idle);
        assert_ne!(ctl.session_id(), old_session);
    }

    #[tokio::test]
    async fn test_history_and_first_run_flag_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(Box::new(FileStorage::new(dir.path())));
        let mut first = SessionController::new(FakeAnalyzer::new(vec![Ok(analysis(91))]), store);
        assert!(first.show_first_run_help());
        first.set_resume_text(valid_resume());
        first.submit().await.unwrap();
        drop(first);

        let store = SessionStore::new(Box::new(FileStorage::new(dir.path())));
        let second = SessionController::new(FakeAnalyzer::new(vec![]), store);
        assert!(!second.show_first_run_help());
        assert_eq!(second.history().len(), 1);
        assert_eq!(second.history()[0].analysis.score, 91);
    }
}
