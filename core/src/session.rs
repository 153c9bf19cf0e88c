//! One chat view's state and the submit flow that drives it.
//!
//! A submit runs: user turn -> backend -> confidence estimate -> session
//! metrics -> history. Requests can overlap, so every exchange carries a
//! sequence token and a response whose token is no longer current is
//! dropped instead of being applied to the wrong view state.

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::client::TriageBackend;
use crate::confidence::{ConfidenceEstimator, StrategyKind};
use crate::errors::{TriageError, TriageResult};
use crate::history::{ChatHistoryManager, ChatThread, HistoryNamespace};
use crate::metrics::{round_seconds, SessionMetrics};
use crate::storage::StoreRef;
use crate::types::{ChatResponse, DoctorSearch, Message, RiskLevel, Source};

/// Condition used for a specialist search before anything was asked
const GENERAL_QUERY: &str = "general";

/// The two views of the product, each with its own history and scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProfile {
    /// Everyday chat: source-count scoring, `chatHistory`
    Chat,
    /// Forensic dashboard: similarity scoring with risk tiers, `forensicHistory`
    Forensic,
}

impl SessionProfile {
    pub fn namespace(&self) -> HistoryNamespace {
        match self {
            SessionProfile::Chat => HistoryNamespace::Chat,
            SessionProfile::Forensic => HistoryNamespace::Forensic,
        }
    }

    pub fn default_strategy(&self) -> StrategyKind {
        match self {
            SessionProfile::Chat => StrategyKind::SourceCount,
            SessionProfile::Forensic => StrategyKind::Similarity,
        }
    }

    /// Text of the assistant turn shown when the backend cannot be reached
    pub fn failure_message(&self) -> &'static str {
        match self {
            SessionProfile::Chat => "Connection error. Please ensure the backend is running.",
            SessionProfile::Forensic => {
                "CRITICAL FAIL: Link to neural backend severed. Verify host connection."
            }
        }
    }
}

/// A submitted query waiting for its response
#[derive(Debug)]
pub struct PendingExchange {
    token: u64,
    query: String,
    started: Instant,
}

impl PendingExchange {
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// What happened to a completed exchange
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The backend answered; the assistant turn was appended and saved
    Answered {
        message: Message,
        thread_id: String,
        specialist_type: Option<String>,
    },
    /// The request failed; a synthetic error turn was appended
    Failed { message: Message, error: String },
    /// A newer exchange or a thread switch superseded this one
    Stale,
}

impl ExchangeOutcome {
    pub fn message(&self) -> Option<&Message> {
        match self {
            ExchangeOutcome::Answered { message, .. } | ExchangeOutcome::Failed { message, .. } => {
                Some(message)
            }
            ExchangeOutcome::Stale => None,
        }
    }
}

/// State of one chat view: the visible conversation, where it is saved, and
/// the figures derived from it.
#[derive(Debug)]
pub struct TriageSession {
    profile: SessionProfile,
    estimator: ConfidenceEstimator,
    metrics: SessionMetrics,
    history: ChatHistoryManager,
    current_thread: Option<String>,
    messages: Vec<Message>,
    /// Turns on screen that are not in the saved thread yet
    unsaved: Vec<Message>,
    sequence: u64,
    last_query: Option<String>,
    active_sources: Vec<Source>,
    current_confidence: u32,
    current_risk: Option<RiskLevel>,
    specialization: Option<String>,
    answer_specialist: Option<String>,
    doctor_search: Option<DoctorSearch>,
}

impl TriageSession {
    /// Open a session on `store` using the profile's default strategy
    pub fn open(store: StoreRef, profile: SessionProfile) -> TriageResult<Self> {
        let estimator = ConfidenceEstimator::new(profile.default_strategy());
        Self::with_estimator(store, profile, estimator)
    }

    pub fn with_estimator(
        store: StoreRef,
        profile: SessionProfile,
        estimator: ConfidenceEstimator,
    ) -> TriageResult<Self> {
        let history = ChatHistoryManager::open(store, profile.namespace())?;
        info!(
            "Opened {:?} session ({} saved threads, {} scoring)",
            profile,
            history.len(),
            estimator.strategy_name()
        );
        Ok(Self {
            profile,
            estimator,
            metrics: SessionMetrics::new(),
            history,
            current_thread: None,
            messages: Vec::new(),
            unsaved: Vec::new(),
            sequence: 0,
            last_query: None,
            active_sources: Vec::new(),
            current_confidence: 0,
            current_risk: None,
            specialization: None,
            answer_specialist: None,
            doctor_search: None,
        })
    }

    pub fn profile(&self) -> SessionProfile {
        self.profile
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Turns of the conversation on screen
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn current_thread(&self) -> Option<&str> {
        self.current_thread.as_deref()
    }

    pub fn threads(&self) -> &[ChatThread] {
        self.history.threads()
    }

    pub fn history(&self) -> &ChatHistoryManager {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ChatHistoryManager {
        &mut self.history
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Sources of the latest answer
    pub fn active_sources(&self) -> &[Source] {
        &self.active_sources
    }

    pub fn current_confidence(&self) -> u32 {
        self.current_confidence
    }

    pub fn current_risk(&self) -> Option<RiskLevel> {
        self.current_risk
    }

    /// Specialist type suggested by the latest answer or doctor search
    pub fn specialization(&self) -> Option<&str> {
        self.specialization.as_deref()
    }

    /// Specialist type carried by the latest answer itself, if any
    pub fn last_specialist_type(&self) -> Option<&str> {
        self.answer_specialist.as_deref()
    }

    pub fn doctor_search(&self) -> Option<&DoctorSearch> {
        self.doctor_search.as_ref()
    }

    /// Start an exchange: show the user turn and issue a token for the reply
    pub fn begin(&mut self, query: &str) -> TriageResult<PendingExchange> {
        if query.trim().is_empty() {
            return Err(TriageError::InvalidInput("Query is empty".to_string()));
        }
        self.sequence += 1;
        let turn = Message::user(query);
        self.messages.push(turn.clone());
        self.unsaved.push(turn);
        self.last_query = Some(query.to_string());
        debug!("Began exchange {}", self.sequence);
        Ok(PendingExchange {
            token: self.sequence,
            query: query.to_string(),
            started: Instant::now(),
        })
    }

    /// Apply the backend's result to the session.
    ///
    /// History write failures are returned after the visible conversation
    /// and metrics have already been updated.
    pub fn complete(
        &mut self,
        pending: PendingExchange,
        result: TriageResult<ChatResponse>,
    ) -> TriageResult<ExchangeOutcome> {
        if pending.token != self.sequence {
            warn!(
                "Dropping stale response for exchange {} (current {})",
                pending.token, self.sequence
            );
            return Ok(ExchangeOutcome::Stale);
        }

        match result {
            Ok(response) => self.apply_answer(pending, response),
            Err(e) => Ok(self.apply_failure(e)),
        }
    }

    /// Ask the backend and apply its answer
    pub async fn submit(
        &mut self,
        backend: &dyn TriageBackend,
        query: &str,
    ) -> TriageResult<ExchangeOutcome> {
        let pending = self.begin(query)?;
        let result = backend.send_message(pending.query()).await;
        self.complete(pending, result)
    }

    fn apply_answer(
        &mut self,
        pending: PendingExchange,
        response: ChatResponse,
    ) -> TriageResult<ExchangeOutcome> {
        let response_time = round_seconds(pending.started.elapsed().as_secs_f64());
        let estimate = self.estimator.estimate(&response.sources);
        let source_count = response.sources.len();

        let message = Message::assistant(
            response.answer,
            response.sources,
            response.medicines,
            estimate.confidence,
            response_time,
        )
        .with_risk(estimate.risk);

        self.active_sources = message.sources.clone();
        self.current_confidence = estimate.confidence;
        self.current_risk = estimate.risk;
        if let Some(specialist) = &response.specialist_type {
            self.specialization = Some(specialist.clone());
        }
        self.answer_specialist = response.specialist_type.clone();

        self.metrics
            .record(source_count, response_time, estimate.confidence, true);

        self.messages.push(message.clone());
        self.unsaved.push(message.clone());
        // Everything shown since the last save, including earlier failed
        // exchanges. The manager keeps them in memory even if the write fails.
        let exchange = std::mem::take(&mut self.unsaved);

        let thread_id = match self.current_thread.clone() {
            Some(id) => self
                .history
                .start_or_continue(Some(&id), &pending.query, &exchange)?,
            None => {
                let id = self.history.start_or_continue(None, &pending.query, &exchange)?;
                self.current_thread = Some(id.clone());
                id
            }
        };

        debug!(
            confidence = estimate.confidence,
            sources = source_count,
            "Answer recorded in thread {}",
            thread_id
        );
        Ok(ExchangeOutcome::Answered {
            message,
            thread_id,
            specialist_type: response.specialist_type,
        })
    }

    fn apply_failure(&mut self, error: TriageError) -> ExchangeOutcome {
        warn!("Exchange failed: {}", error);
        // Scored as an answer with no sources: 0, and High where the strategy rates risk
        let risk = self.estimator.estimate(&[]).risk;
        let message = Message::assistant(self.profile.failure_message(), vec![], vec![], 0, 0.0)
            .with_risk(risk);

        self.messages.push(message.clone());
        self.unsaved.push(message.clone());
        self.active_sources.clear();
        self.current_confidence = 0;
        self.current_risk = risk;
        self.answer_specialist = None;
        self.metrics.record_failure();

        ExchangeOutcome::Failed {
            message,
            error: error.to_string(),
        }
    }

    /// Leave the current thread; the next answer starts a new one
    pub fn new_chat(&mut self) {
        self.sequence += 1;
        self.messages.clear();
        self.unsaved.clear();
        self.current_thread = None;
        self.answer_specialist = None;
        self.active_sources.clear();
        self.current_confidence = 0;
        self.current_risk = None;
    }

    /// Show a saved thread and continue it on the next submit
    pub fn load_chat(&mut self, thread_id: &str) -> TriageResult<&ChatThread> {
        let thread = self
            .history
            .load(thread_id)
            .ok_or_else(|| crate::history::HistoryError::NotFound(thread_id.to_string()))?;
        self.messages = thread.messages.clone();
        self.unsaved.clear();
        self.answer_specialist = None;
        self.current_thread = Some(thread.id.clone());
        self.sequence += 1;
        Ok(thread)
    }

    /// Delete a saved thread; if it is the one on screen, start a new chat
    pub fn delete_chat(&mut self, thread_id: &str) -> TriageResult<bool> {
        let removed = self.history.delete(thread_id)?;
        if self.current_thread.as_deref() == Some(thread_id) {
            self.new_chat();
        }
        Ok(removed)
    }

    /// Erase every saved thread and start a new chat
    pub fn clear_history(&mut self) -> TriageResult<()> {
        self.history.clear_all()?;
        self.new_chat();
        Ok(())
    }

    /// Search for specialists near `location` for the last question asked.
    ///
    /// On failure the previous results are cleared and the error returned.
    pub async fn locate_specialists(
        &mut self,
        backend: &dyn TriageBackend,
        location: &str,
    ) -> TriageResult<&DoctorSearch> {
        let location = location.trim();
        if location.is_empty() {
            return Err(TriageError::InvalidInput("Location is empty".to_string()));
        }
        let query = self
            .last_query
            .clone()
            .unwrap_or_else(|| GENERAL_QUERY.to_string());

        match backend.find_doctors(&query, location).await {
            Ok(mut search) => {
                if search.location.is_empty() {
                    search.location = location.to_string();
                }
                if !search.specialization.is_empty() {
                    self.specialization = Some(search.specialization.clone());
                }
                info!("Found {} doctors near {}", search.doctors.len(), search.location);
                let search = self.doctor_search.insert(search);
                Ok(&*search)
            }
            Err(e) => {
                self.doctor_search = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, KeyValueStore};
    use crate::types::{Doctor, Medicine};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Backend double answering from a script
    #[derive(Default)]
    struct ScriptedBackend {
        answers: Mutex<Vec<TriageResult<ChatResponse>>>,
        doctor_queries: Mutex<Vec<(String, String)>>,
        fail_doctors: bool,
    }

    impl ScriptedBackend {
        fn answering(answers: Vec<TriageResult<ChatResponse>>) -> Self {
            let mut answers = answers;
            answers.reverse();
            Self {
                answers: Mutex::new(answers),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl TriageBackend for ScriptedBackend {
        async fn send_message(&self, _query: &str) -> TriageResult<ChatResponse> {
            self.answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TriageError::RequestError("script exhausted".into())))
        }

        async fn find_doctors(&self, query: &str, location: &str) -> TriageResult<DoctorSearch> {
            self.doctor_queries
                .lock()
                .unwrap()
                .push((query.to_string(), location.to_string()));
            if self.fail_doctors {
                return Err(TriageError::HttpError {
                    status_code: 502,
                    message: "upstream".into(),
                });
            }
            Ok(DoctorSearch {
                doctors: vec![Doctor {
                    name: "City Heart Clinic".into(),
                    specialization: "cardiologist".into(),
                    latitude: 22.57,
                    longitude: 88.36,
                    address: None,
                    phone: None,
                }],
                specialization: "cardiologist".into(),
                location: String::new(),
            })
        }
    }

    fn answer(scores: &[f64]) -> ChatResponse {
        ChatResponse {
            answer: "Paracetamol relieves pain and fever.".into(),
            sources: scores
                .iter()
                .map(|s| Source::new("excerpt").with_document("WHO.pdf", Some(1)).with_score(*s))
                .collect(),
            medicines: vec![Medicine {
                name: "Paracetamol".into(),
                usage: "Pain relief".into(),
                source: Some("WHO.pdf".into()),
            }],
            specialist_type: None,
        }
    }

    fn session(store: &Arc<InMemoryStore>, profile: SessionProfile) -> TriageSession {
        let estimator = ConfidenceEstimator::seeded(profile.default_strategy(), 7);
        TriageSession::with_estimator(store.clone(), profile, estimator).unwrap()
    }

    #[tokio::test]
    async fn test_forensic_answer_flow() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Forensic);
        let backend = ScriptedBackend::answering(vec![Ok(answer(&[0.9, 0.6, 0.3]))]);

        let outcome = session.submit(&backend, "What is paracetamol?").await.unwrap();
        let ExchangeOutcome::Answered { message, thread_id, .. } = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(message.confidence, Some(60));
        assert_eq!(message.risk, Some(RiskLevel::Medium));
        assert_eq!(session.current_confidence(), 60);
        assert_eq!(session.current_risk(), Some(RiskLevel::Medium));
        assert_eq!(session.active_sources().len(), 3);

        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.metrics().questions_asked(), 1);
        assert_eq!(session.metrics().sources_retrieved(), 3);
        assert_eq!(session.metrics().avg_confidence(), 60);

        let thread = session.history().load(&thread_id).unwrap();
        assert_eq!(thread.title, "What is paracetamol?");
        assert_eq!(thread.messages, session.messages());
        assert!(store.contains_key("forensicHistory"));
        assert!(!store.contains_key("chatHistory"));
    }

    #[tokio::test]
    async fn test_failed_send_penalizes_and_appends_error_turn() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Chat);
        let backend = ScriptedBackend::answering(vec![Err(TriageError::RequestError(
            "connection refused".into(),
        ))]);
        assert_eq!(session.metrics().success_rate(), 100);

        let outcome = session.submit(&backend, "What is paracetamol?").await.unwrap();
        let ExchangeOutcome::Failed { message, error } = outcome else {
            panic!("expected a failure");
        };
        assert!(error.contains("connection refused"));
        assert!(!message.is_user);
        assert_eq!(message.confidence, Some(0));
        assert_eq!(message.content, SessionProfile::Chat.failure_message());

        assert_eq!(session.metrics().success_rate(), 90);
        assert_eq!(session.metrics().questions_asked(), 0);
        assert_eq!(session.messages().len(), 2);
        // Failed exchanges are not saved
        assert!(session.threads().is_empty());
        assert!(!store.contains_key("chatHistory"));
    }

    #[tokio::test]
    async fn test_failed_turns_saved_with_next_answer() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Chat);
        let backend = ScriptedBackend::answering(vec![
            Err(TriageError::RequestError("connection refused".into())),
            Ok(answer(&[0.8])),
        ]);

        session.submit(&backend, "first").await.unwrap();
        assert!(session.threads().is_empty());
        session.submit(&backend, "second").await.unwrap();

        let thread = session.history().load(session.current_thread().unwrap()).unwrap();
        assert_eq!(thread.title, "second");
        assert_eq!(thread.messages, session.messages());
        assert_eq!(thread.messages.len(), 4);
        assert_eq!(thread.messages[1].content, SessionProfile::Chat.failure_message());
    }

    #[tokio::test]
    async fn test_failure_inside_thread_saved_with_next_answer() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Forensic);
        let backend = ScriptedBackend::answering(vec![
            Ok(answer(&[0.9])),
            Err(TriageError::RequestError("timeout".into())),
            Ok(answer(&[0.7])),
        ]);

        session.submit(&backend, "one").await.unwrap();
        session.submit(&backend, "two").await.unwrap();
        let id = session.current_thread().unwrap().to_string();
        assert_eq!(session.history().load(&id).unwrap().messages.len(), 2);

        session.submit(&backend, "three").await.unwrap();
        let thread = session.history().load(&id).unwrap();
        assert_eq!(thread.messages.len(), 6);
        assert_eq!(thread.messages, session.messages());
        assert_eq!(session.threads().len(), 1);
    }

    #[tokio::test]
    async fn test_last_specialist_type_follows_latest_answer() {
        let hinted = || {
            let mut response = answer(&[0.9]);
            response.specialist_type = Some("cardiologist".into());
            response
        };

        // Size of the history after one exchange
        let sizing = Arc::new(InMemoryStore::new());
        let backend = ScriptedBackend::answering(vec![Ok(hinted())]);
        session(&sizing, SessionProfile::Chat)
            .submit(&backend, "heart pain")
            .await
            .unwrap();
        let one_thread = "chatHistory".len() + sizing.get("chatHistory").unwrap().unwrap().len();

        // Room for the first exchange only; the second save is refused
        let store = Arc::new(InMemoryStore::with_quota(one_thread + 50));
        let mut session = session(&store, SessionProfile::Chat);
        let backend = ScriptedBackend::answering(vec![Ok(hinted()), Ok(answer(&[0.9]))]);

        session.submit(&backend, "heart pain").await.unwrap();
        assert_eq!(session.last_specialist_type(), Some("cardiologist"));

        let result = session.submit(&backend, "and the dosage?").await;
        assert!(matches!(result, Err(TriageError::History(_))));
        assert_eq!(session.last_specialist_type(), None);
        assert_eq!(session.specialization(), Some("cardiologist"));
        assert_eq!(session.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_follow_up_continues_thread() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Chat);
        let backend = ScriptedBackend::answering(vec![Ok(answer(&[0.8])), Ok(answer(&[]))]);

        session.submit(&backend, "first").await.unwrap();
        let first_thread = session.current_thread().unwrap().to_string();
        session.submit(&backend, "second").await.unwrap();

        assert_eq!(session.threads().len(), 1);
        let thread = session.history().load(&first_thread).unwrap();
        assert_eq!(thread.messages.len(), 4);
        assert_eq!(thread.title, "first");
        // Second answer had no sources
        assert_eq!(session.metrics().success_rate(), 95);
        assert_eq!(session.metrics().questions_asked(), 2);
    }

    #[tokio::test]
    async fn test_stale_response_is_dropped() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Forensic);

        let first = session.begin("first question").unwrap();
        let second = session.begin("second question").unwrap();

        // The second reply lands before the first
        let outcome = session.complete(second, Ok(answer(&[0.9]))).unwrap();
        assert!(matches!(outcome, ExchangeOutcome::Answered { .. }));
        let outcome = session.complete(first, Ok(answer(&[0.1]))).unwrap();
        assert_eq!(outcome, ExchangeOutcome::Stale);

        assert_eq!(session.metrics().questions_asked(), 1);
        assert_eq!(session.current_confidence(), 90);
        let thread = &session.threads()[0];
        assert_eq!(thread.title, "second question");
    }

    #[tokio::test]
    async fn test_switching_threads_invalidates_pending() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Chat);
        let pending = session.begin("slow question").unwrap();
        session.new_chat();

        let outcome = session
            .complete(pending, Err(TriageError::RequestError("timeout".into())))
            .unwrap();
        assert_eq!(outcome, ExchangeOutcome::Stale);
        assert_eq!(session.metrics().success_rate(), 100);
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_load_delete_and_clear() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Chat);
        let backend =
            ScriptedBackend::answering(vec![Ok(answer(&[0.7])), Ok(answer(&[0.7]))]);

        session.submit(&backend, "one").await.unwrap();
        let one = session.current_thread().unwrap().to_string();
        session.new_chat();
        session.submit(&backend, "two").await.unwrap();
        let two = session.current_thread().unwrap().to_string();
        assert_ne!(one, two);

        let loaded = session.load_chat(&one).unwrap();
        assert_eq!(loaded.title, "one");
        assert_eq!(session.current_thread(), Some(one.as_str()));
        assert_eq!(session.messages().len(), 2);

        assert!(session.delete_chat(&one).unwrap());
        assert_eq!(session.current_thread(), None);
        assert!(session.messages().is_empty());
        assert!(session.load_chat(&one).is_err());

        session.clear_history().unwrap();
        assert!(session.threads().is_empty());
        assert!(session.history().load(&two).is_none());
        assert!(!store.contains_key("chatHistory"));
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Chat);
        assert!(matches!(session.begin("   "), Err(TriageError::InvalidInput(_))));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_specialist_hint_and_doctor_search() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Forensic);
        let mut response = answer(&[0.85]);
        response.specialist_type = Some("cardiologist".into());
        let backend = ScriptedBackend::answering(vec![Ok(response)]);

        let outcome = session.submit(&backend, "heart pain").await.unwrap();
        assert!(matches!(
            outcome,
            ExchangeOutcome::Answered { specialist_type: Some(ref s), .. } if s == "cardiologist"
        ));
        assert_eq!(session.specialization(), Some("cardiologist"));

        assert!(session.locate_specialists(&backend, "  ").await.is_err());
        let search = session.locate_specialists(&backend, "Kolkata").await.unwrap();
        assert_eq!(search.location, "Kolkata");
        assert_eq!(search.doctors.len(), 1);

        let queries = backend.doctor_queries.lock().unwrap();
        assert_eq!(queries[0], ("heart pain".to_string(), "Kolkata".to_string()));
    }

    #[tokio::test]
    async fn test_doctor_search_failure_clears_results() {
        let store = Arc::new(InMemoryStore::new());
        let mut session = session(&store, SessionProfile::Forensic);
        let backend = ScriptedBackend {
            fail_doctors: true,
            ..Default::default()
        };

        assert!(session.locate_specialists(&backend, "Mumbai").await.is_err());
        assert!(session.doctor_search().is_none());
        let queries = backend.doctor_queries.lock().unwrap();
        assert_eq!(queries[0].0, "general");
    }
}
