// src/conversation.rs

//! The conversation controller: one session, one append-only message log,
//! and a small state machine that decides which operations are allowed.

use crate::{
    api::{GeminiService, ModelService},
    chat_message::{ChatMessage, Role},
    config::Config,
    constants::{
        GREETING, INIT_FAILURE_PREFIX, MISSING_API_KEY, SEND_FAILURE_BANNER, SEND_FAILURE_PREFIX,
    },
    context::{ContextLoader, ContextSource, SystemInstruction},
    errors::{ConsejeroError, ConsejeroResult},
};
use reqwest::Client;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Initializing,
    Ready,
    Sending,
    /// Initialization failed; nothing can be sent until a fresh start.
    Failed,
}

/// Events that move the controller between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BeginInit,
    InitSucceeded,
    InitFailed,
    BeginSend,
    SendFinished,
}

impl ControllerState {
    /// Pure transition function. `None` means the event is not valid in
    /// this state.
    pub fn next(self, transition: Transition) -> Option<ControllerState> {
        use ControllerState::*;
        use Transition::*;

        match (self, transition) {
            (Uninitialized, BeginInit) => Some(Initializing),
            (Initializing, InitSucceeded) => Some(Ready),
            (Initializing, InitFailed) => Some(Failed),
            (Ready, BeginSend) => Some(Sending),
            (Sending, SendFinished) => Some(Ready),
            _ => None,
        }
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self, ControllerState::Ready)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ControllerState::Initializing | ControllerState::Sending)
    }
}

/// What `send_message` did with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank text, wrong state or no session: nothing changed.
    Ignored,
    Replied,
    /// The service failed; a system entry was appended and the session
    /// stays usable.
    Failed,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationView {
    pub messages: Vec<ChatMessage>,
    pub state: ControllerState,
    pub error: Option<String>,
}

impl ConversationView {
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn input_enabled(&self) -> bool {
        self.state.accepts_input()
    }

    /// Suggestions are offered only before the first exchange.
    pub fn shows_suggestions(&self) -> bool {
        self.state == ControllerState::Ready
            && self.messages.len() == 1
            && self.messages[0].role == Role::Model
    }
}

pub struct Conversation<S: ModelService> {
    loader: ContextLoader,
    service: S,
    api_key: Option<String>,
    state: ControllerState,
    session: Option<S::Session>,
    messages: Vec<ChatMessage>,
    error: Option<String>,
    observer: Option<watch::Sender<ConversationView>>,
}

impl Conversation<GeminiService> {
    /// Wires the document loader and the Gemini client from `config`.
    pub fn from_config(config: &Config) -> Self {
        let client = Client::new();
        let loader = ContextLoader::new(client.clone(), ContextSource::parse(&config.context_source))
            .with_institution(config.institution.clone());
        let service = GeminiService::from_config(client, config);
        Conversation::new(loader, service, config.api_key.clone())
    }
}

impl<S: ModelService> Conversation<S> {
    pub fn new(loader: ContextLoader, service: S, api_key: Option<String>) -> Self {
        Self {
            loader,
            service,
            api_key,
            state: ControllerState::Uninitialized,
            session: None,
            messages: Vec::new(),
            error: None,
            observer: None,
        }
    }

    /// Returns a receiver that sees a fresh snapshot after every change.
    pub fn subscribe(&mut self) -> watch::Receiver<ConversationView> {
        match &self.observer {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = watch::channel(self.view());
                self.observer = Some(tx);
                rx
            }
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn view(&self) -> ConversationView {
        ConversationView {
            messages: self.messages.clone(),
            state: self.state,
            error: self.error.clone(),
        }
    }

    pub fn dismiss_error(&mut self) {
        if self.error.take().is_some() {
            self.notify();
        }
    }

    /// Loads the context, opens the session and seeds the greeting. Any
    /// failure ends in `Failed` with a single system entry in the log.
    /// Only the first call does anything.
    pub async fn initialize(&mut self) {
        if !self.advance(Transition::BeginInit) {
            log::warn!("initialize() called in state {:?}; ignoring", self.state);
            return;
        }
        self.error = None;
        self.notify();

        let opened = match self.loader.load().await {
            Ok(instruction) => self.create_session(&instruction),
            Err(e) => Err(e),
        };

        match opened {
            Ok(session) => {
                self.session = Some(session);
                self.messages = vec![ChatMessage::model(GREETING)];
                self.advance(Transition::InitSucceeded);
                log::info!("Conversation ready");
            }
            Err(e) => {
                log::error!("Failed to initialize conversation: {}", e);
                self.error = Some(e.to_string());
                self.messages = vec![ChatMessage::system(format!("{} {}", INIT_FAILURE_PREFIX, e))];
                self.advance(Transition::InitFailed);
            }
        }
        self.notify();
    }

    /// The document is loaded before this runs, so a load failure is
    /// reported even when the key is missing too.
    fn create_session(&self, instruction: &SystemInstruction) -> ConsejeroResult<S::Session> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConsejeroError::config_error(MISSING_API_KEY))?;

        self.service.create(api_key, instruction)
    }

    /// Relays one user message. Blank text, a controller that is not
    /// `Ready`, or a missing session leave everything untouched.
    pub async fn send_message(&mut self, text: &str) -> SendOutcome {
        if text.trim().is_empty() || !self.state.accepts_input() || self.session.is_none() {
            return SendOutcome::Ignored;
        }

        self.messages.push(ChatMessage::user(text));
        self.advance(Transition::BeginSend);
        self.error = None;
        self.notify();

        let result = match self.session.as_mut() {
            Some(session) => self.service.send(session, text).await,
            None => Err(ConsejeroError::send_error("no active session")),
        };

        let outcome = match result {
            Ok(reply) => {
                self.messages.push(ChatMessage::model(reply.unwrap_or_default()));
                SendOutcome::Replied
            }
            Err(e) => {
                log::error!("Failed to get a reply from the model: {}", e);
                self.error = Some(SEND_FAILURE_BANNER.to_string());
                self.messages
                    .push(ChatMessage::system(format!("{} {}", SEND_FAILURE_PREFIX, e)));
                SendOutcome::Failed
            }
        };

        self.advance(Transition::SendFinished);
        self.notify();
        outcome
    }

    fn advance(&mut self, transition: Transition) -> bool {
        match self.state.next(transition) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }

    fn notify(&self) {
        if let Some(tx) = &self.observer {
            tx.send_replace(self.view());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LOAD_FAILURE;
    use async_trait::async_trait;
    use std::{
        collections::VecDeque,
        fs,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };
    use tempfile::{tempdir, TempDir};
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    /// Scripted stand-in for the hosted model.
    #[derive(Default, Clone)]
    struct FakeModel {
        created: Arc<AtomicUsize>,
        sent: Arc<Mutex<Vec<String>>>,
        replies: Arc<Mutex<VecDeque<Result<Option<String>, String>>>>,
    }

    impl FakeModel {
        fn replying(replies: Vec<Result<Option<String>, String>>) -> Self {
            let fake = FakeModel::default();
            *fake.replies.lock().unwrap() = replies.into();
            fake
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelService for FakeModel {
        type Session = String;

        fn create(&self, _api_key: &str, instruction: &SystemInstruction) -> ConsejeroResult<String> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(instruction.to_string())
        }

        async fn send(&self, _session: &mut String, text: &str) -> ConsejeroResult<Option<String>> {
            self.sent.lock().unwrap().push(text.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(e)) => Err(ConsejeroError::send_error(e)),
                None => Ok(Some("ok".to_string())),
            }
        }
    }

    fn document() -> (TempDir, ContextLoader) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("informacion-universidad.json");
        fs::write(&path, r#"{"carrera": "Sistemas Computacionales"}"#).unwrap();
        let loader = ContextLoader::new(Client::new(), ContextSource::File(path));
        (dir, loader)
    }

    async fn ready(fake: &FakeModel) -> (TempDir, Conversation<FakeModel>) {
        let (dir, loader) = document();
        let mut conversation = Conversation::new(loader, fake.clone(), Some("key".to_string()));
        conversation.initialize().await;
        assert_eq!(conversation.state(), ControllerState::Ready);
        (dir, conversation)
    }

    #[test]
    fn test_transition_table() {
        use ControllerState::*;
        use Transition::*;

        assert_eq!(Uninitialized.next(BeginInit), Some(Initializing));
        assert_eq!(Initializing.next(InitSucceeded), Some(Ready));
        assert_eq!(Initializing.next(InitFailed), Some(Failed));
        assert_eq!(Ready.next(BeginSend), Some(Sending));
        assert_eq!(Sending.next(SendFinished), Some(Ready));

        assert_eq!(Initializing.next(BeginSend), None);
        assert_eq!(Sending.next(BeginSend), None);
        assert_eq!(Failed.next(BeginSend), None);
        assert_eq!(Failed.next(BeginInit), None);
        assert_eq!(Ready.next(BeginInit), None);
    }

    #[test]
    fn test_only_ready_accepts_input() {
        use ControllerState::*;
        for state in [Uninitialized, Initializing, Sending, Failed] {
            assert!(!state.accepts_input(), "{:?}", state);
        }
        assert!(Ready.accepts_input());
        assert!(Initializing.is_busy() && Sending.is_busy());
        assert!(!Ready.is_busy());
    }

    #[tokio::test]
    async fn test_initialize_seeds_single_greeting() {
        let fake = FakeModel::default();
        let (_dir, conversation) = ready(&fake).await;

        assert_eq!(conversation.messages(), &[ChatMessage::model(GREETING)]);
        assert!(conversation.has_session());
        assert!(conversation.error().is_none());
        assert_eq!(fake.created.load(Ordering::SeqCst), 1);
        assert!(conversation.view().shows_suggestions());
    }

    #[tokio::test]
    async fn test_instruction_reaches_session() {
        let fake = FakeModel::default();
        let (_dir, conversation) = ready(&fake).await;
        let session = conversation.session.as_ref().unwrap();
        assert!(session.contains("\"carrera\": \"Sistemas Computacionales\""));
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let fake = FakeModel::default();
        let (_dir, mut conversation) = ready(&fake).await;

        assert_eq!(conversation.send_message("").await, SendOutcome::Ignored);
        assert_eq!(conversation.send_message("   ").await, SendOutcome::Ignored);
        assert_eq!(conversation.messages().len(), 1);
        assert!(fake.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_before_initialize_is_ignored() {
        let fake = FakeModel::default();
        let (_dir, loader) = document();
        let mut conversation = Conversation::new(loader, fake.clone(), Some("key".to_string()));

        assert_eq!(conversation.send_message("Hola").await, SendOutcome::Ignored);
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.state(), ControllerState::Uninitialized);
        assert!(fake.sent().is_empty());
    }

    #[tokio::test]
    async fn test_successful_send_appends_user_then_model() {
        let fake = FakeModel::replying(vec![Ok(Some("¡Bienvenido!".to_string()))]);
        let (_dir, mut conversation) = ready(&fake).await;

        assert_eq!(conversation.send_message("Hola").await, SendOutcome::Replied);
        assert_eq!(
            conversation.messages(),
            &[
                ChatMessage::model(GREETING),
                ChatMessage::user("Hola"),
                ChatMessage::model("¡Bienvenido!"),
            ]
        );
        assert_eq!(fake.sent(), vec!["Hola".to_string()]);
        assert_eq!(conversation.state(), ControllerState::Ready);
        assert!(!conversation.view().shows_suggestions());
    }

    #[tokio::test]
    async fn test_missing_reply_text_becomes_empty_message() {
        let fake = FakeModel::replying(vec![Ok(None)]);
        let (_dir, mut conversation) = ready(&fake).await;

        conversation.send_message("Hola").await;
        assert_eq!(conversation.messages()[2], ChatMessage::model(""));
    }

    #[tokio::test]
    async fn test_send_failure_is_recoverable() {
        let fake = FakeModel::replying(vec![
            Err("quota exceeded".to_string()),
            Ok(Some("segunda".to_string())),
        ]);
        let (_dir, mut conversation) = ready(&fake).await;

        assert_eq!(conversation.send_message("Hola").await, SendOutcome::Failed);
        assert_eq!(conversation.messages().len(), 3);
        assert_eq!(conversation.messages()[1], ChatMessage::user("Hola"));
        let notice = &conversation.messages()[2];
        assert_eq!(notice.role, Role::System);
        assert_eq!(notice.text, format!("{} quota exceeded", SEND_FAILURE_PREFIX));
        assert_eq!(conversation.error(), Some(SEND_FAILURE_BANNER));
        assert_eq!(conversation.state(), ControllerState::Ready);
        assert!(conversation.has_session());

        // The retry is accepted and clears the banner.
        assert_eq!(conversation.send_message("Hola").await, SendOutcome::Replied);
        assert_eq!(conversation.messages().len(), 5);
        assert!(conversation.error().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_initialization() {
        let fake = FakeModel::default();
        let (_dir, loader) = document();
        let mut conversation = Conversation::new(loader, fake.clone(), None);
        conversation.initialize().await;

        assert_eq!(conversation.state(), ControllerState::Failed);
        assert_eq!(
            conversation.messages(),
            &[ChatMessage::system(format!("{} {}", INIT_FAILURE_PREFIX, MISSING_API_KEY))]
        );
        assert_eq!(conversation.error(), Some(MISSING_API_KEY));
        assert!(!conversation.has_session());
        assert_eq!(fake.created.load(Ordering::SeqCst), 0);

        assert_eq!(conversation.send_message("Hola").await, SendOutcome::Ignored);
        assert_eq!(conversation.messages().len(), 1);
        assert!(fake.sent().is_empty());
    }

    #[tokio::test]
    async fn test_blank_api_key_counts_as_missing() {
        let fake = FakeModel::default();
        let (_dir, loader) = document();
        let mut conversation = Conversation::new(loader, fake, Some("  ".to_string()));
        conversation.initialize().await;
        assert_eq!(conversation.state(), ControllerState::Failed);
    }

    #[tokio::test]
    async fn test_load_failure_fails_initialization() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let fake = FakeModel::default();
        let loader = ContextLoader::new(Client::new(), ContextSource::Url(mock_server.uri()));
        // Without a key too: the load failure is reported first.
        let mut conversation = Conversation::new(loader, fake.clone(), None);
        conversation.initialize().await;

        assert_eq!(conversation.state(), ControllerState::Failed);
        assert_eq!(conversation.messages().len(), 1);
        let entry = &conversation.messages()[0];
        assert_eq!(entry.role, Role::System);
        assert_eq!(entry.text, format!("{} {}", INIT_FAILURE_PREFIX, LOAD_FAILURE));
        assert!(!entry.text.contains(MISSING_API_KEY));
        assert_eq!(fake.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let fake = FakeModel::default();
        let (_dir, mut conversation) = ready(&fake).await;
        conversation.send_message("Hola").await;

        conversation.initialize().await;
        assert_eq!(conversation.messages().len(), 3);
        assert_eq!(fake.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_each_change() {
        let fake = FakeModel::replying(vec![Err("boom".to_string())]);
        let (_dir, loader) = document();
        let mut conversation = Conversation::new(loader, fake, Some("key".to_string()));
        let rx = conversation.subscribe();
        assert_eq!(rx.borrow().state, ControllerState::Uninitialized);

        conversation.initialize().await;
        assert_eq!(rx.borrow().messages, vec![ChatMessage::model(GREETING)]);
        assert!(rx.borrow().input_enabled());

        conversation.send_message("Hola").await;
        let view = rx.borrow().clone();
        assert_eq!(view.messages.len(), 3);
        assert_eq!(view.error.as_deref(), Some(SEND_FAILURE_BANNER));

        conversation.dismiss_error();
        assert!(rx.borrow().error.is_none());
    }
}
