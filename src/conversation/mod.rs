use crate::api::{AgentReply, QueryBackend, SourceFileRef};
use crate::core::error::ObchatError;
use crate::settings::ChatSettings;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Submissions longer than this are rejected before dispatch.
pub const MAX_MESSAGE_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Typing,
    Error,
}

/// One entry in the conversation log. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub body: String,
    pub timestamp: DateTime<Local>,
    pub sender: Sender,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<SourceFileRef>,
}

/// Message content before the store assigns an id and timestamp.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub body: String,
    pub sender: Sender,
    pub kind: MessageKind,
    pub metadata: HashMap<String, Value>,
    pub files: Vec<SourceFileRef>,
}

impl MessageDraft {
    pub fn text(sender: Sender, body: impl Into<String>) -> Self {
        MessageDraft {
            body: body.into(),
            sender,
            kind: MessageKind::Text,
            metadata: HashMap::new(),
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        UserProfile {
            id: id.into(),
            name: None,
            email: None,
        }
    }
}

/// Check a submission before it reaches the store. Validation failures never
/// enter the conversation as error state.
pub fn validate_submission(text: &str) -> Result<&str, ObchatError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ObchatError::Input("Message is empty".to_string()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ObchatError::Input(format!(
            "Message exceeds {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }
    Ok(trimmed)
}

/// Single source of truth for the conversation: the ordered message log,
/// transient flags, the user record and the active settings.
///
/// All mutation goes through methods here; the dispatch guard lives in
/// [`ConversationStore::send_message`] rather than in the UI, so the
/// one-outstanding-request invariant holds for programmatic callers too.
pub struct ConversationStore {
    messages: Vec<Message>,
    loading: bool,
    typing: bool,
    error: Option<String>,
    user: Option<UserProfile>,
    settings: ChatSettings,
}

impl ConversationStore {
    pub fn new(settings: ChatSettings) -> Self {
        ConversationStore {
            messages: Vec::new(),
            loading: false,
            typing: false,
            error: None,
            user: None,
            settings,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// False while a request is outstanding or an undismissed error is shown.
    pub fn can_submit(&self) -> bool {
        !self.loading && self.error.is_none()
    }

    /// Assign a fresh id and timestamp and append. The log grows by exactly
    /// one element; insertion order is display order.
    pub fn add_message(&mut self, draft: MessageDraft) {
        self.messages.push(Message {
            id: Uuid::new_v4().to_string(),
            body: draft.body,
            timestamp: Local::now(),
            sender: draft.sender,
            kind: draft.kind,
            metadata: draft.metadata,
            files: draft.files,
        });
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_typing(&mut self, typing: bool) {
        self.typing = typing;
    }

    pub fn set_user(&mut self, user: UserProfile) {
        self.user = Some(user);
    }

    pub fn set_settings(&mut self, settings: ChatSettings) {
        self.settings = settings;
    }

    /// Empties the log; settings, user and error are untouched.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    /// Bulk-restore a previously saved transcript.
    pub fn restore_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Back to the initial state. The user record is persisted identity and
    /// survives; settings stay at their current (persisted) value.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.loading = false;
        self.typing = false;
        self.error = None;
    }

    /// One round trip: append the user message, call the backend, append the
    /// agent reply or record the error.
    ///
    /// No-op while a request is outstanding or an error is undismissed, so at
    /// most one call is ever in flight. All backend failures are converted
    /// into the store error field; nothing propagates to the caller.
    pub async fn send_message(&mut self, content: &str, backend: &dyn QueryBackend) {
        if self.loading || self.error.is_some() {
            debug!("send_message rejected: request outstanding or error undismissed");
            return;
        }

        self.set_error(None);
        self.set_loading(true);
        self.add_message(MessageDraft::text(Sender::User, content));
        self.set_typing(true);

        match backend.send_query(content, &self.settings).await {
            Ok(reply) => self.add_message(agent_draft(reply)),
            Err(err) => {
                debug!(error = %err, "dispatch failed");
                self.error = Some(err.to_string());
            }
        }

        self.set_loading(false);
        self.set_typing(false);
    }
}

fn agent_draft(reply: AgentReply) -> MessageDraft {
    let mut draft = MessageDraft::text(Sender::Agent, reply.analysis);
    if let Some(id) = reply.conversation_id {
        draft.metadata.insert("conversation_id".to_string(), json!(id));
    }
    if let Some(summary) = reply.search_summary {
        draft.metadata.insert("search_summary".to_string(), json!(summary));
    }
    if let Some(secs) = reply.processing_time {
        draft.metadata.insert("processing_time".to_string(), json!(secs));
    }
    if let Some(cost) = reply.cost {
        draft.metadata.insert("cost".to_string(), json!(cost));
    }
    draft.files = reply.files;
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that replays queued results and counts how often it was hit.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<AgentReply, ObchatError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<AgentReply, ObchatError>>) -> Self {
            ScriptedBackend {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn succeeding_with(analysis: &str) -> Self {
            Self::new(vec![Ok(AgentReply {
                analysis: analysis.to_string(),
                ..Default::default()
            })])
        }

        fn failing_with(err: ObchatError) -> Self {
            Self::new(vec![Err(err)])
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryBackend for ScriptedBackend {
        async fn send_query(
            &self,
            _query: &str,
            _settings: &ChatSettings,
        ) -> Result<AgentReply, ObchatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ObchatError::Unknown("script exhausted".to_string())))
        }
    }

    fn store() -> ConversationStore {
        ConversationStore::new(ChatSettings::default())
    }

    #[test]
    fn add_message_preserves_order_and_assigns_unique_ids() {
        let mut store = store();
        for i in 0..25 {
            store.add_message(MessageDraft::text(Sender::User, format!("msg {}", i)));
        }

        assert_eq!(store.messages().len(), 25);
        for (i, message) in store.messages().iter().enumerate() {
            assert_eq!(message.body, format!("msg {}", i));
        }
        let ids: HashSet<&str> = store.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test]
    async fn successful_dispatch_appends_user_then_agent_message() {
        let mut store = store();
        let backend = ScriptedBackend::succeeding_with("Welcome!");

        store.send_message("How do I start?", &backend).await;

        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.messages()[0].sender, Sender::User);
        assert_eq!(store.messages()[0].body, "How do I start?");
        assert_eq!(store.messages()[1].sender, Sender::Agent);
        assert_eq!(store.messages()[1].body, "Welcome!");
        assert_eq!(store.messages()[1].kind, MessageKind::Text);
        assert!(!store.is_loading());
        assert!(!store.is_typing());
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn agent_message_carries_reply_metadata_and_files() {
        let mut store = store();
        let backend = ScriptedBackend::new(vec![Ok(AgentReply {
            analysis: "See the starter guide.".to_string(),
            conversation_id: Some("conv-7".to_string()),
            search_summary: Some("2 wiki pages".to_string()),
            processing_time: Some(0.42),
            cost: Some(0.001),
            files: vec![SourceFileRef {
                repository: "acme/docs".to_string(),
                path: "guides/start.md".to_string(),
                content: String::new(),
                line_range: None,
                branch: Some("main".to_string()),
                commit_hash: None,
            }],
        })]);

        store.send_message("where do I begin", &backend).await;

        let agent = store.last_message().unwrap();
        assert_eq!(agent.metadata["conversation_id"], json!("conv-7"));
        assert_eq!(agent.metadata["search_summary"], json!("2 wiki pages"));
        assert_eq!(agent.metadata["processing_time"], json!(0.42));
        assert_eq!(agent.metadata["cost"], json!(0.001));
        assert_eq!(agent.files.len(), 1);
        assert_eq!(agent.files[0].repository, "acme/docs");
    }

    #[tokio::test]
    async fn network_failure_sets_error_and_appends_no_agent_message() {
        let mut store = store();
        let backend =
            ScriptedBackend::failing_with(ObchatError::Network("Connection failed".to_string()));

        store.send_message("hello?", &backend).await;

        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].sender, Sender::User);
        let error = store.error().unwrap();
        assert!(!error.is_empty());
        assert!(!store.is_loading());
        assert!(!store.is_typing());
    }

    #[tokio::test]
    async fn application_failure_surfaces_the_server_message() {
        let mut store = store();
        let backend =
            ScriptedBackend::failing_with(ObchatError::Api("index unavailable".to_string()));

        store.send_message("hello?", &backend).await;

        assert!(store.error().unwrap().contains("index unavailable"));
    }

    #[tokio::test]
    async fn submission_while_loading_is_a_no_op() {
        let mut store = store();
        let backend = ScriptedBackend::succeeding_with("hi");

        store.set_loading(true);
        store.send_message("second", &backend).await;

        assert_eq!(backend.call_count(), 0);
        assert!(store.messages().is_empty());
    }

    #[tokio::test]
    async fn submission_with_undismissed_error_is_a_no_op() {
        let mut store = store();
        let backend = ScriptedBackend::succeeding_with("hi");

        store.set_error(Some("previous failure".to_string()));
        store.send_message("retry", &backend).await;

        assert_eq!(backend.call_count(), 0);
        assert!(store.messages().is_empty());
        assert_eq!(store.error(), Some("previous failure"));
    }

    #[tokio::test]
    async fn dismissing_the_error_re_enables_submission() {
        let mut store = store();
        let failing =
            ScriptedBackend::failing_with(ObchatError::Network("no route".to_string()));
        store.send_message("first", &failing).await;
        assert!(!store.can_submit());

        store.set_error(None);
        assert!(store.can_submit());

        let succeeding = ScriptedBackend::succeeding_with("recovered");
        store.send_message("second", &succeeding).await;
        assert_eq!(succeeding.call_count(), 1);
        assert_eq!(store.last_message().unwrap().body, "recovered");
    }

    #[tokio::test]
    async fn back_to_back_submissions_each_complete_before_the_next_starts() {
        let mut store = store();
        let backend = ScriptedBackend::new(vec![
            Ok(AgentReply {
                analysis: "one".to_string(),
                ..Default::default()
            }),
            Ok(AgentReply {
                analysis: "two".to_string(),
                ..Default::default()
            }),
        ]);

        store.send_message("a", &backend).await;
        store.send_message("b", &backend).await;

        // Never interleaved: user/agent pairs stay adjacent and ordered.
        let bodies: Vec<&str> = store.messages().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["a", "one", "b", "two"]);
        assert_eq!(backend.call_count(), 2);
    }

    #[test]
    fn validate_submission_rejects_empty_and_over_length_input() {
        assert!(validate_submission("").is_err());
        assert!(validate_submission("   \n\t").is_err());
        let too_long = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(validate_submission(&too_long).is_err());

        let at_limit = "y".repeat(MAX_MESSAGE_LENGTH);
        assert_eq!(validate_submission(&at_limit).unwrap(), at_limit);
        assert_eq!(validate_submission("  hi  ").unwrap(), "hi");
    }

    #[test]
    fn clear_messages_leaves_error_and_settings_alone() {
        let mut store = store();
        store.add_message(MessageDraft::text(Sender::User, "hello"));
        store.set_error(Some("boom".to_string()));

        store.clear_messages();

        assert!(store.messages().is_empty());
        assert_eq!(store.error(), Some("boom"));
        assert_eq!(*store.settings(), ChatSettings::default());
    }

    #[test]
    fn reset_clears_flags_and_log_but_keeps_the_user() {
        let mut store = store();
        store.set_user(UserProfile::new("u-1"));
        store.add_message(MessageDraft::text(Sender::User, "hello"));
        store.set_loading(true);
        store.set_typing(true);
        store.set_error(Some("boom".to_string()));

        store.reset();

        assert!(store.messages().is_empty());
        assert!(!store.is_loading());
        assert!(!store.is_typing());
        assert!(store.error().is_none());
        assert_eq!(store.user().unwrap().id, "u-1");
    }
}
