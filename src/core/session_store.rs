//! Session lifecycle: creation, switching, titling, deletion and persistence.

use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::core::message::Message;
use crate::core::persistence::{PersistError, SessionPersistence};
use crate::core::session::{clean_generated_title, fallback_title, Session, SessionId};
use crate::core::single_flight::SingleFlight;

/// Produces a short title for a conversation from its first user turn.
#[async_trait]
pub trait TitleGenerator: Send + Sync {
    async fn generate_title(&self, seed: &str) -> Result<String, Box<dyn Error + Send + Sync>>;
}

#[derive(Debug)]
pub enum StoreError {
    /// The session does not exist (it may have been deleted meanwhile).
    NotFound(SessionId),
    /// The mutation was applied in memory but could not be written out.
    Persist(PersistError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Session {id} not found"),
            StoreError::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::NotFound(_) => None,
            StoreError::Persist(err) => Some(err),
        }
    }
}

impl From<PersistError> for StoreError {
    fn from(err: PersistError) -> Self {
        StoreError::Persist(err)
    }
}

pub fn welcome_message(credential_configured: bool) -> String {
    let mut text = String::from(
        "# Welcome to Causerie 👋\n\n\
I'm your AI assistant. Alongside each answer you can see:\n\n\
* 💡 the reasoning behind it, when the model shares it\n\
* 📊 a confidence score\n\
* 📚 the sources it cites\n\
* 🖼️ image understanding (attach a picture with /image)\n\n\
Ask anything, or attach an image to get started.",
    );
    if !credential_configured {
        text.push_str(
            "\n\n⚠️ Configure your API key first (run `causerie auth` or use /key) to start chatting.",
        );
    }
    text
}

/// Owns every session, the active-session pointer and their persisted form.
pub struct SessionStore {
    sessions: Vec<Session>,
    active: Option<SessionId>,
    persistence: Box<dyn SessionPersistence>,
    title_flight: SingleFlight,
    credential_configured: bool,
    last_issued_millis: i64,
}

impl SessionStore {
    /// Load the stored collection. Nothing is active until [`Self::restore`]
    /// or [`Self::create_session`] runs.
    pub fn open(persistence: Box<dyn SessionPersistence>) -> Self {
        let sessions = persistence.load();
        let last_issued_millis = sessions
            .iter()
            .filter_map(|session| session.id.millis())
            .max()
            .unwrap_or(0);
        debug!(count = sessions.len(), "loaded session history");

        Self {
            sessions,
            active: None,
            persistence,
            title_flight: SingleFlight::new(),
            credential_configured: false,
            last_issued_millis,
        }
    }

    /// Controls whether welcome messages nag about a missing API key.
    pub fn set_credential_configured(&mut self, configured: bool) {
        self.credential_configured = configured;
    }

    /// Flag held while a title request is outstanding, shared by every session.
    pub fn title_flight(&self) -> &SingleFlight {
        &self.title_flight
    }

    /// Activate the most recent session, creating one when history is empty.
    pub fn restore(&mut self) -> Result<&Session, StoreError> {
        match self.sessions.first().map(|session| session.id.clone()) {
            Some(id) => {
                self.active = Some(id);
                Ok(&self.sessions[0])
            }
            None => self.create_session(),
        }
    }

    pub fn create_session(&mut self) -> Result<&Session, StoreError> {
        let id = self.next_id();
        let mut session = Session::new(id.clone(), Utc::now());
        session.push(Message::assistant(welcome_message(
            self.credential_configured,
        )));

        self.sessions.insert(0, session);
        self.active = Some(id);
        debug!(id = %self.sessions[0].id, "created session");
        self.persist()?;
        Ok(&self.sessions[0])
    }

    /// Sessions in creation order, newest first.
    pub fn list_sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.position(id).map(|index| &self.sessions[index])
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref().and_then(|id| self.session(id))
    }

    /// Make `id` active and return its messages. Unknown ids change nothing.
    pub fn load_session(&mut self, id: &SessionId) -> Option<&[Message]> {
        let index = self.position(id)?;
        self.active = Some(self.sessions[index].id.clone());
        Some(&self.sessions[index].messages)
    }

    /// Append `message` to a session and persist.
    ///
    /// The first user message of a session also derives its title.
    pub async fn append_message(
        &mut self,
        id: &SessionId,
        message: Message,
        titler: &dyn TitleGenerator,
    ) -> Result<&Session, StoreError> {
        self.append_all(id, vec![message], titler).await
    }

    /// Append a user turn and its reply together, with a single save.
    ///
    /// Both messages are in memory before anything is written, so a failed
    /// save never leaves a user turn without its reply.
    pub async fn append_turn(
        &mut self,
        id: &SessionId,
        user: Message,
        reply: Message,
        titler: &dyn TitleGenerator,
    ) -> Result<&Session, StoreError> {
        self.append_all(id, vec![user, reply], titler).await
    }

    async fn append_all(
        &mut self,
        id: &SessionId,
        messages: Vec<Message>,
        titler: &dyn TitleGenerator,
    ) -> Result<&Session, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let session = &mut self.sessions[index];
        let mut title_seed = None;
        for message in messages {
            if message.is_user() && title_seed.is_none() && session.user_message_count() == 0 {
                title_seed = Some(message.text_without_image().to_string());
            }
            session.push(message);
        }

        if let Some(seed) = title_seed {
            self.apply_derived_title(id, &seed, titler).await;
        }

        self.persist()?;
        self.session(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Rename a session. Blank titles and unknown ids are ignored.
    pub fn rename_session(&mut self, id: &SessionId, new_title: &str) -> Result<bool, StoreError> {
        let title = new_title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        self.sessions[index].title = title.to_string();
        self.persist()?;
        Ok(true)
    }

    /// Remove a session. Deleting the active one activates the newest
    /// remaining session, or a fresh one when nothing is left.
    pub fn delete_session(&mut self, id: &SessionId) -> Result<(), StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(());
        };
        self.sessions.remove(index);
        debug!(%id, "deleted session");

        if self.active.as_ref() == Some(id) {
            match self.sessions.first() {
                Some(head) => self.active = Some(head.id.clone()),
                None => {
                    self.active = None;
                    self.create_session()?;
                    return Ok(());
                }
            }
        }

        self.persist()
    }

    /// Derive and store a title for `id` from `seed`, then persist.
    ///
    /// Never fails: any problem falls back to a local truncation of the seed.
    pub async fn derive_title(
        &mut self,
        id: &SessionId,
        seed: &str,
        titler: &dyn TitleGenerator,
    ) -> Option<String> {
        let title = self.apply_derived_title(id, seed, titler).await?;
        if let Err(err) = self.persist() {
            warn!(error = %err, "failed to persist derived title");
        }
        Some(title)
    }

    async fn apply_derived_title(
        &mut self,
        id: &SessionId,
        seed: &str,
        titler: &dyn TitleGenerator,
    ) -> Option<String> {
        let seed = seed.trim();
        if seed.is_empty() {
            return None;
        }

        let title = match self.title_flight.try_acquire() {
            Some(guard) => {
                let generated = titler.generate_title(seed).await;
                drop(guard);
                match generated {
                    Ok(raw) => clean_generated_title(&raw).unwrap_or_else(|| {
                        debug!("model returned an empty title, using local title");
                        fallback_title(seed)
                    }),
                    Err(err) => {
                        debug!(error = %err, "title generation failed, using local title");
                        fallback_title(seed)
                    }
                }
            }
            None => {
                debug!("title generation already in flight, using local title");
                fallback_title(seed)
            }
        };

        let index = self.position(id)?;
        self.sessions[index].title = title.clone();
        Some(title)
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.persistence
            .save(&self.sessions)
            .map_err(StoreError::Persist)
    }

    fn position(&self, id: &SessionId) -> Option<usize> {
        self.sessions.iter().position(|session| &session.id == id)
    }

    fn next_id(&mut self) -> SessionId {
        let now = Utc::now().timestamp_millis();
        let millis = now.max(self.last_issued_millis + 1);
        self.last_issued_millis = millis;
        SessionId::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persistence::MemoryStorage;
    use crate::core::session::DEFAULT_SESSION_TITLE;
    use crate::utils::test_utils::FailingStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTitler {
        calls: AtomicUsize,
        reply: Result<String, String>,
    }

    impl CountingTitler {
        fn answering(title: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Ok(title.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Err("gateway down".to_string()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TitleGenerator for CountingTitler {
        async fn generate_title(
            &self,
            _seed: &str,
        ) -> Result<String, Box<dyn Error + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|err| err.into())
        }
    }

    fn open_store(storage: &MemoryStorage) -> SessionStore {
        SessionStore::open(Box::new(storage.clone()))
    }

    #[test]
    fn create_session_inserts_at_front_and_welcomes() {
        let storage = MemoryStorage::new();
        let mut store = open_store(&storage);

        let first = store.create_session().expect("create").id.clone();
        let second = store.create_session().expect("create").id.clone();

        let ids: Vec<_> = store.list_sessions().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![second.clone(), first]);
        assert_eq!(store.active_id(), Some(&second));

        let session = store.active_session().expect("active");
        assert_eq!(session.messages.len(), 1);
        assert!(session.messages[0].is_assistant());
        assert_eq!(session.title, DEFAULT_SESSION_TITLE);
        assert!(storage.document().is_some(), "create persists immediately");
    }

    #[test]
    fn welcome_mentions_missing_credential() {
        let mut store = open_store(&MemoryStorage::new());
        let without_key = store.create_session().expect("create").messages[0]
            .content
            .clone();
        assert!(without_key.contains("API key"));

        store.set_credential_configured(true);
        let with_key = store.create_session().expect("create").messages[0]
            .content
            .clone();
        assert!(!with_key.contains("API key"));
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut store = open_store(&MemoryStorage::new());
        for _ in 0..5 {
            store.create_session().expect("create");
        }
        let mut ids: Vec<_> = store.list_sessions().iter().map(|s| s.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn appends_keep_call_order() {
        let titler = CountingTitler::answering("Greetings");
        let mut store = open_store(&MemoryStorage::new());
        let id = store.create_session().expect("create").id.clone();

        let contents = ["one", "two", "three", "four"];
        for (index, content) in contents.iter().enumerate() {
            let message = if index % 2 == 0 {
                Message::user(*content)
            } else {
                Message::assistant(*content)
            };
            store
                .append_message(&id, message, &titler)
                .await
                .expect("append");
        }

        let session = store.session(&id).expect("session");
        let appended: Vec<_> = session.messages[1..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(session.messages.len(), 1 + contents.len());
        assert_eq!(appended, contents);
        assert_eq!(session.preview, "four");
    }

    #[tokio::test]
    async fn turn_is_appended_with_one_title_request() {
        let titler = CountingTitler::answering("Greetings");
        let mut store = open_store(&MemoryStorage::new());
        let id = store.create_session().expect("create").id.clone();

        let session = store
            .append_turn(&id, Message::user("hello"), Message::assistant("hi there"), &titler)
            .await
            .expect("append turn");

        assert_eq!(session.messages.len(), 3);
        assert!(session.messages[1].is_user());
        assert!(session.messages[2].is_assistant());
        assert_eq!(session.title, "Greetings");
        assert_eq!(session.preview, "hi there");
        assert_eq!(titler.calls(), 1);
    }

    #[tokio::test]
    async fn failed_save_still_holds_both_halves_of_a_turn() {
        let titler = CountingTitler::answering("Greetings");
        let storage = MemoryStorage::new();
        let mut store = SessionStore::open(Box::new(FailingStorage::after(1, storage.clone())));
        let id = store.create_session().expect("create").id.clone();

        let err = store
            .append_turn(&id, Message::user("hello"), Message::assistant("hi there"), &titler)
            .await
            .expect_err("save fails");

        assert!(matches!(err, StoreError::Persist(_)));
        let session = store.session(&id).expect("session");
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[2].content, "hi there");
        let document = storage.document().expect("first save");
        assert!(!document.contains("hi there"));
    }

    #[tokio::test]
    async fn append_to_missing_session_is_not_found() {
        let titler = CountingTitler::answering("unused");
        let mut store = open_store(&MemoryStorage::new());
        let id = store.create_session().expect("create").id.clone();
        store.delete_session(&id).expect("delete");

        let err = store
            .append_message(&id, Message::user("hello"), &titler)
            .await
            .expect_err("missing session");
        assert!(matches!(err, StoreError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn title_is_derived_once_from_first_user_message() {
        let titler = CountingTitler::answering("  \"Rust questions\" ");
        let mut store = open_store(&MemoryStorage::new());
        let id = store.create_session().expect("create").id.clone();

        store
            .append_message(&id, Message::assistant("extra greeting"), &titler)
            .await
            .expect("append");
        assert_eq!(titler.calls(), 0);

        store
            .append_message(&id, Message::user("How do I borrow?"), &titler)
            .await
            .expect("append");
        store
            .append_message(&id, Message::assistant("Use &."), &titler)
            .await
            .expect("append");
        store
            .append_message(&id, Message::user("And mutably?"), &titler)
            .await
            .expect("append");

        assert_eq!(titler.calls(), 1);
        assert_eq!(store.session(&id).expect("session").title, "Rust questions");
    }

    #[tokio::test]
    async fn title_falls_back_to_truncated_seed_on_failure() {
        let titler = CountingTitler::failing();
        let mut store = open_store(&MemoryStorage::new());
        let id = store.create_session().expect("create").id.clone();

        store
            .append_message(&id, Message::user("Explain the borrow checker"), &titler)
            .await
            .expect("append never fails because of titling");

        assert_eq!(titler.calls(), 1);
        assert_eq!(
            store.session(&id).expect("session").title,
            "Explain the borrow c..."
        );
    }

    #[tokio::test]
    async fn title_requests_are_single_flight_across_sessions() {
        let titler = CountingTitler::answering("Generated");
        let mut store = open_store(&MemoryStorage::new());
        let id = store.create_session().expect("create").id.clone();

        let held = store.title_flight().clone();
        let guard = held.try_acquire().expect("hold the flight");
        store
            .append_message(&id, Message::user("Busy title"), &titler)
            .await
            .expect("append");
        drop(guard);

        assert_eq!(titler.calls(), 0);
        assert_eq!(store.session(&id).expect("session").title, "Busy title");
        assert!(!store.title_flight().is_busy());
    }

    #[tokio::test]
    async fn image_data_never_reaches_the_title_seed() {
        let titler = CountingTitler::failing();
        let mut store = open_store(&MemoryStorage::new());
        let id = store.create_session().expect("create").id.clone();

        let content = "Cat?\n\n![Uploaded Image](data:image/png;base64,AAAAAAAAAAAAAAAAAAAA)";
        store
            .append_message(&id, Message::user(content), &titler)
            .await
            .expect("append");
        assert_eq!(store.session(&id).expect("session").title, "Cat?");
    }

    #[test]
    fn load_session_switches_active_without_mutating() {
        let mut store = open_store(&MemoryStorage::new());
        let older = store.create_session().expect("create").id.clone();
        let newer = store.create_session().expect("create").id.clone();
        assert_eq!(store.active_id(), Some(&newer));

        let messages = store.load_session(&older).expect("known session").to_vec();
        assert_eq!(messages.len(), 1);
        assert_eq!(store.active_id(), Some(&older));
        assert_eq!(store.session(&older).expect("session").messages, messages);

        assert!(store.load_session(&SessionId::new("missing")).is_none());
        assert_eq!(store.active_id(), Some(&older));
    }

    #[test]
    fn rename_ignores_blank_titles() {
        let mut store = open_store(&MemoryStorage::new());
        let id = store.create_session().expect("create").id.clone();

        assert!(!store.rename_session(&id, "   ").expect("rename"));
        assert_eq!(store.session(&id).expect("session").title, DEFAULT_SESSION_TITLE);

        assert!(store.rename_session(&id, "  Trip plans ").expect("rename"));
        assert_eq!(store.session(&id).expect("session").title, "Trip plans");

        assert!(!store
            .rename_session(&SessionId::new("missing"), "x")
            .expect("rename"));
    }

    #[test]
    fn deleting_active_session_activates_newest_remaining() {
        let mut store = open_store(&MemoryStorage::new());
        let oldest = store.create_session().expect("create").id.clone();
        let middle = store.create_session().expect("create").id.clone();
        let newest = store.create_session().expect("create").id.clone();

        store.load_session(&middle);
        store.delete_session(&middle).expect("delete");
        assert_eq!(store.active_id(), Some(&newest));

        store.delete_session(&newest).expect("delete");
        assert_eq!(store.active_id(), Some(&oldest));
        assert_eq!(store.list_sessions().len(), 1);
    }

    #[test]
    fn deleting_inactive_session_keeps_active() {
        let mut store = open_store(&MemoryStorage::new());
        let older = store.create_session().expect("create").id.clone();
        let newer = store.create_session().expect("create").id.clone();

        store.delete_session(&older).expect("delete");
        assert_eq!(store.active_id(), Some(&newer));
        assert_eq!(store.list_sessions().len(), 1);
    }

    #[test]
    fn deleting_last_session_creates_a_fresh_welcomed_one() {
        let mut store = open_store(&MemoryStorage::new());
        let only = store.create_session().expect("create").id.clone();

        store.delete_session(&only).expect("delete");

        assert_eq!(store.list_sessions().len(), 1);
        let fresh = store.active_session().expect("active");
        assert_ne!(fresh.id, only);
        assert_eq!(fresh.messages.len(), 1);
        assert!(fresh.messages[0].is_assistant());
    }

    #[tokio::test]
    async fn reopening_restores_identical_sessions() {
        let storage = MemoryStorage::new();
        let titler = CountingTitler::answering("Saved");
        let mut store = open_store(&storage);
        let id = store.create_session().expect("create").id.clone();
        store.create_session().expect("create");
        store
            .append_message(&id, Message::user("persist me"), &titler)
            .await
            .expect("append");

        let mut reopened = open_store(&storage);
        assert_eq!(reopened.list_sessions(), store.list_sessions());
        assert!(reopened.active_id().is_none());

        let head = reopened.restore().expect("restore").id.clone();
        assert_eq!(Some(&head), store.list_sessions().first().map(|s| &s.id));

        let next = reopened.create_session().expect("create").id.clone();
        assert!(next.millis() > head.millis());
    }

    #[test]
    fn restore_creates_session_when_history_is_empty() {
        let mut store = open_store(&MemoryStorage::with_document("not json at all"));
        assert!(store.list_sessions().is_empty());
        store.restore().expect("restore");
        assert_eq!(store.list_sessions().len(), 1);
        assert!(store.active_session().is_some());
    }
}
