//! The application object: one owner for sessions, the gateway, preferences
//! and per-run state. Every user action is a method returning a result.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::CredentialStore;
use crate::core::config::{Config, ConfigOrchestrator};
use crate::core::gateway::ModelGateway;
use crate::core::image::PendingImage;
use crate::core::persistence::SessionPersistence;
use crate::core::session::Session;
use crate::core::session_store::SessionStore;
use crate::core::single_flight::SingleFlight;
use crate::core::status::{StatusFeed, StatusSnapshot};
use crate::core::style::StyleProfile;
use crate::core::voice::VoiceCapture;
use crate::utils::logging::TranscriptLog;

mod conversation;
mod error;
mod notices;
mod session;
mod settings;


pub use conversation::TurnOutcome;
pub use error::AppError;
pub use notices::{Notice, NoticeLevel, NoticeQueue};
pub use settings::{Preferences, VoiceToggle};

/// Everything [`App::new`] needs; built by the CLI or by tests.
pub struct AppInit {
    pub persistence: Box<dyn SessionPersistence>,
    pub gateway: Arc<ModelGateway>,
    pub config: ConfigOrchestrator,
    pub credentials: CredentialStore,
    pub transcript: TranscriptLog,
    pub voice: Box<dyn VoiceCapture>,
    /// Style for this run only; the stored preference is left alone.
    pub style_override: Option<StyleProfile>,
}

pub struct App {
    store: SessionStore,
    gateway: Arc<ModelGateway>,
    config: ConfigOrchestrator,
    preferences: Config,
    credentials: CredentialStore,
    style: StyleProfile,
    pending_image: Option<PendingImage>,
    send_flight: SingleFlight,
    status: StatusFeed,
    notices: NoticeQueue,
    transcript: TranscriptLog,
    voice: Box<dyn VoiceCapture>,
    voice_active: bool,
}

impl App {
    /// Load preferences and session history, and activate the newest session.
    pub fn new(init: AppInit) -> Result<Self, AppError> {
        let AppInit {
            persistence,
            gateway,
            config,
            credentials,
            transcript,
            voice,
            style_override,
        } = init;

        let preferences = config.load()?;
        let style = style_override.unwrap_or_else(|| preferences.style());

        let mut store = SessionStore::open(persistence);
        store.set_credential_configured(gateway.has_credential());
        store.restore()?;

        let status = StatusFeed::new(gateway.model());

        Ok(Self {
            store,
            gateway,
            config,
            preferences,
            credentials,
            style,
            pending_image: None,
            send_flight: SingleFlight::new(),
            status,
            notices: NoticeQueue::default(),
            transcript,
            voice,
            voice_active: false,
        })
    }

    pub fn gateway(&self) -> &Arc<ModelGateway> {
        &self.gateway
    }

    pub fn sessions(&self) -> &[Session] {
        self.store.list_sessions()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.store.active_session()
    }

    /// True while a send is outstanding; input should be disabled meanwhile.
    pub fn is_sending(&self) -> bool {
        self.send_flight.is_busy()
    }

    /// Shareable handle on the send flag, for observers on other tasks.
    pub fn send_flag(&self) -> SingleFlight {
        self.send_flight.clone()
    }

    pub fn is_generating_title(&self) -> bool {
        self.store.title_flight().is_busy()
    }

    pub fn pending_image(&self) -> Option<&PendingImage> {
        self.pending_image.as_ref()
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    pub fn status_feed(&self) -> &StatusFeed {
        &self.status
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.subscribe()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut TranscriptLog {
        &mut self.transcript
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(level, text);
    }
}
