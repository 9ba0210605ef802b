use std::path::Path;

use tracing::{debug, warn};

use super::{App, AppError, NoticeLevel};
use crate::core::gateway::{GatewayError, TurnReply};
use crate::core::image::PendingImage;
use crate::core::message::{compose_user_content, Message};
use crate::core::session::SessionId;
use crate::core::session_store::StoreError;
use crate::core::status::{ConnectionState, HealthReport};

/// A completed turn: the reply and the session it was appended to.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub reply: TurnReply,
}

impl App {
    /// Send `text` (and the pending image, if any) to the model.
    ///
    /// On success the user turn and the reply are appended to the active
    /// session and the pending image is cleared. A failed save of the
    /// history is reported as a notice and does not fail the turn. On any
    /// other failure nothing is appended and the image stays attached.
    pub async fn submit_turn(&mut self, text: &str) -> Result<TurnOutcome, AppError> {
        let Some(_guard) = self.send_flight.try_acquire() else {
            return Err(AppError::SendInProgress);
        };
        if text.trim().is_empty() && self.pending_image.is_none() {
            return Err(AppError::EmptyTurn);
        }

        let session_id = match self.store.active_id() {
            Some(id) => id.clone(),
            None => self.store.restore()?.id.clone(),
        };

        let reply = match self
            .gateway
            .send_turn(text, self.pending_image.as_ref(), self.style)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                self.record_gateway_failure(&err);
                return Err(err.into());
            }
        };

        let user_message = Message::user(compose_user_content(text, self.pending_image.as_ref()));
        let assistant_message = Message::assistant(reply.content.clone()).with_metadata(reply.metadata());
        self.log_transcript(&user_message);
        self.log_transcript(&assistant_message);

        let appended = self
            .store
            .append_turn(&session_id, user_message, assistant_message, self.gateway.as_ref())
            .await
            .map(|_| ());
        match appended {
            Ok(()) => {}
            // The turn is recorded in memory; only the save failed.
            Err(StoreError::Persist(err)) => {
                warn!(error = %err, "Failed to save session history");
                self.notify(NoticeLevel::Warning, format!("History not saved: {err}"));
            }
            Err(err) => return Err(err.into()),
        }
        self.pending_image = None;

        if reply.model_used != self.gateway.model() {
            debug!(model = %reply.model_used, "Selected model follows the vision override");
            self.gateway.set_model(reply.model_used.clone());
            self.status.set_model(&reply.model_used);
        }
        self.status.record_latency(&reply.model_used, reply.latency);

        Ok(TurnOutcome { session_id, reply })
    }

    /// Read an image file and hold it for the next turn, replacing any other.
    pub fn attach_image(&mut self, path: &Path) -> Result<&PendingImage, AppError> {
        let image = PendingImage::from_path(path)?;
        Ok(self.attach_image_data(image))
    }

    pub fn attach_image_data(&mut self, image: PendingImage) -> &PendingImage {
        self.pending_image.insert(image)
    }

    /// Drop the pending image. Returns whether one was attached.
    pub fn remove_image(&mut self) -> bool {
        self.pending_image.take().is_some()
    }

    /// Probe the API now and publish the outcome on the status feed.
    pub async fn check_health(&mut self) -> HealthReport {
        let report = self.gateway.check_health().await;
        self.status.record_health(&report);
        report
    }

    fn record_gateway_failure(&mut self, err: &GatewayError) {
        match err {
            GatewayError::NetworkUnavailable => {
                self.status.record_connection(ConnectionState::Offline)
            }
            GatewayError::ServerUnreachable
            | GatewayError::InvalidCredential
            | GatewayError::RequestFailed { .. }
            | GatewayError::MalformedResponse(_) => {
                self.status.record_connection(ConnectionState::Online)
            }
            GatewayError::Unauthenticated => {}
        }
        self.notify(NoticeLevel::Error, err.to_string());
    }

    fn log_transcript(&mut self, message: &Message) {
        if let Err(err) = self.transcript.log_message(message) {
            warn!(error = %err, "Failed to write transcript");
            self.notify(NoticeLevel::Warning, format!("Log error: {err}"));
        }
    }
}
