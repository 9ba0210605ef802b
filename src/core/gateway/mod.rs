//! Requests against the chat-completions endpoint and their normalization.

pub mod error;
pub mod request;
pub mod response;

use std::error::Error;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

pub use error::GatewayError;
pub use response::{ResponseConventions, TurnReply};

use crate::api::{ChatRequest, ChatResponse};
use crate::core::connectivity::Connectivity;
use crate::core::image::PendingImage;
use crate::core::session_store::TitleGenerator;
use crate::core::status::{ConnectionState, HealthReport, HealthStatus};
use crate::core::style::StyleProfile;
use crate::utils::auth::add_request_headers;
use crate::utils::url::{construct_api_url, normalize_base_url, CHAT_COMPLETIONS_ENDPOINT};

pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-beta";
pub const DEFAULT_VISION_MODEL: &str = "grok-vision-beta";

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    /// Initially selected text model.
    pub model: String,
    /// Model every image turn is sent to.
    pub vision_model: String,
    /// Model used for credential probes.
    pub probe_model: String,
    pub conventions: ResponseConventions,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            probe_model: DEFAULT_MODEL.to_string(),
            conventions: ResponseConventions::default(),
        }
    }
}

struct Selection {
    credential: Option<String>,
    model: String,
}

/// Client for the remote model endpoint.
///
/// Holds only the selected model and the credential between calls; every
/// call is independent and none is retried.
pub struct ModelGateway {
    client: reqwest::Client,
    base_url: String,
    vision_model: String,
    probe_model: String,
    conventions: ResponseConventions,
    selection: RwLock<Selection>,
    connectivity: Arc<dyn Connectivity>,
}

impl ModelGateway {
    pub fn new(
        client: reqwest::Client,
        settings: GatewaySettings,
        credential: Option<String>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            client,
            base_url: normalize_base_url(&settings.base_url),
            vision_model: settings.vision_model,
            probe_model: settings.probe_model,
            conventions: settings.conventions,
            selection: RwLock::new(Selection {
                credential: non_blank(credential),
                model: settings.model,
            }),
            connectivity,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    pub fn conventions(&self) -> &ResponseConventions {
        &self.conventions
    }

    /// Currently selected text model.
    pub fn model(&self) -> String {
        self.read_selection(|selection| selection.model.clone())
    }

    pub fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        let mut selection = self.selection.write().unwrap_or_else(PoisonError::into_inner);
        if selection.model != model {
            debug!(from = %selection.model, to = %model, "Model selection changed");
            selection.model = model;
        }
    }

    pub fn has_credential(&self) -> bool {
        self.read_selection(|selection| selection.credential.is_some())
    }

    /// Replace the credential; blank values clear it.
    pub fn set_credential(&self, credential: Option<String>) {
        let mut selection = self.selection.write().unwrap_or_else(PoisonError::into_inner);
        selection.credential = non_blank(credential);
    }

    /// Send one user turn and wait for the complete reply.
    pub async fn send_turn(
        &self,
        text: &str,
        image: Option<&PendingImage>,
        style: StyleProfile,
    ) -> Result<TurnReply, GatewayError> {
        let (credential, model) = self.read_selection(|selection| {
            (selection.credential.clone(), selection.model.clone())
        });
        let credential = credential.ok_or(GatewayError::Unauthenticated)?;

        let request = request::turn_request(text, image, style, &model, &self.vision_model);
        let model_used = request.model.clone();
        debug!(
            model = %model_used,
            style = style.id(),
            vision = image.is_some(),
            "Sending turn"
        );

        let started = Instant::now();
        let body = self.complete(&credential, &request).await?;
        response::into_reply(body, &self.conventions, model_used, started.elapsed())
    }

    /// Probe whether `candidate` is accepted: `Ok(true)` on success, `Ok(false)` on 401.
    pub async fn validate_credential(&self, candidate: &str) -> Result<bool, GatewayError> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Ok(false);
        }

        let response = self
            .post(candidate, &request::credential_probe(&self.probe_model))
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::UNAUTHORIZED {
            Ok(false)
        } else {
            Err(status_error(response).await)
        }
    }

    /// Cheap probe against the selected model. Never sends without a credential.
    pub async fn check_health(&self) -> HealthReport {
        let (credential, model) = self.read_selection(|selection| {
            (selection.credential.clone(), selection.model.clone())
        });
        let Some(credential) = credential else {
            return HealthReport::not_configured(model);
        };

        let started = Instant::now();
        match self.post(&credential, &request::health_ping(&model)).await {
            Ok(response) => {
                let latency = started.elapsed();
                let status = response.status();
                let health = if status.is_success() {
                    HealthStatus::Ok
                } else if status == StatusCode::UNAUTHORIZED {
                    HealthStatus::InvalidCredential
                } else {
                    HealthStatus::Degraded
                };
                HealthReport {
                    status: health,
                    latency: Some(latency),
                    connection: ConnectionState::Online,
                    model,
                }
            }
            Err(err) => HealthReport {
                status: HealthStatus::Unreachable,
                latency: None,
                connection: if err == GatewayError::NetworkUnavailable {
                    ConnectionState::Offline
                } else {
                    ConnectionState::Online
                },
                model,
            },
        }
    }

    /// Ask the selected model for a short conversation title.
    pub async fn complete_title(&self, seed: &str) -> Result<String, GatewayError> {
        let (credential, model) = self.read_selection(|selection| {
            (selection.credential.clone(), selection.model.clone())
        });
        let credential = credential.ok_or(GatewayError::Unauthenticated)?;

        let body = self
            .complete(&credential, &request::title_request(seed, &model))
            .await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::MalformedResponse("no title returned".to_string()))
    }

    fn read_selection<T>(&self, read: impl FnOnce(&Selection) -> T) -> T {
        let selection = self.selection.read().unwrap_or_else(PoisonError::into_inner);
        read(&selection)
    }

    async fn complete(
        &self,
        credential: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, GatewayError> {
        let response = self.post(credential, request).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        response
            .json::<ChatResponse>()
            .await
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))
    }

    async fn post(
        &self,
        credential: &str,
        request: &ChatRequest,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = construct_api_url(&self.base_url, CHAT_COMPLETIONS_ENDPOINT);
        let http_request = add_request_headers(self.client.post(url), credential);
        match http_request.json(request).send().await {
            Ok(response) => Ok(response),
            Err(err) => Err(self.transport_error(&err).await),
        }
    }

    async fn transport_error(&self, err: &reqwest::Error) -> GatewayError {
        if self.connectivity.is_online().await {
            warn!(error = %err, "API server unreachable");
            GatewayError::ServerUnreachable
        } else {
            warn!(error = %err, "Network unavailable");
            GatewayError::NetworkUnavailable
        }
    }
}

#[async_trait]
impl TitleGenerator for ModelGateway {
    async fn generate_title(&self, seed: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(self.complete_title(seed).await?)
    }
}

async fn status_error(response: reqwest::Response) -> GatewayError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return GatewayError::InvalidCredential;
    }
    let body = response.text().await.unwrap_or_default();
    let message = error::extract_error_summary(&body);
    debug!(status = status.as_u16(), message = ?message, "API request failed");
    GatewayError::RequestFailed {
        status: status.as_u16(),
        message,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
