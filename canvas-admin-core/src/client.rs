//! API Client - Authenticated and Public Channels
//!
//! The public channel is used for login only. Every other operation goes
//! through the authenticated channel, which attaches the bearer token and
//! sorts each response into a [`ResponseClass`]. An authentication failure
//! is handled by [`ApiClient::invalidate_session`] before the error is
//! returned to the caller.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::fingerprint::token_fingerprint;
use crate::multipart::MultipartBody;
use crate::session::{SessionState, StorageError};
use crate::transport::{ApiRequest, HttpTransport, RawResponse, TransportError, AUTHORIZATION, REQUEST_ID};
use crate::types::{
    AuthResponse, CreateTemplateParams, LoginParams, Template, TemplateParams, TemplateTag,
    TemplatesParams, UpdateTemplateParams,
};
use crate::LOGIN_ROUTE;

pub const UNAUTHORIZED: u16 = 401;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Session expired or not authorized")]
    Unauthorized { payload: Option<Value> },

    #[error("Request failed with status {status}")]
    Rejected { status: u16, payload: Option<Value> },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Session storage error: {0}")]
    Session(#[from] StorageError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(UNAUTHORIZED),
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server error body, when one was sent.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ApiError::Unauthorized { payload } | ApiError::Rejected { payload, .. } => {
                payload.as_ref()
            }
            _ => None,
        }
    }

    /// The server's `message` field if present, else the error's own text.
    pub fn message(&self) -> String {
        self.payload()
            .and_then(|payload| payload.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

/// Outcome of an authenticated exchange that produced a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseClass {
    Success(Vec<u8>),
    AuthFailure { payload: Option<Value> },
    AppFailure { status: u16, payload: Option<Value> },
}

impl ResponseClass {
    pub fn classify(response: RawResponse) -> Self {
        if response.is_success() {
            return ResponseClass::Success(response.body);
        }
        let payload = error_payload(&response.body);
        if response.status == UNAUTHORIZED {
            ResponseClass::AuthFailure { payload }
        } else {
            ResponseClass::AppFailure {
                status: response.status,
                payload,
            }
        }
    }
}

/// Where the application is sent when the session ends.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

pub struct ApiClient<T: HttpTransport> {
    transport: T,
    session: SessionState,
    navigator: Arc<dyn Navigator>,
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(transport: T, session: SessionState, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            transport,
            session,
            navigator,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // --- Public channel ---

    pub async fn login(&self, params: &LoginParams) -> Result<AuthResponse, ApiError> {
        let body = serde_json::to_value(params).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.public_request(ApiRequest::post("/login").json(body)).await
    }

    /// No credential, no session side effects; failures carry the
    /// server payload.
    pub async fn public_request<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let response = self.dispatch(request).await?;
        if response.is_success() {
            decode_body(&response.body)
        } else {
            Err(ApiError::Rejected {
                status: response.status,
                payload: error_payload(&response.body),
            })
        }
    }

    // --- Authenticated channel ---

    pub async fn get_templates(&self, params: &TemplatesParams) -> Result<Vec<Template>, ApiError> {
        self.authenticated_request(ApiRequest::get("/canvas_templates").queries(params.to_query()))
            .await
    }

    pub async fn get_template(&self, params: TemplateParams) -> Result<Template, ApiError> {
        self.authenticated_request(ApiRequest::get(format!("/canvas_templates/{}", params.id)))
            .await
    }

    pub async fn get_template_tags(&self) -> Result<Vec<TemplateTag>, ApiError> {
        self.authenticated_request(ApiRequest::get("/canvas_templates/tags/list"))
            .await
    }

    pub async fn create_template(&self, params: &CreateTemplateParams) -> Result<Template, ApiError> {
        let request = ApiRequest::post("/canvas_templates").multipart(MultipartBody::from(params));
        self.authenticated_request(request).await
    }

    /// POST with `_method=PATCH`; the backend treats it as a partial update.
    pub async fn update_template(&self, params: &UpdateTemplateParams) -> Result<Template, ApiError> {
        let request = ApiRequest::post(format!("/canvas_templates/{}", params.id))
            .query("_method", "PATCH")
            .multipart(MultipartBody::from(&params.fields));
        self.authenticated_request(request).await
    }

    pub async fn delete_template(&self, params: TemplateParams) -> Result<Value, ApiError> {
        let request = ApiRequest::delete("/canvas_templates").query("id", params.id.to_string());
        self.authenticated_request(request).await
    }

    /// Send with the bearer token (if any) and decode a success body.
    ///
    /// On 401 the session is invalidated first, then `Unauthorized` is
    /// still returned.
    pub async fn authenticated_request<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<R, ApiError> {
        match self.authenticated_exchange(request).await? {
            ResponseClass::Success(body) => decode_body(&body),
            ResponseClass::AuthFailure { payload } => {
                self.invalidate_session();
                Err(ApiError::Unauthorized { payload })
            }
            ResponseClass::AppFailure { status, payload } => Err(ApiError::Rejected { status, payload }),
        }
    }

    /// Send with the bearer token attached and classify the response.
    /// Has no session side effects of its own.
    pub async fn authenticated_exchange(&self, request: ApiRequest) -> Result<ResponseClass, ApiError> {
        let request = match self.session.token()? {
            Some(token) => {
                tracing::trace!(token = %token_fingerprint(&token), "attaching bearer token");
                request.header(AUTHORIZATION, format!("Bearer {token}"))
            }
            None => request,
        };
        let response = self.dispatch(request).await?;
        Ok(ResponseClass::classify(response))
    }

    /// Clear the stored token, then send the application to login.
    ///
    /// Navigation happens even when the store cannot be cleared; that
    /// failure is only logged.
    pub fn invalidate_session(&self) {
        tracing::warn!("authentication rejected; clearing session");
        if let Err(error) = self.session.clear() {
            tracing::warn!(%error, "failed to clear stored token");
        }
        self.navigator.navigate(LOGIN_ROUTE);
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "api_request",
            %request_id,
            method = request.method.as_str(),
            path = %request.path,
        );
        let request = request.header(REQUEST_ID, request_id.to_string());
        async move {
            let result = self.transport.send(request).await;
            match &result {
                Ok(response) => tracing::debug!(status = response.status, "response received"),
                Err(error) => tracing::debug!(%error, "no response"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

fn decode_body<R: DeserializeOwned>(body: &[u8]) -> Result<R, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) { b"null".as_slice() } else { body };
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn error_payload(body: &[u8]) -> Option<Value> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(|payload| !payload.is_null())
}
