//! Call Orchestrator - Loading and Error Tracking Around One Call
//!
//! `execute` never propagates a failure: the error is captured in the
//! call state and the caller gets `None`.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::{ApiClient, ApiError};
use crate::transport::HttpTransport;
use crate::types::{
    AuthResponse, CreateTemplateParams, LoginParams, Template, TemplateParams, TemplateTag,
    TemplatesParams, UpdateTemplateParams,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CallState<E> {
    pub loading: bool,
    pub error: Option<E>,
}

impl<E> Default for CallState<E> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
        }
    }
}

/// Tracks one call at a time.
///
/// A call started while another is in flight is refused: its operation is
/// not run, the in-flight state is left alone and `None` is returned.
pub struct CallOrchestrator<E = ApiError> {
    state: Mutex<CallState<E>>,
}

impl<E> CallOrchestrator<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CallState::default()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub async fn execute<T, F, Fut>(&self, op: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        {
            let mut state = self.state.lock();
            if state.loading {
                tracing::warn!("call refused: another call is still in flight");
                return None;
            }
            state.loading = true;
            state.error = None;
        }

        let in_flight = InFlight { state: &self.state };

        let result = op().await;

        let value = match result {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(%error, "call failed");
                self.state.lock().error = Some(error);
                None
            }
        };
        drop(in_flight);
        value
    }
}

/// Clears `loading` when the call ends, including when its future is
/// dropped before completion or the operation panics.
struct InFlight<'a, E> {
    state: &'a Mutex<CallState<E>>,
}

impl<E> Drop for InFlight<'_, E> {
    fn drop(&mut self) {
        self.state.lock().loading = false;
    }
}

impl<E: Clone> CallOrchestrator<E> {
    pub fn error(&self) -> Option<E> {
        self.state.lock().error.clone()
    }

    pub fn snapshot(&self) -> CallState<E> {
        self.state.lock().clone()
    }
}

impl<E> Default for CallOrchestrator<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Client operations wrapped in one orchestrator, for one form or view.
pub struct TrackedApi<T: HttpTransport> {
    client: Arc<ApiClient<T>>,
    calls: CallOrchestrator<ApiError>,
}

impl<T: HttpTransport> TrackedApi<T> {
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        Self {
            client,
            calls: CallOrchestrator::new(),
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn loading(&self) -> bool {
        self.calls.is_loading()
    }

    pub fn error(&self) -> Option<ApiError> {
        self.calls.error()
    }

    pub async fn login(&self, params: &LoginParams) -> Option<AuthResponse> {
        self.calls.execute(|| self.client.login(params)).await
    }

    pub async fn get_templates(&self, params: &TemplatesParams) -> Option<Vec<Template>> {
        self.calls.execute(|| self.client.get_templates(params)).await
    }

    pub async fn get_template(&self, params: TemplateParams) -> Option<Template> {
        self.calls.execute(|| self.client.get_template(params)).await
    }

    pub async fn get_template_tags(&self) -> Option<Vec<TemplateTag>> {
        self.calls.execute(|| self.client.get_template_tags()).await
    }

    pub async fn create_template(&self, params: &CreateTemplateParams) -> Option<Template> {
        self.calls.execute(|| self.client.create_template(params)).await
    }

    pub async fn update_template(&self, params: &UpdateTemplateParams) -> Option<Template> {
        self.calls.execute(|| self.client.update_template(params)).await
    }

    pub async fn delete_template(&self, params: TemplateParams) -> Option<serde_json::Value> {
        self.calls.execute(|| self.client.delete_template(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_state_is_idle() {
        let calls: CallOrchestrator<String> = CallOrchestrator::new();
        assert_eq!(calls.snapshot(), CallState { loading: false, error: None });
    }

    #[tokio::test]
    async fn test_new_call_clears_previous_error() {
        let calls: CallOrchestrator<String> = CallOrchestrator::new();
        let failed = calls.execute(|| async { Err::<(), _>("first".to_string()) }).await;
        assert!(failed.is_none());
        assert_eq!(calls.error().as_deref(), Some("first"));

        let value = calls
            .execute(|| async {
                assert!(calls.error().is_none(), "error is reset when the call starts");
                Ok::<_, String>(5)
            })
            .await;
        assert_eq!(value, Some(5));
        assert!(calls.error().is_none());
    }
}
