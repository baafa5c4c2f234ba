//! Shared fakes for the client tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use canvas_admin_core::{
    ApiClient, ApiRequest, HttpTransport, KeyValueStore, Navigator, RawResponse, SessionState,
    StorageError, TransportError,
};
use parking_lot::Mutex;
use serde_json::Value;

/// Replays scripted responses and records every request it was given.
#[derive(Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: Value) -> &Self {
        self.responses.lock().push_back(Ok(RawResponse::json(status, &body)));
        self
    }

    pub fn respond_raw(&self, status: u16, body: &str) -> &Self {
        self.responses.lock().push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("at least one request was sent")
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(200, "null")))
    }
}

/// Counts navigations and remembers the last route.
#[derive(Default)]
pub struct CountingNavigator {
    routes: Mutex<Vec<String>>,
}

impl CountingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }
}

impl Navigator for CountingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}

/// Holds a token that can be read but never written or removed.
pub struct ReadOnlyStore {
    token: String,
}

impl ReadOnlyStore {
    pub fn new(token: &str) -> Self {
        Self { token: token.to_string() }
    }

    fn denied(&self) -> StorageError {
        StorageError::Io {
            path: "state.json".into(),
            message: "permission denied".to_string(),
        }
    }
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(Some(self.token.clone()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(self.denied())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(self.denied())
    }
}

pub struct Harness {
    pub client: Arc<ApiClient<RecordingTransport>>,
    pub navigator: Arc<CountingNavigator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_session(SessionState::in_memory())
    }

    pub fn logged_in(token: &str) -> Self {
        let session = SessionState::in_memory();
        session.set_token(token).expect("memory store never fails");
        Self::with_session(session)
    }

    pub fn with_session(session: SessionState) -> Self {
        let navigator = Arc::new(CountingNavigator::default());
        let client = Arc::new(ApiClient::new(
            RecordingTransport::new(),
            session,
            navigator.clone(),
        ));
        Self { client, navigator }
    }

    pub fn transport(&self) -> &RecordingTransport {
        self.client.transport()
    }

    pub fn token(&self) -> Option<String> {
        self.client.session().token().expect("memory store never fails")
    }
}
