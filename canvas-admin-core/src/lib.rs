//! Canvas Admin Core - API Client and Form Validation
//!
//! # Pieces
//! 1. Rules are pure predicates
//! 2. The validator owns the error map for one form
//! 3. The client injects credentials and classifies failures
//! 4. A 401 clears the session, then still fails the call
//! 5. The orchestrator turns failures into captured state

pub mod rules;
pub mod validation;
pub mod types;
pub mod multipart;
pub mod session;
pub mod transport;
pub mod client;
pub mod orchestrator;
pub mod config;
pub mod fingerprint;

pub use rules::{Email, FieldInput, FnRule, MinLength, Required, RequiredTags, Rule, RuleResult};
pub use validation::{ErrorMap, FieldSpec, FormSpec, FormValidator};
pub use types::{
    AuthResponse, AuthUser, CreateTemplateParams, LoginParams, PreviewImage, Template, TemplateFilter,
    TemplateId, TemplateParams, TemplateTag, TemplatesParams, UpdateTemplateParams,
};
pub use multipart::{MultipartBody, Part, PartValue};
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionState, StorageError, TOKEN_KEY};
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, RequestBody, ReqwestTransport, TransportError};
pub use client::{ApiClient, ApiError, Navigator, ResponseClass};
pub use orchestrator::{CallOrchestrator, CallState, TrackedApi};
pub use config::{ClientConfig, ConfigError};

pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_BASE_URL: &str = "https://dev-api.aiscreen.io/api/v1";
pub const LOGIN_ROUTE: &str = "/login";
