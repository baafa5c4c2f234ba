//! Canvas Admin CLI - Command-line front end for the template API
//!
//! Commands: login, logout, templates, template, tags, create, update, delete
//! Outputs JSON to stdout
//! Returns 2 on validation failure, 1 on API failure

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use canvas_admin_core::{
    ApiClient, ApiError, ClientConfig, CreateTemplateParams, Email, FileStore, FormSpec,
    FormValidator, LoginParams, MinLength, Navigator, PreviewImage, Required, RequiredTags,
    ReqwestTransport, Rule, SessionState, TemplateFilter, TemplateParams, TemplatesParams,
    TrackedApi, UpdateTemplateParams, DEFAULT_BASE_URL,
};

const PASSWORD_MIN_LENGTH: usize = 6;

#[derive(Parser)]
#[command(name = "canvas-admin-cli")]
#[command(about = "Canvas Admin CLI - manage canvas templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL
    #[arg(long, env = "CANVAS_ADMIN_API_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// File holding the session token
    #[arg(long, env = "CANVAS_ADMIN_STATE", default_value = ".canvas-admin.json")]
    state_file: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        remember_me: bool,
    },

    /// Forget the stored session token
    Logout,

    /// List templates
    Templates {
        /// Filter by name
        #[arg(long)]
        name: Option<String>,

        /// Filter by tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show one template
    Template {
        #[arg(long)]
        id: u64,
    },

    /// List template tags
    Tags,

    /// Create a template
    Create {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value_t = 0)]
        width: u32,

        #[arg(long, default_value_t = 0)]
        height: u32,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Preview image file
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Update a template; omitted fields keep their current values
    Update {
        #[arg(long)]
        id: u64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Tag (repeatable); replaces all tags when given
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Preview image file
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Delete a template
    Delete {
        #[arg(long)]
        id: u64,
    },
}

/// Tells the user to log in again.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: &str) {
        eprintln!("Session expired ({route}). Run `canvas-admin-cli login` to sign in again.");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match ClientConfig::new(&cli.base_url) {
        Ok(c) => c,
        Err(e) => return fail(&e.to_string()),
    };
    let transport = match ReqwestTransport::new(config) {
        Ok(t) => t,
        Err(e) => return fail(&format!("Failed to build HTTP client: {e}")),
    };
    let session = SessionState::new(Arc::new(FileStore::new(&cli.state_file)));
    let client = Arc::new(ApiClient::new(transport, session, Arc::new(ConsoleNavigator)));
    let api = TrackedApi::new(client);

    match cli.command {
        Commands::Login { email, password, remember_me } => {
            let mut validator = FormValidator::new();
            let min_length = MinLength(PASSWORD_MIN_LENGTH);
            {
                let form = FormSpec::new()
                    .field("email", email.as_str(), vec![&Required as &dyn Rule<str>, &Email])
                    .field("password", password.as_str(), vec![&Required as &dyn Rule<str>, &min_length]);
                if !validator.validate_form(&form) {
                    return invalid(&validator);
                }
            }

            let params = LoginParams::new(email, password, remember_me);
            match api.login(&params).await {
                Some(response) => {
                    if let Err(e) = api.client().session().store_login(&response) {
                        return fail(&e.to_string());
                    }
                    emit(&serde_json::json!({ "success": true, "user": response.user }))
                }
                None => api_failure(&api),
            }
        }

        Commands::Logout => match api.client().session().clear() {
            Ok(()) => emit(&serde_json::json!({ "success": true })),
            Err(e) => fail(&e.to_string()),
        },

        Commands::Templates { name, tags } => {
            let filter = (name.is_some() || !tags.is_empty()).then(|| TemplateFilter {
                name,
                tags: (!tags.is_empty()).then_some(tags),
            });
            let params = TemplatesParams { filter };
            match api.get_templates(&params).await {
                Some(templates) => emit(&templates),
                None => api_failure(&api),
            }
        }

        Commands::Template { id } => match api.get_template(TemplateParams { id }).await {
            Some(template) => emit(&template),
            None => api_failure(&api),
        },

        Commands::Tags => match api.get_template_tags().await {
            Some(tags) => emit(&tags),
            None => api_failure(&api),
        },

        Commands::Create { name, width, height, tags, preview } => {
            let mut validator = FormValidator::new();
            {
                let form = FormSpec::new()
                    .field("name", name.as_str(), vec![&Required as &dyn Rule<str>])
                    .field("width", &width, vec![&Required as &dyn Rule<u32>])
                    .field("height", &height, vec![&Required as &dyn Rule<u32>])
                    .field("tags", &tags, vec![&RequiredTags as &dyn Rule<Vec<String>>]);
                if !validator.validate_form(&form) {
                    return invalid(&validator);
                }
            }

            let mut params = CreateTemplateParams::new(name, width, height).with_tags(tags);
            if let Some(path) = preview {
                match read_preview(&path) {
                    Ok(image) => params = params.with_preview(image),
                    Err(e) => return fail(&e),
                }
            }
            match api.create_template(&params).await {
                Some(template) => emit(&template),
                None => api_failure(&api),
            }
        }

        Commands::Update { id, name, width, height, tags, preview } => {
            let validator = validate_update(name.as_deref(), width, height);
            if !validator.is_valid() {
                return invalid(&validator);
            }

            let Some(current) = api.get_template(TemplateParams { id }).await else {
                return api_failure(&api);
            };
            let mut fields = CreateTemplateParams::from(&current);
            if let Some(name) = name {
                fields.name = name;
            }
            if let Some(width) = width {
                fields.width = width;
            }
            if let Some(height) = height {
                fields.height = height;
            }
            if !tags.is_empty() {
                fields.tags = tags;
            }
            if let Some(path) = preview {
                match read_preview(&path) {
                    Ok(image) => fields.preview_image = Some(image),
                    Err(e) => return fail(&e),
                }
            }

            match api.update_template(&UpdateTemplateParams { id, fields }).await {
                Some(template) => emit(&template),
                None => api_failure(&api),
            }
        }

        Commands::Delete { id } => match api.delete_template(TemplateParams { id }).await {
            Some(response) => emit(&serde_json::json!({ "success": true, "response": response })),
            None => api_failure(&api),
        },
    }
}

/// Checks only the fields the user gave; each given field must hold a value.
/// Tags need no check: an empty list means they were not given.
fn validate_update(
    name: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
) -> FormValidator {
    let mut validator = FormValidator::new();
    let mut form = FormSpec::new();
    if let Some(name) = name {
        form = form.field("name", name, vec![&Required as &dyn Rule<str>]);
    }
    if let Some(width) = width.as_ref() {
        form = form.field("width", width, vec![&Required as &dyn Rule<u32>]);
    }
    if let Some(height) = height.as_ref() {
        form = form.field("height", height, vec![&Required as &dyn Rule<u32>]);
    }
    validator.validate_form(&form);
    validator
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = if json { builder.json().try_init() } else { builder.try_init() };
    if let Err(e) = result {
        eprintln!("tracing init failed: {e}");
    }
}

fn read_preview(path: &Path) -> Result<PreviewImage, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read preview {}: {e}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "preview".to_string());
    Ok(PreviewImage::from_file_name(file_name, bytes))
}

fn emit<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&format!("Failed to encode output: {e}")),
    }
}

fn invalid(validator: &FormValidator) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "errors": validator.errors(),
    });
    println!("{output}");
    ExitCode::from(2)  // Validation failure
}

fn api_failure(api: &TrackedApi<ReqwestTransport>) -> ExitCode {
    match api.error() {
        Some(error) => report(&error),
        None => fail("Call did not complete"),
    }
}

fn report(error: &ApiError) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": error.message(),
        "status": error.status(),
        "payload": error.payload(),
    });
    println!("{output}");
    ExitCode::FAILURE
}

fn fail(message: &str) -> ExitCode {
    println!("{}", serde_json::json!({ "success": false, "error": message }));
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_with_nothing_given_is_valid() {
        assert!(validate_update(None, None, None).is_valid());
    }

    #[test]
    fn test_update_rejects_given_but_empty_name() {
        let validator = validate_update(Some(""), None, None);
        assert!(!validator.is_valid());
        assert_eq!(validator.error("name"), Some("Please fill in this field"));
    }

    #[test]
    fn test_update_rejects_given_zero_width() {
        let validator = validate_update(Some("Menu"), Some(0), Some(1080));
        assert_eq!(validator.errors().len(), 1);
        assert!(validator.error("width").is_some());
    }
}
