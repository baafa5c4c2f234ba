//! API Types - Requests and Records Exchanged With the Backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TemplateId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
    /// Sent as `0`/`1`.
    pub remember_me: u8,
}

impl LoginParams {
    pub fn new(email: impl Into<String>, password: impl Into<String>, remember_me: bool) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember_me: u8::from(remember_me),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: u64,
    pub uuid: u64,
    pub position: String,
    pub on_trial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub preview_image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateTag {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplatesParams {
    #[serde(default)]
    pub filter: Option<TemplateFilter>,
}

impl TemplatesParams {
    /// Bracketed query pairs: `filter[name]=..`, `filter[tags][]=..`.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![];
        if let Some(filter) = &self.filter {
            if let Some(name) = &filter.name {
                query.push(("filter[name]".to_string(), name.clone()));
            }
            for tag in filter.tags.iter().flatten() {
                query.push(("filter[tags][]".to_string(), tag.clone()));
            }
        }
        query
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateParams {
    pub id: TemplateId,
}

/// Binary preview attached to create/update requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PreviewImage {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Guess the content type from the file extension.
    pub fn from_file_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = match file_name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            Some("svg") => "image/svg+xml",
            _ => "application/octet-stream",
        };
        Self::new(file_name, content_type, bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTemplateParams {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub tags: Vec<String>,
    pub preview_image: Option<PreviewImage>,
}

impl CreateTemplateParams {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            tags: vec![],
            preview_image: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_preview(mut self, preview: PreviewImage) -> Self {
        self.preview_image = Some(preview);
        self
    }
}

impl From<&Template> for CreateTemplateParams {
    fn from(template: &Template) -> Self {
        Self::new(template.name.clone(), template.width, template.height)
            .with_tags(template.tags.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTemplateParams {
    pub id: TemplateId,
    pub fields: CreateTemplateParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_query_pairs() {
        let params = TemplatesParams {
            filter: Some(TemplateFilter {
                name: Some("promo".into()),
                tags: Some(vec!["x".into(), "y".into()]),
            }),
        };
        assert_eq!(
            params.to_query(),
            vec![
                ("filter[name]".to_string(), "promo".to_string()),
                ("filter[tags][]".to_string(), "x".to_string()),
                ("filter[tags][]".to_string(), "y".to_string()),
            ]
        );
        assert!(TemplatesParams::default().to_query().is_empty());
    }

    #[test]
    fn test_login_response_without_user() {
        let response: AuthResponse = serde_json::from_value(json!({"token": "abc"})).unwrap();
        assert_eq!(response.token, "abc");
        assert!(response.user.is_none());
    }

    #[test]
    fn test_login_params_wire_shape() {
        let value = serde_json::to_value(LoginParams::new("a@b.co", "secret", true)).unwrap();
        assert_eq!(value, json!({"email": "a@b.co", "password": "secret", "remember_me": 1}));
    }

    #[test]
    fn test_preview_content_type_guess() {
        assert_eq!(PreviewImage::from_file_name("cover.PNG", vec![]).content_type, "image/png");
        assert_eq!(
            PreviewImage::from_file_name("blob", vec![]).content_type,
            "application/octet-stream"
        );
    }
}
