//! Multipart Bodies for Template Create/Update
//!
//! Built as plain data so the exact field list can be inspected; the
//! transport converts it to the wire format.

use crate::types::{CreateTemplateParams, PreviewImage};

pub const PREVIEW_FIELD: &str = "preview_image";
pub const TAGS_FIELD: &str = "tags[]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(PreviewImage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    parts: Vec<Part>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: PreviewImage) -> Self {
        self.parts.push(Part {
            name: name.into(),
            value: PartValue::File(file),
        });
        self
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    /// Text values of every part named `name`, in order.
    pub fn texts<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.parts.iter().filter(move |p| p.name == name).filter_map(|p| match &p.value {
            PartValue::Text(text) => Some(text.as_str()),
            PartValue::File(_) => None,
        })
    }

    pub fn file_part(&self, name: &str) -> Option<&PreviewImage> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.value {
            PartValue::File(file) => Some(file),
            PartValue::Text(_) => None,
        })
    }
}

impl From<&CreateTemplateParams> for MultipartBody {
    fn from(params: &CreateTemplateParams) -> Self {
        let mut body = MultipartBody::new()
            .text("name", params.name.as_str())
            .text("width", params.width.to_string())
            .text("height", params.height.to_string());
        for tag in &params.tags {
            body = body.text(TAGS_FIELD, tag.as_str());
        }
        if let Some(preview) = &params.preview_image {
            body = body.file(PREVIEW_FIELD, preview.clone());
        }
        body
    }
}
