//! Media references embedded in prompts

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Regex to match `data:<mimetype>;base64,<payload>`
static DATA_URI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:([a-zA-Z0-9][a-zA-Z0-9!#$&^_.+-]*/[a-zA-Z0-9][a-zA-Z0-9!#$&^_.+-]*);base64,(.+)$")
        .unwrap()
});

/// A media payload handed to the model next to the prompt text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Data URI or remote URL
    pub url: String,
    /// MIME type, known for data URIs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MediaRef {
    /// Build a media reference from a field value, reading the MIME type out of data URIs
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let content_type = DataUri::parse(&url).map(|d| d.mime_type.to_string());

        Self { url, content_type }
    }

    pub fn is_data_uri(&self) -> bool {
        self.url.starts_with("data:")
    }

    /// Split into (mime type, base64 payload) when this is a data URI
    pub fn inline_data(&self) -> Option<(&str, &str)> {
        DataUri::parse(&self.url).map(|d| (d.mime_type, d.data))
    }
}

/// A parsed `data:` URI borrowing from its source string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

impl<'a> DataUri<'a> {
    /// Parse a base64 data URI; returns `None` if the shape or the payload is invalid
    pub fn parse(value: &'a str) -> Option<Self> {
        let caps = DATA_URI_PATTERN.captures(value)?;
        let mime_type = caps.get(1)?.as_str();
        let data = caps.get(2)?.as_str();

        STANDARD.decode(data).ok()?;

        Some(Self { mime_type, data })
    }
}
