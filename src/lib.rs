pub mod captions;
pub mod config;
pub mod node;
pub mod output;
pub mod provider;
pub mod timedtext;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// A single captioned line as returned by a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionLine {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl CaptionLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Result record for one resolved item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Item-level failures that stop an item from producing a record
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NodeError {
    #[error("The provided URL doesn't contain a valid YouTube video identifier. URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to retrieve video information for {0}")]
    VideoNotFound(String),
}

static URL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://)?(www.)?youtu(be|.be)?(\.com)?/.+").expect("valid regex"));

/// Whether the input looks like a YouTube URL rather than a bare id
pub fn is_youtube_url(input: &str) -> bool {
    URL_SHAPE.is_match(input)
}

/// Resolve a video id from a bare id or a YouTube watch/short URL.
///
/// Anything that doesn't look like a YouTube URL is returned verbatim.
pub fn extract_video_id(input: &str) -> Result<String, NodeError> {
    if !is_youtube_url(input) {
        return Ok(input.to_string());
    }

    let invalid = || NodeError::InvalidUrl(input.to_string());

    let parsed = if input.starts_with("http://") || input.starts_with("https://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("https://{input}"))
    }
    .map_err(|_| invalid())?;

    if parsed.host_str() == Some("youtu.be") {
        let id = parsed.path().trim_start_matches('/');
        if id.is_empty() {
            return Err(invalid());
        }
        return Ok(id.to_string());
    }

    parsed
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(invalid)
}
