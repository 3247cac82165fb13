use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::provider::{VideoInfo, VideoProvider};

pub const DEFAULT_LANG: &str = "en";

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Pick a caption language: the preferred one, then English, then whatever
/// the provider listed first.
pub fn select_caption_language<'a>(available: &[&'a str], preferred: &str) -> Option<&'a str> {
    available
        .iter()
        .find(|&&lang| lang == preferred)
        .or_else(|| available.iter().find(|&&lang| lang == DEFAULT_LANG))
        .or_else(|| available.first())
        .copied()
}

/// Clean up joined caption text. Returns `None` if nothing is left.
pub fn normalize_transcript(text: &str) -> Option<String> {
    let cleaned = text.trim();
    let cleaned = WHITESPACE_RUN.replace_all(cleaned, " ");
    let cleaned = cleaned.replace(',', "");
    let cleaned = cleaned.replace('\n', " ");
    let cleaned = WHITESPACE_RUN.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Fetch and clean a transcript for an already looked-up video.
///
/// Caption failures never propagate; they are logged and yield `None`.
pub async fn resolve_transcript(provider: &dyn VideoProvider, video: &VideoInfo, preferred: &str) -> Option<String> {
    let lang = match video.caption_languages() {
        Some(available) => match select_caption_language(&available, preferred) {
            Some(lang) => lang.to_string(),
            None => {
                debug!("No caption languages available for {}", video.id);
                return None;
            }
        },
        None => {
            debug!("{} lists no caption languages, trying {DEFAULT_LANG}", provider.name());
            DEFAULT_LANG.to_string()
        }
    };

    debug!("Using caption language {lang} for {}", video.id);

    let lines = match provider.captions(video, &lang).await {
        Ok(lines) => lines.unwrap_or_default(),
        Err(e) => {
            warn!("[{}] Failed to extract transcript for language {lang}: {e}", provider.name());
            return None;
        }
    };

    let text = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join(" ");
    normalize_transcript(&text)
}
