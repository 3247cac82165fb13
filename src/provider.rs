use async_trait::async_trait;
use eyre::Result;

use crate::CaptionLine;

/// A caption track a provider advertises for a video
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language_code: String,
    /// Provider-specific locator for the track's lines, if any
    pub url: Option<String>,
}

impl CaptionTrack {
    pub fn new(language_code: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// What a provider knows about a single video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoInfo {
    pub id: String,
    pub title: Option<String>,
    pub channel: Option<Channel>,
    /// `None` when the provider doesn't list caption languages at all;
    /// `Some(vec![])` when it does and the video has none.
    pub captions: Option<Vec<CaptionTrack>>,
}

impl VideoInfo {
    pub fn caption_languages(&self) -> Option<Vec<&str>> {
        self.captions
            .as_ref()
            .map(|tracks| tracks.iter().map(|t| t.language_code.as_str()).collect())
    }
}

/// Source of video metadata and captions
#[async_trait]
pub trait VideoProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Look up a video; `Ok(None)` means the provider has no such video
    async fn get_video(&self, video_id: &str) -> Result<Option<VideoInfo>>;

    /// Fetch caption lines for one language of a previously looked-up video
    async fn captions(&self, video: &VideoInfo, lang: &str) -> Result<Option<Vec<CaptionLine>>>;
}

/// Simpler provider contract: transcript lines straight from a watch URL
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_transcript(&self, url: &str) -> Result<Vec<CaptionLine>>;
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Presents a [`TranscriptFetcher`] as a [`VideoProvider`] that lists no
/// caption languages and carries no metadata.
pub struct TranscriptOnly<F>(pub F);

#[async_trait]
impl<F: TranscriptFetcher> VideoProvider for TranscriptOnly<F> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<VideoInfo>> {
        Ok(Some(VideoInfo {
            id: video_id.to_string(),
            ..VideoInfo::default()
        }))
    }

    async fn captions(&self, video: &VideoInfo, _lang: &str) -> Result<Option<Vec<CaptionLine>>> {
        let lines = self.0.fetch_transcript(&watch_url(&video.id)).await?;
        Ok(Some(lines))
    }
}
