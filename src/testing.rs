//! In-memory providers for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use eyre::{Result, bail};

use crate::CaptionLine;
use crate::provider::{CaptionTrack, Channel, TranscriptFetcher, VideoInfo, VideoProvider};

#[derive(Default)]
pub struct FakeProvider {
    videos: HashMap<String, VideoInfo>,
    lines: HashMap<(String, String), Vec<CaptionLine>>,
    failing_langs: HashSet<String>,
    failing_lookups: HashSet<String>,
    caption_requests: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a video with the given caption languages (in provider order)
    pub fn video(mut self, id: &str, langs: &[&str]) -> Self {
        self.videos.insert(
            id.to_string(),
            VideoInfo {
                id: id.to_string(),
                captions: Some(langs.iter().map(|l| CaptionTrack::new(*l)).collect()),
                ..VideoInfo::default()
            },
        );
        self
    }

    /// Register a video that exposes no caption language list
    pub fn unlisted_video(mut self, id: &str) -> Self {
        self.videos.insert(
            id.to_string(),
            VideoInfo {
                id: id.to_string(),
                ..VideoInfo::default()
            },
        );
        self
    }

    pub fn metadata(mut self, id: &str, title: Option<&str>, channel: Option<(&str, &str)>) -> Self {
        if let Some(video) = self.videos.get_mut(id) {
            video.title = title.map(str::to_string);
            video.channel = channel.map(|(cid, name)| Channel {
                id: Some(cid.to_string()),
                name: Some(name.to_string()),
            });
        }
        self
    }

    pub fn lines(mut self, id: &str, lang: &str, texts: &[&str]) -> Self {
        self.lines.insert(
            (id.to_string(), lang.to_string()),
            texts.iter().map(|t| CaptionLine::new(*t)).collect(),
        );
        self
    }

    pub fn failing_lang(mut self, lang: &str) -> Self {
        self.failing_langs.insert(lang.to_string());
        self
    }

    pub fn failing_lookup(mut self, id: &str) -> Self {
        self.failing_lookups.insert(id.to_string());
        self
    }

    pub fn caption_requests(&self) -> Vec<(String, String)> {
        self.caption_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<VideoInfo>> {
        if self.failing_lookups.contains(video_id) {
            bail!("lookup failed for {video_id}");
        }
        Ok(self.videos.get(video_id).cloned())
    }

    async fn captions(&self, video: &VideoInfo, lang: &str) -> Result<Option<Vec<CaptionLine>>> {
        self.caption_requests
            .lock()
            .unwrap()
            .push((video.id.clone(), lang.to_string()));
        if self.failing_langs.contains(lang) {
            bail!("caption fetch failed for {lang}");
        }
        Ok(self.lines.get(&(video.id.clone(), lang.to_string())).cloned())
    }
}

pub struct FakeFetcher {
    lines: Vec<CaptionLine>,
    fail: bool,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn lines(texts: &[&str]) -> Self {
        Self {
            lines: texts.iter().map(|t| CaptionLine::new(*t)).collect(),
            fail: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::lines(&[])
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptFetcher for FakeFetcher {
    fn name(&self) -> &'static str {
        "fake-fetcher"
    }

    async fn fetch_transcript(&self, url: &str) -> Result<Vec<CaptionLine>> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.fail {
            bail!("transcript unavailable");
        }
        Ok(self.lines.clone())
    }
}
