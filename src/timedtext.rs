use async_trait::async_trait;
use eyre::{Result, eyre};
use log::debug;
use url::Url;

use crate::CaptionLine;
use crate::provider::TranscriptFetcher;
use crate::youtube::{USER_AGENT, parse_caption_xml};

const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

/// English transcripts from the legacy timedtext endpoint
pub struct TimedTextFetcher {
    client: reqwest::Client,
}

impl TimedTextFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn timedtext_url(watch_url: &str) -> Result<Url> {
    let parsed = Url::parse(watch_url)?;
    let video_id = parsed
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| eyre!("no video id in {watch_url}"))?;

    Ok(Url::parse_with_params(TIMEDTEXT_URL, &[("lang", "en"), ("v", video_id.as_str())])?)
}

#[async_trait]
impl TranscriptFetcher for TimedTextFetcher {
    fn name(&self) -> &'static str {
        "timedtext"
    }

    async fn fetch_transcript(&self, url: &str) -> Result<Vec<CaptionLine>> {
        let endpoint = timedtext_url(url)?;
        debug!("Fetching timedtext: {endpoint}");

        let body = self
            .client
            .get(endpoint)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        // An empty body means no English track
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        parse_caption_xml(&body)
    }
}
