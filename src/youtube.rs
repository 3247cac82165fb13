use std::sync::LazyLock;

use async_trait::async_trait;
use eyre::{Result, bail, eyre};
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::CaptionLine;
use crate::provider::{CaptionTrack, Channel, VideoInfo, VideoProvider, watch_url};

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<InnerTubeCaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct InnerTubeCaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

/// Video lookups and captions via YouTube's InnerTube player API
pub struct InnerTubeProvider {
    client: reqwest::Client,
    lang: String,
}

impl InnerTubeProvider {
    pub fn new(client: reqwest::Client, lang: &str) -> Self {
        Self {
            client,
            lang: lang.to_string(),
        }
    }

    async fn fetch_player(&self, video_id: &str) -> Result<InnerTubePlayerResponse> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = watch_url(video_id);
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": self.lang,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp)
    }
}

#[async_trait]
impl VideoProvider for InnerTubeProvider {
    fn name(&self) -> &'static str {
        "innertube"
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<VideoInfo>> {
        let resp = self.fetch_player(video_id).await?;
        Ok(video_info_from_player(video_id, resp))
    }

    async fn captions(&self, video: &VideoInfo, lang: &str) -> Result<Option<Vec<CaptionLine>>> {
        let Some(track) = video
            .captions
            .iter()
            .flatten()
            .find(|t| t.language_code == lang)
        else {
            return Ok(None);
        };

        let Some(ref url) = track.url else {
            bail!("caption track {lang} for {} has no URL", video.id);
        };

        debug!("Fetching caption track: lang={lang}");

        let caption_xml = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(Some(parse_caption_xml(&caption_xml)?))
    }
}

fn video_info_from_player(video_id: &str, resp: InnerTubePlayerResponse) -> Option<VideoInfo> {
    // Unplayable or missing videos come back without videoDetails
    let details = resp.video_details?;

    let tracks = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default()
        .into_iter()
        .map(|t| CaptionTrack {
            language_code: t.language_code,
            url: Some(t.base_url),
        })
        .collect();

    let channel = (details.channel_id.is_some() || details.author.is_some()).then(|| Channel {
        id: details.channel_id,
        name: details.author,
    });

    Some(VideoInfo {
        id: video_id.to_string(),
        title: details.title,
        channel,
        captions: Some(tracks),
    })
}

// Current watch pages use the first form, older ones the second
static API_KEY_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).expect("valid regex"),
        Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).expect("valid regex"),
    ]
});

fn extract_api_key(html: &str) -> Result<String> {
    API_KEY_PATTERNS
        .iter()
        .find_map(|re| re.captures(html).map(|caps| caps[1].to_string()))
        .ok_or_else(|| eyre!("could not extract InnerTube API key from watch page"))
}

/// Parse YouTube timedtext XML into caption lines
pub(crate) fn parse_caption_xml(xml: &str) -> Result<Vec<CaptionLine>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut lines = Vec::new();
    let mut current: Option<(f64, f64)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = 0.0;
                let mut dur = 0.0;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                    match attr.key.as_ref() {
                        b"start" => start = value.unwrap_or_default(),
                        b"dur" => dur = value.unwrap_or_default(),
                        _ => {}
                    }
                }
                current = Some((start, dur));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((start, duration)) = current.take() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).to_string();
                    if !text.is_empty() {
                        lines.push(CaptionLine { text, start, duration });
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                current = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_key_patterns() {
        let cases = [
            (r#"ytcfg.set({"INNERTUBE_API_KEY": "key-current", "HL": "en"});"#, Some("key-current")),
            (r#"window.cfg = {innertubeApiKey: "key-legacy"};"#, Some("key-legacy")),
            (r#""INNERTUBE_API_KEY":"first";innertubeApiKey="second""#, Some("first")),
            ("<html><body>watch page without config</body></html>", None),
        ];
        for (html, expected) in cases {
            assert_eq!(extract_api_key(html).ok().as_deref(), expected, "html: {html}");
        }
    }

    fn video_with_tracks(tracks: Vec<CaptionTrack>) -> VideoInfo {
        VideoInfo {
            id: "abc".to_string(),
            captions: Some(tracks),
            ..VideoInfo::default()
        }
    }

    #[tokio::test]
    async fn test_captions_unlisted_language_is_none() {
        let provider = InnerTubeProvider::new(reqwest::Client::new(), "en");
        let video = video_with_tracks(vec![CaptionTrack {
            language_code: "fr".to_string(),
            url: Some("https://example.test/fr".to_string()),
        }]);
        assert_eq!(provider.captions(&video, "en").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_captions_track_without_url_errors() {
        let provider = InnerTubeProvider::new(reqwest::Client::new(), "en");
        let video = video_with_tracks(vec![CaptionTrack::new("en")]);
        let err = provider.captions(&video, "en").await.unwrap_err();
        assert!(err.to_string().contains("has no URL"));
    }

    #[test]
    fn test_video_info_author_without_channel_id() {
        let json = r#"{"videoDetails": {"title": "T", "author": "Someone"}}"#;
        let resp: InnerTubePlayerResponse = serde_json::from_str(json).unwrap();
        let channel = video_info_from_player("abc", resp).unwrap().channel.unwrap();
        assert_eq!(channel.id, None);
        assert_eq!(channel.name.as_deref(), Some("Someone"));
    }

    #[test]
    fn test_video_info_from_player() {
        let json = r#"{
            "videoDetails": {"title": "Never Gonna", "channelId": "UC123", "author": "Rick"},
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                {"baseUrl": "https://example.test/fr", "languageCode": "fr"},
                {"baseUrl": "https://example.test/en", "languageCode": "en"}
            ]}}
        }"#;
        let resp: InnerTubePlayerResponse = serde_json::from_str(json).unwrap();
        let video = video_info_from_player("abc", resp).unwrap();

        assert_eq!(video.id, "abc");
        assert_eq!(video.title.as_deref(), Some("Never Gonna"));
        let channel = video.channel.as_ref().unwrap();
        assert_eq!(channel.id.as_deref(), Some("UC123"));
        assert_eq!(channel.name.as_deref(), Some("Rick"));
        assert_eq!(video.caption_languages(), Some(vec!["fr", "en"]));
        assert_eq!(video.captions.unwrap()[1].url.as_deref(), Some("https://example.test/en"));
    }

    #[test]
    fn test_video_info_without_captions_lists_none() {
        let json = r#"{"videoDetails": {"title": "Silent"}}"#;
        let resp: InnerTubePlayerResponse = serde_json::from_str(json).unwrap();
        let video = video_info_from_player("abc", resp).unwrap();
        assert_eq!(video.caption_languages(), Some(vec![]));
        assert!(video.channel.is_none());
    }

    #[test]
    fn test_video_info_missing_video() {
        let json = r#"{"playabilityStatus": {"status": "ERROR"}}"#;
        let resp: InnerTubePlayerResponse = serde_json::from_str(json).unwrap();
        assert!(video_info_from_player("abc", resp).is_none());
    }

    #[test]
    fn test_parse_caption_xml_basic() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0.21" dur="2.34">Hello world</text>
    <text start="2.55" dur="1.50">This is a test</text>
</transcript>"#;

        let lines = parse_caption_xml(xml).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello world");
        assert!((lines[0].start - 0.21).abs() < f64::EPSILON);
        assert!((lines[0].duration - 2.34).abs() < f64::EPSILON);
        assert_eq!(lines[1].text, "This is a test");
    }

    #[test]
    fn test_parse_caption_xml_html_entities() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0.0" dur="1.0">it&amp;#39;s a &amp;quot;test&amp;quot;</text>
</transcript>"#;

        let lines = parse_caption_xml(xml).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "it's a \"test\"");
    }

    #[test]
    fn test_parse_caption_xml_ignores_whitespace_between_tags() {
        let xml = "<transcript>\n  <text start=\"1\" dur=\"1\">a</text>\n  <text start=\"2\">b</text>\n</transcript>";
        let lines = parse_caption_xml(xml).unwrap();
        assert_eq!(lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(lines[1].duration, 0.0);
    }

    #[test]
    fn test_parse_caption_xml_empty() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript></transcript>"#;
        assert!(parse_caption_xml(xml).unwrap().is_empty());
    }
}
