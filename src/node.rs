use eyre::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::captions::{DEFAULT_LANG, resolve_transcript};
use crate::provider::VideoProvider;
use crate::{NodeError, OutputRecord, extract_video_id};

/// Per-item parameters, named as the workflow host names them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeParameters {
    pub youtube_id: String,
    pub prefer_cap_lang: String,
    pub return_channel_id: bool,
    pub return_channel_name: bool,
    pub return_title: bool,
}

impl Default for NodeParameters {
    fn default() -> Self {
        Self {
            youtube_id: String::new(),
            prefer_cap_lang: DEFAULT_LANG.to_string(),
            return_channel_id: false,
            return_channel_name: false,
            return_title: false,
        }
    }
}

impl NodeParameters {
    /// Bind parameters for one item. Known keys on the item override the
    /// node-level defaults; unknown keys are ignored.
    pub fn bind(item: &Value, defaults: &NodeParameters) -> Result<Self> {
        let mut merged = serde_json::to_value(defaults)?;
        if let (Some(base), Some(overrides)) = (merged.as_object_mut(), item.as_object()) {
            for (key, value) in overrides {
                if base.contains_key(key) {
                    base.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(serde_json::from_value(merged)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputItem {
    pub json: Value,
}

impl InputItem {
    pub fn new(json: Value) -> Self {
        Self { json }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItem {
    pub item: usize,
}

/// One emitted entry, tagged with the index of the input it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputItem {
    pub json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub paired_item: PairedItem,
}

impl OutputItem {
    pub fn record(index: usize, record: &OutputRecord) -> Result<Self> {
        Ok(Self {
            json: serde_json::to_value(record)?,
            error: None,
            paired_item: PairedItem { item: index },
        })
    }

    pub fn failed(index: usize, input: Value, error: &eyre::Report) -> Self {
        Self {
            json: input,
            error: Some(format!("{error:#}")),
            paired_item: PairedItem { item: index },
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Context attached to the error that aborts a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("item {index} failed")]
pub struct ItemFailed {
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub defaults: NodeParameters,
    pub continue_on_fail: bool,
}

/// Resolve a single item into an output record
pub async fn resolve_item(provider: &dyn VideoProvider, params: &NodeParameters) -> Result<OutputRecord> {
    let video_id = extract_video_id(&params.youtube_id)?;
    info!("Resolving video {video_id} via {}", provider.name());

    let video = provider
        .get_video(&video_id)
        .await
        .map_err(|e| e.wrap_err(format!("failed to look up video {video_id}")))?
        .ok_or_else(|| NodeError::VideoNotFound(video_id.clone()))?;

    let transcript = resolve_transcript(provider, &video, &params.prefer_cap_lang).await;

    let mut record = OutputRecord {
        video_id,
        transcript,
        ..OutputRecord::default()
    };

    let channel = video.channel.unwrap_or_default();
    if params.return_channel_id {
        record.channel_id = channel.id;
    }
    if params.return_channel_name {
        record.channel_name = channel.name;
    }
    if params.return_title {
        record.title = video.title;
    }

    Ok(record)
}

/// Run every item in order.
///
/// With `continue_on_fail` a failing item is emitted as an error entry and
/// the batch carries on; otherwise the first failure aborts the batch with
/// an [`ItemFailed`] context naming its index.
pub async fn execute(
    provider: &dyn VideoProvider,
    items: &[InputItem],
    options: &ExecuteOptions,
) -> Result<Vec<OutputItem>> {
    let mut output = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let outcome = match NodeParameters::bind(&item.json, &options.defaults) {
            Ok(params) => resolve_item(provider, &params).await,
            Err(e) => Err(e.wrap_err("invalid item parameters")),
        };

        match outcome {
            Ok(record) => output.push(OutputItem::record(index, &record)?),
            Err(e) if options.continue_on_fail => {
                warn!("Item {index} failed, continuing: {e:#}");
                output.push(OutputItem::failed(index, item.json.clone(), &e));
            }
            Err(e) => return Err(e.wrap_err(ItemFailed { index })),
        }
    }

    info!(
        "Processed {} items ({} failed)",
        output.len(),
        output.iter().filter(|o| o.is_error()).count()
    );
    Ok(output)
}
