use eyre::Result;

use crate::node::OutputItem;

/// Render items as a pretty-printed JSON array
pub fn render_json(items: &[OutputItem]) -> Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

/// Render items as JSON lines, one item per line
pub fn render_jsonl(items: &[OutputItem]) -> Result<String> {
    let lines = items
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

/// Render items as `videoId<TAB>transcript`, one line per item
pub fn render_text(items: &[OutputItem]) -> String {
    items
        .iter()
        .map(|item| {
            if let Some(ref error) = item.error {
                let input = item.json.get("youtubeId").and_then(|v| v.as_str()).unwrap_or("");
                format!("{input}\tERROR: {error}")
            } else {
                let field = |key: &str| item.json.get(key).and_then(|v| v.as_str()).unwrap_or("");
                format!("{}\t{}", field("videoId"), field("transcript"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
