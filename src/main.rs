use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::ValueEnum;
use eyre::{Result, bail};
use log::{debug, info};

use ytnode::config::Config;
use ytnode::node::{ExecuteOptions, InputItem, NodeParameters};
use ytnode::provider::{TranscriptOnly, VideoProvider};
use ytnode::timedtext::TimedTextFetcher;
use ytnode::youtube::InnerTubeProvider;

mod cli;

use cli::{Cli, OutputFormat, ProviderKind};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytnode.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytnode")
        .join("logs")
}

fn build_after_help() -> String {
    format!(
        "\nInputs may be bare video IDs, watch/short URLs, or JSON objects such as\n  \
         {{\"youtubeId\": \"dQw4w9WgXcQ\", \"preferCapLang\": \"ko\", \"returnTitle\": true}}\n\n\
         Config: {}\nLogs are written to: {}",
        ytnode::config::config_path().display(),
        log_dir().join("ytnode.log").display()
    )
}

/// A JSON object line is a full item; anything else is a video reference
fn parse_item(line: &str) -> InputItem {
    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(json) if json.is_object() => InputItem::new(json),
        _ => InputItem::new(serde_json::json!({ "youtubeId": line })),
    }
}

fn resolve_provider(cli: &Cli, config: &Config) -> Result<ProviderKind> {
    if let Some(kind) = cli.provider {
        return Ok(kind);
    }
    match config.default_provider.as_deref() {
        Some(name) => ProviderKind::from_str(name, true)
            .map_err(|e| eyre::eyre!("invalid default_provider in config: {e}")),
        None => Ok(ProviderKind::Innertube),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cmd = <Cli as clap::CommandFactory>::command().after_help(build_after_help());
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_default();

    if cli.verbose {
        let config_path = ytnode::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    // CLI flags take priority over config
    let defaults = NodeParameters {
        prefer_cap_lang: cli
            .lang
            .clone()
            .or_else(|| config.default_lang.clone())
            .unwrap_or_else(|| NodeParameters::default().prefer_cap_lang),
        return_channel_id: cli.channel_id || config.return_channel_id.unwrap_or(false),
        return_channel_name: cli.channel_name || config.return_channel_name.unwrap_or(false),
        return_title: cli.title || config.return_title.unwrap_or(false),
        ..NodeParameters::default()
    };
    let options = ExecuteOptions {
        defaults,
        continue_on_fail: cli.continue_on_fail || config.continue_on_fail.unwrap_or(false),
    };
    debug!("Execute options: {options:?}");

    // Collect inputs: from args or stdin
    let lines = if cli.inputs.is_empty() {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    } else {
        cli.inputs.clone()
    };

    let items: Vec<InputItem> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(parse_item)
        .collect();

    if items.is_empty() {
        bail!("no video ID or URL provided\n\nUsage: ytnode <ID|URL>...\n       echo <ID|URL> | ytnode");
    }

    let client = reqwest::Client::new();
    let provider: Box<dyn VideoProvider> = match resolve_provider(&cli, &config)? {
        ProviderKind::Innertube => Box::new(InnerTubeProvider::new(client, &options.defaults.prefer_cap_lang)),
        ProviderKind::Timedtext => Box::new(TranscriptOnly(TimedTextFetcher::new(client))),
    };

    if cli.verbose {
        eprintln!("Provider: {}\nItems: {}", provider.name(), items.len());
    }

    let output = ytnode::node::execute(provider.as_ref(), &items, &options).await?;

    if cli.verbose {
        let failed = output.iter().filter(|o| o.is_error()).count();
        eprintln!("Records: {}\nFailed: {failed}", output.len());
    }

    let rendered = match cli.format {
        OutputFormat::Json => ytnode::output::render_json(&output)?,
        OutputFormat::Jsonl => ytnode::output::render_jsonl(&output)?,
        OutputFormat::Text => ytnode::output::render_text(&output),
    };

    if let Some(ref path) = cli.output {
        std::fs::write(path, &rendered)?;
        if cli.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{rendered}");
    }

    Ok(())
}
