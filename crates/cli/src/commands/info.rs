//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::LoggerBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;
use crate::pipeline::preview_headers;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    session: SessionInfo,
    sources: Vec<AdapterInfo>,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SessionInfo {
    interval_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_sec: Option<f64>,
    prefix_delimiter: String,
}

#[derive(Serialize)]
struct AdapterInfo {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SinkInfo {
    #[serde(flatten)]
    adapter: AdapterInfo,
    header: Vec<String>,
}

/// Execute the `info` command
pub async fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let headers = preview_headers(&blueprint).await?;
    let info = build_config_info(&blueprint, headers, args.params);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(
    blueprint: &LoggerBlueprint,
    headers: Vec<(String, Vec<String>)>,
    with_params: bool,
) -> ConfigInfo {
    let params = |p: &std::collections::HashMap<String, String>| {
        if with_params {
            p.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        } else {
            BTreeMap::new()
        }
    };

    let sources = blueprint
        .sources
        .iter()
        .map(|s| AdapterInfo {
            name: s.name.clone(),
            kind: format!("{:?}", s.source_type),
            params: params(&s.params),
        })
        .collect();

    // Headers come back in sink declaration order
    let sinks = blueprint
        .sinks
        .iter()
        .zip(headers)
        .map(|(s, (_, header))| SinkInfo {
            adapter: AdapterInfo {
                name: s.name.clone(),
                kind: format!("{:?}", s.sink_type),
                params: params(&s.params),
            },
            header,
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        session: SessionInfo {
            interval_sec: blueprint.session.interval_sec,
            duration_sec: blueprint.session.duration_sec,
            prefix_delimiter: blueprint.session.prefix_delimiter.clone(),
        },
        sources,
        sinks,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== DAQ Logger Configuration ===\n");

    println!("Session");
    println!("   Version: {}", info.version);
    println!("   Interval: {}s", info.session.interval_sec);
    match info.session.duration_sec {
        Some(duration) => println!("   Duration: {duration}s"),
        None => println!("   Duration: unbounded"),
    }
    println!("   Prefix delimiter: {:?}", info.session.prefix_delimiter);

    println!("\nSources ({})", info.sources.len());
    for source in &info.sources {
        println!("   {} ({})", source.name, source.kind);
        print_params(&source.params);
    }

    println!("\nSinks ({})", info.sinks.len());
    for sink in &info.sinks {
        println!("   {} ({})", sink.adapter.name, sink.adapter.kind);
        print_params(&sink.adapter.params);
        println!("      header: {}", sink.header.join(", "));
    }

    println!();
}

fn print_params(params: &BTreeMap<String, String>) {
    for (key, value) in params {
        println!("      {key} = {value}");
    }
}
