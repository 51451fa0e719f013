//! CLI entry point for the doclink tool.

use std::fs;
use std::io::{self, BufRead, BufReader, IsTerminal, Read, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use doclink_core::verifier::{HttpFetcherConfig, VerifierConfig};
use doclink_core::{
    ArticleRecord, DEFAULT_CONCURRENCY, HandlerDispatcher, Registry, Resolution, ResolveOptions,
    Verifier,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod app_config;
mod cli;

use app_config::FileConfig;
use cli::{BatchArgs, CatalogueArgs, Cli, Command, NetworkArgs, ResolveArgs};

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Every record resolved.
    Success,
    /// At least one record ended in a classified failure.
    Failure,
    /// Config, catalogue or input could not be used.
    Configuration,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Configuration => 2,
        }
    }

    fn from_failed(failed: usize) -> Self {
        if failed == 0 {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);
    debug!(?cli, "CLI arguments parsed");

    let exit = match run(&cli).await {
        Ok(exit) => exit,
        Err(error) => {
            error!("{error:#}");
            ProcessExit::Configuration
        }
    };
    ExitCode::from(exit.code())
}

fn init_tracing(verbose: u8, quiet: bool) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries JSON results only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<ProcessExit> {
    let file_config = app_config::load_file_config(cli.config.as_deref())?.unwrap_or_default();
    debug!(?file_config, "Configuration loaded");

    match &cli.command {
        Command::Check(args) => run_check(args, &file_config),
        Command::Resolve(args) => run_resolve(args, &file_config).await,
        Command::Batch(args) => run_batch(args, &file_config).await,
    }
}

fn run_check(args: &CatalogueArgs, file_config: &FileConfig) -> Result<ProcessExit> {
    #[derive(Serialize)]
    struct CatalogueSummary<'a> {
        catalogue: String,
        publishers: usize,
        journals: usize,
        publisher_ids: Vec<&'a str>,
    }

    let (path, registry) = load_registry(args, file_config)?;
    let summary = CatalogueSummary {
        catalogue: path,
        publishers: registry.publisher_count(),
        journals: registry.journal_count(),
        publisher_ids: registry.publisher_ids(),
    };
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, &summary)?;
    writeln!(out)?;
    Ok(ProcessExit::Success)
}

async fn run_resolve(args: &ResolveArgs, file_config: &FileConfig) -> Result<ProcessExit> {
    let (_, registry) = load_registry(&args.catalogue, file_config)?;
    let settings = Settings::new(&args.network, file_config);
    let dispatcher = build_dispatcher(registry, &settings)?;

    let record = ArticleRecord {
        record_id: args.record_id.clone(),
        journal: args.journal.clone(),
        doi: args.doi.clone(),
        volume: args.volume.clone(),
        issue: args.issue.clone(),
        first_page: args.first_page.clone(),
        item_id: args.item_id.clone(),
    };

    let resolution = dispatcher
        .resolve(&record, settings.verify)
        .await
        .context("Catalogue defect while resolving record")?;

    let mut out = io::stdout().lock();
    write_result(&mut out, &record.record_id, &resolution)?;
    Ok(ProcessExit::from_failed(usize::from(!resolution.is_success())))
}

async fn run_batch(args: &BatchArgs, file_config: &FileConfig) -> Result<ProcessExit> {
    let (_, registry) = load_registry(&args.catalogue, file_config)?;
    let settings = Settings::new(&args.network, file_config);
    let concurrency = args
        .concurrency
        .or(file_config.concurrency)
        .map_or(DEFAULT_CONCURRENCY, usize::from);

    let records = match &args.input {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
            parse_records(BufReader::new(file))?
        }
        None if io::stdin().is_terminal() => {
            info!("No input provided. Pipe JSON-lines records via stdin or pass --input.");
            info!(r#"Example: echo '{{"record_id":"1","journal":"Acme Letters","doi":"10.1/x"}}' | doclink batch"#);
            return Ok(ProcessExit::Success);
        }
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            parse_records(buffer.as_bytes())?
        }
    };
    info!(records = records.len(), concurrency, verify = settings.verify, "Parsed input");

    let dispatcher = build_dispatcher(registry, &settings)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling outstanding verifications");
            interrupt.cancel();
        }
    });

    let options = ResolveOptions::new(settings.verify).with_cancel(cancel);
    let results = dispatcher
        .resolve_many(&records, &options, concurrency)
        .await;

    let mut out = io::stdout().lock();
    let mut failed = 0usize;
    for (record, result) in records.iter().zip(results) {
        let resolution = result.with_context(|| {
            format!("Catalogue defect while resolving record '{}'", record.record_id)
        })?;
        if !resolution.is_success() {
            failed += 1;
        }
        write_result(&mut out, &record.record_id, &resolution)?;
    }
    out.flush()?;

    info!(
        resolved = records.len() - failed,
        failed,
        total = records.len(),
        "Batch complete"
    );
    Ok(ProcessExit::from_failed(failed))
}

/// Effective network settings after merging flags over the config file.
#[derive(Debug, Clone)]
struct Settings {
    verify: bool,
    http: HttpFetcherConfig,
    verifier: VerifierConfig,
}

impl Settings {
    fn new(network: &NetworkArgs, file_config: &FileConfig) -> Self {
        let mut http = HttpFetcherConfig::default();
        if let Some(secs) = network
            .connect_timeout_secs
            .or(file_config.connect_timeout_secs)
        {
            http.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(hops) = network.max_redirects.or(file_config.max_redirects) {
            http.max_redirects = usize::from(hops);
        }

        let mut verifier = VerifierConfig::default();
        if let Some(secs) = network
            .request_timeout_secs
            .or(file_config.request_timeout_secs)
        {
            verifier.request_timeout = Duration::from_secs(secs);
        }

        Self {
            verify: network
                .verify_override()
                .or(file_config.verify)
                .unwrap_or(false),
            http,
            verifier,
        }
    }
}

fn load_registry(args: &CatalogueArgs, file_config: &FileConfig) -> Result<(String, Registry)> {
    let path = args
        .catalogue
        .as_deref()
        .or(file_config.catalogue.as_deref())
        .ok_or_else(|| {
            anyhow!(
                "No catalogue given\n  Suggestion: pass --catalogue PATH or set `catalogue` in the config file"
            )
        })?;
    let registry = Registry::load_json_file(path)
        .with_context(|| format!("Failed to load catalogue '{}'", path.display()))?;
    Ok((path.display().to_string(), registry))
}

fn build_dispatcher(registry: Registry, settings: &Settings) -> Result<HandlerDispatcher> {
    let verifier = Verifier::with_defaults(settings.http.clone(), settings.verifier)
        .context("Failed to build verification client")?;
    Ok(HandlerDispatcher::new(Arc::new(registry), verifier))
}

fn parse_records(reader: impl BufRead) -> Result<Vec<ArticleRecord>> {
    let mut records = Vec::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: ArticleRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("Invalid record on input line {}", line_index + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// One JSON line of command output.
#[derive(Serialize)]
struct ResultLine<'a> {
    record_id: &'a str,
    #[serde(flatten)]
    resolution: &'a Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'static str>,
}

fn write_result(out: &mut impl Write, record_id: &str, resolution: &Resolution) -> Result<()> {
    let failure = resolution.failure();
    let line = ResultLine {
        record_id,
        resolution,
        retryable: failure.map(|failure| failure.kind.is_retryable()),
        suggestion: failure.map(|failure| failure.kind.descriptor().fix),
    };
    serde_json::to_writer(&mut *out, &line)?;
    writeln!(out)?;
    Ok(())
}
