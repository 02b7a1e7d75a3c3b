//! Domain Resolve CLI Application
//!
//! A command-line interface for resolving domain and IP registration data
//! using RDAP with legacy WHOIS fallback. This CLI application provides a
//! user-friendly interface to the domain-resolve-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_resolve_lib::{
    load_env_config, parse_timeout_string, CanonicalRecord, ConfigManager, DomainResolver,
    EnvConfig, FileConfig, ResolveConfig, ScrapePolicy,
};
use futures::StreamExt;
use std::io::BufRead;
use std::process;
use std::time::Duration;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-resolve
#[derive(Parser, Debug)]
#[command(name = "domain-resolve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve domain/IP registration data via RDAP with legacy WHOIS fallback")]
#[command(
    long_about = "Resolve registration data (registrar, status, nameservers, lifecycle dates)\nfor domains and IP addresses. Queries RDAP first, merging the registry (thin)\nand registrar (thick) documents, and falls back to legacy WHOIS text\nextraction for registries without RDAP."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domains or IP addresses to resolve
    #[arg(value_name = "TARGETS", help_heading = "Target Selection")]
    pub targets: Vec<String>,

    /// Input file with targets (one per line)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Target Selection"
    )]
    pub file: Option<String>,

    /// Output results in JSON format (one object per target)
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long = "json-pretty", help_heading = "Output Format")]
    pub json_pretty: bool,

    /// Show results as they complete rather than in input order
    #[arg(long = "streaming", help_heading = "Output Format")]
    pub streaming: bool,

    /// Skip the thick (registrar) RDAP fetch
    #[arg(long = "thin-only", help_heading = "Protocol")]
    pub thin_only: bool,

    /// Query a specific RDAP server instead of the routed one
    #[arg(
        short = 's',
        long = "server",
        value_name = "URL",
        help_heading = "Protocol"
    )]
    pub server: Option<String>,

    /// Skip the third-party WHOIS mirror, go straight to port 43
    #[arg(long = "no-scrape", help_heading = "Protocol")]
    pub no_scrape: bool,

    /// RDAP request timeout (e.g. 5s, 30s, 2m)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Protocol")]
    pub timeout: Option<String>,

    /// Max concurrent lookups (default: 8, max: 64)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Configuration")]
    pub verbose: u8,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_tracing(args.verbose);

    if let Err(e) = run(&args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Initialize tracing to stderr; RUST_LOG overrides the verbosity flags.
fn init_tracing(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "domain_resolve_lib=warn,domain_resolve=warn",
        1 => "domain_resolve_lib=info,domain_resolve=info",
        _ => "domain_resolve_lib=debug,domain_resolve=debug",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &Args) -> Result<(), String> {
    let env_config = load_env_config();
    let file_config = load_file_config(args, &env_config)?;

    let targets = collect_targets(args, &env_config)?;
    if targets.is_empty() {
        return Err("No targets to resolve. Pass domains/IPs or use --file.".to_string());
    }

    let config = build_resolve_config(args, &env_config, &file_config)?;
    let concurrency = config.concurrency;
    let resolver = DomainResolver::with_config(config);

    let json_output = args.json
        || args.json_pretty
        || env_config.json.unwrap_or(false)
        || file_config
            .output
            .as_ref()
            .and_then(|o| o.default_format.as_deref())
            == Some("json");
    let json_pretty = args.json_pretty
        || file_config
            .output
            .as_ref()
            .and_then(|o| o.json_pretty)
            .unwrap_or(false);

    if !json_output && targets.len() > 1 {
        ui::print_header(targets.len(), concurrency);
    }

    if args.streaming {
        let mut stream = resolver.resolve_stream(&targets);
        let mut failures = 0usize;
        let mut count = 0usize;
        while let Some(record) = stream.next().await {
            count += 1;
            if !record.found {
                failures += 1;
            }
            emit_record(&record, json_output, json_pretty, Some((count, targets.len())));
        }
        if !json_output && targets.len() > 1 {
            ui::print_summary(targets.len(), failures);
        }
    } else {
        let records = resolver.resolve_many(&targets).await;
        let failures = records.iter().filter(|r| !r.found).count();
        for record in &records {
            emit_record(record, json_output, json_pretty, None);
        }
        if !json_output && records.len() > 1 {
            ui::print_summary(records.len(), failures);
        }
    }

    Ok(())
}

fn emit_record(
    record: &CanonicalRecord,
    json: bool,
    pretty: bool,
    counter: Option<(usize, usize)>,
) {
    if json {
        let rendered = if pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        };
        match rendered {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Error: failed to serialize record: {}", e),
        }
    } else {
        ui::print_record(record, counter);
    }
}

/// Load TOML configuration: explicit --config path, DR_CONFIG, or discovery.
fn load_file_config(args: &Args, env_config: &EnvConfig) -> Result<FileConfig, String> {
    let manager = ConfigManager::new();

    if let Some(path) = args.config.as_ref().or(env_config.config.as_ref()) {
        return manager.load_file(path).map_err(|e| e.to_string());
    }

    manager.discover_and_load().map_err(|e| e.to_string())
}

/// Gather targets from positional arguments and the optional input file.
fn collect_targets(args: &Args, env_config: &EnvConfig) -> Result<Vec<String>, String> {
    let mut targets = args.targets.clone();

    let file = args.file.as_ref().or(env_config.file.as_ref());
    if let Some(path) = file {
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Cannot open targets file {}: {}", path, e))?;
        for line in std::io::BufReader::new(file).lines() {
            let line = line.map_err(|e| format!("Cannot read targets file {}: {}", path, e))?;
            let line = line.trim();
            // Skip blanks and comment lines
            if !line.is_empty() && !line.starts_with('#') {
                targets.push(line.to_string());
            }
        }
    }

    Ok(targets)
}

/// Merge CLI flags, environment, and file config into a resolver config.
/// Precedence: CLI > environment > file > built-in defaults.
fn build_resolve_config(
    args: &Args,
    env_config: &EnvConfig,
    file_config: &FileConfig,
) -> Result<ResolveConfig, String> {
    let defaults = file_config.defaults.clone().unwrap_or_default();
    let mut config = ResolveConfig::default();

    if args.thin_only || env_config.thin_only.unwrap_or(false) || defaults.thin_only.unwrap_or(false)
    {
        config = config.with_thin_only(true);
    }

    if let Some(server) = args
        .server
        .as_ref()
        .or(env_config.server.as_ref())
        .or(defaults.server.as_ref())
    {
        config = config.with_override_server(server.clone());
    }

    let scrape = if args.no_scrape {
        Some(false)
    } else {
        env_config.scrape.or(defaults.scrape)
    };
    if scrape == Some(false) {
        config = config.with_scrape_policy(ScrapePolicy::Skip);
    }

    if let Some(timeout_str) = args
        .timeout
        .as_ref()
        .or(env_config.timeout.as_ref())
        .or(defaults.timeout.as_ref())
    {
        let seconds = parse_timeout_string(timeout_str).ok_or_else(|| {
            format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'.",
                timeout_str
            )
        })?;
        config = config.with_rdap_timeout(Duration::from_secs(seconds));
    }

    if let Some(concurrency) = args
        .concurrency
        .or(env_config.concurrency)
        .or(defaults.concurrency)
    {
        if concurrency == 0 || concurrency > 64 {
            return Err("Concurrency must be between 1 and 64.".to_string());
        }
        config = config.with_concurrency(concurrency);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("argv must parse")
    }

    #[test]
    fn test_args_parse_targets_and_flags() {
        let args = parse(&[
            "domain-resolve",
            "example.com",
            "8.8.8.8",
            "--json",
            "--thin-only",
            "-c",
            "4",
        ]);
        assert_eq!(args.targets, vec!["example.com", "8.8.8.8"]);
        assert!(args.json);
        assert!(args.thin_only);
        assert_eq!(args.concurrency, Some(4));
    }

    #[test]
    fn test_cli_flags_override_file_defaults() {
        let args = parse(&["domain-resolve", "example.com", "--timeout", "3s"]);
        let env = EnvConfig::default();
        let file = FileConfig {
            defaults: Some(domain_resolve_lib::DefaultsConfig {
                timeout: Some("30s".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = build_resolve_config(&args, &env, &file).unwrap();
        assert_eq!(config.rdap_timeout, Duration::from_secs(3));
        assert_eq!(config.scrape_policy, ScrapePolicy::Attempt);
    }

    #[test]
    fn test_no_scrape_flag_switches_policy() {
        let args = parse(&["domain-resolve", "example.com", "--no-scrape"]);
        let config =
            build_resolve_config(&args, &EnvConfig::default(), &FileConfig::default()).unwrap();
        assert_eq!(config.scrape_policy, ScrapePolicy::Skip);
    }

    #[test]
    fn test_bad_timeout_is_an_error() {
        let args = parse(&["domain-resolve", "example.com", "--timeout", "soon"]);
        let result = build_resolve_config(&args, &EnvConfig::default(), &FileConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_concurrency_out_of_range_rejected() {
        let args = parse(&["domain-resolve", "example.com", "-c", "500"]);
        let result = build_resolve_config(&args, &EnvConfig::default(), &FileConfig::default());
        assert!(result.is_err());
    }
}
