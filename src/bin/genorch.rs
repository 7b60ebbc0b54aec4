//! genorch — drive the generation service from the command line.
//!
//! Usage:
//!   genorch generate --user <id> [--activity <type>] [--json] <prompt>
//!   genorch speak [--voice <v>] [--lang <l>] [--format <f>] --out <file> <text>
//!   genorch quota <user>
//!   genorch check-config
//!
//! Every command accepts `--config <path>` (default: `$GENORCH_CONFIG` or
//! `genorch.yaml`).

use ai_gen_orchestrator::prelude::*;
use anyhow::{anyhow, bail, Context};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let rest = &args[2..];
    let outcome = match args[1].as_str() {
        "generate" => cmd_generate(rest).await,
        "speak" => cmd_speak(rest).await,
        "quota" => cmd_quota(rest).await,
        "check-config" => cmd_check_config(rest),
        "version" | "--version" | "-V" => {
            println!("genorch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"genorch — AI generation orchestrator

USAGE:
    genorch <COMMAND> [OPTIONS]

COMMANDS:
    generate --user <id> [--activity <type>] [--items <n>] [--json] <prompt>
    speak [--user <id>] [--voice <v>] [--lang <l>] [--format <f>] --out <file> <text>
    quota <user>
    check-config
    version
    help

OPTIONS:
    --config <path>     Configuration file (default: $GENORCH_CONFIG or genorch.yaml)

ENVIRONMENT:
    RUST_LOG                  Log filter (e.g. ai_gen_orchestrator=debug)
    AI_GENERATION_ENABLED     Master switch for provider calls"#
    );
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Arguments that are neither flags nor flag values, joined by spaces.
fn positional(args: &[String], valued_flags: &[&str]) -> String {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if valued_flags.contains(&arg.as_str()) {
            skip = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.as_str());
    }
    out.join(" ")
}

fn config_path(args: &[String]) -> PathBuf {
    flag_value(args, "--config")
        .map(PathBuf::from)
        .or_else(|| std::env::var("GENORCH_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("genorch.yaml"))
}

fn load_service(args: &[String]) -> anyhow::Result<GenerationService> {
    let path = config_path(args);
    let config = OrchestratorConfig::load(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    Ok(GenerationService::from_config(&config)?)
}

async fn cmd_generate(args: &[String]) -> anyhow::Result<()> {
    let valued = ["--config", "--user", "--activity", "--items"];
    let prompt = positional(args, &valued);
    if prompt.is_empty() {
        bail!("generate needs a prompt");
    }
    let user = flag_value(args, "--user").ok_or_else(|| anyhow!("--user is required"))?;
    let service = load_service(args)?;

    let mut request = TextRequest::new(user, prompt);
    if let Some(activity) = flag_value(args, "--activity") {
        request = request.activity(activity);
    }
    if let Some(items) = flag_value(args, "--items") {
        request = request.items(items.parse().context("--items must be a number")?);
    }

    if has_flag(args, "--json") {
        let schema = serde_json::json!({ "type": "object" });
        let structured = service.generate_structured(&request, &schema).await?;
        println!("{}", serde_json::to_string_pretty(&structured.value)?);
        report(&structured.result);
    } else {
        let result = service.generate(&request).await?;
        println!("{}", result.content);
        report(&result);
    }
    Ok(())
}

fn report(result: &GenerationResult) {
    eprintln!(
        "[{} / {}] {} tokens, ${:.6}, {} ms",
        result.provider,
        result.model,
        result.usage.total_tokens(),
        result.usage.estimated_cost_usd(),
        result.latency_ms
    );
}

async fn cmd_speak(args: &[String]) -> anyhow::Result<()> {
    let valued = ["--config", "--user", "--voice", "--lang", "--format", "--out"];
    let text = positional(args, &valued);
    if text.is_empty() {
        bail!("speak needs text");
    }
    let out = flag_value(args, "--out").ok_or_else(|| anyhow!("--out is required"))?;
    let format = match flag_value(args, "--format") {
        Some(f) => AudioFormat::from_str(f)?,
        None => AudioFormat::default(),
    };
    let options = SpeechOptions::new(
        flag_value(args, "--lang").unwrap_or("en"),
        flag_value(args, "--voice").unwrap_or(""),
    )
    .with_format(format);

    let service = load_service(args)?;
    let mut request = SpeechRequest::new(text, options);
    if let Some(user) = flag_value(args, "--user") {
        request = request.user(user);
    }
    let result = service.synthesize(&request).await?;
    std::fs::write(out, &result.audio).with_context(|| format!("writing {out}"))?;
    eprintln!(
        "[{}] {} bytes of {}, {} chars, ${:.6}, {} ms",
        result.provider,
        result.audio.len(),
        result.format,
        result.characters,
        result.estimated_cost_usd,
        result.latency_ms
    );
    Ok(())
}

async fn cmd_quota(args: &[String]) -> anyhow::Result<()> {
    let user = positional(args, &["--config"]);
    if user.is_empty() {
        bail!("quota needs a user id");
    }
    let service = load_service(args)?;
    let info = service.quota_info(&user).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn cmd_check_config(args: &[String]) -> anyhow::Result<()> {
    let path = config_path(args);
    let config = OrchestratorConfig::load(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    let service = GenerationService::from_config(&config)?;

    println!("Configuration: {}", path.display());
    println!("Generation enabled: {}", config.generation_enabled);
    println!(
        "Quota: {} per request, {} per day",
        config.quota.per_request_limit, config.quota.daily_limit
    );
    println!(
        "Audio cache: {} (ttl {}s)",
        if config.cache.enabled { "on" } else { "off" },
        config.cache.default_ttl().as_secs_f64()
    );

    let mut missing = 0;
    for (label, order) in [("text", config.text.order()), ("speech", config.speech.order())] {
        println!("\n=== {label} providers ===");
        for id in order {
            let available = match label {
                "text" => service.text().provider(&id).map(|p| p.is_available()),
                _ => service.speech().provider(&id).map(|p| p.is_available()),
            };
            match available {
                Some(true) => println!("  ✓ {id}"),
                Some(false) => {
                    missing += 1;
                    println!("  ✗ {id} (no credentials)");
                }
                None => {
                    missing += 1;
                    println!("  ✗ {id} (not configured)");
                }
            }
        }
    }

    if missing > 0 {
        bail!("{missing} provider(s) unusable");
    }
    Ok(())
}
