use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use segfix::deliver::{DeliveryError, HttpSink};
use segfix::{Config, Envelope, Outcome, Payload, SegfixError};
use tracing_subscriber::EnvFilter;

/// Recompile a stored segment rule and push the fixed logic to the filter
/// update API.
#[derive(Debug, Parser)]
#[command(name = "segfix", version)]
struct Args {
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    site_id: u64,

    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    list_id: u64,

    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    rule_id: u64,

    /// Rule name as stored with the rule.
    #[arg(long)]
    name: String,

    /// File holding the stored rule markup, or `-` for stdin.
    #[arg(long)]
    rule: PathBuf,

    /// Delivery configuration (TOML).
    #[arg(long, default_value = "segfix.toml")]
    config: PathBuf,

    /// Print the payload instead of delivering it.
    #[arg(long)]
    dry_run: bool,
}

fn read_rule(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        std::fs::read_to_string(path)
    }
}

fn run(args: Args) -> Result<(), SegfixError> {
    let envelope = Envelope::new(args.site_id, args.list_id, args.rule_id, args.name);
    let raw = read_rule(&args.rule)?;

    if args.dry_run {
        if segfix::is_already_fixed(&raw) {
            println!("rule {} already fixed", envelope.rule_id);
        } else {
            println!("{}", Payload::compile(&raw, &envelope)?);
        }
        return Ok(());
    }

    let config = Config::from_file(&args.config)?;
    let sink = HttpSink::new(&config)?;
    let outcome = segfix::fix(&raw, &envelope, &config.api_key, &sink).inspect_err(|err| {
        if let SegfixError::Delivery(delivery) = err {
            print_response(delivery);
        }
    })?;
    match outcome {
        Outcome::AlreadyFixed => println!(
            "RULE_ID: {}\nRULE_NAME: {}\nalready fixed or relational attribute was not used here",
            envelope.rule_id, envelope.rule_name
        ),
        Outcome::Delivered { response, .. } => println!("{response}"),
    }
    Ok(())
}

/// Echo what the endpoint answered even when it refused the update.
fn print_response(err: &DeliveryError) {
    if let Some(body) = err.response_body() {
        println!("{body}");
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
