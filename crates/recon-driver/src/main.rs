//! `recon` command-line interface

use anyhow::Context as _;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use recon_driver::conformance::run_conformance;
use recon_driver::{
    build_reconciler, AppConfig, Collaborators, DriverKind, ValidatedWorkflow,
};
use recon_engine::SystemClock;
use recon_model::UserRecord;
use recon_store::{ExternalUserSource, MemoryUserStore, StaticUserSource};
use recon_test_utils::fixture_table;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("recon")
        .version(recon_driver::VERSION)
        .about("Reconcile stored user records against an external source of truth")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Reconcile one or more lookup keys against an in-memory store")
                .arg(
                    Arg::new("keys")
                        .required(true)
                        .num_args(1..)
                        .help("Lookup keys to reconcile, one reconciliation each"),
                )
                .arg(
                    Arg::new("api-url")
                        .long("api-url")
                        .help("External source base URL (overrides config and RECON_API_URL)"),
                )
                .arg(
                    Arg::new("source-file")
                        .long("source-file")
                        .value_parser(value_parser!(PathBuf))
                        .conflicts_with("api-url")
                        .help("JSON object of lookupKey -> {userId, name} used instead of HTTP"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of user records to preload into the store"),
                )
                .arg(
                    Arg::new("driver")
                        .long("driver")
                        .value_parser(["sequential", "workflow"])
                        .help("Driver realization (defaults to the configured one)"),
                )
                .arg(
                    Arg::new("dump")
                        .long("dump")
                        .action(ArgAction::SetTrue)
                        .help("Print the final store contents"),
                ),
        )
        .subcommand(
            Command::new("conformance")
                .about("Run the fixture table through both drivers and compare"),
        )
        .subcommand(Command::new("workflow").about("Print the standard workflow definition as JSON"))
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

async fn reconcile(mut config: AppConfig, args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let kind = match args.get_one::<String>("driver") {
        Some(name) => name.parse::<DriverKind>()?,
        None => config.driver,
    };

    let source: Arc<dyn ExternalUserSource> = match args.get_one::<PathBuf>("source-file") {
        Some(path) => Arc::new(StaticUserSource::from_json(&read(path)?)?),
        None => {
            if let Some(url) = args.get_one::<String>("api-url") {
                config.source.api_url.clone_from(url);
            }
            Arc::new(config.http_source()?)
        }
    };

    let store = Arc::new(match args.get_one::<PathBuf>("seed") {
        Some(path) => {
            let records: Vec<UserRecord> = serde_json::from_str(&read(path)?)
                .with_context(|| format!("invalid seed file {}", path.display()))?;
            MemoryUserStore::from_records(records)
        }
        None => MemoryUserStore::new(),
    });
    tracing::info!(table = %config.table_name, driver = %kind, records = store.len(), "store ready");

    let reconciler = build_reconciler(
        kind,
        Collaborators::new(source, store.clone()),
        Arc::new(SystemClock),
        &config.engine,
    )?;

    let mut failed = false;
    for key in args.get_many::<String>("keys").into_iter().flatten() {
        let response = reconciler.handle(key).await;
        failed |= !response.is_success();
        println!("{}", serde_json::to_string(&response)?);
    }

    if args.get_flag("dump") {
        println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

async fn conformance(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let report = run_conformance(&fixture_table(), &config.engine).await?;
    println!("{}", report.generate_text());
    Ok(if report.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("json"));

    let config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("reconcile", args)) => reconcile(config, args).await,
        Some(("conformance", _)) => conformance(&config).await,
        Some(("workflow", _)) => {
            println!("{}", serde_json::to_string_pretty(&ValidatedWorkflow::standard()?)?);
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}
