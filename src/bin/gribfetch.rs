use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use gribfetch::app::{FetchOptions, FileFinder, FinderOptions};
use gribfetch::config::Config;
use gribfetch::domain::{RunSpec, SourceId, parse_datetime};
use gribfetch::error::FetchError;
use gribfetch::fetch::ErrorMode;
use gribfetch::model::ModelRegistry;
use gribfetch::output::{ConsoleProgress, JsonOutput, ModelsResult};
use gribfetch::remote::HttpClient;

#[derive(Parser)]
#[command(name = "gribfetch")]
#[command(
    about = "Find and download numerical weather model GRIB2 output from cloud and government archives"
)]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download a GRIB2 file, optionally subset by a search pattern")]
    Fetch(FetchArgs),
    #[command(about = "Print the parsed index table for a run")]
    Index(IndexArgs),
    #[command(about = "Probe the configured sources for a run")]
    Sources(SourcesArgs),
    #[command(about = "List registered models and their products")]
    Models,
}

#[derive(Args, Clone)]
struct RunArgs {
    model: String,

    #[arg(long, help = "Model initialization time, e.g. \"2022-01-26 00:00\"")]
    date: Option<String>,

    #[arg(long, help = "Model valid time; alternative to --date")]
    valid_date: Option<String>,

    #[arg(long, default_value_t = 0, help = "Forecast lead time in hours")]
    fxx: u32,

    #[arg(long, help = "Product code; defaults to the model's first product")]
    product: Option<String>,

    #[arg(long, default_value_t = 1)]
    member: u32,

    #[arg(long, value_delimiter = ',', help = "Source priority order, e.g. aws,google")]
    priority: Option<Vec<String>>,

    #[arg(long)]
    save_dir: Option<String>,

    #[arg(long)]
    overwrite: bool,
}

#[derive(Args, Clone)]
struct FetchArgs {
    #[command(flatten)]
    run: RunArgs,

    #[arg(long, help = "Regex over variable:level:forecast_time index columns")]
    search: Option<String>,

    #[arg(long, value_enum, default_value_t = ErrorMode::Warn)]
    errors: ErrorMode,
}

#[derive(Args, Clone)]
struct IndexArgs {
    #[command(flatten)]
    run: RunArgs,

    #[arg(long)]
    search: Option<String>,
}

#[derive(Args, Clone)]
struct SourcesArgs {
    #[command(flatten)]
    run: RunArgs,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(fetch) = report.downcast_ref::<FetchError>() {
            return ExitCode::from(map_exit_code(fetch));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::GribNotFound(_) | FetchError::IdxNotFound(_) => 2,
        FetchError::Http(_) | FetchError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).into_diagnostic()?;
    let registry = ModelRegistry::builtin();

    match cli.command {
        Commands::Fetch(args) => {
            let finder = build_finder(&args.run, &registry, &config)?;
            let options = FetchOptions {
                overwrite: args.run.overwrite,
                errors: args.errors,
            };
            let result = finder
                .download(args.search.as_deref(), options, &ConsoleProgress)
                .into_diagnostic()?;
            JsonOutput::print_download(&result).into_diagnostic()?;
        }
        Commands::Index(args) => {
            let finder = build_finder(&args.run, &registry, &config)?;
            let table = finder
                .read_index(args.search.as_deref())
                .into_diagnostic()?;
            JsonOutput::print_index(&table).into_diagnostic()?;
        }
        Commands::Sources(args) => {
            let finder = build_finder(&args.run, &registry, &config)?;
            JsonOutput::print_sources(&finder.resolution().summary()).into_diagnostic()?;
        }
        Commands::Models => {
            JsonOutput::print_models(&ModelsResult::from_registry(&registry)).into_diagnostic()?;
        }
    }
    Ok(())
}

fn build_finder<'a>(
    args: &RunArgs,
    registry: &'a ModelRegistry,
    config: &Config,
) -> miette::Result<FileFinder<'a, HttpClient>> {
    let spec = RunSpec {
        date: args
            .date
            .as_deref()
            .map(parse_datetime)
            .transpose()
            .into_diagnostic()?,
        valid_date: args
            .valid_date
            .as_deref()
            .map(parse_datetime)
            .transpose()
            .into_diagnostic()?,
        model: args.model.clone(),
        fxx: args.fxx,
        product: args.product.clone(),
        member: args.member,
    };
    let priority = args
        .priority
        .as_ref()
        .map(|list| {
            list.iter()
                .map(|name| name.parse::<SourceId>())
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
        .into_diagnostic()?;
    let options = FinderOptions {
        priority,
        save_dir: args.save_dir.clone().map(Utf8PathBuf::from),
        overwrite: args.overwrite,
    };
    let client = HttpClient::new().into_diagnostic()?;
    FileFinder::new(spec, registry, config, client, options).into_diagnostic()
}
