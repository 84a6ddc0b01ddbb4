use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use submeta_validator::assembly::NcbiAssemblyClient;
use submeta_validator::depot::{self, DepositBox};
use submeta_validator::output::{self, JsonOutput};
use submeta_validator::schema::Schema;
use submeta_validator::taxonomy::EnsemblTaxonomyClient;
use submeta_validator::validator::{SubmissionValidator, ValidateOptions};
use submeta_validator::workbook::Workbook;

#[derive(Parser)]
#[command(name = "submeta")]
#[command(about = "Validate biological-sample submission metadata before archival")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Validate a metadata workbook")]
    Validate(ValidateArgs),
    #[command(about = "Inspect FTP deposit boxes")]
    Inspect(InspectArgs),
}

#[derive(Args)]
struct ValidateArgs {
    metadata: Utf8PathBuf,

    /// Schema file; the built-in submission schema is used when omitted.
    #[arg(long)]
    schema: Option<Utf8PathBuf>,

    /// Report case-only scientific-name discrepancies without rewriting
    /// the workbook.
    #[arg(long)]
    no_correct: bool,
}

#[derive(Args)]
struct InspectArgs {
    root: Utf8PathBuf,

    #[arg(long)]
    user: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => run_validate(args, cli.json),
        Commands::Inspect(args) => run_inspect(args, cli.json),
    }
}

fn run_validate(args: ValidateArgs, json: bool) -> miette::Result<ExitCode> {
    let schema = match &args.schema {
        Some(path) => Schema::load(path).into_diagnostic()?,
        None => Schema::embedded().into_diagnostic()?,
    };
    let mut workbook = Workbook::load(&args.metadata).into_diagnostic()?;

    let assembly = NcbiAssemblyClient::new().into_diagnostic()?;
    let taxonomy = EnsemblTaxonomyClient::new().into_diagnostic()?;
    let validator = SubmissionValidator::new(assembly, taxonomy);

    let options = ValidateOptions {
        correct: !args.no_correct,
    };
    let report = validator
        .validate(&mut workbook, &schema, options)
        .into_diagnostic()?;

    if json {
        JsonOutput::print_report(&report).into_diagnostic()?;
    } else {
        output::print_report_text(&report);
    }

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn run_inspect(args: InspectArgs, json: bool) -> miette::Result<ExitCode> {
    let summaries = match &args.user {
        Some(username) => {
            let box_ = DepositBox::explore(&args.root, username).into_diagnostic()?;
            vec![box_.summary()]
        }
        None => depot::inspect_all_users(&args.root).into_diagnostic()?,
    };

    if json {
        JsonOutput::print_summaries(&summaries).into_diagnostic()?;
    } else {
        output::print_summaries_text(&summaries);
    }
    Ok(ExitCode::SUCCESS)
}
