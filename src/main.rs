use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind};
use enex_archive::config;
use enex_archive::export::{self, ExportError, ExportReport};
use enex_archive::generate::BUILD_VERSION;
use enex_archive::output;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enex-archive")]
#[command(about = "Convert Evernote .enex exports into a static HTML archive")]
#[command(long_about = "\
Convert Evernote .enex exports into a static HTML archive

Every .enex file in the input directory becomes a notebook folder with one
page per note, its attachments under media/, and a contents page. A global
index links all notebooks.

Output structure:

  output/
  ├── index.html                   # All notebooks with note counts
  ├── assets/                      # Theme stylesheets and switcher script
  └── notebooks/
      └── Work_Notes/              # From Work Notes.enex
          ├── index.html           # Notes in archive order
          ├── note_001_Kickoff.html
          └── media/               # Extracted attachments

Configuration is read from --config, or config.toml in the input directory.
Run 'enex-archive gen-config' to generate a documented config.toml.

Exit codes: 2 input not found, 3 input not a directory, 4 no archives found,
1 any other error.")]
#[command(version = BUILD_VERSION)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(flatten)]
    export: ExportArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Directory containing .enex archives
    #[arg(long, short, required = true)]
    input: Option<PathBuf>,

    /// Directory to write the site into
    #[arg(long, short, required = true)]
    output: Option<PathBuf>,

    /// Theme to render with (overrides config)
    #[arg(long)]
    theme: Option<String>,

    /// Config file (default: <input>/config.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log per-archive details
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Command::GenConfig) = cli.command {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    let args = cli.export;
    let (Some(input), Some(output_dir)) = (&args.input, &args.output) else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "--input and --output are required",
            )
            .exit();
    };

    init_logging(args.verbose);

    match run(input, output_dir, &args) {
        Ok(report) => {
            output::print_export_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(input: &Path, output_dir: &Path, args: &ExportArgs) -> Result<ExportReport, ExportError> {
    // The config file may live in the input directory, so check it first.
    export::check_input(input)?;

    let config_path = config::config_path(args.config.as_deref(), input);
    let mut config = config::load_config(config_path.as_deref())?;
    if let Some(theme) = &args.theme {
        config.theme = theme.clone();
        config.validate()?;
    }

    let site = config.site_info(BUILD_VERSION);
    export::export(input, output_dir, &config, &site)
}

/// Logs go to stderr so the summary on stdout stays clean. `RUST_LOG` wins
/// over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}
