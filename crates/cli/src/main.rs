mod commands;
mod manifest;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pagegen")]
#[command(version, about = "Per-page renderer generator for CMS-backed static sites", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Scaffold a new site
    Init {
        /// Path of the site directory
        path: PathBuf,

        /// GraphQL endpoint of the CMS
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Validate configuration, component fragments and templates
    Validate {
        /// Path to site directory
        path: PathBuf,
    },

    /// Generate page renderers and the page manifest
    Build {
        /// Path to site directory
        path: PathBuf,

        /// Import every known component into every renderer
        #[arg(long)]
        all_components: bool,
    },

    /// Build, then regenerate on fragment and skeleton changes
    Develop {
        /// Path to site directory
        path: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("pagegen={level},pagegen_core={level},pagegen_source={level},pagegen_generator={level},reqwest=warn,hyper=warn"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Init { path, endpoint } => commands::init::run(path, endpoint).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Build {
            path,
            all_components,
        } => commands::build::run(path, all_components).await,
        Command::Develop { path } => commands::develop::run(path).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "pagegen", &mut io::stdout());
            Ok(())
        }
    }
}
