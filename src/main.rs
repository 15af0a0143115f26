use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Layer as _;
use vcsutils::ops::runner::ProcessRunner;
use vcsutils::registry;
use vcsutils::Action;
use vcsutils::ActionArgs;
use vcsutils::App;
use vcsutils::Config;
use vcsutils::OutputFormat;
use vcsutils::Repository;

/// Environment variable holding the log filter.
const LOG_VAR: &str = "VCS_LOG";

#[derive(Parser)]
#[command(name = "vcs")]
#[command(about = "Run the same actions on Git, Mercurial, Bazaar and Darcs working copies", long_about = None)]
pub struct Cli {
    /// Action(s) to perform, in order
    #[arg(value_name = "ACTION")]
    pub actions: Vec<Action>,

    /// Paths for add, remove and move
    #[arg(last = true, value_name = "PATH")]
    pub paths: Vec<String>,

    /// The working directory (defaults to the current directory)
    #[arg(short = 'D', long)]
    pub directory: Option<PathBuf>,

    /// Target for export and archive (defaults to ./<repository name>)
    #[arg(short = 'd', long)]
    pub output_directory: Option<PathBuf>,

    /// The commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Where to clone from
    #[arg(short, long)]
    pub source: Option<String>,

    /// Backend to use when the directory is not a repository yet (init, clone)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub type_id: Option<String>,

    /// Apply the actions to every repository under the directory
    #[arg(short, long)]
    pub recursive: bool,

    /// Operate on the root of the enclosing repository
    #[arg(long)]
    pub root: bool,

    /// Print results as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Kill external commands after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Change the process directory around each spawn
    #[arg(long)]
    pub scoped_cwd: bool,
}

impl Cli {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// The backend hint, honoured only when an action creates the working copy.
    fn type_hint(&self) -> Option<&str> {
        if self.actions.iter().any(|a| a.creates_repository()) {
            self.type_id.as_deref()
        } else {
            None
        }
    }

    fn action_args(&self, output_directory: PathBuf) -> ActionArgs {
        ActionArgs {
            paths: self.paths.clone(),
            message: self.message.clone(),
            output_directory: Some(output_directory),
            source: self.source.clone(),
        }
    }
}

fn setup_logging() -> Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let format = tracing_subscriber::fmt::format().with_timer(timer);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_VAR)
        .from_env()?;
    let subscriber = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(subscriber).init();
    Ok(())
}

fn header(repo: &Repository, stdout: &mut impl Write) -> Result<()> {
    let title = format!("{} ({})", repo.directory().display(), repo.type_id());
    writeln!(stdout, "{}", title.bold().blue())?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging()?;

    let mut config = Config::load()?;
    if let Some(secs) = cli.timeout {
        config.timeout = Some(Duration::from_secs(secs));
    }
    config.scoped_cwd |= cli.scoped_cwd;

    let registry = registry::init_global(&config);
    let app = App::new(
        registry,
        ProcessRunner::new(config.timeout, config.scoped_cwd),
    );

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    // Listing actions needs no repository.
    if !cli.actions.is_empty() && cli.actions.iter().all(|a| *a == Action::Actions) {
        for name in Action::names() {
            writeln!(stdout, "{}", name)?;
        }
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let mut directory = std::path::absolute(cli.directory.as_deref().unwrap_or(cwd.as_path()))?;
    if cli.root {
        directory = app
            .root(&directory)
            .with_context(|| format!("No repository at or above {}", directory.display()))?;
        if cli.actions.is_empty() {
            writeln!(stdout, "{}", directory.display())?;
            return Ok(());
        }
    }

    let output_root = |repo: &Repository| -> Result<PathBuf> {
        let base = match &cli.output_directory {
            Some(dir) if !cli.recursive => return Ok(std::path::absolute(dir)?),
            Some(dir) => dir.as_path(),
            None => cwd.as_path(),
        };
        Ok(std::path::absolute(base.join(repo.name()))?)
    };

    let ok = if cli.recursive {
        run_recursive(&app, &cli, &directory, &output_root, &mut stdout, &mut stderr).await?
    } else {
        let repo = app.open(&directory, cli.type_hint())?;
        let args = cli.action_args(output_root(&repo)?);
        app.run_actions(&repo, &cli.actions, &args, cli.format(), &mut stdout, &mut stderr)
            .await?
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_recursive(
    app: &App<'_, ProcessRunner>,
    cli: &Cli,
    directory: &Path,
    output_root: &impl Fn(&Repository) -> Result<PathBuf>,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Result<bool> {
    let mut ok = true;
    for repo in app.find(directory) {
        if cli.format() == OutputFormat::Text {
            header(&repo, stdout)?;
        }
        let args = cli.action_args(output_root(&repo)?);
        match app
            .run_actions(&repo, &cli.actions, &args, cli.format(), stdout, stderr)
            .await
        {
            Ok(success) => ok &= success,
            Err(e) => {
                writeln!(stderr, "{}: {}", "error".red(), e)?;
                ok = false;
            }
        }
    }
    Ok(ok)
}
