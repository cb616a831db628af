//! ntrust - npm Trusted Publisher Manager
//!
//! Usage:
//!   ntrust [files...]           # Trust the inferred CI workflow for every package
//!   ntrust github [files...]    # Same, forcing the GitHub provider
//!   ntrust list [files...]      # Show current trusted publishers
//!   ntrust revoke [files...]    # Revoke all trusted publishers

mod interactive;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ntrust_core::config::{NtrustConfig, global_config_dir, load_merged};
use ntrust_core::error::BatchError;
use ntrust_core::inference::{InferenceOptions, infer_target};
use ntrust_core::reconcile::{TracingObserver, TrustEngine, TrustObserver, TrustOptions};
use ntrust_core::registry::{DEFAULT_TIMEOUT_SECS, NpmCli, npm_managed_by_mise};
use ntrust_core::types::{OperationRecord, Provider, TrustAction};
use ntrust_core::workspace::find_packages;

use crate::interactive::{ConsoleObserver, TerminalPrompter};

#[derive(Parser)]
#[command(name = "ntrust")]
#[command(about = "Manage npm trusted publishers for every package in a workspace", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Package directories or package.json globs (defaults to the workspace packages)
    files: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Trust a GitHub Actions workflow
    Github {
        /// Package directories or package.json globs
        files: Vec<String>,
    },

    /// Trust a GitLab CI pipeline
    Gitlab {
        /// Package directories or package.json globs
        files: Vec<String>,
    },

    /// List trusted publishers
    #[command(alias = "ls")]
    List {
        /// Package directories or package.json globs
        files: Vec<String>,
    },

    /// Revoke every trusted publisher
    Revoke {
        /// Package directories or package.json globs
        files: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// CI provider (inferred from the git remote when omitted)
    #[arg(long, global = true)]
    provider: Option<ProviderArg>,

    /// Repository as owner/name (inferred from the git remote when omitted)
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Workflow file name (inferred from .github/workflows when omitted)
    #[arg(long, global = true)]
    file: Option<String>,

    /// CI environment required by the trusted publisher
    #[arg(long, global = true)]
    env: Option<String>,

    /// Registry URL passed to npm
    #[arg(long, global = true)]
    registry: Option<String>,

    /// Run npm through `mise exec npm@^11.10.0`
    #[arg(long, global = true)]
    mise: bool,

    /// Print the npm commands without changing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Skip all confirmation prompts (for CI/CD)
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    /// Print the operation records as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProviderArg {
    Github,
    Gitlab,
}

impl From<ProviderArg> for Provider {
    fn from(value: ProviderArg) -> Self {
        match value {
            ProviderArg::Github => Provider::GitHub,
            ProviderArg::Gitlab => Provider::GitLab,
        }
    }
}

/// What a run does, once subcommand and positional files are folded together.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Apply(Option<Provider>),
    List,
    Revoke,
}

impl Cli {
    fn into_action(self) -> (Action, Vec<String>, GlobalArgs) {
        let provider = self.global.provider.map(Provider::from);
        let (action, files) = match self.command {
            None => (Action::Apply(provider), self.files),
            Some(Commands::Github { files }) => (Action::Apply(Some(Provider::GitHub)), files),
            Some(Commands::Gitlab { files }) => (Action::Apply(Some(Provider::GitLab)), files),
            Some(Commands::List { files }) => (Action::List, files),
            Some(Commands::Revoke { files }) => (Action::Revoke, files),
        };
        (action, files, self.global)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let (action, files, args) = cli.into_action();
    run(action, files, args)
}

fn run(action: Action, files: Vec<String>, args: GlobalArgs) -> Result<()> {
    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine working directory")?,
    };

    let config = resolve_config(&args, &dir)?;

    let packages = find_packages(&dir, &files)?;
    if packages.is_empty() {
        anyhow::bail!("No publishable packages found in {}", dir.display());
    }
    tracing::debug!(count = packages.len(), "discovered packages");

    let mise = config.mise.unwrap_or_else(npm_managed_by_mise);
    let npm = NpmCli::new()?
        .with_cwd(&dir)
        .with_mise(mise)
        .with_stdout_to_stderr(args.json)
        .with_timeout(Duration::from_secs(
            config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        ));

    let mut options = TrustOptions::new()
        .with_dry_run(args.dry_run)
        .with_yes(args.yes);
    if let Some(env) = &config.env {
        options = options.with_env(env);
    }
    if let Some(registry) = &config.registry {
        options = options.with_registry(registry);
    }

    let prompter = TerminalPrompter::new();
    let console = ConsoleObserver::new();
    let observer: &dyn TrustObserver = if args.json { &TracingObserver } else { &console };
    let engine = TrustEngine::new(&npm, &prompter).with_observer(observer);

    let result = match action {
        Action::Apply(provider) => {
            let mut inference = InferenceOptions::new().with_dir(&dir);
            if let Some(provider) = provider.or(config.provider) {
                inference = inference.with_provider(provider);
            }
            if let Some(repo) = &config.repo {
                inference = inference.with_repo(repo);
            }
            if let Some(file) = &config.file {
                inference = inference.with_file(file);
            }
            let desired = infer_target(&inference)?;
            engine.apply(&packages, &desired, &options)
        }
        Action::List => engine.list(&packages, &options),
        Action::Revoke => engine.revoke_all(&packages, &options),
    };

    match result {
        Ok(records) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_summary(&action, &records);
            }
            Ok(())
        }
        Err(err) => {
            if args.json {
                print_failure_json(&err)?;
            } else if !err.records.is_empty() {
                print_partial(&err.records);
            }
            Err(err.into())
        }
    }
}

/// Global config, then project config, then command-line flags.
fn resolve_config(args: &GlobalArgs, dir: &std::path::Path) -> Result<NtrustConfig> {
    let global_dir = global_config_dir()
        .inspect_err(|e| tracing::debug!(error = %e, "skipping global config"))
        .ok();
    let config = load_merged(global_dir.as_deref(), dir)?;

    let flags = NtrustConfig {
        provider: args.provider.map(Provider::from),
        repo: args.repo.clone(),
        file: args.file.clone(),
        env: args.env.clone(),
        registry: args.registry.clone(),
        mise: args.mise.then_some(true),
        timeout_secs: None,
    };
    flags.validate()?;

    Ok(config.merge(flags))
}

fn print_summary(action: &Action, records: &[OperationRecord]) {
    match action {
        Action::List => {
            for record in records {
                if record.is_dry_run() {
                    continue;
                }
                if record.existing.is_empty() {
                    println!(
                        "{}  {}",
                        style(&record.package).bold(),
                        style("no trusted publisher").dim()
                    );
                }
                for binding in &record.existing {
                    println!(
                        "{}  {} {} ({}) [{}]",
                        style(&record.package).bold(),
                        binding.kind,
                        binding.repository,
                        binding.pipeline_file,
                        style(&binding.id).dim()
                    );
                }
            }
        }
        Action::Apply(_) | Action::Revoke => {
            let count = |action: TrustAction| {
                records
                    .iter()
                    .filter(|r| r.action == action && !r.is_dry_run())
                    .count()
            };
            let created = count(TrustAction::Create);
            let revoked = count(TrustAction::Revoke);
            if records.iter().any(OperationRecord::is_dry_run) {
                println!("{}", style("Dry run: no changes were made.").yellow());
            } else if created == 0 && revoked == 0 {
                println!("{}", style("Nothing to change.").green());
            } else {
                println!(
                    "{} {} created, {} revoked",
                    style("Done:").green().bold(),
                    created,
                    revoked
                );
            }
        }
    }
}

fn print_partial(records: &[OperationRecord]) {
    eprintln!("{}", style("Completed before the failure:").yellow());
    for record in records {
        eprintln!(
            "  {} {}  {}",
            record.action,
            record.package,
            record.command.join(" ")
        );
    }
}

fn print_failure_json(err: &BatchError) -> Result<()> {
    let output = serde_json::json!({
        "error": err.to_string(),
        "cause": err.source.to_string(),
        "package": err.package,
        "records": err.records,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
