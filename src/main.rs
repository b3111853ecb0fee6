use std::sync::Arc;

use clap::{Parser, Subcommand};
use gerrit_flow::audit::AuditLogger;
use gerrit_flow::config::Config;
use gerrit_flow::error::{AppError, AppResult};
use gerrit_flow::error_translation::ErrorTranslator;
use gerrit_flow::gerrit::{GerritError, Ref, RestGerritClient, RevisionSession};
use gerrit_flow::git::{
    CommandRunner, FileStatus, GitFacade, GitVersion, default_runner, discover_root,
};
use gerrit_flow::status::FileStatusAggregator;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gflow")]
#[command(version)]
#[command(about = "Gerrit review workflows on top of git")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current change and the working tree status
    Status,

    /// Stage a file
    Stage { path: String },

    /// Unstage a file
    Unstage { path: String },

    /// Discard working tree changes to a file
    Discard { path: String },

    /// Commit the staged changes
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Amend the previous commit, keeping its message
        #[arg(long)]
        amend: bool,
    },

    /// Fetch and check out a remote branch
    CheckoutBranch { name: String },

    /// Fetch and check out a change (latest patch set unless given)
    Checkout { change: u64, patchset: Option<u32> },

    /// Fetch and cherry-pick a change (latest patch set unless given)
    CherryPick { change: u64, patchset: Option<u32> },

    /// Push HEAD for review on a branch
    Push { branch: String },

    /// Fetch and rebase onto a remote branch
    Rebase { branch: String },

    /// Continue a cherry-pick or rebase after resolving conflicts
    Continue,

    /// Abort a stopped cherry-pick or rebase
    Abort,

    /// Show a commit, counting back from HEAD
    Log {
        #[arg(default_value_t = 0)]
        skip: usize,
    },

    /// List open changes of the project
    Changes {
        /// Maximum number of changes
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },
}

fn setup_logging(level: &str, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load config before logging so the configured level applies
    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    setup_logging(&config.logging.level, cli.debug);

    if let Err(e) = run(cli.command, config).await {
        let friendly = ErrorTranslator::translate_app_error(&e);
        eprintln!("Error: {}", friendly.simple_message);
        if let Some(suggestion) = friendly.suggestion {
            eprintln!("Hint: {}", suggestion);
        }
        debug!("{}", friendly.raw_error);
        std::process::exit(1);
    }
}

async fn build_session(config: &Config) -> AppResult<RevisionSession> {
    let runner: Arc<dyn CommandRunner> = Arc::new(default_runner());
    let version = GitVersion::validate(runner.as_ref(), &config.git.binary).await?;
    debug!("Git version: {}", version);

    let root = discover_root(std::env::current_dir()?)?;
    let mut git = GitFacade::with_runner(root, runner).with_binary(&config.git.binary);
    if config.logging.audit_log {
        match AuditLogger::new() {
            Ok(audit) => git = git.with_audit(audit),
            Err(e) => warn!("Audit log disabled: {}", e),
        }
    }

    let git = Arc::new(git);
    git.detect_conflict_state().await?;

    let files = Arc::new(FileStatusAggregator::new(Arc::clone(&git)));
    let gerrit = Arc::new(RestGerritClient::new(&config.gerrit)?);

    Ok(RevisionSession::new(git, files, gerrit)
        .with_remote(&config.git.remote)
        .with_project(&config.gerrit.project))
}

async fn run(command: Commands, config: Config) -> AppResult<()> {
    let session = build_session(&config).await?;
    let git = Arc::clone(session.git());

    match command {
        Commands::Status => status(&session).await?,
        Commands::Stage { path } => print_output(&git.stage(&path).await?),
        Commands::Unstage { path } => print_output(&git.reset(&path, false).await?),
        Commands::Discard { path } => print_output(&git.clean(&path).await?),
        Commands::Commit { message, amend } => {
            print_output(&git.commit(message.as_deref(), amend).await?)
        }
        Commands::CheckoutBranch { name } => print_output(&session.checkout_branch(&name).await?),
        Commands::Checkout { change, patchset } => {
            let reference = resolve_ref(&session, change, patchset).await?;
            print_output(&session.checkout_ref(reference).await?);
            println!("Checked out {}", reference);
        }
        Commands::CherryPick { change, patchset } => {
            let reference = resolve_ref(&session, change, patchset).await?;
            print_output(&session.cherrypick_ref(reference).await?);
            println!("Cherry-picked {}", reference);
        }
        Commands::Push { branch } => print_output(&session.push(&branch).await?),
        Commands::Rebase { branch } => print_output(&session.rebase(&branch).await?),
        Commands::Continue => {
            let state = session.state().await;
            let output = if state.cherry_pick_in_progress {
                session.cherrypick_continue().await?
            } else {
                session.rebase_continue().await?
            };
            match output {
                Some(output) => print_output(&output),
                None => println!("Nothing to continue"),
            }
        }
        Commands::Abort => {
            let state = session.state().await;
            let output = if state.cherry_pick_in_progress {
                session.cherrypick_abort().await?
            } else {
                session.rebase_abort().await?
            };
            match output {
                Some(_) => println!("Aborted"),
                None => println!("Nothing to abort"),
            }
        }
        Commands::Log { skip } => {
            let log = git.log(skip).await?;
            println!("commit {}", log.commit);
            println!("Author: {} <{}>", log.author.name, log.author.email);
            println!("Date:   {}", log.date);
            println!();
            for line in log.comment.lines() {
                println!("    {}", line);
            }
            if let Some(change_id) = log.change_id {
                println!();
                println!("    Change-Id: {}", change_id);
            }
        }
        Commands::Changes { limit } => {
            for change in session.open_changes(limit).await? {
                println!("{:>8}  {:<12} {}", change.number, change.branch, change.subject);
            }
        }
    }

    Ok(())
}

async fn status(session: &RevisionSession) -> AppResult<()> {
    match session.sync_from_head().await {
        Ok(_) | Err(AppError::Gerrit(GerritError::HostNotConfigured)) => {}
        Err(e) => warn!("Could not look up the change at HEAD: {}", e),
    }

    let state = session.state().await;
    if let Some(branch) = &state.current_branch {
        println!("Branch: {}", branch);
    }
    if let Some(reference) = state.current_ref {
        println!("Change: {}", reference);
    }
    if state.cherry_pick_in_progress {
        println!("Cherry-pick stopped on conflicts");
    }
    if state.rebase_in_progress {
        println!("Rebase stopped on conflicts");
    }

    let snapshot = session.files().refresh().await?;
    if snapshot.is_empty() {
        println!("Working tree clean");
        return Ok(());
    }

    let statuses = [
        FileStatus::Staged,
        FileStatus::Modified,
        FileStatus::Deleted,
        FileStatus::Untracked,
    ];
    for entry in snapshot.filter(&statuses) {
        println!("{:>12}  {}", entry.description(), entry.path);
    }
    Ok(())
}

/// Use the given patch set, or ask Gerrit for the latest one
async fn resolve_ref(session: &RevisionSession, change: u64, patchset: Option<u32>) -> AppResult<Ref> {
    if let Some(patchset) = patchset {
        return Ok(Ref::new(change, patchset));
    }

    match session.patchsets(change).await {
        Ok(patchsets) => Ok(patchsets.first().copied().unwrap_or_else(|| Ref::from_change(change))),
        Err(AppError::Gerrit(GerritError::HostNotConfigured)) => {
            warn!("No Gerrit host configured; using patch set 1 of {}", change);
            Ok(Ref::from_change(change))
        }
        Err(e) => Err(e),
    }
}

fn print_output(output: &str) {
    let output = output.trim_end();
    if !output.is_empty() {
        println!("{}", output);
    }
}
