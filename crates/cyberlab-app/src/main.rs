//! cyberlab entry point.
//!
//! `play` opens a challenge in the full-screen terminal, `run` executes
//! command lines non-interactively, `list` shows the catalog, and `serve`
//! starts the flag validation endpoint.

mod host;
mod tui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use cyberlab_flags::{
    AnswerKey, HttpSubmitter, LocalSubmitter, ScoringPolicy, SubmissionClient, Validator,
};
use cyberlab_platform::{JsonFileStore, KeyValueStore, UreqNetwork};
use cyberlab_terminal::TerminalSession;
use cyberlab_types::challenge::{Catalog, Challenge};
use cyberlab_types::config::CyberlabConfig;

use host::ChallengeHost;

#[derive(Parser)]
#[command(name = "cyberlab")]
#[command(about = "Investigate challenge artifacts in a virtual terminal and submit flags")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "cyberlab.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a challenge in the interactive terminal
    Play {
        /// Challenge id from the catalog
        challenge: String,

        /// Log file (the UI owns the screen)
        #[arg(long, default_value = "cyberlab.log")]
        log_file: PathBuf,

        /// Validate flags against the local answer key instead of the endpoint
        #[arg(long)]
        offline: bool,
    },

    /// Run command lines against a challenge and print the transcript
    Run {
        /// Challenge id from the catalog
        challenge: String,

        /// Command lines, each run in order
        #[arg(required = true)]
        lines: Vec<String>,
    },

    /// List catalog challenges
    List,

    /// Serve the flag validation endpoint
    Serve {
        /// Address to bind (overrides the config)
        #[arg(long)]
        bind: Option<String>,

        /// Answer key file, TOML or mapping JSON (overrides the config)
        #[arg(long)]
        answer_key: Option<PathBuf>,
    },
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn load_challenge(config: &CyberlabConfig, id: &str) -> Result<Challenge> {
    let catalog = Catalog::load(&config.catalog.path)
        .with_context(|| format!("loading catalog {}", config.catalog.path.display()))?;
    match catalog.get(id) {
        Some(challenge) => Ok(challenge.clone()),
        None => bail!("no challenge with id {id} in the catalog"),
    }
}

fn load_validator(config: &CyberlabConfig, answer_key: &Path) -> Result<Validator> {
    let key = AnswerKey::load(answer_key)
        .with_context(|| format!("loading answer key {}", answer_key.display()))?;
    Ok(Validator::new(key, ScoringPolicy::from(&config.server)))
}

fn new_session(config: &CyberlabConfig, challenge: Challenge) -> TerminalSession {
    TerminalSession::new(
        challenge,
        Box::new(UreqNetwork::new()),
        config.terminal.clone(),
    )
}

fn play(config: &CyberlabConfig, id: &str, offline: bool) -> Result<()> {
    let challenge = load_challenge(config, id)?;
    log::info!("Opening challenge {} ({})", challenge.id, challenge.title);

    let store = JsonFileStore::open(&config.storage.completion_file).with_context(|| {
        format!(
            "opening completion store {}",
            config.storage.completion_file.display()
        )
    })?;
    let client: Box<dyn SubmissionClient> = if offline {
        Box::new(LocalSubmitter::new(load_validator(
            config,
            &config.server.answer_key,
        )?))
    } else {
        Box::new(HttpSubmitter::new(&config.submission.endpoint))
    };

    let session = new_session(config, challenge);
    let mut host = ChallengeHost::new(session, Box::new(store), client);
    tui::run(&mut host)
}

fn run_lines(config: &CyberlabConfig, id: &str, lines: &[String]) -> Result<()> {
    let challenge = load_challenge(config, id)?;
    let mut session = new_session(config, challenge);
    for line in lines {
        session.submit_line(line);
    }
    println!("{}", session.transcript());
    Ok(())
}

fn list(config: &CyberlabConfig) -> Result<()> {
    let catalog = Catalog::load(&config.catalog.path)
        .with_context(|| format!("loading catalog {}", config.catalog.path.display()))?;
    let store = JsonFileStore::open(&config.storage.completion_file)?;
    for c in &catalog.challenges {
        let done = if store.get(&c.completion_key()) {
            "  [done]"
        } else {
            ""
        };
        let difficulty = format!("{:?}", c.difficulty);
        println!(
            "{:>4}  {:<32} {:<12} {difficulty:<8} {:>4} pts{done}",
            c.id, c.title, c.category, c.points
        );
    }
    Ok(())
}

fn serve(config: &CyberlabConfig, bind: Option<String>, answer_key: Option<PathBuf>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let answer_key = answer_key.unwrap_or_else(|| config.server.answer_key.clone());
    let validator = load_validator(config, &answer_key)?;
    log::info!(
        "Serving {} challenges on {bind}",
        validator.answer_key().challenges.len()
    );
    cyberlab_flags::server::run(&bind, validator).with_context(|| format!("serving on {bind}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Play { log_file, .. } => Some(log_file.as_path()),
        _ => None,
    };
    init_logging(log_file)?;

    let config = CyberlabConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    match cli.command {
        Commands::Play {
            challenge, offline, ..
        } => play(&config, &challenge, offline),
        Commands::Run { challenge, lines } => run_lines(&config, &challenge, &lines),
        Commands::List => list(&config),
        Commands::Serve { bind, answer_key } => serve(&config, bind, answer_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn play_defaults() {
        let cli = Cli::try_parse_from(["cyberlab", "play", "4"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("cyberlab.toml"));
        match cli.command {
            Commands::Play {
                challenge,
                log_file,
                offline,
            } => {
                assert_eq!(challenge, "4");
                assert_eq!(log_file, PathBuf::from("cyberlab.log"));
                assert!(!offline);
            },
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn run_requires_a_line() {
        assert!(Cli::try_parse_from(["cyberlab", "run", "4"]).is_err());
        let cli = Cli::try_parse_from(["cyberlab", "run", "4", "ls", "cat notes.txt"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { lines, .. } if lines.len() == 2));
    }

    #[test]
    fn serve_overrides() {
        let cli = Cli::try_parse_from([
            "cyberlab",
            "--config",
            "alt.toml",
            "serve",
            "--bind",
            "0.0.0.0:8000",
            "--answer-key",
            "mapping.json",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert!(matches!(
            cli.command,
            Commands::Serve { bind: Some(b), answer_key: Some(_) } if b == "0.0.0.0:8000"
        ));
    }
}
