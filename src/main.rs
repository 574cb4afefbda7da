//! # Book Assist CLI (`bookctl`)
//!
//! Command-line front end for the book assistant. Every command probes the
//! remote answering service first and falls back to the bundled book when it
//! is unavailable; fallback answers are marked with an offline banner.
//!
//! ## Usage
//!
//! ```bash
//! bookctl --config ./config/bookctl.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bookctl health` | Probe the remote service |
//! | `bookctl search "<query>"` | Search the book |
//! | `bookctl ask "<question>"` | Ask a question about the book |
//! | `bookctl explain "<passage>"` | Explain a selected passage |
//! | `bookctl translate <lang>` | Translate the whole book |
//! | `bookctl show <lang>` | Print a stored translation |
//! | `bookctl chat` | Interactive session |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use book_assist::config::{self, Config};
use book_assist::debounce::{SearchDebouncer, SearchUpdate};
use book_assist::error::AssistError;
use book_assist::models::{Availability, Routed};
use book_assist::orchestrator::BookOrchestrator;
use book_assist::output;
use book_assist::session::{Session, SessionError};
use book_assist_core::models::Language;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "./config/bookctl.toml";

/// Book Assist CLI: search, Q&A, and translation for the Humanoid Robotics
/// Book, online or offline.
#[derive(Parser)]
#[command(
    name = "bookctl",
    about = "Book Assist: search, Q&A, and whole-book translation with offline fallback",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/bookctl.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the remote answering service is reachable.
    Health,

    /// Search the book.
    Search {
        query: String,

        /// Answer language (`en`, `ur`).
        #[arg(long)]
        lang: Option<String>,
    },

    /// Ask a question about the book.
    Ask {
        question: String,

        #[arg(long)]
        lang: Option<String>,
    },

    /// Explain a selected passage of the book.
    Explain {
        /// The selected text.
        text: String,

        /// Question to ask about the passage.
        #[arg(long, default_value = book_assist::session::SELECTION_QUESTION)]
        question: String,

        #[arg(long)]
        lang: Option<String>,
    },

    /// Translate the whole book and store the result.
    Translate {
        /// Target language code.
        language: String,
    },

    /// Print a stored translation.
    Show {
        language: String,

        /// Only print the section with this id.
        #[arg(long)]
        section: Option<String>,
    },

    /// Start an interactive session.
    ///
    /// Type a question to ask it. `/find <text>` searches as you type,
    /// `/explain <text>` explains a passage, `/lang <code>` switches the
    /// answer language, `/quit` exits.
    Chat,
}

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(Config::default()),
    }
}

fn parse_language(code: &str) -> Result<Language> {
    code.parse::<Language>()
        .map_err(|_| anyhow!(AssistError::UnsupportedLanguage(code.trim().to_string()).user_message()))
}

fn language_or_default(code: Option<&str>, cfg: &Config) -> Result<Language> {
    match code {
        Some(code) => parse_language(code),
        None => Ok(cfg.session.language()),
    }
}

/// Log the underlying error and turn it into the message the user sees.
fn surface(err: AssistError) -> anyhow::Error {
    warn!(error = %err, "operation failed");
    anyhow!(err.user_message())
}

fn print_routed<T>(routed: &Routed<T>, text: String) {
    tracing::debug!(trace = ?routed.trace, "operation finished");
    println!("{}", text);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(cli.config.as_deref())?;
    let orchestrator = Arc::new(BookOrchestrator::from_config(&cfg)?);

    match cli.command {
        Commands::Health => match orchestrator.probe().await {
            Availability::Reachable => println!("Remote service reachable."),
            Availability::Unreachable(reason) => {
                println!("Remote service unreachable ({}). Offline mode.", reason)
            }
        },
        Commands::Search { query, lang } => {
            let language = language_or_default(lang.as_deref(), &cfg)?;
            let routed = orchestrator
                .search(&query, language)
                .await
                .map_err(surface)?;
            print_routed(&routed, output::format_search(&query, &routed));
        }
        Commands::Ask { question, lang } => {
            let language = language_or_default(lang.as_deref(), &cfg)?;
            let routed = orchestrator
                .ask(&question, language)
                .await
                .map_err(surface)?;
            print_routed(&routed, output::format_answer(&routed));
        }
        Commands::Explain {
            text,
            question,
            lang,
        } => {
            let language = language_or_default(lang.as_deref(), &cfg)?;
            let routed = orchestrator
                .ask_selection(&text, &question, language)
                .await
                .map_err(surface)?;
            print_routed(&routed, output::format_answer(&routed));
        }
        Commands::Translate { language } => {
            let language = parse_language(&language)?;
            let routed = orchestrator
                .translate_book(language)
                .await
                .map_err(surface)?;
            print_routed(&routed, output::format_report(&routed));
        }
        Commands::Show { language, section } => {
            let language = parse_language(&language)?;
            show_translation(&orchestrator, language, section.as_deref()).await?;
        }
        Commands::Chat => {
            run_chat(orchestrator, &cfg).await?;
        }
    }

    Ok(())
}

async fn show_translation(
    orchestrator: &BookOrchestrator,
    language: Language,
    section: Option<&str>,
) -> Result<()> {
    let Some(translated) = orchestrator
        .local()
        .load_translation(language)
        .await
        .map_err(surface)?
    else {
        bail!(
            "No translation stored for {}. Run `bookctl translate {}` first.",
            language,
            language
        );
    };

    match section {
        Some(id) => match translated.get(id) {
            Some(entry) => println!("{}", output::format_section(id, entry)),
            None => bail!("No section with id '{}'", id),
        },
        None => {
            for (id, entry) in &translated.sections {
                println!("{}", output::format_section(id, entry));
            }
        }
    }
    Ok(())
}

/// One line typed into `bookctl chat`.
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Quit,
    Lang(&'a str),
    Find(&'a str),
    Explain(&'a str),
    Ask(&'a str),
}

/// Commands are matched on the first whitespace-delimited word, so `/langur`
/// is a question rather than `/lang ur`.
fn parse_chat_command(line: &str) -> ChatCommand<'_> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));
    match head {
        "/quit" => ChatCommand::Quit,
        "/lang" => ChatCommand::Lang(rest),
        "/find" => ChatCommand::Find(rest),
        "/explain" => ChatCommand::Explain(rest),
        _ => ChatCommand::Ask(line),
    }
}

async fn run_chat(orchestrator: Arc<BookOrchestrator>, cfg: &Config) -> Result<()> {
    let session = Session::new(Arc::clone(&orchestrator), &cfg.session);
    let (debouncer, mut updates) =
        SearchDebouncer::new(orchestrator, cfg.session.debounce(), session.language());

    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            match update {
                SearchUpdate::Cleared => println!("(search cleared)"),
                SearchUpdate::Results {
                    query,
                    reply,
                    degraded,
                } => {
                    if degraded {
                        println!("{}", output::OFFLINE_BANNER);
                    }
                    let routed = Routed::immediate(reply);
                    println!("{}", output::format_search(&query, &routed));
                }
                SearchUpdate::Failed { message, .. } => println!("{}", message),
            }
        }
    });

    for message in session.messages() {
        println!("{}", output::format_message(&message));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        let result = match parse_chat_command(line) {
            ChatCommand::Quit => break,
            ChatCommand::Lang(code) => {
                match session.change_language(code) {
                    Ok(language) => {
                        debouncer.set_language(language);
                        println!("Answer language: {}", language.display_name());
                    }
                    Err(err) => println!("{}", err),
                }
                continue;
            }
            ChatCommand::Find(text) => {
                debouncer.input(text);
                continue;
            }
            ChatCommand::Explain(text) => session.submit_selection_question(text).await,
            ChatCommand::Ask(text) => session.submit_query(text).await,
        };

        match result {
            Ok(reply) => println!("{}", output::format_message(&reply)),
            Err(SessionError::EmptyInput) => {}
            Err(err) => println!("{}", err),
        }
    }

    session.close();
    drop(debouncer);
    printer.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_commands() {
        assert_eq!(parse_chat_command("/quit"), ChatCommand::Quit);
        assert_eq!(parse_chat_command("/lang ur"), ChatCommand::Lang("ur"));
        assert_eq!(parse_chat_command("/lang"), ChatCommand::Lang(""));
        assert_eq!(parse_chat_command("/find  loco "), ChatCommand::Find("loco"));
        assert_eq!(
            parse_chat_command("/explain zero moment point"),
            ChatCommand::Explain("zero moment point")
        );
        assert_eq!(
            parse_chat_command("What is ZMP?"),
            ChatCommand::Ask("What is ZMP?")
        );
    }

    #[test]
    fn test_command_word_must_match_exactly() {
        assert_eq!(parse_chat_command("/langur"), ChatCommand::Ask("/langur"));
        assert_eq!(
            parse_chat_command("/language ur"),
            ChatCommand::Ask("/language ur")
        );
        assert_eq!(parse_chat_command("/quitting"), ChatCommand::Ask("/quitting"));
        assert_eq!(parse_chat_command("/finder x"), ChatCommand::Ask("/finder x"));
    }
}
