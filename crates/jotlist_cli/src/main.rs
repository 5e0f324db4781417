//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive `jotlist_core` end to end against a real database file.
//! - Keep output deterministic for quick local sanity checks.

use clap::{Parser, Subcommand};
use jotlist_core::db::open_db;
use jotlist_core::{
    core_version, default_log_level, init_logging, CoordinatorConfig, NoteId, NoteList, Ticket,
    DB_FILE_NAME,
};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

const WAIT_BUDGET: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "jotlist_cli")]
#[command(version, about = "Smoke driver for the jotlist note store")]
struct Cli {
    /// Note database file
    #[arg(long, value_name = "PATH", default_value = DB_FILE_NAME)]
    db: PathBuf,

    /// Log directory (absolute); file logging stays off when unset
    #[arg(long, env = "JOTLIST_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "JOTLIST_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print every note, newest first
    List,

    /// Create a note; skipped when title and content are both blank
    Add {
        title: String,

        #[arg(default_value = "")]
        content: String,
    },

    /// Delete a note by id
    Rm { id: NoteId },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    println!("jotlist_core version={}", core_version());
    let conn = open_db(&cli.db)?;
    let mut list = NoteList::start(conn, CoordinatorConfig::default())?;

    let ticket = list.load_all()?;
    settle(&mut list, ticket)?;

    match cli.command.unwrap_or(Command::List) {
        Command::List => {}
        Command::Add { title, content } => match list.create(&title, &content)? {
            Some(ticket) => settle(&mut list, ticket)?,
            None => println!("skipped: title and content are both blank"),
        },
        Command::Rm { id } => {
            let ticket = list.remove(id)?;
            settle(&mut list, ticket)?;
        }
    }

    for note in list.notes() {
        let marker = if note.important { "*" } else { " " };
        println!("{marker} {:>5}  {}", note.id, note.title);
    }
    list.shutdown();
    Ok(())
}

fn settle(list: &mut NoteList, ticket: Ticket) -> Result<(), Box<dyn Error>> {
    list.wait_for(ticket, WAIT_BUDGET)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn defaults_to_listing_the_default_database() {
        let cli = Cli::try_parse_from(["jotlist_cli"]).unwrap();
        assert_eq!(cli.db, PathBuf::from(jotlist_core::DB_FILE_NAME));
        assert_eq!(cli.command, None);
    }

    #[test]
    fn db_flag_without_value_is_rejected() {
        assert!(Cli::try_parse_from(["jotlist_cli", "list", "--db"]).is_err());
    }

    #[test]
    fn parses_add_and_remove() {
        let cli = Cli::try_parse_from(["jotlist_cli", "--db", "/tmp/n.sqlite3", "add", "milk"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/n.sqlite3"));
        assert_eq!(
            cli.command,
            Some(Command::Add {
                title: "milk".to_string(),
                content: String::new(),
            })
        );

        let cli = Cli::try_parse_from(["jotlist_cli", "rm", "7"]).unwrap();
        assert_eq!(cli.command, Some(Command::Rm { id: 7 }));
        assert!(Cli::try_parse_from(["jotlist_cli", "rm", "seven"]).is_err());
    }
}
