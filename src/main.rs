mod commands;
mod input;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pimbridge_core::error::BridgeError;
use pimbridge_core::protocol::{ErrorBody, Response};
use pimbridge_core::store::RecordKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pimbridge")]
#[command(about = "Apply contact, event and reminder field mappings to a local record store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,
    Contact {
        #[command(subcommand)]
        command: ContactCommand,
    },
    Event {
        #[command(subcommand)]
        command: CalendarCommand,
    },
    Reminder {
        #[command(subcommand)]
        command: CalendarCommand,
    },
    /// List, create or delete calendars and address books
    Container {
        #[command(subcommand)]
        command: ContainerCommand,
    },
    /// Content hash of one record
    Hash {
        kind: Kind,
        id: String,

        /// Calendar or address book holding the record
        #[arg(short, long)]
        container: String,
    },
    /// Content hashes of every record in a container
    Hashes {
        kind: Kind,

        #[arg(short, long)]
        container: String,

        /// Events from this date (YYYY-MM-DD, or "start" for all past events)
        #[arg(long)]
        from: Option<String>,

        /// Events until this date (YYYY-MM-DD, or "end" for all future events)
        #[arg(long)]
        to: Option<String>,
    },
    /// Apply a list of add/change/delete requests
    Batch {
        kind: Kind,

        #[arg(short, long)]
        container: String,

        /// JSON file with the changes, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        data: String,
    },
    /// Render an event or reminder as .ics
    Export {
        kind: Kind,
        id: String,

        #[arg(short, long)]
        container: String,
    },
}

#[derive(Subcommand)]
enum ContactCommand {
    /// Apply a field mapping to a contact (a new one when no id is given)
    Mutate {
        id: Option<String>,

        #[arg(short, long)]
        container: String,

        /// JSON file with the mapping, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        data: String,
    },
}

#[derive(Subcommand)]
enum CalendarCommand {
    /// Apply a detail mapping (to a new record when no id is given)
    Apply {
        id: Option<String>,

        #[arg(short, long)]
        calendar: String,

        /// JSON file with the details, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        data: String,
    },
}

#[derive(Subcommand)]
enum ContainerCommand {
    List {
        kind: Kind,
    },
    Create {
        kind: Kind,
        name: String,
    },
    /// Delete a container and every record in it
    Delete {
        kind: Kind,
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    #[value(alias = "contacts")]
    Contact,
    #[value(alias = "events")]
    Event,
    #[value(alias = "reminders")]
    Reminder,
}

impl From<Kind> for RecordKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Contact => RecordKind::Contact,
            Kind::Event => RecordKind::Event,
            Kind::Reminder => RecordKind::Reminder,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Contact {
            command: ContactCommand::Mutate { id, container, data },
        } => commands::contact::mutate(id, &container, &data).await,
        Commands::Event {
            command: CalendarCommand::Apply { id, calendar, data },
        } => commands::calendar::apply_event(id, &calendar, &data),
        Commands::Reminder {
            command: CalendarCommand::Apply { id, calendar, data },
        } => commands::calendar::apply_reminder(id, &calendar, &data),
        Commands::Container { command } => match command {
            ContainerCommand::List { kind } => commands::container::list(kind.into()),
            ContainerCommand::Create { kind, name } => {
                commands::container::create(kind.into(), &name)
            }
            ContainerCommand::Delete { kind, name } => {
                commands::container::delete(kind.into(), &name)
            }
        },
        Commands::Hash { kind, id, container } => {
            commands::hash::one(kind.into(), &id, &container)
        }
        Commands::Hashes {
            kind,
            container,
            from,
            to,
        } => commands::hash::all(kind.into(), &container, from.as_deref(), to.as_deref()),
        Commands::Batch {
            kind,
            container,
            data,
        } => commands::batch::run(kind.into(), &container, &data),
        Commands::Export {
            kind,
            id,
            container,
        } => commands::export::run(kind.into(), &id, &container),
    };

    match outcome {
        Ok(data) => println!("{}", Response::success(data)?),
        Err(err) => {
            let body = match err.downcast_ref::<BridgeError>() {
                Some(bridge) => ErrorBody::from(bridge),
                None => ErrorBody::internal(format!("{:#}", err)),
            };
            tracing::debug!(code = %body.code, "command failed");
            println!("{}", Response::error(body)?);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only the response envelope.
fn setup_logging() {
    let filter = EnvFilter::try_from_env("PIMBRIDGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
