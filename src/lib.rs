pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;

pub use config::Config;
pub use db::{Session, Store};

use anyhow::Context;
use cli::{BehaviorCommands, Cli, Commands, UserCommands};
use clap::CommandFactory;
use models::behavior::{BehaviorPatch, DateRange, IncidentSearch, NewBehaviorRecord};
use models::user::{NewUser, UserPatch};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Logs go to stderr so command
/// output on stdout stays machine-readable.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to install tracing subscriber")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }

    Ok(())
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    config.validate()?;
    init_tracing(&config)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        return cli::cmd_init();
    }

    let store = Store::from_config(&config).await?;
    debug!(url = %config.database.url, "Store ready");

    let result = dispatch(command, &config, &store).await;
    store.close().await?;
    result
}

async fn dispatch(command: Commands, config: &Config, store: &Store) -> anyhow::Result<()> {
    match command {
        Commands::Init => cli::cmd_init(),

        Commands::Status => cli::cmd_status(config, store).await,

        Commands::User { command } => match command {
            UserCommands::Add {
                username,
                email,
                role,
                first_name,
                last_name,
            } => {
                let new_user = NewUser {
                    username,
                    email,
                    role,
                    first_name,
                    last_name,
                };
                cli::cmd_user_add(store, new_user).await
            }
            UserCommands::Show { id, json } => cli::cmd_user_show(store, id, json).await,
            UserCommands::List { skip, limit, json } => {
                cli::cmd_user_list(store, skip, limit, json).await
            }
            UserCommands::Update {
                id,
                username,
                email,
                role,
                first_name,
                last_name,
                clear_first_name,
                clear_last_name,
            } => {
                let patch = UserPatch {
                    username,
                    email,
                    role,
                    first_name: if clear_first_name {
                        Some(None)
                    } else {
                        first_name.map(Some)
                    },
                    last_name: if clear_last_name {
                        Some(None)
                    } else {
                        last_name.map(Some)
                    },
                };
                cli::cmd_user_update(store, id, patch).await
            }
            UserCommands::Remove { id } => cli::cmd_user_remove(store, id).await,
        },

        Commands::Behavior { command } => match command {
            BehaviorCommands::Record {
                student_id,
                recorded_by_id,
                behavior_type,
                description,
                points,
                at,
            } => {
                let new = NewBehaviorRecord {
                    student_id,
                    recorded_by_id,
                    behavior_type,
                    description,
                    points,
                    timestamp: at,
                };
                cli::cmd_behavior_record(store, new).await
            }
            BehaviorCommands::List {
                student_id,
                from,
                to,
                json,
            } => {
                let range = DateRange {
                    start: from,
                    end: to,
                };
                cli::cmd_behavior_list(store, student_id, range, json).await
            }
            BehaviorCommands::Points {
                student_id,
                from,
                to,
                json,
            } => {
                let range = DateRange {
                    start: from,
                    end: to,
                };
                cli::cmd_behavior_points(store, student_id, range, json).await
            }
            BehaviorCommands::Search {
                text,
                student,
                from,
                to,
                skip,
                limit,
                json,
            } => {
                let search = IncidentSearch {
                    text,
                    student_id: student,
                    range: DateRange {
                        start: from,
                        end: to,
                    },
                    skip,
                    limit,
                };
                cli::cmd_behavior_search(store, search, json).await
            }
            BehaviorCommands::Update {
                record_id,
                description,
                points,
            } => {
                let patch = BehaviorPatch {
                    description,
                    points,
                };
                cli::cmd_behavior_update(store, record_id, patch).await
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_points() {
        let cli = Cli::try_parse_from([
            "conduct", "behavior", "record", "1", "2", "negative", "Late", "--points", "-2",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Behavior {
                command: BehaviorCommands::Record { points, at, .. },
            }) => {
                assert_eq!(points, -2);
                assert!(at.is_none());
            }
            _ => panic!("expected behavior record"),
        }
    }

    #[test]
    fn parses_date_bounds() {
        let cli = Cli::try_parse_from([
            "conduct",
            "behavior",
            "points",
            "7",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Behavior {
                command: BehaviorCommands::Points { from, to, .. },
            }) => {
                assert!(from.is_some());
                assert!(to.is_some());
                assert!(from < to);
            }
            _ => panic!("expected behavior points"),
        }
    }

    #[test]
    fn parses_search_filters() {
        let cli = Cli::try_parse_from([
            "conduct", "behavior", "search", "--text", "late", "--student", "4", "--limit", "10",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Behavior {
                command:
                    BehaviorCommands::Search {
                        text,
                        student,
                        skip,
                        limit,
                        from,
                        ..
                    },
            }) => {
                assert_eq!(text.as_deref(), Some("late"));
                assert_eq!(student, Some(4));
                assert_eq!(skip, 0);
                assert_eq!(limit, 10);
                assert!(from.is_none());
            }
            _ => panic!("expected behavior search"),
        }
    }

    #[test]
    fn clear_and_set_name_conflict() {
        let result = Cli::try_parse_from([
            "conduct",
            "user",
            "update",
            "1",
            "--first-name",
            "Al",
            "--clear-first-name",
        ]);
        assert!(result.is_err());
    }
}
