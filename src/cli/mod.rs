//! `conduct` subcommands and their arguments.
//!
//! Dates accept RFC 3339 or `YYYY-MM-DD`; a bare date used as an upper bound
//! covers the whole day.

mod commands;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::db::repositories::user::DEFAULT_PAGE_SIZE;

/// Conduct - student behavior ledger
/// Keeps users and scored behavior incidents in a local database
#[derive(Parser)]
#[command(name = "conduct")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (defaults to the usual search locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    Init,

    /// Check the database connection and show row counts
    Status,

    /// Manage user accounts
    #[command(alias = "u")]
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Record and query behavior incidents
    #[command(alias = "b")]
    Behavior {
        #[command(subcommand)]
        command: BehaviorCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user
    Add {
        username: String,
        email: String,
        /// Free-form role, e.g. student or teacher
        role: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Show a single user
    Show {
        id: i32,
        #[arg(long)]
        json: bool,
    },
    /// List users
    #[command(alias = "ls")]
    List {
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u64,
        #[arg(long)]
        json: bool,
    },
    /// Change selected fields of a user
    Update {
        id: i32,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long, conflicts_with = "clear_first_name")]
        first_name: Option<String>,
        #[arg(long, conflicts_with = "clear_last_name")]
        last_name: Option<String>,
        /// Remove the stored first name
        #[arg(long)]
        clear_first_name: bool,
        /// Remove the stored last name
        #[arg(long)]
        clear_last_name: bool,
    },
    /// Delete a user
    #[command(alias = "rm")]
    Remove { id: i32 },
}

#[derive(Subcommand)]
pub enum BehaviorCommands {
    /// Log an incident for a student
    Record {
        student_id: i32,
        recorded_by_id: i32,
        /// Usually "positive" or "negative"
        behavior_type: String,
        description: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        points: i32,
        /// Incident time (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long, value_parser = parse_start)]
        at: Option<DateTime<Utc>>,
    },
    /// List a student's incidents, newest first
    #[command(alias = "ls")]
    List {
        student_id: i32,
        /// Inclusive lower bound (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_start)]
        from: Option<DateTime<Utc>>,
        /// Inclusive upper bound (RFC 3339 or YYYY-MM-DD, whole day)
        #[arg(long, value_parser = parse_end)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    /// Total a student's points
    Points {
        student_id: i32,
        #[arg(long, value_parser = parse_start)]
        from: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_end)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    /// Search incidents across all students, newest first
    #[command(alias = "find")]
    Search {
        /// Case-insensitive match on type or description
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        student: Option<i32>,
        #[arg(long, value_parser = parse_start)]
        from: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_end)]
        to: Option<DateTime<Utc>>,
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u64,
        #[arg(long)]
        json: bool,
    },
    /// Change the description and/or points of a record
    Update {
        record_id: i32,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        points: Option<i32>,
    },
}

fn parse_start(value: &str) -> Result<DateTime<Utc>, String> {
    commands::parse_datetime(value, false)
}

fn parse_end(value: &str) -> Result<DateTime<Utc>, String> {
    commands::parse_datetime(value, true)
}

pub use commands::*;
