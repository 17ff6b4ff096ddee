//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::{DocumentType, RelationshipType, ValueType};

/// Validated, navigable content-item trees for structured reports
#[derive(Parser, Debug)]
#[command(name = "srtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a tree from a description file and print it
    Show {
        /// Description file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Build a fragment instead of a full document
        #[arg(short, long)]
        fragment: bool,
    },

    /// List every node carrying a concept name
    Find {
        /// Description file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Code value
        code: String,

        /// Coding scheme designator
        scheme: String,

        /// Build a fragment instead of a full document
        #[arg(short, long)]
        fragment: bool,
    },

    /// Check whether the grammar accepts an insertion
    Check {
        /// Relationship type, e.g. CONTAINS
        relationship: RelationshipType,

        /// Value type, e.g. TEXT
        value_type: ValueType,

        /// Value type of the parent (omit for the first node)
        #[arg(short, long)]
        parent: Option<ValueType>,

        /// Check against a fragment instead of a full document
        #[arg(short, long)]
        fragment: bool,

        /// Content constraints. Documents default to the configured type,
        /// fragments are unconstrained unless given
        #[arg(short = 't', long)]
        document_type: Option<DocumentType>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
