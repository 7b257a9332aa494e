//! Command-line interface for matricula.
//!
//! This module provides the CLI structure for the `matricula` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, EditCommand, ExportCommand, KindArg, ListCommand,
    ShowCommand,
};

/// matricula - Manage enrollment records
///
/// Keeps enrollment records in a JSON file and produces a JSON snapshot
/// and a PDF receipt for each record.
#[derive(Debug, Parser)]
#[command(name = "matricula")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all records
    List(ListCommand),

    /// Show one record
    Show(ShowCommand),

    /// Create a new record
    Add(AddCommand),

    /// Change an existing record
    Edit(EditCommand),

    /// Delete a record and its artifacts
    Delete(DeleteCommand),

    /// Export a record's JSON snapshot or PDF receipt
    Export(ExportCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "matricula");
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["matricula", "list"]).verbosity(), Verbosity::Normal);
        assert_eq!(
            parse(&["matricula", "-v", "list"]).verbosity(),
            Verbosity::Verbose
        );
        assert_eq!(
            parse(&["matricula", "-vv", "list"]).verbosity(),
            Verbosity::Trace
        );
        assert_eq!(
            parse(&["matricula", "-q", "-v", "list"]).verbosity(),
            Verbosity::Quiet
        );
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&[
            "matricula",
            "add",
            "--document",
            "123",
            "--name",
            "Ana Ruiz",
            "--program",
            "ADSO",
            "--cohort",
            "2753421",
        ]);
        let Command::Add(cmd) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(cmd.name, "Ana Ruiz");
        assert!(cmd.status.is_none());
    }

    #[test]
    fn test_parse_add_requires_fields() {
        let result = Cli::try_parse_from(["matricula", "add", "--name", "Ana"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_edit() {
        let cli = parse(&["matricula", "edit", "3", "--status", "Withdrawn"]);
        let Command::Edit(cmd) = cli.command else {
            panic!("expected edit command");
        };
        assert_eq!(cmd.id, 3);
        assert_eq!(cmd.status.as_deref(), Some("Withdrawn"));
        assert!(cmd.name.is_none());
    }

    #[test]
    fn test_parse_export() {
        let cli = parse(&["matricula", "export", "5", "--kind", "json", "-o", "out.json"]);
        let Command::Export(cmd) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(cmd.id, 5);
        assert_eq!(cmd.kind, KindArg::Json);
        assert_eq!(cmd.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_parse_export_defaults_to_pdf() {
        let cli = parse(&["matricula", "export", "5"]);
        let Command::Export(cmd) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(cmd.kind, KindArg::Pdf);
        assert!(cmd.output.is_none());
    }

    #[test]
    fn test_parse_delete_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["matricula", "delete", "two"]).is_err());
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["matricula", "-c", "/custom/config.toml", "list"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
