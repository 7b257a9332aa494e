//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::artifact::ArtifactKind;
use crate::record::Record;

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record id
    pub id: u64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Identity document number
    #[arg(short, long)]
    pub document: String,

    /// Full name of the enrollee
    #[arg(short, long)]
    pub name: String,

    /// Training program
    #[arg(short, long)]
    pub program: String,

    /// Cohort ("ficha") number
    #[arg(short = 'f', long)]
    pub cohort: String,

    /// Initial status (defaults to the configured status)
    #[arg(short, long)]
    pub status: Option<String>,
}

impl AddCommand {
    /// Build the unsaved record described by the arguments.
    #[must_use]
    pub fn to_record(&self) -> Record {
        let record = Record::new(
            self.document.clone(),
            self.name.clone(),
            self.program.clone(),
            self.cohort.clone(),
        );
        match &self.status {
            Some(status) => record.with_status(status.clone()),
            None => record,
        }
    }
}

/// Edit command arguments. Omitted fields keep their stored value.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Record id
    pub id: u64,

    /// New document number
    #[arg(short, long)]
    pub document: Option<String>,

    /// New full name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New program
    #[arg(short, long)]
    pub program: Option<String>,

    /// New cohort
    #[arg(short = 'f', long)]
    pub cohort: Option<String>,

    /// New status
    #[arg(short, long)]
    pub status: Option<String>,
}

impl EditCommand {
    /// Apply the requested changes to a stored record.
    pub fn apply(&self, record: &mut Record) {
        let changes = [
            (&self.document, &mut record.document_number),
            (&self.name, &mut record.full_name),
            (&self.program, &mut record.program),
            (&self.cohort, &mut record.cohort),
            (&self.status, &mut record.status),
        ];
        for (change, field) in changes {
            if let Some(value) = change {
                *field = Some(value.clone());
            }
        }
    }
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Record id
    pub id: u64,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Record id
    pub id: u64,

    /// Artifact to export
    #[arg(short, long, value_enum, default_value = "pdf")]
    pub kind: KindArg,

    /// Where to write the file (defaults to the artifact's file name)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Artifact kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Single-record JSON snapshot
    Json,
    /// PDF receipt
    Pdf,
}

impl From<KindArg> for ArtifactKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Json => Self::Json,
            KindArg::Pdf => Self::Pdf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(id: u64) -> EditCommand {
        EditCommand {
            id,
            document: None,
            name: None,
            program: None,
            cohort: None,
            status: None,
        }
    }

    #[test]
    fn test_kind_arg_conversion() {
        assert_eq!(ArtifactKind::from(KindArg::Json), ArtifactKind::Json);
        assert_eq!(ArtifactKind::from(KindArg::Pdf), ArtifactKind::Pdf);
    }

    #[test]
    fn test_add_to_record() {
        let cmd = AddCommand {
            document: "123".to_string(),
            name: "Ana Ruiz".to_string(),
            program: "ADSO".to_string(),
            cohort: "2753421".to_string(),
            status: None,
        };
        let record = cmd.to_record();
        assert!(record.is_new());
        assert_eq!(record.full_name.as_deref(), Some("Ana Ruiz"));
        assert!(record.status.is_none());
    }

    #[test]
    fn test_add_to_record_with_status() {
        let cmd = AddCommand {
            document: "1".to_string(),
            name: "B".to_string(),
            program: "P".to_string(),
            cohort: "C".to_string(),
            status: Some("Suspended".to_string()),
        };
        assert_eq!(cmd.to_record().status.as_deref(), Some("Suspended"));
    }

    #[test]
    fn test_edit_apply_only_given_fields() {
        let mut record = Record::new("123", "Ana Ruiz", "ADSO", "2753421").with_status("Active");
        let mut cmd = edit(1);
        cmd.name = Some("Ana María Ruiz".to_string());
        cmd.status = Some("Withdrawn".to_string());

        cmd.apply(&mut record);

        assert_eq!(record.full_name.as_deref(), Some("Ana María Ruiz"));
        assert_eq!(record.status.as_deref(), Some("Withdrawn"));
        assert_eq!(record.document_number.as_deref(), Some("123"));
        assert_eq!(record.cohort.as_deref(), Some("2753421"));
    }

    #[test]
    fn test_edit_apply_nothing() {
        let original = Record::new("123", "Ana Ruiz", "ADSO", "2753421");
        let mut record = original.clone();
        edit(1).apply(&mut record);
        assert_eq!(record, original);
    }
}
