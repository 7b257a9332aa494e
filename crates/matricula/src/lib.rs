//! `matricula` - Enrollment records kept in a flat JSON file
//!
//! This library maintains an ordered list of enrollment records in a single
//! JSON backing file and mirrors every record as a JSON snapshot and a PDF
//! receipt.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod artifact;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod storage;

pub use artifact::{Artifact, ArtifactGenerator, ArtifactKind};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::Record;
pub use storage::{JsonFileStore, RecordStore};
