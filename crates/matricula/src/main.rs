//! `matricula` - CLI for the enrollment record store
//!
//! This binary validates input, calls the record service and prints the
//! results. Every invocation performs exactly one store operation.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use matricula::cli::{Cli, Command, ConfigCommand, EditCommand, ExportCommand, ShowCommand};
use matricula::record::Record;
use matricula::{init_logging, Config, Error, JsonFileStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    run(&config, cli.command).await
}

async fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    let store = || JsonFileStore::from_config(config);

    match command {
        Command::List(cmd) => {
            let records = store()?.list().await?;
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_table(&records);
            }
        }
        Command::Show(cmd) => handle_show(&store()?, &cmd).await?,
        Command::Add(cmd) => {
            let record = cmd.to_record();
            record.validate()?;
            let saved = store()?.save(record).await?;
            println!("Created record {}", saved.id);
        }
        Command::Edit(cmd) => handle_edit(&store()?, &cmd).await?,
        Command::Delete(cmd) => {
            let removed = store()?.delete(cmd.id).await?;
            println!(
                "Deleted record {} ({})",
                removed.id,
                text(removed.full_name.as_deref())
            );
        }
        Command::Export(cmd) => handle_export(&store()?, &cmd).await?,
        Command::Config(cmd) => handle_config(config, cmd)?,
    }
    Ok(())
}

async fn handle_show(store: &JsonFileStore, cmd: &ShowCommand) -> anyhow::Result<()> {
    let record = store
        .get_by_id(cmd.id)
        .await?
        .ok_or(Error::RecordNotFound { id: cmd.id })?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Record {}", record.id);
        println!("---------------");
        println!("Document:   {}", text(record.document_number.as_deref()));
        println!("Name:       {}", text(record.full_name.as_deref()));
        println!("Program:    {}", text(record.program.as_deref()));
        println!("Cohort:     {}", text(record.cohort.as_deref()));
        println!(
            "Enrolled:   {}",
            record
                .enrollment_date
                .format(matricula::artifact::receipt::DATE_FORMAT)
        );
        println!("Status:     {}", text(record.status.as_deref()));
    }
    Ok(())
}

async fn handle_edit(store: &JsonFileStore, cmd: &EditCommand) -> anyhow::Result<()> {
    let mut record = store
        .get_by_id(cmd.id)
        .await?
        .ok_or(Error::RecordNotFound { id: cmd.id })?;

    cmd.apply(&mut record);
    record.validate()?;
    let saved = store.save(record).await?;
    println!("Updated record {}", saved.id);
    Ok(())
}

async fn handle_export(store: &JsonFileStore, cmd: &ExportCommand) -> anyhow::Result<()> {
    let artifact = store.fetch_artifact(cmd.id, cmd.kind.into()).await?;
    let output = cmd
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&artifact.file_name));

    tokio::fs::write(&output, &artifact.bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "Wrote {} ({}, {} bytes)",
        output.display(),
        artifact.mime_type(),
        artifact.bytes.len()
    );
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Records file:       {}", config.records_path().display());
                println!("  Artifacts dir:      {}", config.artifacts_path().display());
                println!("  Artifact prefix:    {}", config.storage.artifact_prefix);
                println!("  Atomic writes:      {}", config.storage.atomic_writes);
                println!();
                println!("[Records]");
                println!("  Default status:     {}", config.records.default_status);
                println!();
                println!("[Receipt]");
                println!("  Title:              {}", config.receipt.title);
                println!("  Heading:            {}", config.receipt.heading);
                println!("  Footer:             {}", config.receipt.footer);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_table(records: &[Record]) {
    if records.is_empty() {
        println!("No records.");
        return;
    }
    println!(
        "{:>5}  {:<14}  {:<28}  {:<20}  {:<10}  {:<10}",
        "ID", "Document", "Name", "Program", "Cohort", "Status"
    );
    for record in records {
        println!(
            "{:>5}  {:<14}  {:<28}  {:<20}  {:<10}  {:<10}",
            record.id,
            text(record.document_number.as_deref()),
            text(record.full_name.as_deref()),
            text(record.program.as_deref()),
            text(record.cohort.as_deref()),
            text(record.status.as_deref()),
        );
    }
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or(matricula::artifact::receipt::PLACEHOLDER)
}
