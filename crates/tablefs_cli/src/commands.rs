//! Subcommand execution against a FilesystemAdapter

use crate::cli::{Commands, ContentSource};
use anyhow::{bail, Context};
use chrono::DateTime;
use std::io::Write;
use tablefs_fs::{Config, FileAttributes, FilesystemAdapter, StorageAttributes, Visibility};

/// Run one filesystem subcommand, printing results to `out`
pub fn execute(fs: &dyn FilesystemAdapter, command: &Commands, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Commands::Write {
            path,
            source,
            private,
            timestamp,
        } => {
            let mut config = Config::new();
            if *private {
                config = config.with_visibility(Visibility::Private);
            }
            if let Some(timestamp) = timestamp {
                config = config.with_timestamp(*timestamp);
            }
            write_from(fs, path, source, &config)?;
        }

        Commands::Read { path } => {
            let contents = fs.read(path)?;
            out.write_all(&contents)?;
        }

        Commands::Ls {
            path,
            recursive,
            json,
            files,
            dirs,
        } => {
            let mut listing = fs.list_contents(path, *recursive);
            if *files {
                listing = listing.files_only();
            } else if *dirs {
                listing = listing.directories_only();
            }

            let entries = listing.to_vec();
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            } else {
                for entry in &entries {
                    writeln!(out, "{}", format_entry(entry))?;
                }
            }
        }

        Commands::Rm { path } => fs.delete(path)?,

        Commands::Rmdir { path } => fs.delete_directory(path)?,

        Commands::Mkdir { path } => fs.create_directory(path, &Config::new())?,

        Commands::Mv {
            source,
            destination,
        } => fs.move_file(source, destination, &Config::new())?,

        Commands::Cp {
            source,
            destination,
        } => fs.copy(source, destination, &Config::new())?,

        Commands::Stat { path, json } => {
            let mut attributes = fs.file_size(path)?;
            if attributes.mime_type.is_none() {
                attributes.mime_type = fs.mime_type(path).ok().and_then(|a| a.mime_type);
            }

            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&attributes)?)?;
            } else {
                write_stat(out, &attributes)?;
            }
        }

        Commands::Visibility { path, value } => match value {
            Some(value) => fs.set_visibility(path, value)?,
            None => {
                let attributes = fs.visibility(path)?;
                let visibility = attributes.visibility.unwrap_or_default();
                writeln!(out, "{}", visibility)?;
            }
        },

        Commands::Config { .. } => bail!("config does not operate on the database"),
    }

    Ok(())
}

fn write_from(
    fs: &dyn FilesystemAdapter,
    path: &str,
    source: &ContentSource,
    config: &Config,
) -> anyhow::Result<()> {
    if let Some(text) = &source.text {
        fs.write(path, text.as_bytes(), config)?;
    } else if let Some(file) = &source.file {
        let mut reader = std::fs::File::open(file)
            .with_context(|| format!("Failed to open {:?}", file))?;
        fs.write_stream(path, &mut reader, config)?;
    } else if source.stdin {
        let mut stdin = std::io::stdin().lock();
        fs.write_stream(path, &mut stdin, config)?;
    } else {
        bail!("no contents given: use --file, --stdin or --text");
    }
    Ok(())
}

fn format_time(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One `ls` line: kind, visibility, size, modified time, path
fn format_entry(entry: &StorageAttributes) -> String {
    let (kind, size) = match entry {
        StorageAttributes::File(file) => ("f", file.file_size.unwrap_or(0).to_string()),
        StorageAttributes::Directory(_) => ("d", "-".to_string()),
    };
    let visibility = entry
        .visibility()
        .map(|v| v.as_str())
        .unwrap_or("-");

    format!(
        "{} {:<7} {:>10} {} {}",
        kind,
        visibility,
        size,
        format_time(entry.last_modified()),
        entry.path()
    )
}

fn write_stat(out: &mut dyn Write, attributes: &FileAttributes) -> std::io::Result<()> {
    writeln!(out, "path:          {}", attributes.path)?;
    writeln!(
        out,
        "size:          {}",
        attributes.file_size.map_or("-".to_string(), |s| s.to_string())
    )?;
    writeln!(
        out,
        "visibility:    {}",
        attributes.visibility.map_or("-", |v| v.as_str())
    )?;
    writeln!(out, "last modified: {}", format_time(attributes.last_modified))?;
    writeln!(
        out,
        "mime type:     {}",
        attributes.mime_type.as_deref().unwrap_or("-")
    )
}
