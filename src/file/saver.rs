//! Resource stream saving.
//!
//! This module writes documents back out as a `---`-separated YAML stream,
//! either to any writer (stdout) or to a file with atomic write operations
//! and optional backup creation.

use crate::document::parser::print_documents;
use crate::document::Document;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Saves documents to a file as a YAML stream.
///
/// The write is atomic (temp file then rename) so a crash never leaves the
/// target half written. Targets ending in `.gz` are gzip-compressed.
///
/// # Arguments
///
/// * `path` - The path where the stream should be saved
/// * `documents` - The documents to serialize, in order
/// * `backup` - Copy an existing target to `<name>.bak` before overwriting
///
/// # Examples
///
/// ```no_run
/// use yamlrelay::file::loader::load_documents;
/// use yamlrelay::file::saver::save_documents;
///
/// let documents = load_documents("in.yaml").unwrap();
/// save_documents("out.yaml", &documents, false).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - A document cannot be serialized
/// - Backup creation fails (if requested)
/// - Writing or renaming the temp file fails
pub fn save_documents<P: AsRef<Path>>(path: P, documents: &[Document], backup: bool) -> Result<()> {
    let path = path.as_ref();
    let should_compress = path.to_string_lossy().ends_with(".gz");

    if backup && path.exists() {
        create_backup(path)?;
    }

    let yaml = print_documents(documents)?;
    write_file_atomic(path, yaml.as_bytes(), should_compress)
        .with_context(|| format!("Failed to save {}", path.display()))?;

    log::debug!("wrote {} documents to {}", documents.len(), path.display());
    Ok(())
}

/// Writes documents as a YAML stream to `writer`.
pub fn write_documents<W: Write>(mut writer: W, documents: &[Document]) -> Result<()> {
    let yaml = print_documents(documents)?;
    writer
        .write_all(yaml.as_bytes())
        .context("Failed to write output")?;
    writer.flush().context("Failed to flush output")?;
    Ok(())
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
    backup_path.set_file_name(format!("{}.bak", original_name));
    fs::copy(path, backup_path).context("Failed to create backup")?;
    Ok(())
}

/// Writes data to a file atomically, optionally compressing with gzip.
///
/// # Errors
///
/// Returns an error if:
/// - Creating the temp file fails
/// - Writing or compressing fails
/// - Renaming the temp file fails
fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8], compress: bool) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;
    Ok(())
}
