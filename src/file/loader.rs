//! Resource stream and function config loading.
//!
//! This module reads multi-document YAML streams from files or stdin and
//! parses them into [`Document`]s, and reads the function config that
//! carries the replacement rules. Gzip-compressed input is detected by the
//! `.gz` extension for files and by the magic bytes for stdin.

use crate::document::parser::parse_documents;
use crate::document::Document;
use crate::engine::rule::{FunctionConfig, API_VERSION, KIND};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Loads and parses a multi-document YAML file from the filesystem.
///
/// # Arguments
///
/// * `path` - The path to the YAML stream, optionally ending in `.gz`
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(Vec<Document>)` with the documents in stream order
/// - `Err(anyhow::Error)` if:
///   - The file could not be read (doesn't exist, permission denied, etc.)
///   - The file is gzipped but corrupted
///   - A document is not valid YAML or is not a mapping
///
/// # Examples
///
/// ```no_run
/// use yamlrelay::file::loader::load_documents;
///
/// let documents = load_documents("manifests.yaml").unwrap();
/// println!("{} documents", documents.len());
/// ```
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let content = read_content(path)?;
    parse_documents(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Loads and parses a multi-document YAML stream from standard input.
///
/// Input starting with the gzip magic bytes (`0x1f 0x8b`) is decompressed
/// first.
///
/// # Examples
///
/// ```no_run
/// use yamlrelay::file::loader::load_documents_from_stdin;
///
/// // Usage: kustomize build . | yamlrelay --config relay.yaml
/// let documents = load_documents_from_stdin().unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - Reading from stdin fails
/// - The input is not valid UTF-8 or not a valid YAML stream
pub fn load_documents_from_stdin() -> Result<Vec<Document>> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let content = decode_bytes(buffer)?;
    parse_documents(&content).context("Failed to parse YAML from stdin")
}

/// Loads a function config carrying the replacement rules.
///
/// A config whose `apiVersion` or `kind` differ from the expected ones is
/// still accepted; the mismatch is logged as a warning.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not deserialize into
/// a [`FunctionConfig`].
pub fn load_function_config<P: AsRef<Path>>(path: P) -> Result<FunctionConfig> {
    let path = path.as_ref();
    let content = read_content(path)?;
    let config = parse_function_config(&content)
        .with_context(|| format!("Failed to parse function config {}", path.display()))?;

    log::debug!(
        "loaded {} replacements from {}",
        config.replacements().len(),
        path.display()
    );
    Ok(config)
}

/// Parses a function config from YAML text.
pub fn parse_function_config(content: &str) -> Result<FunctionConfig> {
    let config: FunctionConfig =
        serde_yaml::from_str(content).context("Invalid function config")?;

    if config.api_version != API_VERSION || config.kind != KIND {
        log::warn!(
            "function config has apiVersion '{}' and kind '{}', expected {} {}",
            config.api_version,
            config.kind,
            API_VERSION,
            KIND
        );
    }
    Ok(config)
}

fn read_content(path: &Path) -> Result<String> {
    if is_gzipped(path) {
        read_gzipped_file(path)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false)
}

fn decode_bytes(buffer: Vec<u8>) -> Result<String> {
    if buffer.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&buffer)
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in stdin")
    }
}

/// Reads and decompresses a gzipped file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - The file is not valid gzip format (corrupted)
/// - The decompressed content is not valid UTF-8
fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped stdin")?;
    Ok(content)
}
