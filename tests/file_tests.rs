//! Integration tests for file I/O operations.

use flate2::read::GzDecoder;
use std::fs;
use std::io::{Read, Write};
use tempfile::{NamedTempFile, TempDir};
use yamlrelay::document::Value;
use yamlrelay::engine::ReplacementEngine;
use yamlrelay::file::loader::{load_documents, load_function_config};
use yamlrelay::file::saver::save_documents;

const CONFIG: &str = r#"apiVersion: yamlrelay.io/v1alpha1
kind: Relay
metadata:
  name: image
spec:
  replacements:
    - source:
        selector:
          kind: ConfigMap
          name: images
      targets:
        - selector:
            kind: Deployment
          expressions:
            - .spec.template.spec.containers[0].image = $images.data.web
"#;

const STREAM: &str = r#"apiVersion: v1
kind: ConfigMap
metadata:
  name: images
data:
  web: registry.example/web:2.0
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  template:
    spec:
      containers:
        - name: web
          image: registry.example/web:1.0
"#;

fn image(document: &yamlrelay::document::Document) -> Option<Value> {
    match document
        .map_view()
        .pointer(["spec", "template", "spec", "containers"])
    {
        Some(Value::Array(items)) => items.first().and_then(|c| c.get("image")).cloned(),
        _ => None,
    }
}

#[test]
fn test_load_simple_stream() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", STREAM).unwrap();

    let documents = load_documents(temp_file.path()).unwrap();

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].kind(), "ConfigMap");
    assert_eq!(documents[1].api_version(), "apps/v1");
}

#[test]
fn test_load_stream_skips_empty_documents() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "---\n---\nkind: A\n---\n").unwrap();

    let documents = load_documents(temp_file.path()).unwrap();
    assert_eq!(documents.len(), 1);
}

#[test]
fn test_load_invalid_yaml_fails() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "kind: [unclosed").unwrap();

    assert!(load_documents(temp_file.path()).is_err());
}

#[test]
fn test_load_save_apply_round_trip() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("relay.yaml");
    let input_path = dir.path().join("in.yaml");
    let output_path = dir.path().join("out.yaml");
    fs::write(&config_path, CONFIG).unwrap();
    fs::write(&input_path, STREAM).unwrap();

    let config = load_function_config(&config_path).unwrap();
    let documents = load_documents(&input_path).unwrap();
    let out = ReplacementEngine::new()
        .apply(documents, config.replacements())
        .unwrap();
    save_documents(&output_path, &out, false).unwrap();

    let reloaded = load_documents(&output_path).unwrap();
    assert_eq!(reloaded, out);
    assert_eq!(
        image(&reloaded[1]),
        Some(Value::from("registry.example/web:2.0"))
    );
}

#[test]
fn test_gzip_round_trip() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("in.yaml");
    let gz_path = dir.path().join("out.yaml.gz");
    fs::write(&input_path, STREAM).unwrap();

    let documents = load_documents(&input_path).unwrap();
    save_documents(&gz_path, &documents, false).unwrap();

    let bytes = fs::read(&gz_path).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut text = String::new();
    decoder.read_to_string(&mut text).unwrap();
    assert!(text.contains("registry.example/web:1.0"));

    assert_eq!(load_documents(&gz_path).unwrap(), documents);
}

#[test]
fn test_in_place_rewrite_with_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stream.yaml");
    fs::write(&path, STREAM).unwrap();

    let documents = load_documents(&path).unwrap();
    let config = yamlrelay::file::loader::parse_function_config(CONFIG).unwrap();
    let out = ReplacementEngine::new()
        .apply(documents, config.replacements())
        .unwrap();
    save_documents(&path, &out, true).unwrap();

    let backup = fs::read_to_string(dir.path().join("stream.yaml.bak")).unwrap();
    assert_eq!(backup, STREAM);
    let rewritten = load_documents(&path).unwrap();
    assert_eq!(
        image(&rewritten[1]),
        Some(Value::from("registry.example/web:2.0"))
    );
}

#[test]
fn test_load_function_config_from_gzip() {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("relay.yaml.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(CONFIG.as_bytes()).unwrap();
    fs::write(&path, encoder.finish().unwrap()).unwrap();

    let config = load_function_config(&path).unwrap();
    assert_eq!(config.metadata.name, "image");
    assert!(config.replacements()[0].source.is_some());
}
