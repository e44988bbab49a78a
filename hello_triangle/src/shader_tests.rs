//! Unit tests for shader.rs

use crate::error::Error;
use crate::shader::*;
use std::path::PathBuf;

fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "hello_triangle_{}_{}.spv",
        std::process::id(),
        name
    ));
    std::fs::write(&path, bytes).unwrap();
    path
}

fn minimal_module() -> Vec<u8> {
    // magic, version 1.0, generator, bound, schema
    [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0]
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .collect()
}

// ============================================================================
// BYTE CHECKS
// ============================================================================

#[test]
fn test_spirv_words_accepts_valid_header() {
    let words = spirv_words(&minimal_module()).unwrap();
    assert_eq!(words.len(), 5);
    assert_eq!(words[0], SPIRV_MAGIC);
    assert_eq!(words[1], 0x0001_0000);
}

#[test]
fn test_spirv_words_rejects_unaligned_length() {
    let mut bytes = minimal_module();
    bytes.push(0);
    let err = spirv_words(&bytes).unwrap_err();
    assert!(err.contains("multiple of 4"));
}

#[test]
fn test_spirv_words_rejects_bad_magic() {
    let mut bytes = minimal_module();
    bytes[0] = 0xFF;
    let err = spirv_words(&bytes).unwrap_err();
    assert!(err.contains("magic"));
}

#[test]
fn test_spirv_words_rejects_empty() {
    assert!(spirv_words(&[]).is_err());
}

// ============================================================================
// FILE LOADING
// ============================================================================

#[test]
fn test_load_spirv_from_file() {
    let path = temp_file("valid", &minimal_module());
    let words = load_spirv(&path).unwrap();
    assert_eq!(words[0], SPIRV_MAGIC);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_spirv_missing_file() {
    let err = load_spirv("this/file/does/not/exist.spv").unwrap_err();
    assert!(matches!(err, Error::ShaderLoad(_)));
    assert!(err.is_setup_error());
}

#[test]
fn test_load_spirv_truncated_file() {
    let path = temp_file("truncated", &minimal_module()[..7]);
    let err = load_spirv(&path).unwrap_err();
    match err {
        Error::ShaderLoad(msg) => assert!(msg.contains("length 7")),
        other => panic!("unexpected error: {:?}", other),
    }
    std::fs::remove_file(path).ok();
}
