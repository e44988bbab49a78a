//! SPIR-V bytecode loading
//!
//! Shaders are compiled ahead of time (see `hello_triangle_app/shaders`) and
//! read whole from disk. The bytes are checked and converted to the `u32`
//! words Vulkan expects.

use crate::error::{Error, Result};
use std::path::Path;

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Read a SPIR-V file into little-endian words
///
/// Fails with `Error::ShaderLoad` if the file cannot be read, its length is
/// not a multiple of 4, or it does not start with the SPIR-V magic number.
pub fn load_spirv(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        crate::app_error!("triangle::shader", "Failed to read shader '{}': {}", path.display(), e);
        Error::ShaderLoad(format!("{}: {}", path.display(), e))
    })?;
    let words = spirv_words(&bytes)
        .map_err(|msg| Error::ShaderLoad(format!("{}: {}", path.display(), msg)))?;
    crate::app_debug!(
        "triangle::shader",
        "Loaded '{}' ({} words)",
        path.display(),
        words.len()
    );
    Ok(words)
}

/// Convert raw SPIR-V bytes into words
pub fn spirv_words(bytes: &[u8]) -> std::result::Result<Vec<u32>, String> {
    if bytes.is_empty() {
        return Err("file is empty".to_string());
    }
    if bytes.len() % 4 != 0 {
        return Err(format!("length {} is not a multiple of 4", bytes.len()));
    }
    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    if words[0] != SPIRV_MAGIC {
        return Err(format!("bad magic number 0x{:08x}", words[0]));
    }
    Ok(words)
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
