//! `cops version`: build version plus a digest of the running executable,
//! so two copies of the binary on different hosts can be told apart.

use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io;
use std::path::Path;

/// Lowercase hex MD5 of the file at `path`
pub fn file_md5(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Version report for the running executable
pub fn render() -> Result<String> {
    let exe = std::env::current_exe().context("failed to locate the running executable")?;
    Ok(format!(
        "cops version {}\nMD5 hash: {}",
        env!("CARGO_PKG_VERSION"),
        file_md5(&exe)?
    ))
}
