// =============================================================================
// BUILD VERIFICATION MODULE - tools/goose-builder/src/verification/mod.rs
// =============================================================================

//! Sanity checks on the linked payload
//!
//! The linker exiting zero is not enough: the file must be an ELF image. The
//! verifier also records size and SHA-256 for the build report.

use log::info;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use shared::{BuildError, BuildResult};

/// First four bytes of every ELF file
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Result of verifying one linked artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuildVerifier;

impl BuildVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Check the ELF magic and fingerprint the file
    pub fn verify(&self, artifact: &Path) -> BuildResult<VerificationResult> {
        let data = fs::read(artifact).map_err(|err| BuildError::Verification {
            path: artifact.to_path_buf(),
            message: format!("cannot read linked output: {}", err),
        })?;

        if !is_elf(&data) {
            return Err(BuildError::Verification {
                path: artifact.to_path_buf(),
                message: "missing ELF magic number".to_string(),
            });
        }

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let sha256 = format!("{:x}", hasher.finalize());

        info!("Verified {} ({} bytes, sha256 {})", artifact.display(), data.len(), sha256);
        Ok(VerificationResult {
            path: artifact.to_path_buf(),
            size: data.len() as u64,
            sha256,
        })
    }
}

/// True when `data` starts with the ELF magic number
pub fn is_elf(data: &[u8]) -> bool {
    data.starts_with(&ELF_MAGIC)
}
