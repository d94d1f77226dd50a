//! On-disk form of a fitted [`StrokePipeline`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::pipeline::StrokePipeline;

/// Bumped whenever the serialized pipeline layout changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("model file `{}` not found", .0.display())]
    NotFound(PathBuf),
    #[error("model file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("model file is malformed: {0}")]
    Format(#[from] serde_json::Error),
    #[error("model file format version {found} is not supported (expected {expected})")]
    IncompatibleVersion { found: u32, expected: u32 },
}

#[derive(Serialize, Deserialize)]
struct Envelope<P> {
    format_version: u32,
    crate_version: String,
    trained_at_unix: u64,
    pipeline: P,
}

#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
}

pub fn save(path: &Path, pipeline: &StrokePipeline) -> Result<(), ArtifactError> {
    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
        trained_at_unix: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default(),
        pipeline,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &envelope)?;
    writer.flush()?;
    Ok(())
}

pub fn load(path: &Path) -> Result<StrokePipeline, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;

    let header: VersionHeader = serde_json::from_slice(&bytes)?;
    if header.format_version != FORMAT_VERSION {
        return Err(ArtifactError::IncompatibleVersion {
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let envelope: Envelope<StrokePipeline> = serde_json::from_slice(&bytes)?;
    Ok(envelope.pipeline)
}
