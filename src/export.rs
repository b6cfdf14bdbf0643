//! Artifact Exporter
//!
//! Writes the serial number text and two raster copies of its symbol.
//! Writes are plain sequential overwrites; a rerun replaces the bundle.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hashing::sha256_hex;
use crate::serial::SERIAL_PREFIX;
use crate::symbol::{SymbolError, SymbolImage};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Missing info or SN not generated!")]
    Precondition,

    #[error("Error creating directory: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error saving SN file: {source}")]
    WriteSerial {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error saving QR files: {source}")]
    WriteSymbol {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error saving QR files: {0}")]
    EncodeSymbol(#[from] SymbolError),
}

/// How bundle filenames are derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    /// `SN-{project}-{revision}.txt`, `QR-{project}-{revision}.{png,bmp}`
    #[default]
    Revision,
    /// `{project}_{serial}.{txt,png,bmp}`
    Serial,
}

impl std::str::FromStr for NamingConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "revision" => Ok(Self::Revision),
            "serial" => Ok(Self::Serial),
            other => Err(format!("unknown naming convention: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SerialText,
    Png,
    Bmp,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::SerialText => "txt",
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }
}

impl NamingConvention {
    pub fn file_name(
        &self,
        kind: ArtifactKind,
        project_name: &str,
        revision: &str,
        serial: &str,
    ) -> String {
        let ext = kind.extension();
        match (self, kind) {
            (Self::Revision, ArtifactKind::SerialText) => {
                format!("SN-{}-{}.{}", project_name, revision, ext)
            }
            (Self::Revision, _) => format!("QR-{}-{}.{}", project_name, revision, ext),
            (Self::Serial, _) => format!("{}_{}.{}", project_name, serial, ext),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub sha256: String,
}

/// The three files written by one export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedBundle {
    pub serial_number: String,
    pub directory: PathBuf,
    pub artifacts: Vec<ExportedArtifact>,
}

impl ExportedBundle {
    pub fn path_of(&self, kind: ArtifactKind) -> Option<&Path> {
        self.artifacts
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.path.as_path())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactExporter {
    naming: NamingConvention,
}

impl ArtifactExporter {
    pub fn new(naming: NamingConvention) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> NamingConvention {
        self.naming
    }

    /// Write the bundle into `target_dir`, creating it if needed.
    ///
    /// A failed text write aborts before any image is written. A failed
    /// image write leaves the text file in place.
    pub fn export(
        &self,
        project_name: &str,
        revision: &str,
        serial_number: &str,
        symbol: &SymbolImage,
        target_dir: &Path,
    ) -> Result<ExportedBundle, ExportError> {
        if project_name.is_empty()
            || revision.is_empty()
            || !serial_number.starts_with(SERIAL_PREFIX)
        {
            return Err(ExportError::Precondition);
        }

        if !target_dir.is_dir() {
            fs::create_dir_all(target_dir).map_err(|source| ExportError::CreateDir {
                path: target_dir.to_path_buf(),
                source,
            })?;
            tracing::debug!(dir = %target_dir.display(), "Created export directory");
        }

        let path_for = |kind: ArtifactKind| {
            target_dir.join(self.naming.file_name(kind, project_name, revision, serial_number))
        };
        let mut artifacts = Vec::with_capacity(3);

        let text_path = path_for(ArtifactKind::SerialText);
        fs::write(&text_path, serial_number.as_bytes()).map_err(|source| {
            ExportError::WriteSerial {
                path: text_path.clone(),
                source,
            }
        })?;
        tracing::debug!(path = %text_path.display(), "Wrote serial number");
        artifacts.push(ExportedArtifact {
            kind: ArtifactKind::SerialText,
            path: text_path,
            sha256: sha256_hex(serial_number.as_bytes()),
        });

        for (kind, format) in [
            (ArtifactKind::Png, ImageFormat::Png),
            (ArtifactKind::Bmp, ImageFormat::Bmp),
        ] {
            let path = path_for(kind);
            let bytes = write_symbol(symbol, format, &path)?;
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote symbol");
            artifacts.push(ExportedArtifact {
                kind,
                path,
                sha256: sha256_hex(&bytes),
            });
        }

        Ok(ExportedBundle {
            serial_number: serial_number.to_string(),
            directory: target_dir.to_path_buf(),
            artifacts,
        })
    }
}

fn write_symbol(
    symbol: &SymbolImage,
    format: ImageFormat,
    path: &Path,
) -> Result<Vec<u8>, ExportError> {
    let bytes = symbol.encode_as(format)?;
    fs::write(path, &bytes).map_err(|source| ExportError::WriteSymbol {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes)
}
