//! Issuance Pipeline - Single Entry Point
//!
//! CRITICAL: generate MUST validate internally. No bypass.
//!
//! The session holds the most recent issuance. A new generation replaces
//! it wholesale; a failed one leaves it untouched.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::GeneratorConfig;
use crate::date::{self, DateError};
use crate::export::{ArtifactExporter, ExportError, ExportedBundle};
use crate::serial::{SerialNumber, SerialNumberGenerator};
use crate::symbol::{SymbolEncoder, SymbolError, SymbolImage};
use crate::validation::{Field, IssuanceRequest, Validator};

pub const STATUS_GENERATED: &str = "Serial number generated.";
pub const STATUS_SAVED: &str = "Files saved successfully.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Please fill in the highlighted fields!")]
    MissingFields(Vec<Field>),

    #[error(transparent)]
    Date(#[from] DateError),

    #[error("Failed to encode QR code: {0}")]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Fields the form should highlight
    pub fn flagged_fields(&self) -> &[Field] {
        match self {
            Self::MissingFields(fields) => fields,
            Self::Date(_) => &[Field::FinishDate],
            _ => &[],
        }
    }
}

/// One successful generation
#[derive(Debug, Clone)]
pub struct Issuance {
    /// The trimmed request, with the finish date as actually used
    pub request: IssuanceRequest,
    pub serial: SerialNumber,
    pub symbol: SymbolImage,
}

pub struct IssuanceSession {
    config: GeneratorConfig,
    validator: Validator,
    generator: SerialNumberGenerator,
    encoder: SymbolEncoder,
    exporter: ArtifactExporter,
    current: Option<Issuance>,
}

impl IssuanceSession {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            validator: Validator::new(),
            generator: SerialNumberGenerator::new(config.policy),
            encoder: SymbolEncoder::new(config.symbol),
            exporter: ArtifactExporter::new(config.naming),
            config,
            current: None,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The held issuance, if any generation has succeeded
    pub fn current(&self) -> Option<&Issuance> {
        self.current.as_ref()
    }

    /// Validate, derive a serial number, and render its symbol.
    pub fn generate(&mut self, request: &IssuanceRequest) -> Result<&Issuance, PipelineError> {
        let request = request.trimmed();
        let validation = self.validator.validate(&request);

        if !validation.valid {
            let missing: Vec<_> = validation
                .violations
                .iter()
                .filter(|v| v.rule == "required_fields")
                .map(|v| v.field)
                .collect();
            tracing::warn!(fields = ?validation.flagged_fields(), "Rejected issuance request");
            if !missing.is_empty() {
                return Err(PipelineError::MissingFields(validation.flagged_fields()));
            }
            return Err(DateError::InvalidFormat(request.finish_date).into());
        }

        let finish_date = date::normalize(&request.finish_date, request.use_current_date)?;
        let serial = self
            .generator
            .generate(&request.project_name, &request.revision, &finish_date)?;
        let symbol = self.encoder.encode(serial.as_str())?;

        tracing::info!(
            serial = %serial,
            policy = self.generator.policy().as_str(),
            project = %request.project_name,
            revision = %request.revision,
            "Serial number generated"
        );

        let issuance = Issuance {
            request: IssuanceRequest {
                finish_date,
                ..request
            },
            serial,
            symbol,
        };
        Ok(&*self.current.insert(issuance))
    }

    /// Export the held issuance.
    ///
    /// A blank or absent `target_dir` falls back to the configured save
    /// directory, then to the working directory.
    pub fn export(&self, target_dir: Option<&Path>) -> Result<ExportedBundle, PipelineError> {
        let issuance = self.current.as_ref().ok_or(ExportError::Precondition)?;
        let dir = self.resolve_target(target_dir);

        let bundle = self
            .exporter
            .export(
                &issuance.request.project_name,
                &issuance.request.revision,
                issuance.serial.as_str(),
                &issuance.symbol,
                &dir,
            )
            .map_err(|e| {
                tracing::warn!(error = %e, dir = %dir.display(), "Export failed");
                e
            })?;

        tracing::info!(
            serial = %issuance.serial,
            dir = %dir.display(),
            files = bundle.artifacts.len(),
            "Files saved"
        );
        Ok(bundle)
    }

    fn resolve_target(&self, target_dir: Option<&Path>) -> PathBuf {
        target_dir
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| self.config.save_directory.clone())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for IssuanceSession {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

/// Render an outcome as the one-line status shown to the user
pub fn status_message<T>(result: &Result<T, PipelineError>, success: &str) -> String {
    match result {
        Ok(_) => success.to_string(),
        Err(e) => e.to_string(),
    }
}
