//! SerialForge Core - Serial Number & QR Artifact Engine
//!
//! # The Rules
//! 1. Every serial number starts with `SN-`
//! 2. Dates are DDMMYY, verbatim
//! 3. Policies are chosen, never mixed
//! 4. Generation always validates
//! 5. A failed generation never touches the held issuance
//! 6. Exports overwrite, last write wins

pub mod config;
pub mod date;
pub mod hashing;
pub mod serial;
pub mod symbol;
pub mod validation;
pub mod export;
pub mod pipeline;

pub use config::{ConfigError, GeneratorConfig};
pub use date::{normalize, DateError};
pub use export::{ArtifactExporter, ArtifactKind, ExportError, ExportedBundle, NamingConvention};
pub use serial::{SerialNumber, SerialNumberGenerator, SerialPolicy, SERIAL_PREFIX};
pub use symbol::{SymbolEncoder, SymbolError, SymbolImage, SymbolSpec};
pub use validation::{Field, IssuanceRequest, ValidationResult, ValidationRule, Validator};
pub use pipeline::{status_message, Issuance, IssuanceSession, PipelineError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
