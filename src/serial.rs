//! Serial Number Derivation
//!
//! Two policies share one interface. Callers pick one explicitly; they are
//! never mixed within a session.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::date::{parse_ddmmyy, DateError};
use crate::hashing::issuance_digest;

/// Literal prefix every serial number starts with
pub const SERIAL_PREFIX: &str = "SN-";

const DETERMINISTIC_MODULUS: u128 = 10_000;
const RANDOMIZED_MODULUS: u128 = 1_000_000;
const SALT_MODULUS: u32 = 10_000;

/// Serial number derivation policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialPolicy {
    /// `SN-DDMMYY-HHHH`: 4-digit block, identical inputs give identical output
    #[default]
    Deterministic,
    /// `SN-HHHHHHDDMMYY`: 6-digit salted block, repeated runs differ
    Randomized,
}

impl SerialPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Randomized => "randomized",
        }
    }
}

impl std::str::FromStr for SerialPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deterministic" => Ok(Self::Deterministic),
            "randomized" => Ok(Self::Randomized),
            other => Err(format!("unknown serial policy: {other}")),
        }
    }
}

/// An issued serial number. Immutable; a new generation supersedes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SerialNumber(String);

impl SerialNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DDMMYY component, whichever policy produced it
    pub fn date_component(&self) -> &str {
        let body = &self.0[SERIAL_PREFIX.len()..];
        match body.split_once('-') {
            Some((date, _)) => date,
            None => &body[body.len() - 6..],
        }
    }

    /// The hash-derived numeric block
    pub fn numeric_component(&self) -> &str {
        let body = &self.0[SERIAL_PREFIX.len()..];
        match body.split_once('-') {
            Some((_, block)) => block,
            None => &body[..body.len() - 6],
        }
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SerialNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives serial numbers under a fixed policy
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialNumberGenerator {
    policy: SerialPolicy,
}

impl SerialNumberGenerator {
    pub fn new(policy: SerialPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SerialPolicy {
        self.policy
    }

    /// Derive a serial number. The randomized policy draws its salt from the
    /// thread-local generator.
    pub fn generate(
        &self,
        project_name: &str,
        revision: &str,
        finish_date: &str,
    ) -> Result<SerialNumber, DateError> {
        self.generate_with_rng(project_name, revision, finish_date, &mut rand::thread_rng())
    }

    /// Derive a serial number drawing any salt from `rng`
    pub fn generate_with_rng<R: RngCore + ?Sized>(
        &self,
        project_name: &str,
        revision: &str,
        finish_date: &str,
        rng: &mut R,
    ) -> Result<SerialNumber, DateError> {
        parse_ddmmyy(finish_date)?;
        let digest = issuance_digest(project_name, revision);

        let serial = match self.policy {
            SerialPolicy::Deterministic => {
                let block = digest % DETERMINISTIC_MODULUS;
                format!("{SERIAL_PREFIX}{finish_date}-{block:04}")
            }
            SerialPolicy::Randomized => {
                let salt = u128::from(rng.next_u32() % SALT_MODULUS);
                // (digest + salt) mod m, reduced first to stay in range
                let block = (digest % RANDOMIZED_MODULUS + salt) % RANDOMIZED_MODULUS;
                format!("{SERIAL_PREFIX}{block:06}{finish_date}")
            }
        };

        Ok(SerialNumber(serial))
    }
}
