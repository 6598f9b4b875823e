//! Gateway operating mode
//!
//! Resolved once at startup from configuration and passed explicitly to
//! the decision engine. Decision-time code never sniffs the environment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the gateway treats whitelisted paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatingMode {
    /// Full authorization on every whitelisted path
    #[default]
    Strict,

    /// Whitelisted paths pass without authorization checks.
    ///
    /// Intended for local development and bring-up only; configuration
    /// refuses it without an explicit acknowledgment flag.
    OpenBypass,
}

impl OperatingMode {
    pub fn is_open_bypass(&self) -> bool {
        matches!(self, OperatingMode::OpenBypass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingMode::Strict => "strict",
            OperatingMode::OpenBypass => "open-bypass",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized mode names in configuration
#[derive(Debug, thiserror::Error)]
#[error("unknown operating mode: {0} (expected \"strict\" or \"open-bypass\")")]
pub struct ParseModeError(pub String);

impl FromStr for OperatingMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(OperatingMode::Strict),
            "open-bypass" | "open_bypass" => Ok(OperatingMode::OpenBypass),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
