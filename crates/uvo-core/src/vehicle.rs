//! Vehicle identity types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid vehicle IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VehicleIdError {
    #[error("vehicle id cannot be empty")]
    Empty,

    #[error("vehicle id cannot contain whitespace")]
    ContainsWhitespace,
}

/// Opaque identifier assigned to a vehicle by the owners service
///
/// The service hands these back from the account vehicle list; they are
/// treated as opaque keys and never parsed beyond basic validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VehicleId(String);

impl VehicleId {
    /// Create a new VehicleId from an opaque key
    pub fn new(id: impl Into<String>) -> Result<Self, VehicleIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(VehicleIdError::Empty);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(VehicleIdError::ContainsWhitespace);
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VehicleId {
    type Err = VehicleIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VehicleId {
    type Error = VehicleIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<VehicleId> for String {
    fn from(id: VehicleId) -> String {
        id.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vehicle identity as reported by the account vehicle list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    /// Opaque vehicle key
    pub id: VehicleId,

    /// Owner-assigned display name (falls back to the model name upstream)
    pub name: String,

    /// Model name (e.g., "EV6")
    pub model: String,

    /// Model year, when the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

impl VehicleInfo {
    /// Create a new VehicleInfo
    pub fn new(
        id: VehicleId,
        name: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            model: model.into(),
            year: None,
        }
    }

    /// Set the model year
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }
}
