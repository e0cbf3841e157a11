//! Identifier types used throughout the intercom core.
//!
//! Identifiers coming from hardware or configuration are held in
//! fixed-capacity strings. Construction fails instead of truncating.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// A non-empty string of at most `N` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundedString<const N: usize>(String);

impl<const N: usize> BoundedString<N> {
    /// Maximum length in bytes.
    pub const CAPACITY: usize = N;

    /// Validates and wraps `value`.
    pub fn new(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        let len = value.len();
        if len == 0 || len > N {
            return Err(Error::InvalidIdentifier { len, capacity: N });
        }
        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> Deref for BoundedString<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> AsRef<str> for BoundedString<N> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Display for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> FromStr for BoundedString<N> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<const N: usize> TryFrom<String> for BoundedString<N> {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const N: usize> From<BoundedString<N>> for String {
    fn from(value: BoundedString<N>) -> Self {
        value.0
    }
}

/// Device serial number.
pub type SerialNumber = BoundedString<16>;

/// Firmware version string.
pub type FirmwareVersion = BoundedString<16>;

/// Hardware model string.
pub type ModelName = BoundedString<32>;

/// Caller identifier or dialable number.
pub type CallerId = BoundedString<32>;

/// Opaque handle correlating a call with its audio transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u32);

impl ConnectionId {
    /// Wraps a raw handle issued by the signaling layer.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle.
    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}
