//! URL handling module for Sumi-Scribe
//!
//! This module provides the [`Address`] type, the only form in which a URL
//! is allowed to enter the frontier, and the link normalizer that produces it.

mod normalize;

use crate::{UrlError, UrlResult};
use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

pub use normalize::normalize;

/// An absolute, normalized HTTP(S) address
///
/// Two addresses are equal iff their normalized serializations are
/// byte-equal. Instances are only produced by [`Address::parse`] and
/// [`normalize`], both of which canonicalize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Url);

impl Address {
    /// Parses and normalizes an absolute address
    ///
    /// Used for the seed, which has no base to resolve against.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_scribe::url::Address;
    ///
    /// let seed = Address::parse("HTTPS://Example.com:443/a?utm_source=x#top").unwrap();
    /// assert_eq!(seed.as_str(), "https://example.com/a");
    /// ```
    pub fn parse(raw: &str) -> UrlResult<Self> {
        let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        normalize::canonicalize(url)
    }

    /// Returns the normalized serialization
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host portion of the address
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
