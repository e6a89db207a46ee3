//! Resource identity and check-outcome types.
//!
//! A resource is addressed by its [`ResourceName`] together with the
//! [`ApiVersion`] and kind of the spec that declared it. A scheduled check
//! of a resource ends in one of the [`ResourceState`] outcomes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum allowed length for a [`ResourceName`].
const RESOURCE_NAME_MAX_LEN: usize = 253;

/// Errors from constructing a [`ResourceName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceNameError {
    /// The input was empty or contained only whitespace.
    #[error("resource name cannot be empty or whitespace")]
    Empty,
    /// The name contains characters other than `a-z`, `0-9`, `.`, `_` and `-`.
    #[error("resource name contains invalid characters (only a-z, 0-9, '.', '_' and '-' allowed)")]
    InvalidCharacters,
    /// The name exceeds [`RESOURCE_NAME_MAX_LEN`] characters.
    #[error("resource name exceeds maximum length of {RESOURCE_NAME_MAX_LEN} characters")]
    TooLong,
}

/// A validated resource name.
///
/// Names are trimmed and lowercased on construction. After normalization
/// the name must be non-empty, at most 253 characters, and contain only
/// `a-z`, `0-9`, `.`, `_` and `-`.
///
/// # Examples
///
/// ```
/// use rudder_core::ResourceName;
///
/// let name: ResourceName = "web".parse().unwrap();
/// assert_eq!(name.as_str(), "web");
///
/// let name: ResourceName = " Payments-API ".parse().unwrap();
/// assert_eq!(name.as_str(), "payments-api");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    /// Create a new `ResourceName`, normalizing and validating the input.
    pub fn new(raw: &str) -> Result<Self, ResourceNameError> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ResourceNameError::Empty);
        }
        if !normalized
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'_' | b'-'))
        {
            return Err(ResourceNameError::InvalidCharacters);
        }
        if normalized.len() > RESOURCE_NAME_MAX_LEN {
            return Err(ResourceNameError::TooLong);
        }

        Ok(Self(normalized))
    }

    /// Return the inner string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceName {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.0
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ResourceName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResourceName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Errors from parsing an [`ApiVersion`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiVersionError {
    /// The input was empty or contained only whitespace.
    #[error("api version cannot be empty")]
    Empty,
    /// The version segment after the final `/` was empty.
    #[error("api version '{0}' is missing a version segment")]
    MissingVersion(String),
}

/// An API version, optionally qualified by a group.
///
/// The canonical string form is `group/version`, or a bare `version` when
/// there is no group (`"ec2.rudder.io/v1"`, `"v1"`).
///
/// # Examples
///
/// ```
/// use rudder_core::ApiVersion;
///
/// let v: ApiVersion = "ec2.rudder.io/v1".parse().unwrap();
/// assert_eq!(v.group(), "ec2.rudder.io");
/// assert_eq!(v.version(), "v1");
/// assert_eq!(v.to_string(), "ec2.rudder.io/v1");
///
/// let bare: ApiVersion = "v1".parse().unwrap();
/// assert_eq!(bare.to_string(), "v1");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion {
    group: String,
    version: String,
}

impl ApiVersion {
    /// Parse an API version from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, ApiVersionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ApiVersionError::Empty);
        }
        match trimmed.rsplit_once('/') {
            Some((group, version)) => {
                if version.is_empty() {
                    return Err(ApiVersionError::MissingVersion(trimmed.to_owned()));
                }
                Ok(Self {
                    group: group.to_owned(),
                    version: version.to_owned(),
                })
            }
            None => Ok(Self {
                group: String::new(),
                version: trimmed.to_owned(),
            }),
        }
    }

    /// The group segment; empty for an unqualified version.
    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The version segment.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}

impl FromStr for ApiVersion {
    type Err = ApiVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = ApiVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ApiVersion> for String {
    fn from(v: ApiVersion) -> Self {
        v.to_string()
    }
}

/// Error from parsing a [`ResourceState`] symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource state '{0}'")]
pub struct ParseResourceStateError(pub String);

/// Outcome of a scheduled resource check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceState {
    /// The resource matches its declared spec.
    Active,
    /// The resource exists but has drifted from its declared spec.
    Diff,
    /// The resource does not exist.
    Missing,
    /// The check itself failed.
    Error,
}

impl ResourceState {
    /// The canonical symbolic name, e.g. `"ACTIVE"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Diff => "DIFF",
            Self::Missing => "MISSING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceState {
    type Err = ParseResourceStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "DIFF" => Ok(Self::Diff),
            "MISSING" => Ok(Self::Missing),
            "ERROR" => Ok(Self::Error),
            other => Err(ParseResourceStateError(other.to_owned())),
        }
    }
}
