//! Deliverable artifact types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error from parsing an [`ArtifactType`] symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown artifact type '{0}'")]
pub struct ParseArtifactTypeError(pub String);

/// The packaging format of a deliverable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    /// A Debian package.
    Deb,
    /// A Docker image.
    Docker,
    /// An RPM package.
    Rpm,
}

impl ArtifactType {
    /// The canonical symbolic name, e.g. `"DOCKER"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deb => "DEB",
            Self::Docker => "DOCKER",
            Self::Rpm => "RPM",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = ParseArtifactTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEB" => Ok(Self::Deb),
            "DOCKER" => Ok(Self::Docker),
            "RPM" => Ok(Self::Rpm),
            other => Err(ParseArtifactTypeError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_names_round_trip() {
        for t in [ArtifactType::Deb, ArtifactType::Docker, ArtifactType::Rpm] {
            let parsed: ArtifactType = t.as_str().parse().unwrap();
            assert_eq!(parsed, t);
        }
        assert_eq!(ArtifactType::Docker.to_string(), "DOCKER");
    }

    #[test]
    fn rejects_unknown_name() {
        assert!("JAR".parse::<ArtifactType>().is_err());
    }
}
