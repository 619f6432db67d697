//! Requirement tokens.
//!
//! A requirement names a package and, optionally, a version range:
//! `bar` accepts any version, `bar-1.2` accepts versions in `^1.2`, and
//! `bar->=2.7,<3` spells the range out. Package names may not contain
//! `-`, so the first `-` in a token always starts the range.

use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A parsed requirement token.
///
/// The original token text is retained: variant subdirectories are named
/// after the token exactly as the package author wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: String,
    range: Option<VersionReq>,
    token: String,
}

#[derive(Debug, Error)]
pub enum RequirementError {
    #[error("empty requirement token")]
    Empty,

    #[error("invalid package name `{name}` in requirement `{token}`")]
    InvalidName { token: String, name: String },

    #[error("invalid version range `{range}` in requirement `{token}`: {source}")]
    InvalidRange {
        token: String,
        range: String,
        #[source]
        source: semver::Error,
    },
}

impl Requirement {
    /// The requested package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The requested version range, if the token carried one.
    pub fn range(&self) -> Option<&VersionReq> {
        self.range.as_ref()
    }

    /// The token exactly as written.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Whether a concrete version satisfies this requirement.
    pub fn matches(&self, version: &Version) -> bool {
        self.range.as_ref().map_or(true, |range| range.matches(version))
    }
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.is_empty() {
            return Err(RequirementError::Empty);
        }

        let (name, range_text) = match token.split_once('-') {
            Some((name, range)) => (name, Some(range)),
            None => (token, None),
        };

        if !is_valid_name(name) {
            return Err(RequirementError::InvalidName {
                token: token.to_string(),
                name: name.to_string(),
            });
        }

        let range = match range_text {
            Some(text) => Some(text.parse::<VersionReq>().map_err(|source| {
                RequirementError::InvalidRange {
                    token: token.to_string(),
                    range: text.to_string(),
                    source,
                }
            })?),
            None => None,
        };

        Ok(Requirement {
            name: name.to_string(),
            range,
            token: token.to_string(),
        })
    }
}

/// Package names are one or more of `[A-Za-z0-9_.]`, not starting with a
/// dot. `-` is reserved as the name/range separator.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(de::Error::custom)
    }
}
