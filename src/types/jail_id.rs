// ABOUTME: Validated jail@host identifiers.
// ABOUTME: Every deployment target and super jail is addressed this way.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JailIdError {
    #[error("jail id cannot be empty")]
    Empty,

    #[error("jail id '{0}' must be of the form jail@host")]
    MissingSeparator(String),

    #[error("jail id '{0}' has an empty jail part")]
    EmptyJail(String),

    #[error("jail id '{0}' has an empty host part")]
    EmptyHost(String),
}

/// A `jail@host` pair naming one jail on one remote host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JailId {
    jail: String,
    host: String,
}

impl JailId {
    pub fn parse(s: &str) -> Result<Self, JailIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(JailIdError::Empty);
        }

        let Some((jail, host)) = s.split_once('@') else {
            return Err(JailIdError::MissingSeparator(s.to_string()));
        };

        if jail.is_empty() {
            return Err(JailIdError::EmptyJail(s.to_string()));
        }
        if host.is_empty() {
            return Err(JailIdError::EmptyHost(s.to_string()));
        }

        Ok(Self {
            jail: jail.to_string(),
            host: host.to_string(),
        })
    }

    pub fn jail(&self) -> &str {
        &self.jail
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Jail name with every non-alphanumeric character replaced by `_`,
    /// the form ezjail uses for its config filenames and variable names.
    pub fn safe_jail(&self) -> String {
        self.jail
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for JailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.jail, self.host)
    }
}

impl std::str::FromStr for JailId {
    type Err = JailIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
