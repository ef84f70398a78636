//! Adapter options: raw key/value input and its validated form.
//!
//! The orchestration tool hands each adapter a flat map of option names to
//! text, integer or boolean values. [`SyncOptions::from_raw`] validates that
//! map once and produces an immutable [`SyncOptions`]; the first problem found
//! is reported as a [`ConfigurationError`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::cleanup::CleanupRule;
use crate::remote::{DEFAULT_FTP_PORT, FtpEndpoint};

/// Option key naming the server host.
pub const HOST: &str = "host";
/// Option key naming the control port.
pub const PORT: &str = "port";
/// Option key naming the login user.
pub const USER: &str = "user";
/// Option key naming the login password.
pub const PASSWORD: &str = "password";
/// Option key naming the remote directory.
pub const PATH: &str = "path";
/// Option key toggling passive mode.
pub const PASSIVE: &str = "passive";

/// A single raw option value.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean flag.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Free-form text.
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Unvalidated adapter options keyed by name. Unknown keys are carried but
/// ignored.
#[derive(Clone, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct RawOptions(BTreeMap<String, OptionValue>);

impl RawOptions {
    /// Creates an empty option map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object of option values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Malformed`] when the document is not an
    /// object of strings, integers and booleans.
    pub fn from_json(document: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(document).map_err(|err| ConfigurationError::Malformed {
            message: err.to_string(),
        })
    }

    /// Adds or replaces an option, returning the updated map.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces an option.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the raw value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    /// Returns `true` when `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the value under `name` as text, treating blank text as absent.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(ToString::to_string)
            .filter(|value| !value.trim().is_empty())
    }

    pub(crate) fn required_text(&self, name: &str) -> Result<String, ConfigurationError> {
        self.text(name)
            .ok_or_else(|| ConfigurationError::MissingOption {
                name: name.to_owned(),
            })
    }

    pub(crate) fn integer(&self, name: &str) -> Result<Option<i64>, ConfigurationError> {
        match self.get(name) {
            None => Ok(None),
            Some(OptionValue::Integer(value)) => Ok(Some(*value)),
            Some(OptionValue::Text(value)) if value.trim().is_empty() => Ok(None),
            Some(OptionValue::Text(value)) => value
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(name, "expected a whole number")),
            Some(OptionValue::Bool(_)) => Err(invalid(name, "expected a whole number")),
        }
    }

    pub(crate) fn flag(&self, name: &str, default: bool) -> Result<bool, ConfigurationError> {
        match self.get(name) {
            None => Ok(default),
            Some(OptionValue::Bool(value)) => Ok(*value),
            Some(OptionValue::Integer(value)) => Ok(*value != 0),
            Some(OptionValue::Text(value)) => {
                match value.trim().to_ascii_lowercase().as_str() {
                    "" => Ok(default),
                    "true" | "1" | "yes" | "on" => Ok(true),
                    "false" | "0" | "no" | "off" => Ok(false),
                    _ => Err(invalid(name, "expected a boolean")),
                }
            }
        }
    }
}

impl fmt::Debug for RawOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.0 {
            if name == PASSWORD {
                map.entry(name, &"<redacted>");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for RawOptions
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Errors raised while validating adapter options.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigurationError {
    /// A mandatory option is absent or blank.
    #[error("option '{name}' is missing")]
    MissingOption {
        /// Name of the missing option.
        name: String,
    },
    /// The remote path starts with a separator.
    #[error("absolute path is not allowed")]
    AbsolutePath,
    /// An option is present but unusable.
    #[error("option '{name}' is invalid: {reason}")]
    InvalidValue {
        /// Name of the offending option.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// `cleanup.type` names a strategy this crate does not know.
    #[error("unknown cleanup type '{value}'")]
    UnknownCleanupType {
        /// Value found in `cleanup.type`.
        value: String,
    },
    /// The raw option document could not be parsed.
    #[error("malformed options: {message}")]
    Malformed {
        /// Parser error message.
        message: String,
    },
    /// The adapter was used before a successful setup.
    #[error("sync adapter has not been set up")]
    NotSetUp,
}

pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

/// Validated settings for one FTP sync destination.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncOptions {
    endpoint: FtpEndpoint,
    remote_path: String,
    cleanup: Option<CleanupRule>,
}

impl SyncOptions {
    /// Validates `raw` into sync options.
    ///
    /// Checks run in a fixed order (host, user, password, path, port,
    /// passive, cleanup) and stop at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingOption`] for an absent mandatory
    /// option, [`ConfigurationError::AbsolutePath`] when `path` starts with a
    /// separator, and [`ConfigurationError::InvalidValue`] or
    /// [`ConfigurationError::UnknownCleanupType`] for unusable values.
    pub fn from_raw(raw: &RawOptions) -> Result<Self, ConfigurationError> {
        let host = raw.required_text(HOST)?;
        let user = raw.required_text(USER)?;
        let password = raw.required_text(PASSWORD)?;
        let path = raw.required_text(PATH)?;
        let remote_path = relative_remote_path(&path)?;
        if user.contains(':') {
            return Err(invalid(USER, "':' separates user and password"));
        }
        let port = parse_port(raw)?;
        let passive = raw.flag(PASSIVE, false)?;
        let cleanup = CleanupRule::from_options(raw)?;

        Ok(Self {
            endpoint: FtpEndpoint {
                host: host.trim().to_owned(),
                port,
                user: user.trim().to_owned(),
                password,
                passive,
            },
            remote_path,
            cleanup,
        })
    }

    /// Returns the server connection details.
    #[must_use]
    pub const fn endpoint(&self) -> &FtpEndpoint {
        &self.endpoint
    }

    /// Returns the remote directory, relative to the login directory and
    /// without trailing separators.
    #[must_use]
    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Returns the configured cleanup rule, if any.
    #[must_use]
    pub const fn cleanup(&self) -> Option<&CleanupRule> {
        self.cleanup.as_ref()
    }
}

fn relative_remote_path(path: &str) -> Result<String, ConfigurationError> {
    let trimmed = path.trim();
    if trimmed.starts_with(['/', '\\']) {
        return Err(ConfigurationError::AbsolutePath);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(invalid(PATH, "control characters are not allowed"));
    }
    Ok(trimmed.trim_end_matches(['/', '\\']).to_owned())
}

fn parse_port(raw: &RawOptions) -> Result<u16, ConfigurationError> {
    let Some(value) = raw.integer(PORT)? else {
        return Ok(DEFAULT_FTP_PORT);
    };
    u16::try_from(value)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| invalid(PORT, "expected a port between 1 and 65535"))
}

#[cfg(test)]
mod tests;
