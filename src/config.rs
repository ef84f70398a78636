//! Tool settings for the curl-backed FTP transport, loaded via
//! `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default name of the `curl` executable.
pub const DEFAULT_CURL_BIN: &str = "curl";

/// Default limit, in seconds, for establishing the control connection.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u32 = 30;

/// Settings for the transfer program, merged from defaults, configuration
/// files, environment variables and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "BACKUP_SYNC_FTP")]
pub struct FtpToolConfig {
    /// Path to the `curl` executable.
    #[ortho_config(default = DEFAULT_CURL_BIN.to_owned())]
    pub curl_bin: String,
    /// Seconds allowed for the control connection to be established.
    #[ortho_config(default = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u32,
}

impl Default for FtpToolConfig {
    fn default() -> Self {
        Self {
            curl_bin: DEFAULT_CURL_BIN.to_owned(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Errors raised when loading or validating tool settings.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ToolConfigError {
    /// Indicates that a required setting is blank or out of range.
    #[error("invalid tool setting {field}: set BACKUP_SYNC_FTP_{env_suffix}", env_suffix = field.to_uppercase())]
    Invalid {
        /// Setting that failed validation.
        field: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("tool configuration parsing failed: {0}")]
    Parse(String),
}

impl FtpToolConfig {
    /// Loads settings without attempting to parse CLI arguments. Values still
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ToolConfigError::Parse`] when the merge fails, or
    /// [`ToolConfigError::Invalid`] when the merged values fail validation.
    pub fn load_without_cli_args() -> Result<Self, ToolConfigError> {
        let config = Self::load_from_iter([std::ffi::OsString::from("backup-sync")])
            .map_err(|err| ToolConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Ensures the executable name is present and the timeout is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ToolConfigError::Invalid`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ToolConfigError> {
        if self.curl_bin.trim().is_empty() {
            return Err(ToolConfigError::Invalid {
                field: String::from("curl_bin"),
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ToolConfigError::Invalid {
                field: String::from("connect_timeout_secs"),
            });
        }
        Ok(())
    }
}
