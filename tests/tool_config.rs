//! Tests for loading and validating the curl tool settings.

use std::env;
use std::ffi::OsString;

use backup_sync::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_CURL_BIN};
use backup_sync::{FtpToolConfig, ToolConfigError};
use rstest::rstest;
use tokio::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Holds the env mutex and restores the touched variables on drop.
struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }
        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

#[test]
fn default_settings_use_curl_on_path() {
    let config = FtpToolConfig::default();
    assert_eq!(config.curl_bin, DEFAULT_CURL_BIN);
    assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    assert_eq!(config.validate(), Ok(()));
}

#[rstest]
#[case::blank_binary("  ", 30, "curl_bin")]
#[case::zero_timeout("curl", 0, "connect_timeout_secs")]
fn validate_names_the_offending_setting(
    #[case] curl_bin: &str,
    #[case] connect_timeout_secs: u32,
    #[case] field: &str,
) {
    let config = FtpToolConfig {
        curl_bin: curl_bin.to_owned(),
        connect_timeout_secs,
    };

    let err = config
        .validate()
        .expect_err("invalid settings should be rejected");

    assert_eq!(
        err,
        ToolConfigError::Invalid {
            field: field.to_owned()
        }
    );
    assert!(
        err.to_string()
            .contains(&format!("BACKUP_SYNC_FTP_{}", field.to_uppercase())),
        "{err}"
    );
}

#[tokio::test]
async fn environment_overrides_curl_binary() {
    let _guard = EnvGuard::set_vars(&[
        ("BACKUP_SYNC_FTP_CURL_BIN", "/opt/curl/bin/curl"),
        ("BACKUP_SYNC_FTP_CONNECT_TIMEOUT_SECS", "5"),
    ])
    .await;

    let config = FtpToolConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("settings should load: {err}"));

    assert_eq!(config.curl_bin, "/opt/curl/bin/curl");
    assert_eq!(config.connect_timeout_secs, 5);
}

#[tokio::test]
async fn environment_zero_timeout_fails_validation() {
    let _guard = EnvGuard::set_vars(&[("BACKUP_SYNC_FTP_CONNECT_TIMEOUT_SECS", "0")]).await;

    let err = FtpToolConfig::load_without_cli_args()
        .expect_err("zero timeout should be rejected");

    assert_eq!(
        err,
        ToolConfigError::Invalid {
            field: String::from("connect_timeout_secs")
        }
    );
}
