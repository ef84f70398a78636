//! Retention rules for pruning old backups on a remote server.
//!
//! A [`CleanupRule`] is parsed from the `cleanup.*` options and applied to a
//! remote directory listing by [`select_obsolete`]. Selection is pure: it
//! never touches the remote side and never mutates the listing it is given.
//!
//! Listings are normalised to oldest-first before a rule is applied. When
//! every entry reports a modification time the entries are stably sorted by
//! it; otherwise the server's order is taken to be upload order.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::options::{ConfigurationError, RawOptions, invalid};
use crate::remote::RemoteFile;

mod literals;

pub use literals::{parse_age, parse_size};

/// Option key selecting the cleanup strategy.
pub const CLEANUP_TYPE: &str = "cleanup.type";
/// Option key holding the number of backups a quantity rule keeps.
pub const CLEANUP_AMOUNT: &str = "cleanup.amount";
/// Option key holding the size limit of a capacity rule.
pub const CLEANUP_SIZE: &str = "cleanup.size";
/// Option key holding the maximum age of an outdated rule.
pub const CLEANUP_OLDER: &str = "cleanup.older";
/// Option key permitting `cleanup.amount = 0`.
pub const CLEANUP_ALLOW_ZERO: &str = "cleanup.allow_zero";

/// Retention strategies understood by `cleanup.type`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CleanupKind {
    /// Keep a fixed number of backups.
    Quantity,
    /// Keep backups within a total size.
    Capacity,
    /// Keep backups younger than an age.
    Outdated,
}

impl fmt::Display for CleanupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Quantity => "quantity",
            Self::Capacity => "capacity",
            Self::Outdated => "outdated",
        };
        f.write_str(label)
    }
}

impl FromStr for CleanupKind {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quantity" => Ok(Self::Quantity),
            "capacity" => Ok(Self::Capacity),
            "outdated" => Ok(Self::Outdated),
            _ => Err(ConfigurationError::UnknownCleanupType {
                value: value.to_owned(),
            }),
        }
    }
}

/// A configured retention rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CleanupRule {
    /// Keep the `keep` newest files and delete the rest. `keep = 0` deletes
    /// every listed file.
    Quantity {
        /// Number of newest files retained.
        keep: usize,
    },
    /// Delete the oldest files until the total size is at most `max_bytes`.
    /// The newest file is always kept.
    Capacity {
        /// Upper bound for the summed size of retained files.
        max_bytes: u64,
    },
    /// Delete files last modified longer than `max_age` ago. Files without a
    /// modification time are kept.
    Outdated {
        /// Age beyond which a file is obsolete.
        max_age: Duration,
    },
}

impl CleanupRule {
    /// Returns the strategy of this rule.
    #[must_use]
    pub const fn kind(&self) -> CleanupKind {
        match self {
            Self::Quantity { .. } => CleanupKind::Quantity,
            Self::Capacity { .. } => CleanupKind::Capacity,
            Self::Outdated { .. } => CleanupKind::Outdated,
        }
    }

    /// Parses the `cleanup.*` options. Returns `Ok(None)` when
    /// `cleanup.type` is absent, meaning no cleanup phase runs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownCleanupType`] for an unknown
    /// strategy, [`ConfigurationError::MissingOption`] when the strategy's
    /// threshold is absent, and [`ConfigurationError::InvalidValue`] when the
    /// threshold is unusable. A zero amount is rejected unless
    /// `cleanup.allow_zero` is truthy.
    pub fn from_options(raw: &RawOptions) -> Result<Option<Self>, ConfigurationError> {
        let Some(kind_text) = raw.text(CLEANUP_TYPE) else {
            return Ok(None);
        };
        let rule = match kind_text.parse::<CleanupKind>()? {
            CleanupKind::Quantity => Self::Quantity {
                keep: parse_amount(raw)?,
            },
            CleanupKind::Capacity => Self::Capacity {
                max_bytes: parse_size(CLEANUP_SIZE, &raw.required_text(CLEANUP_SIZE)?)?,
            },
            CleanupKind::Outdated => Self::Outdated {
                max_age: parse_age(CLEANUP_OLDER, &raw.required_text(CLEANUP_OLDER)?)?,
            },
        };
        Ok(Some(rule))
    }
}

impl fmt::Display for CleanupRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantity { keep } => write!(f, "quantity (keep {keep} newest)"),
            Self::Capacity { max_bytes } => write!(f, "capacity (keep within {max_bytes} bytes)"),
            Self::Outdated { max_age } => {
                write!(f, "outdated (older than {} seconds)", max_age.as_secs())
            }
        }
    }
}

fn parse_amount(raw: &RawOptions) -> Result<usize, ConfigurationError> {
    let amount = raw
        .integer(CLEANUP_AMOUNT)?
        .ok_or_else(|| ConfigurationError::MissingOption {
            name: CLEANUP_AMOUNT.to_owned(),
        })?;
    if amount < 0 {
        return Err(invalid(CLEANUP_AMOUNT, "must not be negative"));
    }
    if amount == 0 && !raw.flag(CLEANUP_ALLOW_ZERO, false)? {
        return Err(invalid(
            CLEANUP_AMOUNT,
            "zero would delete every backup; set cleanup.allow_zero to permit it",
        ));
    }
    usize::try_from(amount).map_err(|_| invalid(CLEANUP_AMOUNT, "value is too large"))
}

/// Selects the files `rule` marks obsolete, evaluating ages against the
/// current time.
#[must_use]
pub fn select_obsolete(listing: &[RemoteFile], rule: &CleanupRule) -> Vec<RemoteFile> {
    select_obsolete_at(listing, rule, Utc::now())
}

/// Selects the files `rule` marks obsolete, evaluating ages against `now`.
///
/// The result is ordered oldest first.
#[must_use]
pub fn select_obsolete_at(
    listing: &[RemoteFile],
    rule: &CleanupRule,
    now: DateTime<Utc>,
) -> Vec<RemoteFile> {
    let ordered = oldest_first(listing);
    let obsolete: Vec<&RemoteFile> = match *rule {
        CleanupRule::Quantity { keep } => {
            let surplus = ordered.len().saturating_sub(keep);
            ordered.into_iter().take(surplus).collect()
        }
        CleanupRule::Capacity { max_bytes } => over_capacity(ordered, max_bytes),
        CleanupRule::Outdated { max_age } => older_than(ordered, max_age, now),
    };
    obsolete.into_iter().cloned().collect()
}

fn oldest_first(listing: &[RemoteFile]) -> Vec<&RemoteFile> {
    let mut ordered: Vec<&RemoteFile> = listing.iter().collect();
    if ordered.iter().all(|file| file.modified.is_some()) {
        ordered.sort_by_key(|file| file.modified);
    }
    ordered
}

fn over_capacity(ordered: Vec<&RemoteFile>, max_bytes: u64) -> Vec<&RemoteFile> {
    let mut total = ordered
        .iter()
        .fold(0_u64, |sum, file| sum.saturating_add(file.size.unwrap_or(0)));
    let mut remaining = ordered.len();
    let mut obsolete = Vec::new();
    for file in ordered {
        if total <= max_bytes || remaining <= 1 {
            break;
        }
        total = total.saturating_sub(file.size.unwrap_or(0));
        remaining -= 1;
        obsolete.push(file);
    }
    obsolete
}

fn older_than(ordered: Vec<&RemoteFile>, max_age: Duration, now: DateTime<Utc>) -> Vec<&RemoteFile> {
    let Some(cutoff) = chrono::Duration::from_std(max_age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
    else {
        return Vec::new();
    };
    ordered
        .into_iter()
        .filter(|file| file.modified.is_some_and(|modified| modified < cutoff))
        .collect()
}
