//! Parser for machine-readable `MLSD` directory listings (RFC 3659).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use super::{RemoteFile, TransportError};

/// Parses the body of an `MLSD` response into the plain files it lists.
///
/// Directory, link and other non-file entries are skipped. Entries keep the
/// order in which the server returned them.
///
/// # Errors
///
/// Returns [`TransportError::Listing`] when a line has no fact/name
/// separator or carries an unreadable `size` or `modify` fact.
pub fn parse_mlsd_listing(body: &str) -> Result<Vec<RemoteFile>, TransportError> {
    let mut files = Vec::new();
    for raw_line in body.lines() {
        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if let Some(file) = parse_line(line)? {
            files.push(file);
        }
    }
    Ok(files)
}

fn parse_line(line: &str) -> Result<Option<RemoteFile>, TransportError> {
    let Some((facts, name)) = line.split_once(' ') else {
        return Err(listing_error(format!("missing fact separator in {line:?}")));
    };
    if name.is_empty() {
        return Err(listing_error(format!("missing file name in {line:?}")));
    }

    let mut file = RemoteFile::named(name);
    for fact in facts.split(';').filter(|fact| !fact.is_empty()) {
        let Some((key, value)) = fact.split_once('=') else {
            continue;
        };
        match key.to_ascii_lowercase().as_str() {
            "type" if !value.eq_ignore_ascii_case("file") => return Ok(None),
            "size" => {
                let size = value
                    .parse::<u64>()
                    .map_err(|err| listing_error(format!("size of {name}: {err}")))?;
                file.size = Some(size);
            }
            "modify" => file.modified = Some(parse_modify(name, value)?),
            _ => {}
        }
    }
    Ok(Some(file))
}

fn parse_modify(name: &str, value: &str) -> Result<DateTime<Utc>, TransportError> {
    let whole_seconds = value.split_once('.').map_or(value, |(head, _)| head);
    let naive = NaiveDateTime::parse_from_str(whole_seconds, "%Y%m%d%H%M%S")
        .map_err(|err| listing_error(format!("modify time of {name}: {err}")))?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn listing_error(message: String) -> TransportError {
    TransportError::Listing { message }
}
