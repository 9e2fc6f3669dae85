//! Input-line parser
//!
//! Turns one raw tab-separated line into an [`AppsInstalled`] record.
//! Structural errors reject the line; data errors degrade it with a
//! logged warning. This asymmetry is deliberate and load-bearing: the
//! file-level error rate must only reflect records that were lost.

use crate::error::ParseError;
use crate::record::AppsInstalled;

/// Parse one input line into a record
///
/// The line is trimmed first. Expected layout:
///
/// ```text
/// device_type<TAB>device_id<TAB>lat<TAB>lon<TAB>app_id[,app_id...]
/// ```
///
/// Extra fields beyond the fifth are ignored.
///
/// # Errors
///
/// Returns a [`ParseError`] when the line has fewer than 5 tab-separated
/// fields or an empty device type/id. Bad coordinates or app-id tokens are
/// *not* errors - see [`parse_apps`] and [`parse_geo`].
pub fn parse_line(line: &str) -> Result<AppsInstalled, ParseError> {
    let line = line.trim();
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 5 {
        return Err(ParseError::TooFewFields { found: parts.len() });
    }

    let (device_type, device_id) = (parts[0], parts[1]);
    if device_type.is_empty() {
        return Err(ParseError::EmptyDeviceType);
    }
    if device_id.is_empty() {
        return Err(ParseError::EmptyDeviceId);
    }

    let apps = parse_apps(parts[4], line);
    let (lat, lon) = parse_geo(parts[2], parts[3], line);

    Ok(AppsInstalled {
        device_type: device_type.to_string(),
        device_id: device_id.to_string(),
        lat,
        lon,
        apps,
    })
}

/// Parse the comma-separated app-id list
///
/// First pass parses every token as `u32`. If any token fails, the list is
/// re-filtered keeping only purely numeric tokens and the event is logged
/// as partial data - the record is still emitted.
fn parse_apps(raw: &str, line: &str) -> Vec<u32> {
    let tokens: Vec<&str> = raw.split(',').map(str::trim).collect();

    match tokens.iter().map(|t| t.parse::<u32>()).collect::<Result<Vec<_>, _>>() {
        Ok(apps) => apps,
        Err(_) => {
            tracing::info!(line, "not all app ids are numeric, keeping digit-only tokens");
            tokens
                .iter()
                .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
                .filter_map(|t| t.parse().ok())
                .collect()
        }
    }
}

/// Parse the latitude/longitude pair
///
/// On any failure both coordinates fall back to `0.0` and a warning is
/// logged. Geo problems never reject the record.
fn parse_geo(raw_lat: &str, raw_lon: &str, line: &str) -> (f64, f64) {
    match (raw_lat.parse::<f64>(), raw_lon.parse::<f64>()) {
        (Ok(lat), Ok(lon)) => (lat, lon),
        _ => {
            tracing::info!(line, "invalid geo coordinates, using 0.0");
            (0.0, 0.0)
        }
    }
}
