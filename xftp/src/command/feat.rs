use crate::reply::Reply;
use crate::types::Features;
use crate::FtpError;

/// Parses the reply to `FEAT` ([RFC 2389](https://datatracker.ietf.org/doc/html/rfc2389#section-3.2)).
///
/// - no-features: "211 [SP] ..."
/// - features-list: "211-...", one `SP feature-label [SP params]` per line, then "211 END"
///
/// Feature labels are case-insensitive and are stored upper-cased.
pub fn parse_features(reply: &Reply) -> Result<Features, FtpError> {
    let first_line = reply.lines.first().ok_or(FtpError::BadResponse)?;
    debug!("Parsing features; first line: {first_line}");

    let mut features = Features::with_capacity(reply.lines.len());
    if first_line.starts_with("211-") {
        for line in reply.lines.iter().skip(1) {
            if line.starts_with("211 ") {
                break;
            }
            parse_feature(line, &mut features)?;
        }
        Ok(features)
    } else if first_line.starts_with("211 ") {
        debug!("Found `211` - no features available");
        Ok(features)
    } else {
        Err(FtpError::BadResponse)
    }
}

fn parse_feature(line: &str, features: &mut Features) -> Result<(), FtpError> {
    if !line.starts_with(' ') {
        error!("Feature response doesn't start with ` `: {line}");
        return Err(FtpError::BadResponse);
    }
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    let (label, params) = match line.split_once(' ') {
        Some((label, params)) => (label, Some(params.trim().to_string())),
        None => (line, None),
    };
    debug!("found supported feature: {label}: {params:?}");
    features.insert(label.to_ascii_uppercase(), params);

    Ok(())
}
