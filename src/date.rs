//! HTTP dates and conditional requests.

use std::time::SystemTime;

/// Formats `time` as an HTTP/1.1 date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// Evaluates an `If-Modified-Since` header against the resource's last
/// modification time.
///
/// Returns `true` (the resource must be sent) when the header is absent,
/// empty or unparseable, or when it predates `last_modified`. HTTP dates
/// have one-second resolution, so `last_modified` is truncated to whole
/// seconds before comparing.
pub fn check_if_modified_since(header: Option<&str>, last_modified: SystemTime) -> bool {
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return true;
    };
    match httpdate::parse_http_date(header) {
        Ok(since) => since < truncate(last_modified),
        Err(_) => true,
    }
}

fn truncate(time: SystemTime) -> SystemTime {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(d.as_secs()),
        Err(_) => time,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn formats_imf_fixdate() {
        assert_eq!(http_date(at(784_111_777)), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn missing_or_garbage_header_means_modified() {
        assert!(check_if_modified_since(None, at(0)));
        assert!(check_if_modified_since(Some(""), at(0)));
        assert!(check_if_modified_since(Some("yesterday-ish"), at(0)));
    }

    #[test]
    fn compares_against_last_modified() {
        let header = Some("Sun, 06 Nov 1994 08:49:37 GMT");
        assert!(check_if_modified_since(header, at(784_111_778)));
        assert!(!check_if_modified_since(header, at(784_111_777)));
        assert!(!check_if_modified_since(header, at(784_111_700)));
    }

    #[test]
    fn sub_second_modification_is_not_newer() {
        let header = Some("Sun, 06 Nov 1994 08:49:37 GMT");
        let last = at(784_111_777) + Duration::from_millis(400);
        assert!(!check_if_modified_since(header, last));
    }

    #[test]
    fn accepts_obsolete_date_formats() {
        assert!(!check_if_modified_since(Some("Sunday, 06-Nov-94 08:49:37 GMT"), at(784_111_777)));
        assert!(!check_if_modified_since(Some("Sun Nov  6 08:49:37 1994"), at(784_111_777)));
    }
}
