//! Text scans over keygen responses
//!
//! Appliance responses look like XML
//! (`<response status='success'><result><key>...</key></result></response>`)
//! but are not guaranteed to be well formed, so they are scanned as plain
//! text rather than parsed. Malformed bodies simply yield no match.

const KEY_OPEN: &str = "<key>";
const KEY_CLOSE: &str = "</key>";
const STATUS_NAME: &str = "status";

/// Inner text of the first `<key>...</key>` pair on a single line.
///
/// An opening tag whose closing tag only appears after a line break is
/// skipped and the scan resumes at the next opening tag. The capture may be
/// empty.
pub fn extract_key(body: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(pos) = body[from..].find(KEY_OPEN) {
        let start = from + pos + KEY_OPEN.len();
        let rest = &body[start..];
        let line = match rest.find(is_line_break) {
            Some(end) => &rest[..end],
            None => rest,
        };
        if let Some(end) = line.find(KEY_CLOSE) {
            return Some(&line[..end]);
        }
        from = start;
    }
    None
}

/// Value of the first `status = 'value'` (or double-quoted) attribute.
///
/// Whitespace is allowed on either side of `=`. The value must be non-empty
/// and contain no quote of either kind; the closing quote may be either kind.
pub fn extract_status(body: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(pos) = body[from..].find(STATUS_NAME) {
        let start = from + pos + STATUS_NAME.len();
        if let Some(value) = match_status_value(&body[start..]) {
            return Some(value);
        }
        from = start;
    }
    None
}

fn match_status_value(rest: &str) -> Option<&str> {
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let rest = rest.strip_prefix(is_quote)?;
    let end = rest.find(is_quote)?;
    if end == 0 {
        return None;
    }
    Some(&rest[..end])
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}
