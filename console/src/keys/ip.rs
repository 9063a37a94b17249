//! IPv4 dotted-quad syntax check

/// Returns true iff `candidate` is exactly four dot-separated decimal octets.
///
/// Each octet accepts one to three digits with a value in 0..=255, so `0`,
/// `00` and `010` pass while `256`, `0255` and `1.2.3.4.5` do not. No
/// surrounding whitespace is tolerated; callers trim operator input first.
pub fn validate_ip_format(candidate: &str) -> bool {
    let mut count = 0;
    for octet in candidate.split('.') {
        count += 1;
        if count > 4 || !is_octet(octet) {
            return false;
        }
    }
    count == 4
}

fn is_octet(segment: &str) -> bool {
    if segment.is_empty() || segment.len() > 3 {
        return false;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    segment.parse::<u16>().map(|v| v <= 255).unwrap_or(false)
}
