//! Human-readable duration parsing.
//!
//! Search results report video lengths as timestamp strings such as `"4:13"`
//! or `"1:02:03"`. [`parse_duration`] turns them into whole seconds.

/// Parse a colon-separated timestamp into total seconds.
///
/// Accepts one to three numeric components, interpreted strictly by count:
/// `ss`, `mm:ss`, or `hh:mm:ss`. Components are taken literally and never
/// normalized, so `"75"` is 75 seconds and `"1:75"` is 135 seconds.
///
/// Empty or malformed input returns `0` instead of an error: a bad duration
/// on one search result must not abort candidate selection.
///
/// # Example
///
/// ```
/// use scenereel::parse_duration;
///
/// assert_eq!(parse_duration("1:30"), 90);
/// assert_eq!(parse_duration("1:02:03"), 3723);
/// assert_eq!(parse_duration("45"), 45);
/// assert_eq!(parse_duration(""), 0);
/// assert_eq!(parse_duration("live"), 0);
/// ```
pub fn parse_duration(value: &str) -> u64 {
    let mut parts = [0_u64; 3];
    let mut count = 0;

    for component in value.split(':') {
        if count == parts.len() {
            return 0;
        }
        match component.trim().parse::<u64>() {
            Ok(number) => parts[count] = number,
            Err(_) => return 0,
        }
        count += 1;
    }

    let total = match count {
        1 => Some(parts[0]),
        2 => parts[0].checked_mul(60).and_then(|m| m.checked_add(parts[1])),
        3 => parts[0]
            .checked_mul(3600)
            .and_then(|h| h.checked_add(parts[1].checked_mul(60)?))
            .and_then(|hm| hm.checked_add(parts[2])),
        _ => None,
    };

    total.unwrap_or(0)
}
