//! Duration parser tests.

use scenereel::parse_duration;

#[test]
fn seconds_only() {
    assert_eq!(parse_duration("45"), 45);
    assert_eq!(parse_duration("0"), 0);
}

#[test]
fn minutes_and_seconds() {
    assert_eq!(parse_duration("4:13"), 253);
    assert_eq!(parse_duration("10:00"), 600);
}

#[test]
fn hours_minutes_seconds() {
    assert_eq!(parse_duration("1:02:03"), 3723);
    assert_eq!(parse_duration("00:00:07"), 7);
}

#[test]
fn components_are_not_normalized() {
    assert_eq!(parse_duration("75"), 75);
    assert_eq!(parse_duration("1:75"), 135);
}

#[test]
fn malformed_input_yields_zero() {
    for input in ["", "live", "1:xx", "1::2", "-5", "1:2:3:4", "1.5", ":30"] {
        assert_eq!(parse_duration(input), 0, "input {input:?}");
    }
}

#[test]
fn surrounding_whitespace_is_ignored() {
    assert_eq!(parse_duration(" 2:05 "), 125);
}

#[test]
fn parsing_is_deterministic() {
    assert_eq!(parse_duration("3:21"), parse_duration("3:21"));
}
