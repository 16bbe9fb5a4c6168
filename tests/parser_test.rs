//! Tests for the log line parser.

use logwarden::parser::parse_line;

#[test]
fn parses_full_line() {
    let record = parse_line("2026-08-29 14:30:00 ERROR [Database] Query timeout after 5231ms")
        .expect("line should parse");

    assert_eq!(record.timestamp, "2026-08-29 14:30:00");
    assert_eq!(record.level, "ERROR");
    assert_eq!(record.component, "Database");
    assert_eq!(record.message, "Query timeout after 5231ms");
    assert_eq!(record.response_time_ms, Some(5231));
    assert_eq!(record.user_id, None);
    // First 3-digit run wins, even inside a longer number.
    assert_eq!(record.error_code.as_deref(), Some("523"));
}

#[test]
fn extraction_is_independent() {
    let record = parse_line(
        "2026-08-29 14:30:05 INFO  [API] Request for user_id=4521 completed in 234ms",
    )
    .expect("line should parse");

    assert_eq!(record.user_id, Some(4521));
    assert_eq!(record.response_time_ms, Some(234));
    // The over-matching error code grabs the user id's first 3 digits.
    assert_eq!(record.error_code.as_deref(), Some("452"));
}

#[test]
fn user_id_colon_form() {
    let record = parse_line("2026-08-29 14:30:05 WARN [Auth] Token expired for user_id:77")
        .expect("line should parse");

    assert_eq!(record.user_id, Some(77));
}

#[test]
fn no_extractions_leave_fields_empty() {
    let record = parse_line("2026-08-29 14:31:00 INFO [Cache] Cache eviction: memory limit reached")
        .expect("line should parse");

    assert_eq!(record.response_time_ms, None);
    assert_eq!(record.user_id, None);
    assert_eq!(record.error_code, None);
}

#[test]
fn unrecognized_level_passes_through() {
    let record = parse_line("2026-08-29 14:31:00 TRACE [Queue] Worker started")
        .expect("line should parse");

    assert_eq!(record.level, "TRACE");
}

#[test]
fn surrounding_whitespace_is_trimmed() {
    let record = parse_line("  2026-08-29 14:31:00 INFO [API] ok\n")
        .expect("line should parse");

    assert_eq!(record.component, "API");
    assert_eq!(record.message, "ok");
}

#[test]
fn malformed_lines_fail_without_partial_records() {
    // Not the grammar at all.
    assert!(parse_line("this is not a log line").is_err());
    // Missing bracketed component.
    assert!(parse_line("2026-08-29 14:31:00 INFO no component here").is_err());
    // Timestamp digits wrong.
    assert!(parse_line("2026-8-9 14:31:00 INFO [API] ok").is_err());
    // Empty line.
    assert!(parse_line("").is_err());
}

#[test]
fn http_status_codes_are_captured() {
    let record = parse_line("2026-08-29 14:32:00 ERROR [API] 500 Internal Server Error: /api/orders")
        .expect("line should parse");

    assert_eq!(record.error_code.as_deref(), Some("500"));
}
