/// Appends `line` after a blank line unless `marker` already occurs in
/// `reply`.
pub fn ensure_attribution(reply: &str, marker: &str, line: &str) -> String {
    if reply.contains(marker) {
        return reply.to_string();
    }
    format!("{}\n\n{}", reply.trim_end(), line)
}

/// Replaces an empty model reply with the fixed not-found text.
pub fn or_not_found(reply: String, not_found: &str) -> String {
    if reply.trim().is_empty() { not_found.to_string() } else { reply }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "-- made by";
    const LINE: &str = "-- made by tests";

    #[test]
    fn appends_line_when_marker_missing() {
        assert_eq!(ensure_attribution("Answer.", MARKER, LINE), "Answer.\n\n-- made by tests");
    }

    #[test]
    fn trims_trailing_whitespace_before_appending() {
        assert_eq!(ensure_attribution("Answer.\n\n  ", MARKER, LINE), "Answer.\n\n-- made by tests");
    }

    #[test]
    fn leaves_reply_alone_when_marker_present() {
        let reply = "Answer.\n\n-- made by someone else";
        assert_eq!(ensure_attribution(reply, MARKER, LINE), reply);
    }

    #[test]
    fn is_idempotent() {
        let once = ensure_attribution("Answer.", MARKER, LINE);
        let twice = ensure_attribution(&once, MARKER, LINE);
        assert_eq!(once, twice);
        assert_eq!(twice.matches(MARKER).count(), 1);
    }

    #[test]
    fn blank_reply_becomes_not_found() {
        assert_eq!(or_not_found("  \n".to_string(), "missing"), "missing");
        assert_eq!(or_not_found("ok".to_string(), "missing"), "ok");
    }
}
