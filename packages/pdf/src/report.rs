//! Fixed-width report text.

/// Splits report bytes into lines.
///
/// Invalid UTF-8 is replaced rather than rejected. Line terminators and
/// leading form feeds are removed so character offsets line up across
/// pages.
#[must_use]
pub fn lines_lossy(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|line| {
            line.trim_end_matches('\r')
                .trim_start_matches('\u{c}')
                .to_owned()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bytes_are_replaced() {
        let lines = lines_lossy(b"ok\r\nbad \xff byte\n");
        assert_eq!(lines, vec!["ok", "bad \u{fffd} byte"]);
    }

    #[test]
    fn form_feeds_do_not_shift_offsets() {
        let lines = lines_lossy(b"\x0cDATE  PARTICULARS\n");
        assert_eq!(lines[0].find("PARTICULARS"), Some(6));
    }
}
