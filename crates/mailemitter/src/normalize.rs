/// Rewrites every line ending in `text` (CRLF, lone CR or lone LF)
/// as CRLF.
pub fn normalize_line_endings(text: &str) -> String {
    let data = text.as_bytes();
    let mut normalized = String::with_capacity(text.len() + text.len() / 16);
    let mut last_idx = 0;

    for i in memchr::memchr2_iter(b'\r', b'\n', data) {
        match data[i] {
            b'\r' => {
                normalized.push_str(&text[last_idx..i]);
                normalized.push_str("\r\n");
                if data.get(i + 1).copied() == Some(b'\n') {
                    last_idx = i + 2;
                    continue;
                }
            }
            b'\n' => {
                // The CR of a CRLF pair has already consumed this LF
                if i > 0 && data[i - 1] == b'\r' && last_idx > i {
                    continue;
                }
                normalized.push_str(&text[last_idx..i]);
                normalized.push_str("\r\n");
            }
            _ => unreachable!(),
        }
        last_idx = i + 1;
    }

    normalized.push_str(&text[last_idx..]);
    normalized
}
