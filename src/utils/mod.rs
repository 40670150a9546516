//! Small string helpers shared by the relay and the Instagram client.

/// Telegram's limit on the length of a single text message.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Truncate a string to at most `max_bytes` bytes, ensuring the cut lands on a
/// valid UTF-8 char boundary. Returns the longest prefix that fits.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Split text into chunks of at most `max_len` bytes, preferring to break
/// after a newline near the end of a chunk. Never splits a character.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let rest = &text[start..];
        let window = truncate_str(rest, max_len);
        // A char wider than max_len still has to go somewhere.
        let window = if window.is_empty() {
            rest.chars().next().map_or(rest, |c| &rest[..c.len_utf8()])
        } else {
            window
        };

        let take = if window.len() < rest.len() {
            window
                .rfind('\n')
                .filter(|&pos| pos + 200 > window.len())
                .map(|pos| pos + 1)
                .unwrap_or(window.len())
        } else {
            window.len()
        };

        chunks.push(&rest[..take]);
        start += take;
    }
    chunks
}
