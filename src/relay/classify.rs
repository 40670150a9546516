//! Inbound text classification: commands, post URLs, or junk.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

pub const INVALID_URL: &str = "Please send a valid Instagram post URL.";

/// Path markers that identify a post or reel resource.
const POST_MARKERS: &[&str] = &["p", "reel"];

static SHORTCODE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap()
});

/// A validated post link and the lookup key extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUrl {
    /// The text exactly as the sender submitted it (trimmed)
    pub url: String,
    pub shortcode: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Leading `/`: a bot command, name without the slash or `@botname` suffix
    Command(String),
    Post(PostUrl),
    InvalidUrl,
}

pub fn classify(text: &str) -> Inbound {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('/') {
        let name = rest
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("");
        return Inbound::Command(name.to_lowercase());
    }

    if !POST_MARKERS
        .iter()
        .any(|m| text.contains(&format!("/{}/", m)))
    {
        return Inbound::InvalidUrl;
    }

    match extract_shortcode(text) {
        Some(shortcode) => Inbound::Post(PostUrl {
            url: text.to_string(),
            shortcode,
        }),
        None => Inbound::InvalidUrl,
    }
}

/// Find the segment following a `p`/`reel` marker in the first link-like
/// word that has one, tolerating surrounding text, a username prefix, a
/// missing trailing slash, query strings and a missing scheme.
pub fn extract_shortcode(text: &str) -> Option<String> {
    text.split_whitespace()
        .filter(|word| POST_MARKERS.iter().any(|m| word.contains(&format!("/{}/", m))))
        .find_map(shortcode_from_link)
}

fn shortcode_from_link(link: &str) -> Option<String> {
    let parsed = if link.contains("://") {
        Url::parse(link).ok()?
    } else {
        Url::parse(&format!("https://{}", link)).ok()?
    };

    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    let marker = segments.iter().position(|s| POST_MARKERS.contains(s))?;
    let code = segments.get(marker + 1)?;

    SHORTCODE_RE.is_match(code).then(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://instagram.com/p/ABC123/", "ABC123")]
    #[case("https://www.instagram.com/reel/Cx_9-z/", "Cx_9-z")]
    #[case("https://www.instagram.com/p/ABC123", "ABC123")]
    #[case("https://www.instagram.com/p/ABC123/?igsh=MWQ1ZGUxMzBkMA==", "ABC123")]
    #[case("https://www.instagram.com/someone/p/XYZ/", "XYZ")]
    #[case("instagram.com/reel/QQQ/", "QQQ")]
    #[case("  https://instagram.com/p/ABC123/  ", "ABC123")]
    #[case("Check this https://www.instagram.com/p/ABC123/", "ABC123")]
    #[case("https://www.instagram.com/reel/Cx_9-z/ wow", "Cx_9-z")]
    #[case("see\nhttps://instagram.com/p/ABC123/?igsh=x\nthanks", "ABC123")]
    fn test_post_urls(#[case] text: &str, #[case] shortcode: &str) {
        match classify(text) {
            Inbound::Post(post) => {
                assert_eq!(post.shortcode, shortcode);
                assert_eq!(post.url, text.trim());
            }
            other => panic!("expected post for {:?}, got {:?}", text, other),
        }
    }

    #[rstest]
    #[case("hello there")]
    #[case("https://instagram.com/stories/someone/123/")]
    #[case("https://instagram.com/reels/ABC/")]
    #[case("https://example.com/")]
    #[case("")]
    fn test_missing_marker_is_invalid(#[case] text: &str) {
        assert_eq!(classify(text), Inbound::InvalidUrl);
    }

    #[rstest]
    #[case("https://instagram.com/p/")]
    #[case("https://instagram.com/p//")]
    #[case("https://instagram.com/p/ABC$123/")]
    #[case("look /p/ here")]
    fn test_marker_without_shortcode_is_invalid(#[case] text: &str) {
        assert_eq!(classify(text), Inbound::InvalidUrl);
    }

    #[rstest]
    #[case("/start", "start")]
    #[case("/start@InstaRelayBot", "start")]
    #[case("/HELP me", "help")]
    #[case("/", "")]
    #[case("/start  extra args", "start")]
    fn test_commands(#[case] text: &str, #[case] name: &str) {
        assert_eq!(classify(text), Inbound::Command(name.to_string()));
    }
}
