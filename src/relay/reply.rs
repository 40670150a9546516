//! Reply dispatch: staged media back to the chat, then the caption.

use super::media::{scan_media, MediaKind};
use crate::error::{RelayError, ReplyError};
use crate::utils::{split_message, TELEGRAM_MAX_MESSAGE_LEN};
use async_trait::async_trait;
use std::path::Path;

pub const NO_CAPTION: &str = "No caption available.";

/// Where replies for one inbound message go.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), ReplyError>;
    async fn send_video(&self, path: &Path) -> Result<(), ReplyError>;
    async fn send_photo(&self, path: &Path) -> Result<(), ReplyError>;
}

pub fn caption_message(caption: Option<&str>) -> String {
    let caption = caption.filter(|c| !c.trim().is_empty()).unwrap_or(NO_CAPTION);
    format!("Post caption:\n\n{}", caption)
}

/// Send every video/image in `dir` (by file name), removing each file once its
/// send has been attempted, then send the caption. Returns the media count.
pub async fn dispatch(
    dir: &Path,
    caption: Option<&str>,
    replier: &dyn Replier,
) -> Result<usize, RelayError> {
    let files = scan_media(dir).map_err(RelayError::Scratch)?;
    if files.is_empty() {
        return Err(RelayError::MediaNotFound);
    }

    for file in &files {
        let sent = match file.kind {
            MediaKind::Video => replier.send_video(&file.path).await,
            MediaKind::Photo => replier.send_photo(&file.path).await,
        };
        if let Err(e) = std::fs::remove_file(&file.path) {
            tracing::warn!("Reply: failed to remove {:?}: {}", file.path, e);
        }
        sent?;
        tracing::debug!("Reply: sent {:?} ({:?})", file.path, file.kind);
    }

    let text = caption_message(caption);
    for chunk in split_message(&text, TELEGRAM_MAX_MESSAGE_LEN) {
        replier.send_text(chunk).await?;
    }

    Ok(files.len())
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingReplier, Sent};
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_caption_message() {
        assert_eq!(caption_message(Some("hi")), "Post caption:\n\nhi");
        assert_eq!(caption_message(None), "Post caption:\n\nNo caption available.");
        assert_eq!(caption_message(Some("  ")), "Post caption:\n\nNo caption available.");
    }

    #[tokio::test]
    async fn test_single_video_then_caption() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("ABC123_01.mp4");
        std::fs::write(&video, b"v").unwrap();

        let replier = RecordingReplier::default();
        let count = dispatch(dir.path(), Some("sunset"), &replier).await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            replier.sent(),
            vec![
                Sent::Video(video.clone()),
                Sent::Text("Post caption:\n\nsunset".to_string()),
            ]
        );
        assert!(!video.exists());
    }

    #[tokio::test]
    async fn test_mixed_media_sent_in_name_order() {
        let dir = TempDir::new().unwrap();
        for name in ["X_02.mp4", "X_01.jpg", "X_03.jpg", "X.json"] {
            std::fs::write(dir.path().join(name), b"m").unwrap();
        }

        let replier = RecordingReplier::default();
        dispatch(dir.path(), None, &replier).await.unwrap();

        assert_eq!(
            replier.sent(),
            vec![
                Sent::Photo(dir.path().join("X_01.jpg")),
                Sent::Video(dir.path().join("X_02.mp4")),
                Sent::Photo(dir.path().join("X_03.jpg")),
                Sent::Text("Post caption:\n\nNo caption available.".to_string()),
            ]
        );
        // Unrecognized files are left for the scratch lease to clean up.
        assert!(dir.path().join("X.json").exists());
    }

    #[tokio::test]
    async fn test_no_media_found() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("caption.txt"), b"t").unwrap();

        let replier = RecordingReplier::default();
        let err = dispatch(dir.path(), Some("c"), &replier).await.unwrap_err();

        assert!(matches!(err, RelayError::MediaNotFound));
        assert!(replier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_file_removed_even_when_send_fails() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("A_01.mp4");
        std::fs::write(&video, b"v").unwrap();

        let replier = RecordingReplier {
            fail_media: true,
            ..RecordingReplier::default()
        };
        let err = dispatch(dir.path(), Some("c"), &replier).await.unwrap_err();

        assert!(matches!(err, RelayError::Reply(_)));
        assert!(!video.exists());
        assert!(replier.texts().is_empty());
    }

    #[tokio::test]
    async fn test_long_caption_is_split() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("A_01.jpg"), b"i").unwrap();

        let caption = "word ".repeat(1000);
        let replier = RecordingReplier::default();
        dispatch(dir.path(), Some(&caption), &replier).await.unwrap();

        let texts = replier.texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts.concat(), caption_message(Some(&caption)));
    }
}
