//! Recognized media kinds and scratch directory scanning.

use glob::{MatchOptions, Pattern};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Photo,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Video, MediaKind::Photo];

    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Photo => "jpg",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
}

/// Video and image files directly inside `dir`, ordered by file name.
pub fn scan_media(dir: &Path) -> io::Result<Vec<MediaFile>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let base = Pattern::escape(&dir.to_string_lossy());

    let mut files = Vec::new();
    for kind in MediaKind::ALL {
        let pattern = format!("{}/*.{}", base, kind.extension());
        let paths = glob::glob_with(&pattern, options)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        for path in paths {
            let path = path.map_err(io::Error::from)?;
            if path.is_file() {
                files.push(MediaFile { path, kind });
            }
        }
    }

    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(files)
}
