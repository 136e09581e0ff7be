//! Fixed demo playlist with a wrap-around cursor.

use std::path::{Path, PathBuf};

use crate::audio::LoadError;

/// One playlist entry: display name plus file name under the playlist dir
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: &'static str,
    pub file: &'static str,
}

/// The built-in rotation, cycled by the test-track control
const ENTRIES: [Entry; 4] = [
    Entry {
        name: "Neon Drift",
        file: "neon-drift.mp3",
    },
    Entry {
        name: "Low Orbit",
        file: "low-orbit.mp3",
    },
    Entry {
        name: "Glasswork",
        file: "glasswork.mp3",
    },
    Entry {
        name: "Afterglow",
        file: "afterglow.mp3",
    },
];

/// Ordered demo tracks with a cursor that wraps at the end.
pub struct Playlist {
    dir: PathBuf,
    cursor: usize,
}

impl Playlist {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current entry, advancing the cursor with wrap-around.
    ///
    /// The cursor moves even when the caller later fails to read the file,
    /// so a broken entry does not wedge the rotation.
    pub fn advance(&mut self) -> Entry {
        let entry = ENTRIES[self.cursor].clone();
        self.cursor = (self.cursor + 1) % ENTRIES.len();
        entry
    }

    /// Resolve an entry against the playlist directory
    pub fn path_of(&self, entry: &Entry) -> PathBuf {
        self.dir.join(entry.file)
    }

    /// Fetch an entry's bytes
    pub fn read(&self, entry: &Entry) -> Result<Vec<u8>, LoadError> {
        let path = self.path_of(entry);
        read_bytes(&path)
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Fetch {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_wraps_back_to_start() {
        let mut playlist = Playlist::new("audio");
        assert_eq!(playlist.cursor(), 0);

        let first = playlist.advance();
        assert_eq!(first.name, ENTRIES[0].name);
        assert_eq!(playlist.cursor(), 1);

        playlist.advance();
        playlist.advance();
        playlist.advance();
        assert_eq!(playlist.cursor(), 0, "four advances return to the start");

        let again = playlist.advance();
        assert_eq!(again.name, first.name);
    }

    #[test]
    fn test_paths_resolve_under_playlist_dir() {
        let mut playlist = Playlist::new("some/dir");
        let entry = playlist.advance();
        assert_eq!(
            playlist.path_of(&entry),
            PathBuf::from("some/dir").join(entry.file)
        );
    }

    #[test]
    fn test_missing_entry_surfaces_fetch_error() {
        let mut playlist = Playlist::new("definitely/not/a/dir");
        let entry = playlist.advance();
        let err = playlist.read(&entry).unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
    }
}
