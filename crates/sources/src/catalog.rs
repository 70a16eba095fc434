//! Static registry of known publisher sources

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a known publisher site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Tokybook,
    FreeAudiobooks,
}

impl SourceId {
    /// All known sources, in lookup order
    pub const ALL: [SourceId; 2] = [SourceId::Tokybook, SourceId::FreeAudiobooks];

    /// Substring matched against a book-page URL to identify the source
    pub fn host_fragment(&self) -> &'static str {
        match self {
            SourceId::Tokybook => "tokybook.com",
            SourceId::FreeAudiobooks => "freeaudiobooks.top",
        }
    }

    /// Primary mirror that relative chapter URLs are joined against
    pub fn media_base(&self) -> &'static str {
        match self {
            SourceId::Tokybook => "https://files01.tokybook.com/audio/",
            SourceId::FreeAudiobooks => "https://files01.freeaudiobooks.top/audio/",
        }
    }

    /// Secondary mirror tried after the primary fails
    pub fn media_fallback_base(&self) -> &'static str {
        match self {
            SourceId::Tokybook => "https://files02.tokybook.com/audio/",
            SourceId::FreeAudiobooks => "https://files02.freeaudiobooks.top/audio/",
        }
    }

    /// Promotional audio file the site injects into every chapter list.
    /// Excluded from chapter counts and never downloaded.
    pub fn filler_chapter_url(&self) -> &'static str {
        match self {
            SourceId::Tokybook => {
                "https://file.tokybook.com/upload/welcome-you-to-tokybook.mp3"
            }
            SourceId::FreeAudiobooks => {
                "https://freeaudiobooks.top/wp-content/uploads/welcome-to-freeaudiobook-top.mp3"
            }
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host_fragment())
    }
}

/// Looks up sources by book-page URL
pub struct SourceCatalog;

impl SourceCatalog {
    /// First declared source whose host fragment appears in `page_url`.
    /// Absence is not an error here; the caller decides whether a job
    /// can proceed without a source.
    pub fn match_url(page_url: &str) -> Option<SourceId> {
        SourceId::ALL
            .into_iter()
            .find(|source| page_url.contains(source.host_fragment()))
    }
}
