//! Candidate media-URL resolution for a chapter

use talefetch_core::Chapter;
use thiserror::Error;
use url::Url;

use crate::catalog::SourceId;

/// Where a candidate URL came from. Decides the fallback policy: only
/// a failed `Primary` attempt has a `Fallback` left to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
    /// The chapter carried a full URL of its own; no fallback exists
    Absolute,
    Primary,
    Fallback,
}

/// One URL to attempt, already encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub origin: CandidateOrigin,
}

/// Errors from candidate resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("chapter '{0}' has a relative URL but no source is available")]
    NoSource(String),

    #[error("invalid media URL for chapter '{chapter}': {cause}")]
    InvalidUrl { chapter: String, cause: String },

    #[error("no candidate URLs remaining for chapter '{0}'")]
    NoCandidatesRemaining(String),
}

/// Returns true when `raw` is a full URL with its own scheme
pub fn is_absolute_url(raw: &str) -> bool {
    Url::parse(raw).is_ok()
}

/// Ordered candidate URLs for one chapter.
///
/// Absolute chapter URLs are used byte-for-byte: sources that hand out
/// full URLs pre-encode their query parameters, and encoding them again
/// corrupts the request. Relative URLs are joined against the source's
/// primary and fallback mirrors, percent-encoded once in the process.
pub fn resolve(
    chapter: &Chapter,
    source: Option<SourceId>,
) -> Result<Vec<Candidate>, ResolveError> {
    if is_absolute_url(&chapter.url) {
        return Ok(vec![Candidate {
            url: chapter.url.clone(),
            origin: CandidateOrigin::Absolute,
        }]);
    }

    let source = source.ok_or_else(|| ResolveError::NoSource(chapter.name.clone()))?;

    let join = |base: &str| -> Result<String, ResolveError> {
        Url::parse(base)
            .and_then(|b| b.join(&chapter.url))
            .map(|u| u.to_string())
            .map_err(|e| ResolveError::InvalidUrl {
                chapter: chapter.name.clone(),
                cause: e.to_string(),
            })
    };

    Ok(vec![
        Candidate {
            url: join(source.media_base())?,
            origin: CandidateOrigin::Primary,
        },
        Candidate {
            url: join(source.media_fallback_base())?,
            origin: CandidateOrigin::Fallback,
        },
    ])
}
