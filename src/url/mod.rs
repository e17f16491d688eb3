//! URL handling module for Kata-Harvest
//!
//! This module provides URL normalization (the request queue's dedup key),
//! pseudo-URL matching for challenge links, and identifier derivation.

mod normalize;
mod pseudo;

pub use normalize::{normalize_url, resolve_link};
pub use pseudo::PseudoUrl;

/// Derives a challenge identifier from its detail-page URL
///
/// The identifier is whatever follows the fixed `prefix` (the literal part of
/// the challenge pattern). Returns `None` when the URL does not start with the
/// prefix or nothing follows it.
///
/// # Examples
///
/// ```
/// use kata_harvest::url::challenge_id;
///
/// let id = challenge_id(
///     "https://edabit.com/challenge/ARr5tA458o2tC9FTN",
///     "https://edabit.com/challenge/",
/// );
/// assert_eq!(id.as_deref(), Some("ARr5tA458o2tC9FTN"));
/// ```
pub fn challenge_id(source_url: &str, prefix: &str) -> Option<String> {
    source_url
        .strip_prefix(prefix)
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

/// Last non-empty path segment of a profile URL
pub fn author_id(author_url: &str) -> Option<String> {
    let url = ::url::Url::parse(author_url).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://edabit.com/challenge/";

    #[test]
    fn test_challenge_id_is_deterministic() {
        let url = "https://edabit.com/challenge/ARr5tA458o2tC9FTN";
        assert_eq!(challenge_id(url, PREFIX), challenge_id(url, PREFIX));
        assert_eq!(
            challenge_id(url, PREFIX).as_deref(),
            Some("ARr5tA458o2tC9FTN")
        );
    }

    #[test]
    fn test_challenge_id_trailing_slash() {
        assert_eq!(
            challenge_id("https://edabit.com/challenge/abc/", PREFIX).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_challenge_id_without_prefix() {
        assert_eq!(challenge_id("https://edabit.com/challenges", PREFIX), None);
        assert_eq!(challenge_id("https://edabit.com/challenge/", PREFIX), None);
        assert_eq!(challenge_id("", PREFIX), None);
    }

    #[test]
    fn test_author_id() {
        assert_eq!(
            author_id("https://edabit.com/user/qJRPoyMeN8aSjGxzR").as_deref(),
            Some("qJRPoyMeN8aSjGxzR")
        );
        assert_eq!(
            author_id("https://edabit.com/user/abc/").as_deref(),
            Some("abc")
        );
        assert_eq!(author_id("https://edabit.com/"), None);
        assert_eq!(author_id("not a url"), None);
    }
}
