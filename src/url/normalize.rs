use crate::UrlError;
use url::Url;

/// Query parameters that never change which page is served
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
];

/// Normalizes a URL into the key the request queue deduplicates on
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme and a host
/// 3. Lowercase the host (done by the parser)
/// 4. Remove dot segments, duplicate slashes and the trailing slash
///    (except for the root `/`)
/// 5. Remove the fragment
/// 6. Remove tracking query parameters and sort the rest by key
/// 7. Drop an empty query string
///
/// # Examples
///
/// ```
/// use kata_harvest::url::normalize_url;
///
/// let url = normalize_url("https://EDABIT.com/challenge/abc/#tests").unwrap();
/// assert_eq!(url.as_str(), "https://edabit.com/challenge/abc");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Resolves `href` against `base` and normalizes the result
///
/// Returns `None` for anchors that cannot lead to a page
/// (`javascript:`, `mailto:`, fragment-only links and the like).
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    normalize_url(absolute.as_str()).ok()
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_kept() {
        let result = normalize_url("http://127.0.0.1:8080/challenges").unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:8080/challenges");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://edabit.com/challenge/abc/").unwrap();
        assert_eq!(result.as_str(), "https://edabit.com/challenge/abc");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://edabit.com").unwrap();
        assert_eq!(result.as_str(), "https://edabit.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://edabit.com/challenge/abc#code").unwrap();
        assert_eq!(result.as_str(), "https://edabit.com/challenge/abc");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = normalize_url("https://EDABIT.COM/challenge/ARr5tA458o2tC9FTN").unwrap();
        assert_eq!(
            result.as_str(),
            "https://edabit.com/challenge/ARr5tA458o2tC9FTN"
        );
    }

    #[test]
    fn test_tracking_params_removed_and_sorted() {
        let result = normalize_url(
            "https://edabit.com/challenges?tab=js&utm_medium=email&lang=en&fbclid=123",
        )
        .unwrap();
        assert_eq!(
            result.as_str(),
            "https://edabit.com/challenges?lang=en&tab=js"
        );

        let result = normalize_url("https://edabit.com/challenges?utm_source=a&gclid=c").unwrap();
        assert_eq!(result.as_str(), "https://edabit.com/challenges");
    }

    #[test]
    fn test_dot_segments_and_slashes() {
        let result = normalize_url("https://edabit.com///a/../challenge/./x//").unwrap();
        assert_eq!(result.as_str(), "https://edabit.com/challenge/x");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://edabit.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://edabit.com/challenges").unwrap();

        assert_eq!(
            resolve_link("/challenge/abc", &base).unwrap().as_str(),
            "https://edabit.com/challenge/abc"
        );
        assert_eq!(
            resolve_link("https://edabit.com/challenge/abc/", &base)
                .unwrap()
                .as_str(),
            "https://edabit.com/challenge/abc"
        );
        assert!(resolve_link("javascript:void(0)", &base).is_none());
        assert!(resolve_link("mailto:a@b.com", &base).is_none());
        assert!(resolve_link("#top", &base).is_none());
        assert!(resolve_link("   ", &base).is_none());
    }
}
