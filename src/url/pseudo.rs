use crate::UrlError;
use regex::Regex;

/// A URL pattern where bracketed sections are regular expressions
///
/// Everything outside `[...]` matches literally, everything inside is a
/// regular expression fragment. The pattern must match the whole URL.
///
/// # Examples
///
/// ```
/// use kata_harvest::url::PseudoUrl;
///
/// let purl = PseudoUrl::new("https://edabit.com/challenge/[.*]").unwrap();
/// assert!(purl.matches("https://edabit.com/challenge/ARr5tA458o2tC9FTN"));
/// assert!(!purl.matches("https://edabit.com/challenges"));
/// assert_eq!(purl.literal_prefix(), "https://edabit.com/challenge/");
/// ```
#[derive(Debug, Clone)]
pub struct PseudoUrl {
    pattern: String,
    regex: Regex,
    literal_prefix: String,
}

impl PseudoUrl {
    pub fn new(pattern: &str) -> Result<Self, UrlError> {
        let mut source = String::from("^");
        let mut literal_prefix = String::new();
        let mut in_prefix = true;
        let mut rest = pattern;

        while !rest.is_empty() {
            match rest.find('[') {
                Some(open) => {
                    let literal = &rest[..open];
                    source.push_str(&regex::escape(literal));
                    if in_prefix {
                        literal_prefix.push_str(literal);
                        in_prefix = false;
                    }

                    let close = find_closing_bracket(&rest[open..]).ok_or_else(|| {
                        UrlError::Pattern {
                            pattern: pattern.to_string(),
                            message: "unterminated '['".to_string(),
                        }
                    })?;
                    let fragment = &rest[open + 1..open + close];
                    source.push_str("(?:");
                    source.push_str(fragment);
                    source.push(')');
                    rest = &rest[open + close + 1..];
                }
                None => {
                    source.push_str(&regex::escape(rest));
                    if in_prefix {
                        literal_prefix.push_str(rest);
                    }
                    rest = "";
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| UrlError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            literal_prefix,
        })
    }

    /// Returns true if the whole URL matches the pattern
    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// The literal text before the first bracketed section
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Finds the `]` that closes the `[` at position 0, allowing nested brackets
/// inside the regular expression (e.g. character classes).
fn find_closing_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}
