//! Format checks: regular expressions, predefined named formats, and
//! custom predicates.

use super::{Failure, Rule};
use crate::core::display_value;
use crate::validation::ViolationType;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Compiled regular expression that compares by its source text.
#[derive(Clone, Debug)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self(regex)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Custom format predicate over the raw attribute value.
pub type FormatFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// How a format rule decides whether a value is well-formed.
#[derive(Clone)]
pub enum FormatMatcher {
    /// Match the value's string form; `name` is set for predefined formats.
    Pattern { pattern: Pattern, name: Option<String> },
    Predicate(FormatFn),
}

impl FormatMatcher {
    pub fn pattern(pattern: Pattern) -> Self {
        Self::Pattern {
            pattern,
            name: None,
        }
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Pattern { pattern, .. } => match value {
                None | Some(Value::Null) => false,
                Some(value) => pattern.is_match(&display_value(value)),
            },
            Self::Predicate(predicate) => predicate(value.unwrap_or(&Value::Null)),
        }
    }

    pub(super) fn check(&self, rule: &Rule, value: Option<&Value>) -> Option<Failure> {
        if rule.is_optional(value) || self.matches(value) {
            None
        } else {
            Some(Failure::new(ViolationType::Invalid))
        }
    }
}

impl PartialEq for FormatMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Pattern { pattern: a, name: an },
                Self::Pattern { pattern: b, name: bn },
            ) => a == b && an == bn,
            (Self::Predicate(a), Self::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for FormatMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { pattern, name } => f
                .debug_struct("Pattern")
                .field("pattern", &pattern.as_str())
                .field("name", name)
                .finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// Close to RFC 2822, with unicode letters allowed and local domains
// (user@localhost) rejected.
static EMAIL_ADDRESS: LazyLock<Pattern> = LazyLock::new(|| {
    let atext = r"[a-zA-Z\p{L}0-9!#$%&'*+/=?^_`{|}~\-]";
    let no_ws_ctl = r"\x01-\x08\x11\x12\x14-\x1f\x7f";
    let dot_atom = format!(r"{atext}+(?:[.]{atext}*)+");
    let quoted_pair = r"(?:\x5c[\x01-\x09\x11\x12\x14-\x7f])";
    let qtext = format!(r"[^{no_ws_ctl}\x0d\x22\x5c]");
    let quoted_string = format!(r#""(?:{qtext}|{quoted_pair})+""#);
    let atom = format!("{atext}+");
    let word = format!("(?:{atom}|{quoted_string})");
    let obs_local_part = format!("{word}(?:[.]{word})*");
    let local_part = format!("(?:{dot_atom}|{quoted_string}|{obs_local_part})");
    let dtext = format!(r"[{no_ws_ctl}\x21-\x5a\x5e-\x7e]");
    let domain_literal = format!(r"\[(?:{dtext}|{quoted_pair})+\]");
    let obs_domain = format!("{atom}(?:[.]{atom})+");
    let domain = format!("(?:{dot_atom}|{domain_literal}|{obs_domain})");

    Pattern::new(&format!(r"\A{local_part}@{domain}\z")).expect("email pattern is valid")
});

// http(s) URLs; the empty string also matches.
static URL: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(
        r"(?i)\A(?:|https?://[a-z0-9]+(?:[\-.][a-z0-9]+)*\.[a-z]{2,5}(?::[0-9]{1,5})?(?:/.*)?)\z",
    )
    .expect("url pattern is valid")
});

/// Look up a predefined format by name.
///
/// # Example
///
/// ```rust
/// use validity::rules::predefined_format;
///
/// assert!(predefined_format("email_address").is_some());
/// assert!(predefined_format("postcode").is_none());
/// ```
pub fn predefined_format(name: &str) -> Option<FormatMatcher> {
    let pattern = match name {
        "email_address" => &*EMAIL_ADDRESS,
        "url" => &*URL,
        _ => return None,
    };
    Some(FormatMatcher::Pattern {
        pattern: pattern.clone(),
        name: Some(name.to_string()),
    })
}
