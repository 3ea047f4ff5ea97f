//! Line matchers: which lines are eligible, and where their address is

use regex::bytes::{NoExpand, Regex};

use crate::error::{Error, Result};

/// Default address shape: four dot-separated decimal groups
pub const DEFAULT_ADDRESS_PATTERN: &str = r"(?:[0-9]+\.){3}[0-9]+";

/// Immutable set of literal service labels
///
/// A line is eligible for rewriting when it contains any of the labels.
#[derive(Debug, Clone)]
pub struct ServiceMatchSet {
    labels: Vec<String>,
    matcher: Regex,
}

impl ServiceMatchSet {
    /// Build a match set from literal labels
    ///
    /// Labels are matched as plain substrings; regex metacharacters in a
    /// label have no special meaning.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(Error::config("Service match set cannot be empty"));
        }
        if labels.iter().any(|l| l.is_empty()) {
            return Err(Error::config("Service labels cannot be empty"));
        }

        let alternation = labels
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = Regex::new(&alternation)?;

        Ok(Self { labels, matcher })
    }

    /// Whether `line` contains any tracked label
    pub fn matches(&self, line: &[u8]) -> bool {
        self.matcher.is_match(line)
    }

    /// The configured labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Lexical shape used to locate the address inside an eligible line
#[derive(Debug, Clone)]
pub struct AddressPattern {
    regex: Regex,
}

impl AddressPattern {
    /// Compile an address pattern
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::config("Address pattern cannot be empty"));
        }
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// The default dotted-quad pattern
    pub fn dotted_quad() -> Self {
        Self {
            regex: Regex::new(DEFAULT_ADDRESS_PATTERN).expect("default address pattern is valid"),
        }
    }

    /// First address-shaped substring of `line`, if any
    pub fn find(&self, line: &[u8]) -> Option<String> {
        self.regex
            .find(line)
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
    }

    /// Whether `candidate` is an address in its entirety
    pub fn matches_whole(&self, candidate: &str) -> bool {
        self.regex
            .find(candidate.as_bytes())
            .is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
    }

    /// Copy of `line` with every match replaced by `address`
    pub fn replace_all(&self, line: &[u8], address: &str) -> Vec<u8> {
        self.regex
            .replace_all(line, NoExpand(address.as_bytes()))
            .into_owned()
    }

    /// The pattern source
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
