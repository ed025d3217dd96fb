//! Extension filter compilation.
//!
//! Turns the user's comma-separated extension list into a single suffix-anchored
//! alternation that is embedded in the query's `REGEXP_CONTAINS` predicate. Token
//! validation here is what keeps user input from escaping the pattern literal.

use crate::error::{Result, WordlistError};
use regex::Regex;
use std::fmt;

/// Ordered, de-duplicated set of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    extensions: Vec<String>,
}

impl FilterSpec {
    /// Parses a comma-separated list such as `"sql,js"`.
    ///
    /// Whitespace around each token is trimmed. Repeated tokens keep their first
    /// position. Empty tokens and non-alphanumeric tokens are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        Self::from_tokens(input.split(','))
    }

    /// Builds a filter spec from already-split tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = Vec::new();

        for token in tokens {
            let token = token.as_ref().trim();
            validate_token(token)?;
            if !extensions.iter().any(|e| e == token) {
                extensions.push(token.to_string());
            }
        }

        if extensions.is_empty() {
            return Err(WordlistError::invalid_filter(
                "at least one extension is required",
            ));
        }

        Ok(Self { extensions })
    }

    /// Returns the extensions in insertion order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Compiles the spec into its query pattern.
    pub fn compile(&self) -> CompiledPattern {
        CompiledPattern::new(format!(r"\.({})$", self.extensions.join("|")))
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extensions.join(","))
    }
}

fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(WordlistError::invalid_filter("empty extension in list"));
    }
    if let Some(bad) = token.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(WordlistError::invalid_filter(format!(
            "'{token}' contains '{bad}'; extensions must be alphanumeric"
        )));
    }
    Ok(())
}

/// Compiles a sequence of extensions into a suffix-anchored pattern.
pub fn compile<I, S>(extensions: I) -> Result<CompiledPattern>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(FilterSpec::from_tokens(extensions)?.compile())
}

/// A disjunction of extensions, safe to place inside a raw string literal.
///
/// The pattern is compiled once, for local matching with [`CompiledPattern::is_match`].
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    regex: Option<Regex>,
}

impl CompiledPattern {
    fn new(pattern: String) -> Self {
        // Tokens are validated alphanumeric, so the pattern always compiles.
        let regex = Regex::new(&pattern).ok();
        Self { pattern, regex }
    }

    /// Returns the pattern text.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Returns true if `filename` ends in one of the compiled extensions.
    pub fn is_match(&self, filename: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|re| re.is_match(filename))
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for CompiledPattern {}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
