//! Query template rendering.
//!
//! Templates are plain query text with `{{name}}` placeholders. Rendering is literal
//! substitution over a closed set of keys: nothing inside a template is evaluated.

use crate::error::{Result, WordlistError};
use std::fmt;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// The placeholders a query template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKey {
    Extensions,
    Limit,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 2] = [TemplateKey::Extensions, TemplateKey::Limit];

    /// Returns the placeholder name as written between the markers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extensions => "extensions",
            Self::Limit => "limit",
        }
    }

    /// Looks up a key by placeholder name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParameters {
    extensions: String,
    limit: String,
}

impl TemplateParameters {
    pub fn new(extensions: impl Into<String>, limit: impl Into<String>) -> Self {
        Self {
            extensions: extensions.into(),
            limit: limit.into(),
        }
    }

    /// Returns the value bound to `key`.
    pub fn get(&self, key: TemplateKey) -> &str {
        match key {
            TemplateKey::Extensions => &self.extensions,
            TemplateKey::Limit => &self.limit,
        }
    }
}

/// Parses a row limit. Only positive integers reach a template.
pub fn parse_limit(input: &str) -> Result<u64> {
    match input.trim().parse::<u64>() {
        Ok(0) => Err(WordlistError::invalid_limit("limit must be at least 1")),
        Ok(n) => Ok(n),
        Err(_) => Err(WordlistError::invalid_limit(format!(
            "'{input}' is not a positive integer"
        ))),
    }
}

/// The final query text handed to the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery(String);

impl RenderedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RenderedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Splits a template into literal text and placeholder names.
fn segments(source: &str) -> Result<Vec<Segment<'_>>> {
    let mut out = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            out.push(Segment::Text(&rest[..start]));
        }
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open.find(CLOSE).ok_or_else(|| {
            let fragment: String = rest[start..].chars().take(32).collect();
            WordlistError::unresolved_placeholder(format!(
                "unterminated placeholder starting at '{fragment}'"
            ))
        })?;
        out.push(Segment::Placeholder(&after_open[..end]));
        rest = &after_open[end + CLOSE.len()..];
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    Ok(out)
}

fn resolve(name: &str) -> Result<TemplateKey> {
    TemplateKey::parse(name)
        .ok_or_else(|| WordlistError::unresolved_placeholder(format!("{OPEN}{name}{CLOSE}")))
}

/// Substitutes every placeholder in `source` with its parameter value.
pub fn render(source: &str, params: &TemplateParameters) -> Result<RenderedQuery> {
    let mut query = String::with_capacity(source.len());
    for segment in segments(source)? {
        match segment {
            Segment::Text(text) => query.push_str(text),
            Segment::Placeholder(name) => query.push_str(params.get(resolve(name)?)),
        }
    }
    Ok(RenderedQuery(query))
}

/// A template that has been checked against the placeholder contract.
#[derive(Debug, Clone)]
pub struct QueryTemplate {
    name: String,
    source: String,
}

impl QueryTemplate {
    /// Validates `source`: all placeholders must be known, and every key must appear.
    pub fn parse(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let mut seen = Vec::new();
        for segment in segments(&source)? {
            if let Segment::Placeholder(placeholder) = segment {
                seen.push(resolve(placeholder)?);
            }
        }
        if let Some(missing) = TemplateKey::ALL.into_iter().find(|k| !seen.contains(k)) {
            return Err(WordlistError::unresolved_placeholder(format!(
                "template '{name}' is missing {OPEN}{}{CLOSE}",
                missing.as_str()
            )));
        }

        Ok(Self { name, source })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, params: &TemplateParameters) -> Result<RenderedQuery> {
        render(&self.source, params)
    }
}
