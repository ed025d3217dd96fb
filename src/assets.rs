//! Bundled query templates.
//!
//! Templates are compiled into the binary. A `templates_dir` from the config file can
//! shadow any bundled template by relative name.

use crate::error::{Result, WordlistError};
use crate::template::QueryTemplate;
use std::path::Path;
use tracing::debug;

/// Template used by the `words-with-ext` command.
pub const WORDS_WITH_EXT: &str = "sql/github/words-with-ext.sql";

const BUNDLED: &[(&str, &str)] = &[(
    WORDS_WITH_EXT,
    include_str!("../assets/sql/github/words-with-ext.sql"),
)];

/// Returns the bundled template source for `name`.
pub fn bundled(name: &str) -> Result<&'static str> {
    BUNDLED
        .iter()
        .find(|(asset, _)| *asset == name)
        .map(|(_, source)| *source)
        .ok_or_else(|| WordlistError::template_not_found(name))
}

/// Loads and validates a template, preferring `override_dir/<name>` when it exists.
pub fn load_template(name: &str, override_dir: Option<&Path>) -> Result<QueryTemplate> {
    if let Some(dir) = override_dir {
        let path = dir.join(name);
        if path.is_file() {
            debug!("Loading template override from {}", path.display());
            let source = std::fs::read_to_string(&path).map_err(|e| {
                WordlistError::config(format!(
                    "Failed to read template {}: {e}",
                    path.display()
                ))
            })?;
            return QueryTemplate::parse(name, source);
        }
    }

    QueryTemplate::parse(name, bundled(name)?)
}
