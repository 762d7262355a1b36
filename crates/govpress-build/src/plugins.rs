//! Curated plugin list.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::{BuildError, BuildResult};

/// Ordered, de-duplicated plugin slugs read once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CuratedList {
    slugs: Vec<String>,
}

impl CuratedList {
    /// Parse newline-separated slugs; blank lines and `#` comments are skipped.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut seen = BTreeSet::new();
        let mut slugs = Vec::new();
        for line in contents.lines() {
            let slug = line.trim();
            if slug.is_empty() || slug.starts_with('#') {
                continue;
            }
            if !seen.insert(slug.to_string()) {
                warn!(slug, "duplicate plugin slug ignored");
                continue;
            }
            slugs.push(slug.to_string());
        }
        Self { slugs }
    }

    /// Read and parse the list at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PluginList`] when the file cannot be read.
    pub fn load(path: &Path) -> BuildResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| BuildError::PluginList {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&contents))
    }

    /// Slugs in file order.
    #[must_use]
    pub fn slugs(&self) -> &[String] {
        &self.slugs
    }

    /// Number of slugs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    /// Whether the list holds no slugs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CuratedList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let joined: Vec<String> = iter.into_iter().map(Into::into).collect();
        Self::parse(&joined.join("\n"))
    }
}
