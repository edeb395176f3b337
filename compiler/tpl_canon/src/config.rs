//! Session configuration.

use crate::CanonError;

/// Default temporaries: `$var0`, `$var1`, ...
pub const DEFAULT_TEMP_PREFIX: &str = "var";

/// Default hygiene tag: `$name` becomes `$tpl_name`.
pub const DEFAULT_HYGIENE_TAG: &str = "tpl_";

/// Knobs for one canonicalization session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonConfig {
    /// Temporaries are spelled `$` + prefix + counter.
    pub temp_prefix: String,
    /// User bindings are respelled `$` + tag + original name.
    pub hygiene_tag: String,
    /// Give up after this many traversals. `None` runs to the fixed point.
    pub max_passes: Option<usize>,
}

impl Default for CanonConfig {
    fn default() -> Self {
        CanonConfig {
            temp_prefix: DEFAULT_TEMP_PREFIX.to_owned(),
            hygiene_tag: DEFAULT_HYGIENE_TAG.to_owned(),
            max_passes: None,
        }
    }
}

impl CanonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_hygiene_tag(mut self, tag: impl Into<String>) -> Self {
        self.hygiene_tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_max_passes(mut self, limit: usize) -> Self {
        self.max_passes = Some(limit);
        self
    }

    /// Check that temporaries can never be spelled like a renamed binding.
    ///
    /// A renamed binding is `$` + tag + rest and a temporary is
    /// `$` + prefix + digits; the two spaces are disjoint exactly when
    /// neither fragment is a prefix of the other.
    pub fn validate(&self) -> Result<(), CanonError> {
        if self.temp_prefix.is_empty() {
            return Err(CanonError::EmptyTempPrefix);
        }
        if self.hygiene_tag.is_empty() {
            return Err(CanonError::EmptyHygieneTag);
        }
        for fragment in [&self.temp_prefix, &self.hygiene_tag] {
            if !fragment.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(CanonError::InvalidPrefix(fragment.clone()));
            }
        }
        if self.temp_prefix.starts_with(&self.hygiene_tag)
            || self.hygiene_tag.starts_with(&self.temp_prefix)
        {
            return Err(CanonError::OverlappingPrefixes {
                temp: self.temp_prefix.clone(),
                tag: self.hygiene_tag.clone(),
            });
        }
        Ok(())
    }
}
