use thiserror::Error;

/// Recoverable canonicalization failures.
///
/// Internal invariant violations (a splice anchor that vanished, a rule
/// planned against a node that is not there) are bugs and panic instead.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CanonError {
    #[error("temporary prefix must not be empty")]
    EmptyTempPrefix,
    #[error("hygiene tag must not be empty")]
    EmptyHygieneTag,
    #[error("{0:?} contains characters not allowed in a variable name")]
    InvalidPrefix(String),
    #[error("temporary prefix {temp:?} and hygiene tag {tag:?} overlap, so renamed bindings could collide with temporaries")]
    OverlappingPrefixes { temp: String, tag: String },
    #[error("template {template:?} did not reach canonical form within {limit} passes")]
    PassLimit { template: String, limit: usize },
}
