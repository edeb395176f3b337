//! Template-expression canonicalization.
//!
//! Rewrites a template [`Tree`] into an equivalent tree in which no
//! expression position composes more than one step. Nested pipes, chained
//! calls, path reads in argument position, and calls in conditions are
//! hoisted into single-assignment statements placed just before the
//! statement that needs them:
//!
//! ```text
//! {{if eq ("what" | up | lower) "what"}}{{end}}
//! ```
//!
//! becomes
//!
//! ```text
//! {{$var2 := up "what"}}{{$var1 := lower $var2}}{{$var0 := eq $var1 "what"}}{{if $var0}}{{end}}
//! ```
//!
//! Rendered output and side effects are unchanged; evaluation order is
//! preserved because every hoisted expression is evaluated in the same
//! scope, in the same order, immediately before its consumer.
//!
//! # Pipeline Position
//!
//! ```text
//! Source → tpl_parse → Tree → [tpl_canon] → Tree (canonical) → type inference / checking
//! ```
//!
//! # Session
//!
//! 1. **Hygiene**: user bindings are respelled once (`$t` → `$tpl_t`).
//! 2. **Rewriting**: passes repeat until one applies no rule. Temporaries
//!    (`$var0`, `$var1`, ...) come from one counter per tree.
//!
//! Statement count grows; nothing here evaluates or type-checks templates.

mod config;
mod driver;
mod error;
mod hygiene;
mod names;
mod rules;
pub mod splice;
pub mod validate;

use std::sync::Once;

use rayon::prelude::*;
use tpl_ir::{TemplateSet, Tree};

pub use config::{CanonConfig, DEFAULT_HYGIENE_TAG, DEFAULT_TEMP_PREFIX};
pub use driver::CanonStats;
pub use error::CanonError;
pub use rules::Rule;

use driver::Session;

/// Canonicalize `tree` with the default configuration.
pub fn canonicalize(tree: &mut Tree) -> CanonStats {
    let config = CanonConfig::default();
    Session::new(&config).run_to_fixed_point(tree)
}

/// Canonicalize `tree` with `config`.
///
/// Fails if `config` is invalid or the tree needs more passes than
/// `config.max_passes` allows. On a pass-limit failure the tree holds
/// whatever rewrites were applied so far; each of them preserves behaviour.
pub fn canonicalize_with(tree: &mut Tree, config: &CanonConfig) -> Result<CanonStats, CanonError> {
    config.validate()?;
    Session::new(config).run(tree)
}

/// Canonicalize every tree of `set` in parallel, each in its own session.
///
/// Statistics come back in [`TemplateSet::trees`] order. If any tree fails,
/// one of the failures is returned and the remaining trees may be left
/// partially rewritten.
pub fn canonicalize_set(set: &mut TemplateSet, config: &CanonConfig) -> Result<Vec<CanonStats>, CanonError> {
    config.validate()?;
    set.trees_mut()
        .par_iter_mut()
        .map(|tree| Session::new(config).run(tree))
        .collect()
}

/// Whether no rewrite rule applies anywhere in `tree`.
///
/// Hygiene is not considered: a freshly parsed tree with no reducible
/// pipes is canonical even though a session would still rename its
/// bindings.
pub fn is_canonical(tree: &Tree) -> bool {
    driver::find_rewrite(tree).is_none()
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`, once.
///
/// Does nothing when `RUST_LOG` is unset, so embedding applications that
/// configure their own subscriber are unaffected.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if std::env::var_os("RUST_LOG").is_none() {
            return;
        }
        use tracing_subscriber::layer::SubscriberExt as _;
        use tracing_subscriber::util::SubscriberInitExt as _;
        // Another subscriber may already be installed; keep it.
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
    });
}
