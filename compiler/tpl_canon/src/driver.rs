//! Fixed-point rewrite driver.
//!
//! A pass is a read-only depth-first scan for the first pipe some rule can
//! rewrite. The scan keeps a stack of host statements so every pipe knows
//! where hoisted assignments must go. When a rule matches, the scan stops,
//! the session applies the planned rewrite, and the next pass starts over
//! from the root. A pass that finds nothing ends the session.
//!
//! # Traversal Order
//!
//! ```text
//! block:     statements front to back
//! statement: governing pipe → nested operand pipes → body → else body
//! pipe:      rules (by role) → each command's head, then arguments
//! ```

use rustc_hash::FxHashMap;
use tpl_ir::{ensure_sufficient_stack, Expr, PipeId, Stmt, StmtId, Tree};

use crate::names::TempNames;
use crate::rules::{self, Planned, Role, Rule, Site};
use crate::{hygiene, CanonConfig, CanonError};

/// What one session did to its tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanonStats {
    /// Traversals run, including the final one that found nothing.
    pub passes: usize,
    /// Rewrites applied.
    pub rewrites: usize,
    /// Temporaries minted.
    pub temporaries: usize,
    /// User declarations and references respelled by hygiene.
    pub renamed: usize,
    /// Rewrites applied, per rule.
    pub by_rule: FxHashMap<Rule, usize>,
}

/// One canonicalization session: the hygiene tag, the name counter, and the
/// pass budget for a single tree.
pub(crate) struct Session<'cfg> {
    config: &'cfg CanonConfig,
    names: TempNames,
    stats: CanonStats,
}

impl<'cfg> Session<'cfg> {
    /// Start a session. `config` must already be validated.
    pub(crate) fn new(config: &'cfg CanonConfig) -> Self {
        Session {
            config,
            names: TempNames::new(&config.temp_prefix),
            stats: CanonStats::default(),
        }
    }

    /// Rename user bindings, then rewrite until no rule applies or the
    /// pass budget runs out.
    pub(crate) fn run(mut self, tree: &mut Tree) -> Result<CanonStats, CanonError> {
        let _span = tracing::debug_span!("canonicalize", template = %tree.name).entered();
        self.begin(tree);
        while self.step(tree) {
            if let Some(limit) = self.config.max_passes {
                if self.stats.passes >= limit {
                    tracing::debug!(limit, rewrites = self.stats.rewrites, "pass limit reached");
                    return Err(CanonError::PassLimit {
                        template: tree.name.clone(),
                        limit,
                    });
                }
            }
        }
        Ok(self.finish(tree))
    }

    /// [`run`](Self::run) without a pass budget.
    pub(crate) fn run_to_fixed_point(mut self, tree: &mut Tree) -> CanonStats {
        let _span = tracing::debug_span!("canonicalize", template = %tree.name).entered();
        self.begin(tree);
        while self.step(tree) {}
        self.finish(tree)
    }

    fn begin(&mut self, tree: &mut Tree) {
        self.stats.renamed = hygiene::rename_bindings(tree, &self.config.hygiene_tag);
    }

    fn finish(mut self, tree: &Tree) -> CanonStats {
        self.stats.temporaries = self.names.minted();
        tracing::debug!(
            passes = self.stats.passes,
            rewrites = self.stats.rewrites,
            temporaries = self.stats.temporaries,
            "canonical form reached"
        );
        #[cfg(debug_assertions)]
        crate::validate::assert_scoped(tree, self.config);
        #[cfg(not(debug_assertions))]
        let _ = tree;
        self.stats
    }

    /// One pass. Returns whether a rewrite was applied.
    fn step(&mut self, tree: &mut Tree) -> bool {
        self.stats.passes += 1;
        let Some(planned) = find_rewrite(tree) else {
            return false;
        };
        rules::apply(tree, &mut self.names, &planned);
        self.stats.rewrites += 1;
        *self.stats.by_rule.entry(planned.rule).or_insert(0) += 1;
        true
    }
}

/// The first rewrite a pass over `tree` would apply.
pub(crate) fn find_rewrite(tree: &Tree) -> Option<Planned> {
    Scan {
        tree,
        hosts: Vec::new(),
    }
    .block(tree.root())
}

struct Scan<'t> {
    tree: &'t Tree,
    /// Innermost host on top.
    hosts: Vec<StmtId>,
}

impl<'t> Scan<'t> {
    fn block(&mut self, block: &[StmtId]) -> Option<Planned> {
        block.iter().find_map(|&stmt| self.stmt(stmt))
    }

    fn stmt(&mut self, id: StmtId) -> Option<Planned> {
        let tree = self.tree;
        match tree.stmt(id) {
            Stmt::Text(_) => None,
            Stmt::Action(pipe) => {
                let role = if tree.pipe(*pipe).is_assignment() {
                    Role::Assign
                } else {
                    Role::Print
                };
                self.hosted(id, |scan| scan.pipe(*pipe, role))
            }
            Stmt::If(branch) | Stmt::Range(branch) | Stmt::With(branch) => {
                self.hosted(id, |scan| {
                    ensure_sufficient_stack(|| {
                        scan.pipe(branch.pipe, Role::Subject)
                            .or_else(|| scan.block(&branch.body))
                            .or_else(|| scan.block(&branch.else_body))
                    })
                })
            }
            Stmt::Invoke { pipe, .. } => {
                let pipe = (*pipe)?;
                self.hosted(id, |scan| scan.pipe(pipe, Role::Subject))
            }
        }
    }

    fn hosted(&mut self, host: StmtId, f: impl FnOnce(&mut Self) -> Option<Planned>) -> Option<Planned> {
        self.hosts.push(host);
        let found = f(self);
        self.hosts.pop();
        found
    }

    fn pipe(&mut self, pipe: PipeId, role: Role) -> Option<Planned> {
        let tree = self.tree;
        let host = *self.hosts.last()?;
        if let Some(planned) = rules::plan(tree, &Site { host, pipe, role }) {
            return Some(planned);
        }
        tree.pipe(pipe).cmds.iter().find_map(|&cmd| {
            tree.cmd(cmd).operands().find_map(|(_, expr)| match tree.expr(expr) {
                Expr::Pipe(inner) => ensure_sufficient_stack(|| self.pipe(*inner, Role::Nested)),
                _ => None,
            })
        })
    }
}
