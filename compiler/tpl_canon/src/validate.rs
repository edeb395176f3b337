//! Shape checks for canonicalized trees.
//!
//! [`check`] reports every place a tree departs from canonical shape:
//!
//! - a nested pipe with more than one command
//! - a pipe in argument position
//! - a call reading a field or variable path in argument position
//! - a temporary used before (or outside the scope of) its declaration
//!
//! Rule priority leaves some unusual pipes unflattened (a boolean literal
//! piped into a call, say), so the first three are reported, not enforced.
//! Temporary scoping holds for every input; debug builds assert it after
//! each session.

use rustc_hash::FxHashSet;
use tpl_ir::{CmdId, Expr, PipeId, Stmt, StmtId, Tree};

use crate::names::is_temp;
use crate::CanonConfig;

/// One departure from canonical shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// A parenthesized pipe still has several commands.
    CompositeNestedPipe { pipe: PipeId },
    /// A command argument is still a parenthesized pipe.
    PipeArgument { cmd: CmdId },
    /// A call still reads a path in argument position.
    PathArgument { cmd: CmdId },
    /// A temporary is referenced where no declaration of it is in scope.
    UndeclaredTemporary { stmt: StmtId, name: String },
}

/// Every violation in `tree`, in traversal order per kind.
pub fn check(tree: &Tree, config: &CanonConfig) -> Vec<Violation> {
    let mut out = shape_violations(tree);
    out.extend(scope_violations(tree, &config.temp_prefix));
    out
}

fn shape_violations(tree: &Tree) -> Vec<Violation> {
    let mut out = Vec::new();
    for pipe in tree.reachable_pipes() {
        for &cmd in &tree.pipe(pipe).cmds {
            let command = tree.cmd(cmd);
            let is_call = tree.expr(command.head).is_identifier();
            for &arg in &command.args {
                match tree.expr(arg) {
                    Expr::Pipe(inner) => {
                        out.push(Violation::PipeArgument { cmd });
                        if tree.pipe(*inner).cmds.len() > 1 {
                            out.push(Violation::CompositeNestedPipe { pipe: *inner });
                        }
                    }
                    expr if is_call && expr.is_path_read() => {
                        out.push(Violation::PathArgument { cmd });
                    }
                    _ => {}
                }
            }
        }
    }
    out
}

fn scope_violations(tree: &Tree, prefix: &str) -> Vec<Violation> {
    let mut scopes = ScopeCheck {
        tree,
        prefix,
        scopes: Vec::new(),
        out: Vec::new(),
    };
    scopes.block(tree.root(), &[]);
    scopes.out
}

/// Panic if a temporary escapes its scope. Debug builds only.
#[cfg(debug_assertions)]
pub(crate) fn assert_scoped(tree: &Tree, config: &CanonConfig) {
    let violations = scope_violations(tree, &config.temp_prefix);
    debug_assert!(
        violations.is_empty(),
        "temporaries used out of scope in {:?}: {violations:?}\n{tree}",
        tree.name
    );
}

struct ScopeCheck<'t> {
    tree: &'t Tree,
    prefix: &'t str,
    /// Declared temporaries, one set per open block.
    scopes: Vec<FxHashSet<&'t str>>,
    out: Vec<Violation>,
}

impl<'t> ScopeCheck<'t> {
    /// Walk `block` in a fresh scope that starts out holding `declared`.
    fn block(&mut self, block: &'t [StmtId], declared: &[&'t str]) {
        self.scopes.push(declared.iter().copied().collect());
        for &stmt in block {
            self.stmt(stmt);
        }
        self.scopes.pop();
    }

    fn stmt(&mut self, id: StmtId) {
        let tree = self.tree;
        let stmt = tree.stmt(id);
        if let Some(pipe) = stmt.governing_pipe() {
            self.uses(id, pipe);
        }
        match stmt {
            Stmt::Action(pipe) => {
                let decls = &tree.pipe(*pipe).decls;
                if let Some(scope) = self.scopes.last_mut() {
                    scope.extend(decls.iter().map(String::as_str));
                }
            }
            Stmt::If(branch) | Stmt::Range(branch) | Stmt::With(branch) => {
                let decls: Vec<&str> = tree
                    .pipe(branch.pipe)
                    .decls
                    .iter()
                    .map(String::as_str)
                    .collect();
                tpl_ir::ensure_sufficient_stack(|| {
                    self.block(&branch.body, &decls);
                    self.block(&branch.else_body, &decls);
                });
            }
            Stmt::Text(_) | Stmt::Invoke { .. } => {}
        }
    }

    /// Check the temporaries `pipe` (and pipes nested in it) reference.
    fn uses(&mut self, stmt: StmtId, pipe: PipeId) {
        let tree = self.tree;
        for &cmd in &tree.pipe(pipe).cmds {
            for (_, expr) in tree.cmd(cmd).operands() {
                match tree.expr(expr) {
                    Expr::Variable(path) => {
                        let name = path[0].as_str();
                        if is_temp(name, self.prefix) && !self.in_scope(name) {
                            self.out.push(Violation::UndeclaredTemporary {
                                stmt,
                                name: name.to_owned(),
                            });
                        }
                    }
                    Expr::Pipe(inner) => self.uses(stmt, *inner),
                    _ => {}
                }
            }
        }
    }

    fn in_scope(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }
}
