//! Arena-backed template tree.
//!
//! # Index Spaces
//!
//! A [`Tree`] owns four arenas: statements, pipes, commands, and
//! expressions. Nodes refer to each other only through handles
//! ([`StmtId`], [`PipeId`], [`CmdId`], [`ExprId`]). Nodes are never freed;
//! a rewrite that drops a node simply stops referring to it. "Reachable"
//! always means reachable from [`Tree::root`].
//!
//! # Blocks
//!
//! Blocks are plain `Vec<StmtId>` owned by the root or by a branch
//! statement. [`BlockRef`] names a block without borrowing it, which is what
//! [`Tree::locate`] hands back so the caller can mutate afterwards.

use std::fmt;

use crate::ids::to_u32;
use crate::node::{Args, Block, Command, Expr, Pipe, Stmt};
use crate::{CmdId, ExprId, PipeId, StmtId};

/// Names one statement list in the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockRef {
    Root,
    /// `body` of the branch statement.
    Body(StmtId),
    /// `else_body` of the branch statement.
    Else(StmtId),
}

/// Position of a statement: which block, and where in it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub block: BlockRef,
    pub index: usize,
}

/// A parsed template: a root block plus the arenas its handles index into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tree {
    /// Template name (`""` for an anonymous main template).
    pub name: String,
    root: Block,
    stmts: Vec<Stmt>,
    pipes: Vec<Pipe>,
    cmds: Vec<Command>,
    exprs: Vec<Expr>,
}

impl Tree {
    pub fn new(name: impl Into<String>) -> Self {
        Tree {
            name: name.into(),
            ..Tree::default()
        }
    }

    // Allocation

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(to_u32(self.stmts.len(), "statement"));
        self.stmts.push(stmt);
        id
    }

    pub fn alloc_pipe(&mut self, pipe: Pipe) -> PipeId {
        let id = PipeId::new(to_u32(self.pipes.len(), "pipe"));
        self.pipes.push(pipe);
        id
    }

    pub fn alloc_cmd(&mut self, cmd: Command) -> CmdId {
        let id = CmdId::new(to_u32(self.cmds.len(), "command"));
        self.cmds.push(cmd);
        id
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len(), "expression"));
        self.exprs.push(expr);
        id
    }

    // Access

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    #[inline]
    pub fn pipe(&self, id: PipeId) -> &Pipe {
        &self.pipes[id.index()]
    }

    #[inline]
    pub fn pipe_mut(&mut self, id: PipeId) -> &mut Pipe {
        &mut self.pipes[id.index()]
    }

    #[inline]
    pub fn cmd(&self, id: CmdId) -> &Command {
        &self.cmds[id.index()]
    }

    #[inline]
    pub fn cmd_mut(&mut self, id: CmdId) -> &mut Command {
        &mut self.cmds[id.index()]
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    /// Head expression of a command, resolved.
    #[inline]
    pub fn head(&self, cmd: CmdId) -> &Expr {
        self.expr(self.cmd(cmd).head)
    }

    pub fn root(&self) -> &[StmtId] {
        &self.root
    }

    /// Append a statement to the root block.
    pub fn push_root(&mut self, stmt: StmtId) {
        self.root.push(stmt);
    }

    /// Replace the root block wholesale.
    pub fn set_root(&mut self, block: Block) {
        self.root = block;
    }

    /// Number of allocated statements, reachable or not.
    pub fn stmt_arena_len(&self) -> usize {
        self.stmts.len()
    }

    pub fn block(&self, block: BlockRef) -> &[StmtId] {
        match block {
            BlockRef::Root => &self.root,
            BlockRef::Body(owner) => &self.branch_of(owner).body,
            BlockRef::Else(owner) => &self.branch_of(owner).else_body,
        }
    }

    pub fn block_mut(&mut self, block: BlockRef) -> &mut Block {
        match block {
            BlockRef::Root => &mut self.root,
            BlockRef::Body(owner) | BlockRef::Else(owner) => {
                let stmt = &mut self.stmts[owner.index()];
                let kind = stmt.kind_name();
                let Some(branch) = stmt.branch_mut() else {
                    panic!("{block:?} names a block of {owner:?}, which is a {kind} statement");
                };
                if matches!(block, BlockRef::Body(_)) {
                    &mut branch.body
                } else {
                    &mut branch.else_body
                }
            }
        }
    }

    fn branch_of(&self, owner: StmtId) -> &crate::Branch {
        let stmt = self.stmt(owner);
        match stmt.branch() {
            Some(branch) => branch,
            None => panic!(
                "{owner:?} owns no block: it is a {} statement",
                stmt.kind_name()
            ),
        }
    }

    /// Find where `target` sits.
    ///
    /// Scans a block front to back; at each statement that is not the target,
    /// descends into its `body` and then its `else_body` before moving on.
    /// `Invoke` bodies live in other trees and are not searched.
    pub fn locate(&self, target: StmtId) -> Option<Slot> {
        self.locate_in(BlockRef::Root, target)
    }

    fn locate_in(&self, block: BlockRef, target: StmtId) -> Option<Slot> {
        crate::ensure_sufficient_stack(|| {
            for (index, &id) in self.block(block).iter().enumerate() {
                if id == target {
                    return Some(Slot { block, index });
                }
                if self.stmt(id).branch().is_some() {
                    let found = self
                        .locate_in(BlockRef::Body(id), target)
                        .or_else(|| self.locate_in(BlockRef::Else(id), target));
                    if found.is_some() {
                        return found;
                    }
                }
            }
            None
        })
    }

    /// Every pipe reachable from the root, in traversal order.
    ///
    /// A statement's governing pipe comes before the pipes nested in its
    /// operands, which come before anything in its bodies.
    pub fn reachable_pipes(&self) -> Vec<PipeId> {
        let mut out = Vec::new();
        self.collect_block(&self.root, &mut out);
        out
    }

    fn collect_block(&self, block: &[StmtId], out: &mut Vec<PipeId>) {
        for &id in block {
            let stmt = self.stmt(id);
            if let Some(pipe) = stmt.governing_pipe() {
                self.collect_pipe(pipe, out);
            }
            if let Some(branch) = stmt.branch() {
                crate::ensure_sufficient_stack(|| {
                    self.collect_block(&branch.body, out);
                    self.collect_block(&branch.else_body, out);
                });
            }
        }
    }

    fn collect_pipe(&self, pipe: PipeId, out: &mut Vec<PipeId>) {
        out.push(pipe);
        for &cmd in &self.pipe(pipe).cmds {
            for (_, expr) in self.cmd(cmd).operands() {
                if let Expr::Pipe(inner) = self.expr(expr) {
                    crate::ensure_sufficient_stack(|| self.collect_pipe(*inner, out));
                }
            }
        }
    }

    // Construction helpers

    pub fn text(&mut self, text: impl Into<String>) -> StmtId {
        self.alloc_stmt(Stmt::Text(text.into()))
    }

    /// Single-segment variable reference `name`.
    pub fn variable(&mut self, name: &str) -> ExprId {
        self.alloc_expr(Expr::variable(name))
    }

    pub fn command(&mut self, head: ExprId, args: impl IntoIterator<Item = ExprId>) -> CmdId {
        self.alloc_cmd(Command::new(head, args.into_iter().collect::<Args>()))
    }

    /// Command that just yields `expr`.
    pub fn bare_command(&mut self, expr: ExprId) -> CmdId {
        self.alloc_cmd(Command::bare(expr))
    }

    pub fn action(&mut self, decls: Vec<String>, cmds: Vec<CmdId>) -> StmtId {
        let pipe = self.alloc_pipe(Pipe::new(decls, cmds));
        self.alloc_stmt(Stmt::Action(pipe))
    }

    /// `{{name := cmds}}`
    pub fn assignment(&mut self, name: &str, cmds: Vec<CmdId>) -> StmtId {
        self.action(vec![name.to_owned()], cmds)
    }

    /// `{{name}}`
    pub fn print_variable(&mut self, name: &str) -> StmtId {
        let var = self.variable(name);
        let cmd = self.bare_command(var);
        self.action(Vec::new(), vec![cmd])
    }

    /// Renders one statement with its id and kind, for panic messages.
    pub fn dump_stmt(&self, id: StmtId) -> String {
        format!(
            "{id:?} {} `{}`",
            self.stmt(id).kind_name(),
            self.display_stmt(id)
        )
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_block(f, &self.root)
    }
}
