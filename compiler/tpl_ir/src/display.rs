//! Template-source rendering of trees.
//!
//! Output is the canonical `{{ }}` spelling: one space around `|` and `:=`,
//! declarations joined by `, `, sub-pipelines in parentheses, strings
//! re-quoted. Trim markers and comments are not reproduced.

use std::fmt::{self, Write as _};

use crate::node::Stmt;
use crate::{Branch, CmdId, Expr, ExprId, PipeId, StmtId, Tree};

/// Borrowed view that renders one node of a tree.
#[derive(Copy, Clone)]
pub struct Render<'a, T> {
    tree: &'a Tree,
    node: T,
}

impl Tree {
    pub fn display_stmt(&self, id: StmtId) -> Render<'_, StmtId> {
        Render {
            tree: self,
            node: id,
        }
    }

    pub fn display_pipe(&self, id: PipeId) -> Render<'_, PipeId> {
        Render {
            tree: self,
            node: id,
        }
    }

    pub fn display_expr(&self, id: ExprId) -> Render<'_, ExprId> {
        Render {
            tree: self,
            node: id,
        }
    }

    pub(crate) fn fmt_block(&self, f: &mut fmt::Formatter<'_>, block: &[StmtId]) -> fmt::Result {
        block.iter().try_for_each(|&id| self.fmt_stmt(f, id))
    }

    fn fmt_stmt(&self, f: &mut fmt::Formatter<'_>, id: StmtId) -> fmt::Result {
        crate::ensure_sufficient_stack(|| match self.stmt(id) {
            Stmt::Text(text) => f.write_str(text),
            Stmt::Action(pipe) => {
                f.write_str("{{")?;
                self.fmt_pipe(f, *pipe)?;
                f.write_str("}}")
            }
            Stmt::If(branch) => self.fmt_branch(f, "if", branch),
            Stmt::Range(branch) => self.fmt_branch(f, "range", branch),
            Stmt::With(branch) => self.fmt_branch(f, "with", branch),
            Stmt::Invoke { name, pipe } => {
                f.write_str("{{template ")?;
                write_quoted(f, name)?;
                if let Some(pipe) = pipe {
                    f.write_char(' ')?;
                    self.fmt_pipe(f, *pipe)?;
                }
                f.write_str("}}")
            }
        })
    }

    fn fmt_branch(&self, f: &mut fmt::Formatter<'_>, keyword: &str, branch: &Branch) -> fmt::Result {
        write!(f, "{{{{{keyword} ")?;
        self.fmt_pipe(f, branch.pipe)?;
        f.write_str("}}")?;
        self.fmt_block(f, &branch.body)?;
        if !branch.else_body.is_empty() {
            f.write_str("{{else}}")?;
            self.fmt_block(f, &branch.else_body)?;
        }
        f.write_str("{{end}}")
    }

    fn fmt_pipe(&self, f: &mut fmt::Formatter<'_>, id: PipeId) -> fmt::Result {
        let pipe = self.pipe(id);
        if pipe.is_assignment() {
            f.write_str(&pipe.decls.join(", "))?;
            f.write_str(" := ")?;
        }
        for (i, &cmd) in pipe.cmds.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            self.fmt_cmd(f, cmd)?;
        }
        Ok(())
    }

    fn fmt_cmd(&self, f: &mut fmt::Formatter<'_>, id: CmdId) -> fmt::Result {
        for (i, (_, expr)) in self.cmd(id).operands().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            self.fmt_expr(f, expr)?;
        }
        Ok(())
    }

    fn fmt_expr(&self, f: &mut fmt::Formatter<'_>, id: ExprId) -> fmt::Result {
        match self.expr(id) {
            Expr::Pipe(pipe) => {
                f.write_char('(')?;
                crate::ensure_sufficient_stack(|| self.fmt_pipe(f, *pipe))?;
                f.write_char(')')
            }
            Expr::Variable(path) => f.write_str(&path.join(".")),
            Expr::Field(path) => {
                for segment in path {
                    f.write_char('.')?;
                    f.write_str(segment)?;
                }
                Ok(())
            }
            Expr::Dot => f.write_char('.'),
            Expr::Identifier(name) => f.write_str(name),
            Expr::Str(text) => write_quoted(f, text),
            Expr::Number(text) => f.write_str(text),
            Expr::Bool(value) => write!(f, "{value}"),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\x{:02x}", u32::from(c))?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl fmt::Display for Render<'_, StmtId> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt_stmt(f, self.node)
    }
}

impl fmt::Display for Render<'_, PipeId> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt_pipe(f, self.node)
    }
}

impl fmt::Display for Render<'_, ExprId> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt_expr(f, self.node)
    }
}
