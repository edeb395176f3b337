//! Statement and expression node kinds.
//!
//! The node set is closed: every consumer matches exhaustively, so adding a
//! kind is a compile error at each walk that forgets it.

use smallvec::SmallVec;

use crate::{CmdId, ExprId, PipeId, StmtId};

/// The bare root variable `$`. Never renamed, never hoisted.
pub const ROOT_VARIABLE: &str = "$";

/// Ordered statement list owned by the root or by a branch statement.
pub type Block = Vec<StmtId>;

/// Command argument list. Most commands take at most a few operands.
pub type Args = SmallVec<[ExprId; 4]>;

/// A statement inside a [`Block`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stmt {
    /// Literal text emitted verbatim.
    Text(String),
    /// `{{pipe}}`: prints the result, or binds it when the pipe declares.
    Action(PipeId),
    /// `{{if pipe}}body{{else}}else_body{{end}}`
    If(Branch),
    /// `{{range pipe}}body{{else}}else_body{{end}}`
    Range(Branch),
    /// `{{with pipe}}body{{else}}else_body{{end}}`
    With(Branch),
    /// `{{template "name" pipe}}`
    Invoke { name: String, pipe: Option<PipeId> },
}

/// Governing pipe and the two bodies of an `if`/`range`/`with`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Branch {
    pub pipe: PipeId,
    pub body: Block,
    pub else_body: Block,
}

impl Branch {
    pub fn new(pipe: PipeId, body: Block, else_body: Block) -> Self {
        Branch {
            pipe,
            body,
            else_body,
        }
    }
}

impl Stmt {
    /// The pipe this statement evaluates before anything else, if any.
    pub fn governing_pipe(&self) -> Option<PipeId> {
        match self {
            Stmt::Text(_) => None,
            Stmt::Action(pipe) => Some(*pipe),
            Stmt::If(branch) | Stmt::Range(branch) | Stmt::With(branch) => Some(branch.pipe),
            Stmt::Invoke { pipe, .. } => *pipe,
        }
    }

    pub fn branch(&self) -> Option<&Branch> {
        match self {
            Stmt::If(branch) | Stmt::Range(branch) | Stmt::With(branch) => Some(branch),
            Stmt::Text(_) | Stmt::Action(_) | Stmt::Invoke { .. } => None,
        }
    }

    pub fn branch_mut(&mut self) -> Option<&mut Branch> {
        match self {
            Stmt::If(branch) | Stmt::Range(branch) | Stmt::With(branch) => Some(branch),
            Stmt::Text(_) | Stmt::Action(_) | Stmt::Invoke { .. } => None,
        }
    }

    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Text(_) => "Text",
            Stmt::Action(_) => "Action",
            Stmt::If(_) => "If",
            Stmt::Range(_) => "Range",
            Stmt::With(_) => "With",
            Stmt::Invoke { .. } => "Invoke",
        }
    }
}

/// A pipeline: optional declarations followed by `|`-separated commands.
///
/// The result of command *i* becomes the final argument of command *i+1*.
/// A non-empty `decls` turns the pipe into an assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pipe {
    /// Declared variable names, each spelled with its leading `$`.
    pub decls: Vec<String>,
    pub cmds: Vec<CmdId>,
}

impl Pipe {
    pub fn new(decls: Vec<String>, cmds: Vec<CmdId>) -> Self {
        Pipe { decls, cmds }
    }

    #[inline]
    pub fn is_assignment(&self) -> bool {
        !self.decls.is_empty()
    }
}

/// Which operand of a [`Command`] an edit targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Head,
    Arg(usize),
}

/// One stage of a pipeline: a head expression applied to arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Command {
    pub head: ExprId,
    pub args: Args,
}

impl Command {
    pub fn new(head: ExprId, args: Args) -> Self {
        Command { head, args }
    }

    /// A command consisting of a single value and nothing else.
    pub fn bare(head: ExprId) -> Self {
        Command {
            head,
            args: Args::new(),
        }
    }

    /// Head followed by arguments, in source order.
    pub fn operands(&self) -> impl Iterator<Item = (Operand, ExprId)> + '_ {
        std::iter::once((Operand::Head, self.head)).chain(
            self.args
                .iter()
                .enumerate()
                .map(|(i, &arg)| (Operand::Arg(i), arg)),
        )
    }

    pub fn operand(&self, operand: Operand) -> ExprId {
        match operand {
            Operand::Head => self.head,
            Operand::Arg(i) => self.args[i],
        }
    }

    pub fn set_operand(&mut self, operand: Operand, expr: ExprId) {
        match operand {
            Operand::Head => self.head = expr,
            Operand::Arg(i) => self.args[i] = expr,
        }
    }
}

/// An expression in operand position.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// Parenthesized sub-pipeline.
    Pipe(PipeId),
    /// `$name.Field.Field`: first segment keeps its `$`; the bare root is `$`.
    Variable(Vec<String>),
    /// `.Field.Field` relative to dot; segments stored without dots.
    Field(Vec<String>),
    /// `.`
    Dot,
    /// Function name.
    Identifier(String),
    /// Decoded string literal.
    Str(String),
    /// Number literal, kept in source spelling.
    Number(String),
    Bool(bool),
}

impl Expr {
    /// A single-segment variable reference.
    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(vec![name.into()])
    }

    /// Field read or multi-segment variable read: anything that walks a path.
    pub fn is_path_read(&self) -> bool {
        match self {
            Expr::Field(_) => true,
            Expr::Variable(path) => path.len() > 1,
            _ => false,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, Expr::Identifier(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Pipe(_) => "Pipe",
            Expr::Variable(_) => "Variable",
            Expr::Field(_) => "Field",
            Expr::Dot => "Dot",
            Expr::Identifier(_) => "Identifier",
            Expr::Str(_) => "StringLit",
            Expr::Number(_) => "NumberLit",
            Expr::Bool(_) => "BoolLit",
        }
    }
}
