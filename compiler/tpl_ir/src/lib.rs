//! Node model for pipe-based text templates.
//!
//! A template is a [`Tree`]: a root block of [`Stmt`]s whose expression
//! positions hold [`Pipe`]lines of [`Command`]s over [`Expr`]essions.
//! All nodes live in per-tree arenas and are addressed by handles, so a
//! node's handle is also its identity.
//!
//! # Shape
//!
//! ```text
//! Tree
//!  └─ Block = [StmtId]
//!      ├─ Text
//!      ├─ Action(PipeId)
//!      ├─ If / Range / With(Branch { pipe, body, else_body })
//!      └─ Invoke { name, pipe? }
//! Pipe    { decls: [$name], cmds: [CmdId] }
//! Command { head: ExprId, args: [ExprId] }
//! Expr    = Pipe | Variable | Field | Dot | Identifier | Str | Number | Bool
//! ```
//!
//! Consumers: `tpl_parse` builds trees, `tpl_canon` rewrites them.

mod display;
mod ids;
mod node;
mod set;
mod stack;
mod tree;

pub use display::Render;
pub use ids::{CmdId, ExprId, PipeId, StmtId};
pub use node::{Args, Block, Branch, Command, Expr, Operand, Pipe, Stmt, ROOT_VARIABLE};
pub use set::TemplateSet;
pub use stack::ensure_sufficient_stack;
pub use tree::{BlockRef, Slot, Tree};
