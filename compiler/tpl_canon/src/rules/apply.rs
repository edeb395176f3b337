//! Applying planned rewrites.

use tpl_ir::{CmdId, Expr, Operand, Pipe, PipeId, Stmt, StmtId, Tree};

use super::{Planned, Rewrite};
use crate::names::TempNames;
use crate::splice;

/// Apply one planned rewrite. Panics if the plan no longer fits the tree;
/// plans are applied immediately after the scan that produced them, so a
/// mismatch is a bug in detection.
pub(crate) fn apply(tree: &mut Tree, names: &mut TempNames, planned: &Planned) {
    match planned.rewrite {
        Rewrite::Fold { pipe, from, into } => {
            let source = tree.pipe(pipe).cmds[from];
            let target = tree.pipe(pipe).cmds[into];
            let value = tree.cmd(source).head;
            tree.cmd_mut(target).args.push(value);
            tree.pipe_mut(pipe).cmds.remove(from);
            tracing::debug!(rule = %planned.rule, ?pipe, from, into, "folded piped value");
        }
        Rewrite::HoistLeading { pipe, len, host } => {
            let name = names.fresh();
            let leading: Vec<CmdId> = tree.pipe_mut(pipe).cmds.drain(..len).collect();
            let assignment = tree.assignment(&name, leading);
            let temp = temp_command(tree, &name);
            tree.pipe_mut(pipe).cmds.insert(0, temp);
            splice_before(tree, host, assignment);
            tracing::debug!(rule = %planned.rule, ?host, temp = %name, len, "hoisted leading commands");
        }
        Rewrite::HoistOperand { cmd, operand, host } => {
            let expr = tree.cmd(cmd).operand(operand);
            let nested = match tree.expr(expr) {
                Expr::Pipe(inner) => Some(*inner),
                _ => None,
            };
            let (name, hoisted_pipe) = match nested {
                // `($x := p)` is hoisted as written and read back through `$x`.
                Some(inner) if tree.pipe(inner).is_assignment() => {
                    let declared = tree.pipe(inner).decls[0].clone();
                    (declared, inner)
                }
                // The parenthesized pipe itself becomes the assignment.
                Some(inner) => {
                    let name = names.fresh();
                    tree.pipe_mut(inner).decls = vec![name.clone()];
                    (name, inner)
                }
                None => {
                    let name = names.fresh();
                    let read = tree.bare_command(expr);
                    let pipe = tree.alloc_pipe(Pipe::new(vec![name.clone()], vec![read]));
                    (name, pipe)
                }
            };
            let assignment = tree.alloc_stmt(Stmt::Action(hoisted_pipe));
            let var = tree.variable(&name);
            tree.cmd_mut(cmd).set_operand(operand, var);
            splice_before(tree, host, assignment);
            let position = match operand {
                Operand::Head => "head",
                Operand::Arg(_) => "argument",
            };
            tracing::debug!(rule = %planned.rule, ?host, temp = %name, position, "hoisted operand");
        }
        Rewrite::HoistAll { pipe, host } => {
            let name = names.fresh();
            let cmds = std::mem::take(&mut tree.pipe_mut(pipe).cmds);
            let assignment = tree.assignment(&name, cmds);
            let temp = temp_command(tree, &name);
            tree.pipe_mut(pipe).cmds = vec![temp];
            splice_before(tree, host, assignment);
            tracing::debug!(rule = %planned.rule, ?host, temp = %name, "hoisted governing pipe");
        }
        Rewrite::Unwrap { pipe, inner } => {
            let cmds = std::mem::take(&mut tree.pipe_mut(inner).cmds);
            tree.pipe_mut(pipe).cmds = cmds;
            tracing::debug!(rule = %planned.rule, ?pipe, ?inner, "removed parentheses");
        }
        Rewrite::SplitPrint { action } => {
            let Some(pipe) = action_pipe(tree, action) else {
                panic!(
                    "print split planned on a non-action: {}",
                    tree.dump_stmt(action)
                );
            };
            let name = names.fresh();
            tree.pipe_mut(pipe).decls = vec![name.clone()];
            let print = tree.print_variable(&name);
            if !splice::insert_after(tree, action, print) {
                panic!(
                    "print split lost its action: {} is not reachable",
                    tree.dump_stmt(action)
                );
            }
            tracing::debug!(rule = %planned.rule, ?action, temp = %name, "split print");
        }
    }
}

/// A command that just reads the temporary `name`.
fn temp_command(tree: &mut Tree, name: &str) -> CmdId {
    let var = tree.variable(name);
    tree.bare_command(var)
}

fn splice_before(tree: &mut Tree, host: StmtId, stmt: StmtId) {
    if !splice::insert_before(tree, host, stmt) {
        panic!(
            "hoist target vanished: {} is not reachable from the root of {:?}",
            tree.dump_stmt(host),
            tree.name
        );
    }
}

fn action_pipe(tree: &Tree, stmt: StmtId) -> Option<PipeId> {
    match tree.stmt(stmt) {
        Stmt::Action(pipe) => Some(*pipe),
        _ => None,
    }
}
