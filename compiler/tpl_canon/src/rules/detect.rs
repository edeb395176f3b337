//! Pattern detection. Read-only.

use tpl_ir::{CmdId, Command, Expr, Operand, PipeId, Tree};

use super::{Planned, Rewrite, Role, Rule, Site};

pub(super) fn detect(tree: &Tree, site: &Site, rule: Rule) -> Option<Rewrite> {
    match rule {
        Rule::FoldPipedValue => fold_piped_value(tree, site.pipe),
        Rule::ChainedCall => chained_call(tree, site),
        Rule::SubjectCall => subject_call(tree, site),
        Rule::RedundantParens => redundant_parens(tree, site.pipe),
        Rule::CompoundHead => compound_head(tree, site),
        Rule::SplitPrint => split_print(tree, site),
        Rule::MethodCall => method_call(tree, site),
        Rule::ParenthesizedHead => parenthesized_head(tree, site),
        // Found by the operand scan, which also decides what runs first.
        Rule::NestedPipe | Rule::ArgumentRead => operands(tree, site)
            .filter(|planned| planned.rule == rule)
            .map(|planned| planned.rewrite),
    }
}

// Command shapes

/// Identifier head: a function call.
fn is_call(tree: &Tree, cmd: CmdId) -> bool {
    tree.head(cmd).is_identifier()
}

/// Path head with arguments, or dot applied to arguments.
fn is_method_call(tree: &Tree, cmd: CmdId) -> bool {
    let command = tree.cmd(cmd);
    let head = tree.expr(command.head);
    !command.args.is_empty() && (head.is_path_read() || is_dot(head))
}

/// Just a value: nothing follows the head.
fn bare_value(tree: &Tree, cmd: CmdId) -> Option<&Expr> {
    let command = tree.cmd(cmd);
    command.args.is_empty().then(|| tree.expr(command.head))
}

fn lone_command(tree: &Tree, pipe: PipeId) -> Option<CmdId> {
    match tree.pipe(pipe).cmds.as_slice() {
        [cmd] => Some(*cmd),
        _ => None,
    }
}

/// Values that evaluate without running anything.
fn is_plain_value(tree: &Tree, cmd: CmdId) -> bool {
    bare_value(tree, cmd).is_some_and(|head| match head {
        Expr::Variable(path) => path.len() == 1,
        Expr::Dot | Expr::Str(_) | Expr::Number(_) | Expr::Bool(_) => true,
        Expr::Pipe(_) | Expr::Field(_) | Expr::Identifier(_) => false,
    })
}

/// Value kinds the fold rule moves.
const FOLDABLE: [fn(&Expr) -> bool; 5] = [is_variable, is_string, is_dot, is_field, is_number];

fn is_variable(expr: &Expr) -> bool {
    matches!(expr, Expr::Variable(_))
}

fn is_string(expr: &Expr) -> bool {
    matches!(expr, Expr::Str(_))
}

fn is_dot(expr: &Expr) -> bool {
    matches!(expr, Expr::Dot)
}

fn is_field(expr: &Expr) -> bool {
    matches!(expr, Expr::Field(_))
}

fn is_number(expr: &Expr) -> bool {
    matches!(expr, Expr::Number(_))
}

/// `v | f a` → `f a v`: the call right after a bare leading value absorbs it.
///
/// Only the leading command can be folded. Any later command receives the
/// piped value, so moving it would change what it computes. A path read
/// stays in front while the call still has arguments to hoist, since
/// folding would run it after them.
fn fold_piped_value(tree: &Tree, pipe: PipeId) -> Option<Rewrite> {
    let (value, call) = match tree.pipe(pipe).cmds.as_slice() {
        [value, call, ..] => (*value, *call),
        _ => return None,
    };
    if !is_call(tree, call) {
        return None;
    }
    let head = bare_value(tree, value)?;
    if !FOLDABLE.iter().any(|matches_kind| matches_kind(head)) {
        return None;
    }
    if head.is_path_read() && hoistable_arg(tree, call).is_some() {
        return None;
    }
    Some(Rewrite::Fold {
        pipe,
        from: 0,
        into: 1,
    })
}

/// Two calls in a row at the front of the pipe.
fn chained_call(tree: &Tree, site: &Site) -> Option<Rewrite> {
    match tree.pipe(site.pipe).cmds.as_slice() {
        [first, second, ..] if is_call(tree, *first) && is_call(tree, *second) => {
            Some(Rewrite::HoistLeading {
                pipe: site.pipe,
                len: 1,
                host: site.host,
            })
        }
        _ => None,
    }
}

/// The next operand to hoist, in evaluation order.
///
/// Operands are parenthesized pipes in argument position and path reads
/// passed to calls, leftmost first. Arguments of a later command run after
/// every command in front of it, so unless the only thing in front is a
/// plain value, the commands in front are hoisted first.
pub(super) fn operands(tree: &Tree, site: &Site) -> Option<Planned> {
    let cmds = &tree.pipe(site.pipe).cmds;
    let (at, cmd, operand) = cmds
        .iter()
        .enumerate()
        .find_map(|(at, &cmd)| hoistable_arg(tree, cmd).map(|operand| (at, cmd, operand)))?;
    let leading = cmds[0];
    let host = site.host;
    if at == 0 || (at == 1 && is_plain_value(tree, leading)) {
        let rule = match tree.expr(tree.cmd(cmd).operand(operand)) {
            Expr::Pipe(_) => Rule::NestedPipe,
            _ => Rule::ArgumentRead,
        };
        return Some(Planned {
            rule,
            rewrite: Rewrite::HoistOperand { cmd, operand, host },
        });
    }
    if at == 1 && tree.cmd(leading).args.is_empty() {
        let rule = match tree.head(leading) {
            Expr::Pipe(_) => Some(Rule::ParenthesizedHead),
            head if head.is_path_read() => Some(Rule::ArgumentRead),
            _ => None,
        };
        if let Some(rule) = rule {
            return Some(Planned {
                rule,
                rewrite: Rewrite::HoistOperand {
                    cmd: leading,
                    operand: Operand::Head,
                    host,
                },
            });
        }
    }
    let rule = if is_method_call(tree, leading) {
        Rule::MethodCall
    } else {
        Rule::ChainedCall
    };
    Some(Planned {
        rule,
        rewrite: Rewrite::HoistLeading {
            pipe: site.pipe,
            len: at,
            host,
        },
    })
}

/// Leftmost argument of `cmd` that must be hoisted: a parenthesized pipe,
/// or a path read when `cmd` calls a function.
fn hoistable_arg(tree: &Tree, cmd: CmdId) -> Option<Operand> {
    let call = is_call(tree, cmd);
    if !call && !is_method_call(tree, cmd) {
        return None;
    }
    first_arg(tree, tree.cmd(cmd), |expr| {
        matches!(expr, Expr::Pipe(_)) || (call && expr.is_path_read())
    })
}

/// A branch or invocation governed by a lone call with arguments.
fn subject_call(tree: &Tree, site: &Site) -> Option<Rewrite> {
    if site.role != Role::Subject {
        return None;
    }
    let cmd = lone_command(tree, site.pipe)?;
    (is_call(tree, cmd) && !tree.cmd(cmd).args.is_empty()).then_some(Rewrite::HoistAll {
        pipe: site.pipe,
        host: site.host,
    })
}

/// `((p))`: a lone argument-free command wrapping a declaration-free pipe.
fn redundant_parens(tree: &Tree, pipe: PipeId) -> Option<Rewrite> {
    let cmd = lone_command(tree, pipe)?;
    let Some(Expr::Pipe(inner)) = bare_value(tree, cmd) else {
        return None;
    };
    (!tree.pipe(*inner).is_assignment()).then_some(Rewrite::Unwrap {
        pipe,
        inner: *inner,
    })
}

/// A printed or governing pipe that is a lone path read or method call.
fn compound_head(tree: &Tree, site: &Site) -> Option<Rewrite> {
    if !matches!(site.role, Role::Print | Role::Subject) {
        return None;
    }
    let cmd = lone_command(tree, site.pipe)?;
    (tree.head(cmd).is_path_read() || is_method_call(tree, cmd)).then_some(Rewrite::HoistAll {
        pipe: site.pipe,
        host: site.host,
    })
}

/// A printing action that calls a function.
fn split_print(tree: &Tree, site: &Site) -> Option<Rewrite> {
    if site.role != Role::Print {
        return None;
    }
    tree.pipe(site.pipe)
        .cmds
        .iter()
        .any(|&cmd| is_call(tree, cmd))
        .then_some(Rewrite::SplitPrint { action: site.host })
}

/// A method call feeding later commands.
fn method_call(tree: &Tree, site: &Site) -> Option<Rewrite> {
    match tree.pipe(site.pipe).cmds.as_slice() {
        [first, _, ..] if is_method_call(tree, *first) => Some(Rewrite::HoistLeading {
            pipe: site.pipe,
            len: 1,
            host: site.host,
        }),
        _ => None,
    }
}

/// `(p) | f`: a parenthesized leading head feeding later commands.
fn parenthesized_head(tree: &Tree, site: &Site) -> Option<Rewrite> {
    match tree.pipe(site.pipe).cmds.as_slice() {
        [first, _, ..] if matches!(tree.head(*first), Expr::Pipe(_)) => {
            Some(Rewrite::HoistOperand {
                cmd: *first,
                operand: Operand::Head,
                host: site.host,
            })
        }
        _ => None,
    }
}

fn first_arg(tree: &Tree, command: &Command, pred: impl Fn(&Expr) -> bool) -> Option<Operand> {
    command
        .args
        .iter()
        .position(|&arg| pred(tree.expr(arg)))
        .map(Operand::Arg)
}
