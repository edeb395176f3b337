//! Hygiene renaming of user bindings.
//!
//! Before any rewriting, every variable the template author wrote (other
//! than the root `$`) is respelled with the session's hygiene tag, in
//! declarations and references alike: `$t` becomes `$tpl_t`. Temporaries
//! minted afterwards live in a disjoint name space, so hoisting can never
//! capture or shadow a user binding.

use tpl_ir::{Expr, Tree, ROOT_VARIABLE};

/// Respell every reachable user variable. Returns how many declarations and
/// references were renamed.
pub(crate) fn rename_bindings(tree: &mut Tree, tag: &str) -> usize {
    let mut renamed = 0;
    for pipe in tree.reachable_pipes() {
        for decl in &mut tree.pipe_mut(pipe).decls {
            if let Some(name) = hygienic(decl, tag) {
                tracing::trace!(from = %decl, to = %name, "renamed declaration");
                *decl = name;
                renamed += 1;
            }
        }
        let cmds = tree.pipe(pipe).cmds.clone();
        for cmd in cmds {
            let operands: Vec<_> = tree.cmd(cmd).operands().map(|(_, expr)| expr).collect();
            for expr in operands {
                if let Expr::Variable(path) = tree.expr_mut(expr) {
                    if let Some(name) = hygienic(&path[0], tag) {
                        tracing::trace!(from = %path[0], to = %name, "renamed reference");
                        path[0] = name;
                        renamed += 1;
                    }
                }
            }
        }
    }
    renamed
}

/// `$name` spelled with the hygiene tag, or `None` for the root variable.
fn hygienic(name: &str, tag: &str) -> Option<String> {
    if name == ROOT_VARIABLE {
        return None;
    }
    let bare = name.strip_prefix('$').unwrap_or(name);
    Some(format!("${tag}{bare}"))
}
