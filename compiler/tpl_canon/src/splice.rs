//! Statement insertion by identity.
//!
//! The anchor is found with [`Tree::locate`]: a front-to-back scan of the
//! root block that descends into `if`/`range`/`with` bodies and then their
//! else bodies. The new statement lands in the same block as the anchor, so
//! it shares the anchor's scope and dot.

use tpl_ir::{StmtId, Tree};

/// Insert `stmt` immediately before `anchor`. Returns `false` if `anchor`
/// is not reachable.
pub fn insert_before(tree: &mut Tree, anchor: StmtId, stmt: StmtId) -> bool {
    insert_at(tree, anchor, stmt, 0)
}

/// Insert `stmt` immediately after `anchor`. Returns `false` if `anchor` is
/// not reachable.
pub fn insert_after(tree: &mut Tree, anchor: StmtId, stmt: StmtId) -> bool {
    insert_at(tree, anchor, stmt, 1)
}

fn insert_at(tree: &mut Tree, anchor: StmtId, stmt: StmtId, offset: usize) -> bool {
    let Some(slot) = tree.locate(anchor) else {
        return false;
    };
    tree.block_mut(slot.block).insert(slot.index + offset, stmt);
    true
}
