//! Named template collections.

use crate::Tree;

/// A main template plus the templates it `define`s.
///
/// Each tree has its own arenas; handles never cross trees.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateSet {
    /// `trees[0]` is the main template.
    trees: Vec<Tree>,
}

impl TemplateSet {
    pub fn new(main: Tree) -> Self {
        TemplateSet { trees: vec![main] }
    }

    pub fn main(&self) -> &Tree {
        &self.trees[0]
    }

    pub fn main_mut(&mut self) -> &mut Tree {
        &mut self.trees[0]
    }

    pub fn into_main(mut self) -> Tree {
        self.trees.swap_remove(0)
    }

    /// Add a defined template. A later definition replaces an earlier one
    /// with the same name.
    pub fn define(&mut self, tree: Tree) {
        match self.trees[1..].iter().position(|t| t.name == tree.name) {
            Some(i) => self.trees[i + 1] = tree,
            None => self.trees.push(tree),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Tree> {
        self.trees[1..].iter().find(|t| t.name == name)
    }

    /// Defined templates, in definition order.
    pub fn defined(&self) -> &[Tree] {
        &self.trees[1..]
    }

    /// All trees, main first.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn trees_mut(&mut self) -> &mut [Tree] {
        &mut self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Always false: a set holds at least its main template.
    pub fn is_empty(&self) -> bool {
        false
    }
}
