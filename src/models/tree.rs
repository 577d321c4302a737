//! File-tree data model: an arena of nodes addressed by stable ids.
//!
//! Parent and child links are stored as `NodeId`s, never as owning handles,
//! so the parent/child cycle needs no reference counting. Only the arena
//! owns node storage.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use compact_str::{CompactString, ToCompactString};
use slotmap::{new_key_type, SlotMap};

use super::path_key::PathKey;
use crate::services::ports::file::Stat;

new_key_type! { pub struct NodeId; }

/// One file-system entry known to the engine.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub location: PathBuf,
    pub name: CompactString,
    pub is_directory: bool,
    pub is_symbolic_link: bool,
    /// Placeholder for an in-progress create/rename not yet confirmed on disk.
    pub is_temporary: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl TreeNode {
    pub fn new(location: PathBuf, is_directory: bool) -> Self {
        let name = display_name(&location);
        Self {
            location,
            name,
            is_directory,
            is_symbolic_link: false,
            is_temporary: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn from_stat(stat: &Stat) -> Self {
        let mut node = Self::new(stat.location.clone(), stat.is_directory);
        node.is_symbolic_link = stat.is_symbolic_link;
        node
    }

    pub fn path_key(&self) -> PathKey {
        PathKey::new(&self.location, self.is_symbolic_link)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

fn display_name(location: &Path) -> CompactString {
    location
        .file_name()
        .map(|n| n.to_string_lossy().to_compact_string())
        .unwrap_or_else(|| location.to_string_lossy().to_compact_string())
}

/// Numeric-aware, locale-neutral name ordering: digit runs compare by value
/// (`file2` before `file10`), other characters compare case-insensitively,
/// ties break on the case-sensitive full name.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    natural_cmp(a, b).then_with(|| a.cmp(b))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ac = a.chars().peekable();
    let mut bc = b.chars().peekable();

    loop {
        match (ac.peek().copied(), bc.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let xr = take_digit_run(&mut ac);
                let yr = take_digit_run(&mut bc);
                let ord = cmp_digit_runs(&xr, &yr);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let xl = x.to_ascii_lowercase();
                let yl = y.to_ascii_lowercase();
                if xl != yl {
                    return xl.cmp(&yl);
                }
                ac.next();
                bc.next();
            }
        }
    }
}

fn take_digit_run(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn cmp_digit_runs(x: &str, y: &str) -> Ordering {
    let xs = x.trim_start_matches('0');
    let ys = y.trim_start_matches('0');
    xs.len()
        .cmp(&ys.len())
        .then_with(|| xs.cmp(ys))
        .then_with(|| x.len().cmp(&y.len()))
}

/// Arena of tree nodes. Roots are kept in insertion order; every child list
/// is re-sorted with [`compare_names`] after each mutation.
pub struct WorkTree {
    arena: SlotMap<NodeId, TreeNode>,
    roots: Vec<NodeId>,
}

impl WorkTree {
    pub fn new() -> Self {
        Self {
            arena: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    pub fn insert_root(&mut self, node: TreeNode) -> NodeId {
        let id = self.arena.insert(node);
        self.roots.push(id);
        id
    }

    pub fn insert_child(&mut self, parent: NodeId, mut node: TreeNode) -> NodeId {
        node.parent = Some(parent);
        let id = self.arena.insert(node);
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(id);
        }
        self.resort_children(parent);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn find_temporary_child(&self, parent: NodeId) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&id| self.arena.get(id).is_some_and(|n| n.is_temporary))
    }

    /// Removes `child` from `parent`'s child list without touching the arena.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.retain(|&id| id != child);
        }
    }

    pub fn detach_root(&mut self, id: NodeId) {
        self.roots.retain(|&root| root != id);
    }

    /// Removes `id` and its whole subtree from the arena. The node must
    /// already be detached from any parent child list. Returns the path keys
    /// of every removed node so the caller can purge status entries.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<PathKey> {
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children.iter().copied());
                removed.push(node.path_key());
            }
        }
        removed
    }

    /// Replaces `parent`'s child list; the list is sorted before being stored.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children = children;
        }
        self.resort_children(parent);
    }

    pub fn resort_children(&mut self, parent: NodeId) {
        let Some(mut kids) = self.arena.get(parent).map(|n| n.children.clone()) else {
            return;
        };
        kids.sort_by(|&a, &b| {
            let an = self.arena.get(a).map(|n| n.name.as_str()).unwrap_or("");
            let bn = self.arena.get(b).map(|n| n.name.as_str()).unwrap_or("");
            compare_names(an, bn)
        });
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children = kids;
        }
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.roots.clear();
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl Default for WorkTree {
    fn default() -> Self {
        Self::new()
    }
}
