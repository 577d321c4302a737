//! Data model: node arena, path keys, status table.

pub mod path_key;
pub mod status;
pub mod tree;

pub use path_key::PathKey;
pub use status::{StatusEntry, StatusTable};
pub use tree::{compare_names, NodeId, TreeNode, WorkTree};
