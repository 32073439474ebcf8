//! Installation Hash Tree
//!
//! Represents an installation directory as a nested mapping from path segment
//! to either a file's content hash or a further mapping for a subdirectory.

pub mod builder;
pub mod hasher;
pub mod node;
pub mod path;
pub mod walker;

pub use builder::TreeBuilder;
pub use node::{HashNode, HashTree};
pub use walker::ExclusionSet;
