//! # Linkbase Tree Reconstruction
//!
//! Parses a presentation, definition, or calculation linkbase's flat XLink
//! arc graph into an ordered tree per `xlink:role`, repairing whatever
//! orphaned subgraphs the arcs alone don't connect.
//!
//! Nodes live in an arena ([`NodeId`]-addressed) rather than behind
//! `Rc<RefCell<_>>`, since a tree node needs to reach both its parent and
//! its children and an `Rc` cycle would need `Weak` everywhere to avoid
//! leaking. See [`LinkbaseTree`] and [`TreeWalk`].

mod build;
mod node;
mod tree;

pub use node::{NodeData, NodeId, NodeKind, Usage};
pub use tree::{LinkbaseKind, LinkbaseTree, TreeWalk};
