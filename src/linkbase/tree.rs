//! The arena and the explicit pre-order walk over it.

use std::collections::HashMap;

use crate::error::{JpxError, JpxResult};

use super::node::{NodeData, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkbaseKind {
    Presentation,
    Definition,
    Calculation,
}

impl LinkbaseKind {
    pub(super) fn link_tag(self) -> &'static str {
        match self {
            LinkbaseKind::Presentation => "presentationLink",
            LinkbaseKind::Definition => "definitionLink",
            LinkbaseKind::Calculation => "calculationLink",
        }
    }

    pub(super) fn arc_tag(self) -> &'static str {
        match self {
            LinkbaseKind::Presentation => "presentationArc",
            LinkbaseKind::Definition => "definitionArc",
            LinkbaseKind::Calculation => "calculationArc",
        }
    }
}

/// An ordered forest of [`NodeData`] reconstructed from one linkbase file,
/// one subtree per `xlink:role`.
pub struct LinkbaseTree {
    pub(super) arena: Vec<NodeData>,
    root: NodeId,
    role_list: Vec<String>,
    role_node: HashMap<String, NodeId>,
    kind: LinkbaseKind,
}

impl LinkbaseTree {
    pub(super) fn new(kind: LinkbaseKind) -> Self {
        let mut root_data = NodeData::new(NodeKind::Root, "document_root");
        root_data.href = Some("root".to_string());
        root_data.id = Some("root".to_string());
        Self {
            arena: vec![root_data],
            root: NodeId(0),
            role_list: Vec::new(),
            role_node: HashMap::new(),
            kind,
        }
    }

    pub fn kind(&self) -> LinkbaseKind {
        self.kind
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn role_list(&self) -> &[String] {
        &self.role_list
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.arena[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.arena[id.0]
    }

    pub(super) fn alloc(&mut self, data: NodeData) -> NodeId {
        self.arena.push(data);
        NodeId(self.arena.len() - 1)
    }

    pub(super) fn attach_child(&mut self, parent: NodeId, child: NodeId, order: f64) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(child).order = Some(order);
        self.node_mut(parent).children.push(child);
    }

    pub(super) fn register_role(&mut self, role_short_name: String, doc_name_id: NodeId) {
        self.role_node.insert(role_short_name.clone(), doc_name_id);
        self.role_list.push(role_short_name);
    }

    pub fn role_node_id(&self, role_short_name: &str) -> Option<NodeId> {
        self.role_node.get(role_short_name).copied()
    }

    /// Find the first node (pre-order from the root) whose element id
    /// matches `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.walk(self.root).find(|&n| self.node(n).id.as_deref() == Some(id))
    }

    /// A fresh pre-order walk rooted at `root`. Re-arming means calling this
    /// again; the walk itself is a plain value, not hidden tree state.
    pub fn walk(&self, root: NodeId) -> TreeWalk<'_> {
        TreeWalk::new(self, root)
    }

    pub fn walk_role(&self, role_short_name: &str) -> JpxResult<TreeWalk<'_>> {
        let root = self.role_node_id(role_short_name).ok_or_else(|| JpxError::RoleNotFound {
            role: role_short_name.to_string(),
        })?;
        Ok(self.walk(root))
    }

    fn sorted_children(&self, node: NodeId) -> Vec<NodeId> {
        let mut children = self.node(node).children.clone();
        children.sort_by(|a, b| {
            let oa = self.node(*a).order.unwrap_or(0.0);
            let ob = self.node(*b).order.unwrap_or(0.0);
            oa.partial_cmp(&ob).unwrap_or(std::cmp::Ordering::Equal)
        });
        children
    }
}

struct WalkFrame {
    node: NodeId,
    children: Vec<NodeId>,
    emitted_self: bool,
    next_child: usize,
}

/// A pre-order iterator over a [`LinkbaseTree`] subtree, siblings ordered by
/// their arc `order` attribute. Holds its own stack of frames rather than
/// mutating anything on the tree, so several walks can be in flight (or
/// re-started) over the same tree at once.
pub struct TreeWalk<'a> {
    tree: &'a LinkbaseTree,
    stack: Vec<WalkFrame>,
}

impl<'a> TreeWalk<'a> {
    fn new(tree: &'a LinkbaseTree, root: NodeId) -> Self {
        Self {
            tree,
            stack: vec![WalkFrame {
                node: root,
                children: Vec::new(),
                emitted_self: false,
                next_child: 0,
            }],
        }
    }
}

impl<'a> Iterator for TreeWalk<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let top = self.stack.last_mut()?;
            if !top.emitted_self {
                top.emitted_self = true;
                let node = top.node;
                top.children = self.tree.sorted_children(node);
                return Some(node);
            }
            if top.next_child >= top.children.len() {
                self.stack.pop();
                continue;
            }
            let child = top.children[top.next_child];
            top.next_child += 1;
            self.stack.push(WalkFrame {
                node: child,
                children: Vec::new(),
                emitted_self: false,
                next_child: 0,
            });
        }
    }
}
