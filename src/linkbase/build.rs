//! Linkbase parsing and orphan-forest repair.
//!
//! XLink arcs describe a graph, not a tree: a `from`/`to` pair only promises
//! that `to` has *a* parent among the arcs present, and in practice a role's
//! arcs reconstruct several disconnected subtrees plus a handful of nodes
//! that never appear as an arc's `to` at all. This module interns every arc
//! endpoint once per role, links the arcs it can, and then repairs whatever
//! forest is left into the single tree a role's document-name node roots.

use indexmap::IndexMap;

use crate::error::{JpxError, JpxResult};
use crate::filing::FilingPaths;
use crate::xmlsrc::XmlSource;

use super::node::{NodeData, NodeId, NodeKind};
use super::tree::{LinkbaseKind, LinkbaseTree};

/// XBRL dimensions arcrole for "this member is the default of this axis".
/// Such an arc is not a parent-child edge; it only flags its `to` node.
const DIMENSION_DEFAULT_ARCROLE: &str = "http://xbrl.org/int/dim/arcrole/dimension-default";

impl LinkbaseTree {
    /// Parse `kind`'s linkbase file for `filing` into a tree with one
    /// subtree per `xlink:role`, repairing orphaned arc endpoints along the
    /// way.
    pub fn load(xml_src: &XmlSource, filing: &FilingPaths, kind: LinkbaseKind) -> JpxResult<Self> {
        let path = filing.linkbase_path(kind).to_string_lossy().to_string();
        let text = xml_src.get(&path)?;
        let doc = roxmltree::Document::parse(&text)?;

        let mut tree = LinkbaseTree::new(kind);

        let link_tag = kind.link_tag();
        let arc_tag = kind.arc_tag();

        let roleref_elems: Vec<_> = doc.descendants().filter(|n| n.tag_name().name() == "roleRef").collect();
        let loc_elems: Vec<_> = doc.descendants().filter(|n| n.tag_name().name() == "loc").collect();

        let link_elems: Vec<_> = doc.descendants().filter(|n| n.tag_name().name() == link_tag).collect();
        if link_elems.is_empty() {
            return Err(JpxError::LinkElementMissing {
                role: format!("<any {link_tag}>"),
            });
        }

        for (document_number, link_elem) in link_elems.into_iter().enumerate() {
            let role_uri = link_elem
                .attribute("role")
                .ok_or_else(|| JpxError::Other(format!("{link_tag} is missing xlink:role")))?;

            let mut doc_name_node = NodeData::new(NodeKind::DocumentName, role_uri);
            if let Some(rr) = roleref_elems.iter().find(|n| n.attribute("roleURI") == Some(role_uri)) {
                if let Some(href) = rr.attribute("href") {
                    doc_name_node.set_href(resolve_href(href, &filing.dir));
                }
            }
            let doc_name_id = tree.alloc(doc_name_node);
            tree.attach_child(tree.root(), doc_name_id, (document_number + 1) as f64);

            let role_short_name = role_uri.rsplit('/').next().unwrap_or(role_uri).to_string();
            tree.register_role(role_short_name.clone(), doc_name_id);

            let mut tree_dict: IndexMap<String, NodeId> = IndexMap::new();

            for arc in link_elem.children().filter(|n| n.is_element() && n.tag_name().name() == arc_tag) {
                let from_label = arc
                    .attribute("from")
                    .ok_or_else(|| JpxError::Other(format!("{arc_tag} is missing xlink:from")))?;
                let to_label = arc
                    .attribute("to")
                    .ok_or_else(|| JpxError::Other(format!("{arc_tag} is missing xlink:to")))?;
                let order: f64 = arc.attribute("order").and_then(|s| s.parse().ok()).unwrap_or(0.0);
                let weight: Option<f64> = arc.attribute("weight").and_then(|s| s.parse().ok());
                let preferred_label = arc.attribute("preferredLabel").map(|s| s.to_string());
                let is_dimension_default = arc.attribute("arcrole") == Some(DIMENSION_DEFAULT_ARCROLE);

                let parent_id = intern(&mut tree, &mut tree_dict, from_label);
                let child_id = intern(&mut tree, &mut tree_dict, to_label);

                if is_dimension_default {
                    tree.node_mut(child_id).dimension_default = true;
                } else {
                    tree.attach_child(parent_id, child_id, order);
                }

                if let Some(pl) = preferred_label {
                    tree.node_mut(child_id).preferred_label = Some(pl);
                }
                if let Some(w) = weight {
                    tree.node_mut(child_id).weight = Some(w);
                }
            }

            if tree_dict.is_empty() {
                continue;
            }

            resolve_hrefs(&mut tree, &tree_dict, &loc_elems, &filing.dir);
            harvest_dimension_defaults(&mut tree, &tree_dict);
            repair_orphans(&mut tree, &tree_dict, doc_name_id, &role_short_name)?;
        }

        if kind == LinkbaseKind::Presentation {
            let root = tree.root();
            propagate_preferred_label(&mut tree, root, None);
        }

        Ok(tree)
    }

    /// Copy the `dimension-default` flag from a definition tree's
    /// `role_short_name` subtree onto this tree's matching nodes (by
    /// element id). Presentation and definition linkbases intern the same
    /// taxonomy elements independently, so the flag harvested while parsing
    /// the definition linkbase never reaches the presentation tree on its
    /// own.
    pub fn set_dimension_default(&mut self, def_tree: &LinkbaseTree, role_short_name: &str) -> JpxResult<()> {
        let def_root = def_tree
            .role_node_id(role_short_name)
            .ok_or_else(|| JpxError::RoleNotFound {
                role: role_short_name.to_string(),
            })?;
        let default_ids: std::collections::HashSet<String> = def_tree
            .walk(def_root)
            .filter(|&n| def_tree.node(n).dimension_default)
            .filter_map(|n| def_tree.node(n).id.clone())
            .collect();

        let root = self
            .role_node_id(role_short_name)
            .ok_or_else(|| JpxError::RoleNotFound {
                role: role_short_name.to_string(),
            })?;
        let node_ids: Vec<NodeId> = self.walk(root).collect();
        for node_id in node_ids {
            if let Some(id) = self.node(node_id).id.clone() {
                if default_ids.contains(&id) {
                    self.node_mut(node_id).dimension_default = true;
                }
            }
        }

        Ok(())
    }
}

fn intern(tree: &mut LinkbaseTree, tree_dict: &mut IndexMap<String, NodeId>, label: &str) -> NodeId {
    if let Some(&id) = tree_dict.get(label) {
        return id;
    }
    let id = tree.alloc(NodeData::new(NodeKind::Content, label));
    tree_dict.insert(label.to_string(), id);
    id
}

fn resolve_href(href: &str, filing_dir: &std::path::Path) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        filing_dir.join(href).to_string_lossy().to_string()
    }
}

fn resolve_hrefs(
    tree: &mut LinkbaseTree,
    tree_dict: &IndexMap<String, NodeId>,
    loc_elems: &[roxmltree::Node],
    filing_dir: &std::path::Path,
) {
    for (label, &node_id) in tree_dict.iter() {
        if let Some(loc) = loc_elems.iter().find(|n| n.attribute("label") == Some(label.as_str())) {
            if let Some(href) = loc.attribute("href") {
                tree.node_mut(node_id).set_href(resolve_href(href, filing_dir));
            }
        }
    }
}

/// A `dimension-default` arc only flags its immediate `to` node, but the
/// same taxonomy element can be interned under several linkbase-local
/// labels within one role (one alias reached via the default arc, another
/// reached only via a presentation-style arc elsewhere). Propagate the flag
/// to every interned node sharing that element id, then drop the
/// default-only placeholders — they carry no position in the report, only
/// the flag.
fn harvest_dimension_defaults(tree: &mut LinkbaseTree, tree_dict: &IndexMap<String, NodeId>) {
    let mut default_ids: std::collections::HashSet<String> = std::collections::HashSet::new();
    for &node_id in tree_dict.values() {
        let node = tree.node(node_id);
        if node.dimension_default {
            if let Some(id) = &node.id {
                default_ids.insert(id.clone());
            }
        }
    }

    for &node_id in tree_dict.values() {
        let node = tree.node(node_id);
        if let Some(id) = &node.id {
            if default_ids.contains(id) {
                tree.node_mut(node_id).dimension_default = true;
            }
        }
    }
}

/// Find the first node (in the raw, insertion-order children arrays left by
/// arc processing — not the sibling `order` the walk sorts by) whose
/// element id is `target_id`. Checks `node`'s own children before
/// descending into any of them, matching the original resolver's search
/// order and so its choice of which occurrence "wins" when an id appears
/// more than once in a subtree.
fn search_id_in_subtree(tree: &LinkbaseTree, node: NodeId, target_id: &str) -> Option<(NodeId, usize)> {
    let children = tree.node(node).children.clone();
    for (index, &child) in children.iter().enumerate() {
        if tree.node(child).id.as_deref() == Some(target_id) {
            return Some((node, index));
        }
    }
    for &child in &children {
        if let Some(found) = search_id_in_subtree(tree, child, target_id) {
            return Some(found);
        }
    }
    None
}

/// Graft every parentless node left after arc processing onto `doc_name_id`.
///
/// A no-parent node is a *heading* if its id does not appear anywhere inside
/// another no-parent node's own subtree; headings become the role's
/// top-level sections, attached in encounter order. Every other orphan is
/// presumed to belong somewhere inside one of those headings' subtrees under
/// a placeholder sharing its id (the taxonomy element was declared twice:
/// once as a bare reference, once in its real position); we locate the first
/// such placeholder and swap the orphan in over it, carrying across the
/// placeholder's order, parent slot, dimension-default flag, and preferred
/// label.
fn repair_orphans(
    tree: &mut LinkbaseTree,
    tree_dict: &IndexMap<String, NodeId>,
    doc_name_id: NodeId,
    role_short_name: &str,
) -> JpxResult<()> {
    let mut no_parent: Vec<NodeId> = tree_dict
        .values()
        .copied()
        .filter(|&id| tree.node(id).parent.is_none())
        .collect();

    let mut headings = Vec::new();
    for &candidate in &no_parent {
        let candidate_id = tree.node(candidate).id.clone();
        let is_heading = match &candidate_id {
            None => true,
            Some(target_id) => !no_parent
                .iter()
                .any(|&other| other != candidate && search_id_in_subtree(tree, other, target_id).is_some()),
        };
        if is_heading {
            headings.push(candidate);
        }
    }

    if headings.is_empty() {
        return Err(JpxError::HeadingNodeMissing {
            role: role_short_name.to_string(),
        });
    }

    let mut order = 0.0;
    for heading in headings {
        order += 1.0;
        tree.attach_child(doc_name_id, heading, order);
        no_parent.retain(|&n| n != heading);

        loop {
            let mut placement = None;
            for &orphan in &no_parent {
                if let Some(target_id) = tree.node(orphan).id.clone() {
                    if let Some((placeholder_parent, index)) = search_id_in_subtree(tree, heading, &target_id) {
                        placement = Some((placeholder_parent, index, orphan));
                        break;
                    }
                }
            }
            let Some((placeholder_parent, index, orphan)) = placement else {
                break;
            };

            let placeholder_id = tree.node(placeholder_parent).children[index];
            let placeholder = tree.node(placeholder_id).clone();

            {
                let orphan_data = tree.node_mut(orphan);
                orphan_data.order = placeholder.order;
                orphan_data.dimension_default = placeholder.dimension_default;
                orphan_data.parent = Some(placeholder_parent);
                orphan_data.preferred_label = placeholder.preferred_label;
            }
            tree.node_mut(placeholder_parent).children[index] = orphan;

            no_parent.retain(|&n| n != orphan);
        }
    }

    if !no_parent.is_empty() {
        return Err(JpxError::OrphanNodesRemain {
            role: role_short_name.to_string(),
            remaining: no_parent.len(),
        });
    }

    Ok(())
}

/// Presentation preferred-label inheritance: a node with no explicit
/// `preferredLabel` of its own adopts the nearest ancestor's. Walks raw
/// child order, not sibling `order` — inheritance doesn't depend on display
/// position.
fn propagate_preferred_label(tree: &mut LinkbaseTree, node: NodeId, inherited: Option<String>) {
    let own = tree.node(node).preferred_label.clone();
    let effective = own.or(inherited);
    if tree.node(node).preferred_label.is_none() {
        tree.node_mut(node).preferred_label = effective.clone();
    }

    let children = tree.node(node).children.clone();
    for child in children {
        propagate_preferred_label(tree, child, effective.clone());
    }
}
