//! Arena node data.
//!
//! Nodes live in a `Vec<NodeData>` owned by [`super::tree::LinkbaseTree`] and
//! are addressed by [`NodeId`], a plain index. This sidesteps the
//! parent-pointing-to-child-pointing-to-parent cycle a `Rc<RefCell<_>>` tree
//! would need `Weak` to break, at the cost of routing every mutation through
//! the owning tree.

use crate::instance::{PeriodType, XbrlData};

/// A handle into a [`super::tree::LinkbaseTree`]'s arena. Only meaningful
/// relative to the tree that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The single arena slot 0, parent of every role's document-name node.
    Root,
    /// One per `xlink:role`; the tree a [`super::tree::TreeWalk`] rooted here
    /// walks is that role's reconstructed report.
    DocumentName,
    /// An interned arc endpoint: a line item, axis, member, or heading.
    Content,
}

/// The classification [`crate::schema`] assigns a content node from its XSD
/// declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Heading,
    Title,
    Table,
    Axis,
    Member,
    LineItems,
    Number,
    Date,
    Bool,
    Uri,
    TextBlock,
    Text,
}

impl Usage {
    /// Usages that may carry a reported fact at a leaf.
    pub fn is_reportable(self) -> bool {
        matches!(self, Usage::Number | Usage::Date | Usage::TextBlock | Usage::Text | Usage::Bool)
    }
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// The `xlink:label` (or role URI, for a document-name node) this node
    /// was interned under. Linkbase-local, not the taxonomy element id.
    pub label_in_linkbase: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Sibling ordering from the arc's `order` attribute.
    pub order: Option<f64>,
    pub href: Option<String>,
    /// The taxonomy element id, taken from the fragment of `href`.
    pub id: Option<String>,
    pub preferred_label: Option<String>,
    /// Calculation-linkbase arc weight (+1/-1, occasionally fractional).
    pub weight: Option<f64>,
    /// Set when this node is the default member of a dimension axis, per a
    /// `dimension-default` arc in the definition linkbase.
    pub dimension_default: bool,
    pub usage: Option<Usage>,
    /// Element local name (e.g. `NetSales`), filled in by schema enrichment.
    pub name: Option<String>,
    pub period_type: Option<PeriodType>,
    /// Human-readable label, filled in by label enrichment.
    pub label: Option<String>,
    /// The resolved fact attached by [`crate::resolver`], if any.
    pub fact: Option<XbrlData>,
}

impl NodeData {
    pub fn new(kind: NodeKind, label_in_linkbase: impl Into<String>) -> Self {
        Self {
            kind,
            label_in_linkbase: label_in_linkbase.into(),
            parent: None,
            children: Vec::new(),
            order: None,
            href: None,
            id: None,
            preferred_label: None,
            weight: None,
            dimension_default: false,
            usage: None,
            name: None,
            period_type: None,
            label: None,
            fact: None,
        }
    }

    /// Record an `xlink:href`, deriving `id` from its fragment the way an
    /// href like `jppfs_cor.xsd#jppfs_cor_NetSales` carries its element id
    /// after the `#`.
    pub fn set_href(&mut self, href: impl Into<String>) {
        let href = href.into();
        self.id = href.rsplit('#').next().map(|s| s.to_string());
        self.href = Some(href);
    }

    /// The schema file this node's `href` points into, i.e. everything
    /// before the `#`.
    pub fn xsd_uri(&self) -> Option<&str> {
        self.href.as_deref().and_then(|h| h.split('#').next())
    }
}

impl std::fmt::Display for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id.as_deref().unwrap_or(&self.label_in_linkbase))?;
        if let Some(usage) = self.usage {
            write!(f, "({usage:?})")?;
        }
        if let Some(label) = &self.label {
            write!(f, "[{label}]")?;
        }
        if let Some(w) = self.weight {
            write!(f, "[weight={w}]")?;
        }
        if self.dimension_default {
            write!(f, "[default]")?;
        }
        if let Some(fact) = &self.fact {
            write!(f, "={fact}")?;
        }
        Ok(())
    }
}
