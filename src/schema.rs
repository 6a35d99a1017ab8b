//! # Schema Enricher
//!
//! Classifies every content node in a role subtree from its XSD element
//! declaration: what kind of thing it is (a heading, an axis, a reportable
//! number, ...) and, for reportable leaves, its period type.

use crate::error::{JpxError, JpxResult};
use crate::instance::PeriodType;
use crate::linkbase::{LinkbaseTree, NodeId, NodeKind, Usage};
use crate::xmlsrc::XmlSource;

struct ElementDecl {
    name: String,
    ty: String,
    substitution_group: String,
    period_type: Option<PeriodType>,
    is_abstract: bool,
}

impl LinkbaseTree {
    /// Classify every content node reachable from `role_short_name`'s
    /// document-name node, fetching each node's XSD file via `xml_src` as
    /// needed (one fetch per distinct `xsd_uri`, not per node).
    pub fn enrich_schema(&mut self, xml_src: &XmlSource, role_short_name: &str) -> JpxResult<()> {
        let root = self
            .role_node_id(role_short_name)
            .ok_or_else(|| JpxError::RoleNotFound {
                role: role_short_name.to_string(),
            })?;

        let node_ids: Vec<NodeId> = self.walk(root).collect();

        for node_id in node_ids {
            if self.node(node_id).kind == NodeKind::DocumentName {
                continue;
            }

            let Some(xsd_uri) = self.node(node_id).xsd_uri().map(str::to_string) else {
                continue;
            };
            let Some(id) = self.node(node_id).id.clone() else {
                continue;
            };

            let text = xml_src.get(&xsd_uri)?;
            let doc = roxmltree::Document::parse(&text)?;

            let decl = find_element_decl(&doc, &id).ok_or_else(|| JpxError::ElementNotDeclared {
                id: id.clone(),
                xsd_uri: xsd_uri.clone(),
            })?;

            let usage = classify(&decl).ok_or_else(|| JpxError::UsageClassificationFailed {
                id: id.clone(),
                name: decl.name.clone(),
                ty: decl.ty.clone(),
            })?;

            let node = self.node_mut(node_id);
            node.usage = Some(usage);
            node.name = Some(decl.name);
            node.period_type = decl.period_type;
        }

        Ok(())
    }
}

fn find_element_decl(doc: &roxmltree::Document, id: &str) -> Option<ElementDecl> {
    let elem = doc
        .descendants()
        .find(|n| n.tag_name().name() == "element" && n.attribute("id") == Some(id))?;

    let name = elem.attribute("name")?.to_string();
    let ty = local_name(elem.attribute("type").unwrap_or(""));
    let substitution_group = local_name(elem.attribute("substitutionGroup").unwrap_or(""));
    let is_abstract = elem.attribute("abstract") == Some("true");
    let period_type = match elem.attribute("periodType") {
        Some("instant") => Some(PeriodType::Instant),
        Some("duration") => Some(PeriodType::Duration),
        _ => None,
    };

    Some(ElementDecl {
        name,
        ty,
        substitution_group,
        period_type,
        is_abstract,
    })
}

/// Strip a `prefix:LocalName` QName down to `LocalName`.
fn local_name(qname: &str) -> String {
    qname.rsplit(':').next().unwrap_or(qname).to_string()
}

const NUMBER_TYPES: &[&str] = &[
    "monetaryItemType",
    "perShareItemType",
    "sharesItemType",
    "percentItemType",
    "percentage1ItemType",
    "percentage2ItemType",
    "decimalItemType",
    "nonNegativeIntegerItemType",
];

fn classify(decl: &ElementDecl) -> Option<Usage> {
    if decl.name.contains("Heading")
        && decl.ty == "stringItemType"
        && decl.substitution_group == "identifierItem"
        && decl.is_abstract
    {
        return Some(Usage::Heading);
    }
    if decl.name.contains("Abstract") && decl.ty == "stringItemType" && decl.substitution_group == "item" && decl.is_abstract {
        return Some(Usage::Title);
    }
    if decl.name.contains("Table") && decl.ty == "stringItemType" && decl.substitution_group == "hypercubeItem" && decl.is_abstract {
        return Some(Usage::Table);
    }
    if decl.name.contains("Axis") && decl.ty == "stringItemType" && decl.substitution_group == "dimensionItem" && decl.is_abstract {
        return Some(Usage::Axis);
    }
    if decl.name.contains("Member") && decl.ty == "domainItemType" && decl.substitution_group == "item" && decl.is_abstract {
        return Some(Usage::Member);
    }
    if decl.name.contains("LineItems") && decl.ty == "stringItemType" && decl.substitution_group == "item" && decl.is_abstract {
        return Some(Usage::LineItems);
    }
    if !decl.is_abstract && (NUMBER_TYPES.contains(&decl.ty.as_str()) || decl.ty.starts_with("numberOf")) {
        return Some(Usage::Number);
    }
    if !decl.is_abstract && decl.ty == "dateItemType" {
        return Some(Usage::Date);
    }
    if !decl.is_abstract && decl.ty == "booleanItemType" {
        return Some(Usage::Bool);
    }
    if !decl.is_abstract && decl.ty == "anyURIItemType" {
        return Some(Usage::Uri);
    }
    if !decl.is_abstract && decl.ty == "textBlockItemType" {
        return Some(Usage::TextBlock);
    }
    if !decl.is_abstract && decl.ty == "stringItemType" && decl.substitution_group == "item" {
        return Some(Usage::Text);
    }
    if decl.ty == "stringItemType" && decl.substitution_group == "item" && decl.is_abstract {
        return Some(Usage::Title);
    }
    None
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, ty: &str, sg: &str, is_abstract: bool) -> ElementDecl {
        ElementDecl {
            name: name.to_string(),
            ty: ty.to_string(),
            substitution_group: sg.to_string(),
            period_type: None,
            is_abstract,
        }
    }

    #[test]
    fn test_classify_heading() {
        let usage = classify(&decl("BalanceSheetHeading", "stringItemType", "identifierItem", true));
        assert_eq!(usage, Some(Usage::Heading));
    }

    #[test]
    fn test_classify_number_leaf() {
        let usage = classify(&decl("NetSales", "monetaryItemType", "item", false));
        assert_eq!(usage, Some(Usage::Number));
    }

    #[test]
    fn test_classify_number_of_prefix() {
        let usage = classify(&decl("NumberOfEmployees", "numberOfPersonsItemType", "item", false));
        assert_eq!(usage, Some(Usage::Number));
    }

    #[test]
    fn test_classify_axis_and_member() {
        assert_eq!(
            classify(&decl("ConsolidatedOrNonConsolidatedAxis", "stringItemType", "dimensionItem", true)),
            Some(Usage::Axis)
        );
        assert_eq!(
            classify(&decl("ConsolidatedMember", "domainItemType", "item", true)),
            Some(Usage::Member)
        );
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(classify(&decl("Mystery", "weirdItemType", "item", false)), None);
    }

    #[test]
    fn test_local_name_strips_prefix() {
        assert_eq!(local_name("jppfs_cor:NetSales"), "NetSales");
        assert_eq!(local_name("NoPrefix"), "NoPrefix");
    }
}
