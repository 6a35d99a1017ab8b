//! # Label Linkbase Analyzer
//!
//! Resolves human-readable labels for schema elements out of a filing's
//! label linkbase(s), with an on-disk cache keyed by `SHA-256(file URL)` so
//! repeated resolutions against the same filing skip re-parsing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JpxError, JpxResult};
use crate::filing::FilingPaths;
use crate::linkbase::{LinkbaseTree, NodeKind};
use crate::xmlsrc::{cache_file_path, XmlSource};

pub const STANDARD_LABEL_ROLE: &str = "http://www.xbrl.org/2003/role/label";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LabelRecord {
    id: String,
    role: String,
    text: String,
}

/// A label linkbase file's records, indexed `(id, role) -> text` for O(1)
/// lookup rather than the original's linear scan.
#[derive(Default, Serialize, Deserialize)]
pub struct LabelIndex {
    by_id_role: HashMap<(String, String), String>,
}

impl LabelIndex {
    fn from_records(records: Vec<LabelRecord>) -> Self {
        let mut by_id_role = HashMap::new();
        for record in records {
            by_id_role.insert((record.id, record.role), record.text);
        }
        Self { by_id_role }
    }

    pub fn lookup(&self, id: &str, preferred_role: Option<&str>) -> Option<&str> {
        if let Some(role) = preferred_role {
            if let Some(text) = self.by_id_role.get(&(id.to_string(), role.to_string())) {
                return Some(text);
            }
        }
        self.by_id_role
            .get(&(id.to_string(), STANDARD_LABEL_ROLE.to_string()))
            .map(String::as_str)
    }
}

impl LinkbaseTree {
    /// Attach a label to every content node in `role_short_name`'s subtree,
    /// loading (and disk-caching) whichever label file covers each node's
    /// schema. Requires `enrich_schema` to have already run — label lookup
    /// needs nothing from it directly, but a node with no `usage` set is
    /// presumed not yet worth labelling.
    pub fn enrich_labels(
        &mut self,
        xml_src: &XmlSource,
        filing: &FilingPaths,
        role_short_name: &str,
    ) -> JpxResult<()> {
        let root = self
            .role_node_id(role_short_name)
            .ok_or_else(|| JpxError::RoleNotFound {
                role: role_short_name.to_string(),
            })?;

        let mut candidate_files = enumerate_label_files(xml_src, &filing.xsd)?;
        let filing_lab = filing.lab.to_string_lossy().to_string();
        if !candidate_files.contains(&filing_lab) {
            candidate_files.insert(0, filing_lab);
        }

        let cache_dir = filing.dir.join("labfile");
        let mut indexes: HashMap<String, LabelIndex> = HashMap::new();

        let node_ids: Vec<_> = self.walk(root).collect();
        for node_id in node_ids {
            if self.node(node_id).kind == NodeKind::DocumentName {
                continue;
            }
            let (Some(id), Some(xsd_uri)) = (self.node(node_id).id.clone(), self.node(node_id).xsd_uri().map(str::to_string)) else {
                continue;
            };
            let xsd_dir = match xsd_uri.rsplit_once('/') {
                Some((dir, _)) => dir.to_string(),
                None => String::new(),
            };

            let Some(file) = candidate_files.iter().find(|f| f.starts_with(&xsd_dir)).cloned() else {
                continue;
            };

            if !indexes.contains_key(&file) {
                let index = load_label_index(xml_src, &file, &cache_dir)?;
                indexes.insert(file.clone(), index);
            }
            let index = &indexes[&file];

            let preferred_role = self.node(node_id).preferred_label.clone();
            if let Some(text) = index.lookup(&id, preferred_role.as_deref()) {
                self.node_mut(node_id).label = Some(text.to_string());
            }
        }

        Ok(())
    }
}

fn load_label_index(xml_src: &XmlSource, label_path: &str, cache_dir: &Path) -> JpxResult<LabelIndex> {
    let cache_path = cache_file_path(cache_dir, "label_index", label_path);
    if cache_path.exists() {
        let bytes = std::fs::read_to_string(&cache_path)?;
        let records: Vec<LabelRecord> = serde_json::from_str(&bytes)?;
        return Ok(LabelIndex::from_records(records));
    }

    let text = xml_src.get(label_path)?;
    let records = parse_label_file(&text)?;

    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&cache_path, serde_json::to_string(&records)?)?;

    Ok(LabelIndex::from_records(records))
}

/// Join `loc` (element id) -> `labelArc` (`from`/`to`) -> `label` (role,
/// text) the way a label linkbase's three element kinds chain together.
fn parse_label_file(text: &str) -> JpxResult<Vec<LabelRecord>> {
    let doc = roxmltree::Document::parse(text)?;

    let mut loc_by_label: HashMap<&str, &str> = HashMap::new();
    for loc in doc.descendants().filter(|n| n.tag_name().name() == "loc") {
        if let (Some(label), Some(href)) = (loc.attribute("label"), loc.attribute("href")) {
            if let Some(id) = href.rsplit('#').next() {
                loc_by_label.insert(label, id);
            }
        }
    }

    let mut label_text_by_label: HashMap<&str, (&str, &str)> = HashMap::new();
    for label_elem in doc.descendants().filter(|n| n.tag_name().name() == "label") {
        if let (Some(label), Some(role)) = (label_elem.attribute("label"), label_elem.attribute("role")) {
            label_text_by_label.insert(label, (role, label_elem.text().unwrap_or("")));
        }
    }

    let mut records = Vec::new();
    for arc in doc.descendants().filter(|n| n.tag_name().name() == "labelArc") {
        let (Some(from), Some(to)) = (arc.attribute("from"), arc.attribute("to")) else {
            continue;
        };
        let (Some(&id), Some(&(role, text))) = (loc_by_label.get(from), label_text_by_label.get(to)) else {
            continue;
        };
        records.push(LabelRecord {
            id: id.to_string(),
            role: role.to_string(),
            text: text.to_string(),
        });
    }

    Ok(records)
}

/// Enumerate every label file a filing's schema advertises via
/// `<linkbaseRef>`: the filing's own label file plus any IFRS-ja shared
/// label file it references.
pub fn enumerate_label_files(xml_src: &XmlSource, xsd_path: &Path) -> JpxResult<Vec<String>> {
    let text = xml_src.get(&xsd_path.to_string_lossy())?;
    let doc = roxmltree::Document::parse(&text)?;

    let mut files: Vec<String> = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "linkbaseRef")
        .filter_map(|n| n.attribute("href"))
        .filter(|href| href.ends_with("_lab.xml") || href.ends_with("-lab.xml") || href.contains("lab_full_ifrs-ja"))
        .map(|href| resolve_relative(href, xsd_path))
        .collect();
    files.dedup();
    Ok(files)
}

fn resolve_relative(href: &str, base: &Path) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        base.parent()
            .map(|dir| dir.join(href))
            .unwrap_or_else(|| PathBuf::from(href))
            .to_string_lossy()
            .to_string()
    }
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LAB: &str = r#"<linkbase xmlns:xlink="http://www.w3.org/1999/xlink">
        <labelLink>
            <loc xlink:href="co.xsd#NetSales" xlink:label="loc_net_sales"/>
            <label xlink:label="label_net_sales_std" xlink:role="http://www.xbrl.org/2003/role/label">Net sales</label>
            <label xlink:label="label_net_sales_total" xlink:role="http://www.xbrl.org/2003/role/totalLabel">Total net sales</label>
            <labelArc xlink:from="loc_net_sales" xlink:to="label_net_sales_std"/>
            <labelArc xlink:from="loc_net_sales" xlink:to="label_net_sales_total"/>
        </labelLink>
    </linkbase>"#;

    #[test]
    fn test_parse_label_file_joins_loc_arc_label() {
        let records = parse_label_file(SAMPLE_LAB).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.id == "NetSales" && r.text == "Net sales"));
    }

    #[test]
    fn test_label_index_falls_back_to_standard_role() {
        let records = parse_label_file(SAMPLE_LAB).unwrap();
        let index = LabelIndex::from_records(records);

        assert_eq!(
            index.lookup("NetSales", Some("http://www.xbrl.org/2003/role/totalLabel")),
            Some("Total net sales")
        );
        assert_eq!(index.lookup("NetSales", Some("http://www.xbrl.org/2003/role/missingLabel")), Some("Net sales"));
        assert_eq!(index.lookup("Unknown", None), None);
    }
}
