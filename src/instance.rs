//! # Instance Analyzer
//!
//! Extracts `<xbrli:context>` elements and `ix:nonFraction`/`ix:nonNumeric`
//! facts out of an inline-XBRL instance document, and renders each fact's
//! raw inline markup (scale, sign, decimals, format) into the value the
//! filer actually reported.
//!
//! Inline-XBRL documents are XHTML with embedded namespaced elements
//! (`ix:nonFraction`, `ix:nonNumeric`, `xbrli:context`, ...). `roxmltree` is
//! a strict XML parser, not an HTML one, but JPX/TDnet inline documents are
//! well-formed XHTML, so they parse cleanly; elements and attributes are
//! then located by local tag name exactly as the rest of this crate locates
//! linkbase elements.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{JpxError, JpxResult};
use crate::xmlsrc::XmlSource;

/// Whether a context's period is a point in time or a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodType {
    Instant,
    Duration,
}

/// One `<xbrli:context>` element: its scenario (axis, member) pairs and an
/// inferred period type.
#[derive(Debug, Clone)]
pub struct Context {
    pub id: String,
    pub period_type: PeriodType,
    /// (dimension axis id, member id) pairs found in the context's scenario.
    pub scenario: Vec<(String, String)>,
}

impl Context {
    /// True if every axis the scenario mentions is one of `axis_ids` — an
    /// empty scenario always matches (it's the convention for "every axis
    /// at its default"), but a scenario axis absent from `axis_ids` rules
    /// the context out.
    pub fn matches_axis_set(&self, axis_ids: &[&str]) -> bool {
        if axis_ids.is_empty() {
            return self.scenario.is_empty();
        }
        self.scenario.iter().all(|(axis, _)| axis_ids.contains(&axis.as_str()))
    }

    /// True if every `(axis, member)` pair requested is present in the
    /// scenario. An empty request matches any context with an empty
    /// scenario.
    pub fn matches_members(&self, members: &[(&str, &str)]) -> bool {
        members.iter().all(|(axis, member)| {
            self.scenario
                .iter()
                .any(|(a, m)| a == axis && m == member)
        })
    }

    pub fn matches_period_type(&self, period_type: PeriodType) -> bool {
        self.period_type == period_type
    }

    /// True if the context id starts with `prefix` — the convention filers
    /// use to tag a context with a reporting-period token
    /// (`CurrentYearInstant`, `Prior1YearDuration`, ...).
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.id.starts_with(prefix)
    }
}

/// A single inline-XBRL fact: the tagged text plus enough of its rendering
/// attributes to recover the value the filer intended.
#[derive(Debug, Clone)]
pub struct InlineXbrlValue {
    pub context_ref: String,
    pub name: String,
    pub raw_text: String,
    pub scale: i32,
    /// `ix:nonFraction`'s `decimals` attribute: the number of fractional
    /// digits accuracy the filer reported to, if present.
    pub decimals: Option<i32>,
    pub sign_negative: bool,
    pub format: Option<String>,
    /// `escape="true"`: `raw_text` is itself markup, not plain text.
    pub escape: bool,
    pub is_numeric: bool,
}

const BOOLEAN_TRUE_FORMAT: &str = "ixt:booleantrue";
const BOOLEAN_FALSE_FORMAT: &str = "ixt:booleanfalse";

impl InlineXbrlValue {
    /// Render the reported value the way the filer intended.
    ///
    /// Non-numeric: `format` of `ixt:booleantrue`/`ixt:booleanfalse` renders
    /// `"True"`/`"False"`; everything else passes `raw_text` through
    /// (already de-escaped if `escape="true"`).
    ///
    /// Numeric: strip digit grouping commas, apply `10^scale`, apply the
    /// sign flag, then format by `decimals` — present and `<= 0` renders as
    /// an integer, otherwise with exactly that many fractional digits; with
    /// no `decimals` at all, fall back to the shortest representation.
    pub fn value_str(&self) -> String {
        if !self.is_numeric {
            return match self.format.as_deref() {
                Some(BOOLEAN_TRUE_FORMAT) => "True".to_string(),
                Some(BOOLEAN_FALSE_FORMAT) => "False".to_string(),
                _ => self.raw_text.trim().to_string(),
            };
        }

        let cleaned: String = self.raw_text.chars().filter(|c| *c != ',').collect();
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            return String::new();
        }

        let parsed: f64 = match cleaned.parse() {
            Ok(v) => v,
            Err(_) => return cleaned.to_string(),
        };

        let mut value = parsed * 10f64.powi(self.scale);
        if self.sign_negative {
            value = -value;
        }

        match self.decimals {
            Some(d) if d <= 0 => format!("{value:.0}"),
            Some(d) => format!("{value:.*}", d as usize),
            None if value.fract() == 0.0 => format!("{value:.0}"),
            None => format!("{value}"),
        }
    }
}

impl std::fmt::Display for InlineXbrlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value_str())
    }
}

/// One resolved `(context, value)` pair, the unit this crate ultimately
/// attaches to a tree leaf.
#[derive(Debug, Clone)]
pub struct XbrlData {
    pub context: Context,
    pub value: InlineXbrlValue,
}

impl std::fmt::Display for XbrlData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.value.value_str(), self.context.id)
    }
}

/// Parsed contexts and facts from one or more inline-XBRL instance
/// documents belonging to a single filing.
pub struct InstanceAnalyzer {
    contexts: HashMap<String, Context>,
    facts: Vec<XbrlData>,
}

impl InstanceAnalyzer {
    /// Parse every context and fact out of `documents`, keyed by whatever
    /// path/URL `xml_src` can resolve.
    pub fn load(xml_src: &XmlSource, documents: &[String]) -> JpxResult<Self> {
        let mut contexts = HashMap::new();
        let mut facts = Vec::new();

        for doc_location in documents {
            let text = xml_src.get(doc_location)?;
            let doc = roxmltree::Document::parse(&text)?;

            for node in doc.descendants().filter(|n| n.tag_name().name() == "context") {
                let Some(id) = node.attribute("id") else {
                    continue;
                };
                let context = parse_context(id, node)?;
                contexts.insert(context.id.clone(), context);
            }

            for node in doc.descendants().filter(|n| {
                let name = n.tag_name().name();
                name == "nonFraction" || name == "nonNumeric"
            }) {
                let is_numeric = node.tag_name().name() == "nonFraction";
                if let Some(value) = parse_inline_value(node, is_numeric) {
                    if let Some(context) = contexts.get(&value.context_ref) {
                        facts.push(XbrlData {
                            context: context.clone(),
                            value,
                        });
                    }
                }
            }
        }

        Ok(Self { contexts, facts })
    }

    pub fn context(&self, id: &str) -> Option<&Context> {
        self.contexts.get(id)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    /// All facts tagged with `name` (an element id such as
    /// `jppfs_cor:NetSales`), across every context.
    pub fn facts_for(&self, name: &str) -> Vec<&XbrlData> {
        self.facts.iter().filter(|f| f.value.name == name).collect()
    }

    pub fn facts(&self) -> &[XbrlData] {
        &self.facts
    }
}

fn parse_context(id: &str, node: roxmltree::Node) -> JpxResult<Context> {
    let period_type = infer_period_type(id)?;

    let mut scenario = Vec::new();
    if let Some(scenario_node) = node.descendants().find(|n| n.tag_name().name() == "scenario") {
        for member_node in scenario_node
            .descendants()
            .filter(|n| n.tag_name().name() == "explicitMember")
        {
            if let (Some(axis), Some(member)) =
                (member_node.attribute("dimension"), member_node.text())
            {
                scenario.push((axis.replace(':', "_"), member.trim().replace(':', "_")));
            }
        }
    }

    Ok(Context {
        id: id.to_string(),
        period_type,
        scenario,
    })
}

/// Infer instant/duration from the `_Instant`/`_Duration` (or `_NonConsolidatedMember`
/// with no period qualifier) substring JPX taxonomies encode into context ids,
/// since the `<period>` element's own shape (`instant` vs `startDate`/`endDate`)
/// is not always present verbatim in the synthetic contexts filers hand-roll.
fn infer_period_type(context_id: &str) -> JpxResult<PeriodType> {
    if context_id.contains("Instant") {
        Ok(PeriodType::Instant)
    } else if context_id.contains("Duration") {
        Ok(PeriodType::Duration)
    } else {
        Err(JpxError::PeriodTypeUnknown {
            context: context_id.to_string(),
        })
    }
}

fn parse_inline_value(node: roxmltree::Node, is_numeric: bool) -> Option<InlineXbrlValue> {
    let context_ref = node.attribute("contextRef")?.to_string();
    let name = node.attribute("name")?.replace(':', "_");

    let escape = node.attribute("escape") == Some("true");
    let raw_text = if escape {
        inner_markup(node)
    } else {
        node.text().unwrap_or("").to_string()
    };

    let scale = node
        .attribute("scale")
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or(0);

    let sign_negative = node.attribute("sign") == Some("-");

    let format = node.attribute("format").map(|s| s.to_string());
    let decimals = node.attribute("decimals").and_then(|s| s.parse::<i32>().ok());

    Some(InlineXbrlValue {
        context_ref,
        name,
        raw_text,
        scale,
        decimals,
        sign_negative,
        format,
        escape,
        is_numeric,
    })
}

/// `escape="true"` means the tagged content is itself markup (escaped HTML
/// rather than plain text), so the original value is its serialized
/// children, not just the text nodes `roxmltree::Node::text()` would see.
fn inner_markup(node: roxmltree::Node) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            out.push_str(child.text().unwrap_or(""));
        } else if child.is_element() {
            out.push_str(&format!("<{}>", child.tag_name().name()));
            out.push_str(&inner_markup(child));
            out.push_str(&format!("</{}>", child.tag_name().name()));
        }
    }
    out
}

/// Convenience wrapper: parse a single already-fetched document string
/// without going through [`XmlSource`]'s caching, used by tests and by
/// callers that already hold the text (e.g. a page fetched for another
/// purpose).
pub fn parse_document_text(text: &Rc<String>) -> JpxResult<(Vec<Context>, Vec<InlineXbrlValue>)> {
    let doc = roxmltree::Document::parse(text)?;

    let mut contexts = Vec::new();
    for node in doc.descendants().filter(|n| n.tag_name().name() == "context") {
        if let Some(id) = node.attribute("id") {
            contexts.push(parse_context(id, node)?);
        }
    }

    let mut values = Vec::new();
    for node in doc.descendants().filter(|n| {
        let name = n.tag_name().name();
        name == "nonFraction" || name == "nonNumeric"
    }) {
        let is_numeric = node.tag_name().name() == "nonFraction";
        if let Some(value) = parse_inline_value(node, is_numeric) {
            values.push(value);
        }
    }

    Ok((contexts, values))
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL" xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:xbrldi="http://xbrl.org/2006/xbrldi">
        <body>
            <xbrli:context id="CurrentYearInstant_ConsolidatedMember">
                <xbrli:scenario>
                    <xbrldi:explicitMember dimension="jppfs_cor:ConsolidatedOrNonConsolidatedAxis">jppfs_cor:ConsolidatedMember</xbrldi:explicitMember>
                </xbrli:scenario>
            </xbrli:context>
            <xbrli:context id="CurrentYearDuration">
            </xbrli:context>
            <ix:nonFraction contextRef="CurrentYearInstant_ConsolidatedMember" name="jppfs_cor:NetAssets" scale="6" sign="-" format="ixt:numdotdecimal">1,234</ix:nonFraction>
            <ix:nonNumeric contextRef="CurrentYearDuration" name="jppfs_cor:CompanyNameCoverPage">Example Corp</ix:nonNumeric>
        </body>
    </html>"#;

    #[test]
    fn test_context_period_type_inferred_from_id() {
        let doc = roxmltree::Document::parse(SAMPLE).unwrap();
        let node = doc
            .descendants()
            .find(|n| n.tag_name().name() == "context" && n.attribute("id") == Some("CurrentYearInstant_ConsolidatedMember"))
            .unwrap();
        let ctx = parse_context("CurrentYearInstant_ConsolidatedMember", node).unwrap();
        assert_eq!(ctx.period_type, PeriodType::Instant);
        assert_eq!(
            ctx.scenario,
            vec![(
                "jppfs_cor_ConsolidatedOrNonConsolidatedAxis".to_string(),
                "jppfs_cor_ConsolidatedMember".to_string()
            )]
        );
    }

    #[test]
    fn test_value_str_applies_scale_and_sign() {
        let (_, values) = parse_document_text(&Rc::new(SAMPLE.to_string())).unwrap();
        let net_assets = values
            .iter()
            .find(|v| v.name == "jppfs_cor_NetAssets")
            .unwrap();
        assert_eq!(net_assets.value_str(), "-1234000000");
    }

    #[test]
    fn test_non_numeric_value_is_passed_through() {
        let (_, values) = parse_document_text(&Rc::new(SAMPLE.to_string())).unwrap();
        let name = values
            .iter()
            .find(|v| v.name == "jppfs_cor_CompanyNameCoverPage")
            .unwrap();
        assert_eq!(name.value_str(), "Example Corp");
    }

    #[test]
    fn test_matches_members_and_axis_set() {
        let doc = roxmltree::Document::parse(SAMPLE).unwrap();
        let node = doc
            .descendants()
            .find(|n| n.tag_name().name() == "context" && n.attribute("id") == Some("CurrentYearInstant_ConsolidatedMember"))
            .unwrap();
        let ctx = parse_context("CurrentYearInstant_ConsolidatedMember", node).unwrap();

        assert!(ctx.matches_axis_set(&["jppfs_cor_ConsolidatedOrNonConsolidatedAxis"]));
        assert!(!ctx.matches_axis_set(&[]));
        assert!(ctx.matches_members(&[(
            "jppfs_cor_ConsolidatedOrNonConsolidatedAxis",
            "jppfs_cor_ConsolidatedMember"
        )]));
        assert!(!ctx.matches_members(&[(
            "jppfs_cor_ConsolidatedOrNonConsolidatedAxis",
            "jppfs_cor_NonConsolidatedMember"
        )]));
    }

    #[test]
    fn test_value_str_formats_by_decimals() {
        let html = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL" xmlns:xbrli="http://www.xbrl.org/2003/instance"><body>
            <xbrli:context id="CurrentYearInstant"></xbrli:context>
            <ix:nonFraction contextRef="CurrentYearInstant" name="jppfs_cor:PerShare" scale="0" decimals="2">1.5</ix:nonFraction>
            <ix:nonFraction contextRef="CurrentYearInstant" name="jppfs_cor:Shares" scale="3" decimals="-3">12</ix:nonFraction>
        </body></html>"#;
        let (_, values) = parse_document_text(&Rc::new(html.to_string())).unwrap();

        let per_share = values.iter().find(|v| v.name == "jppfs_cor_PerShare").unwrap();
        assert_eq!(per_share.value_str(), "1.50");

        let shares = values.iter().find(|v| v.name == "jppfs_cor_Shares").unwrap();
        assert_eq!(shares.value_str(), "12000");
    }

    #[test]
    fn test_value_str_renders_boolean_format() {
        let html = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL" xmlns:xbrli="http://www.xbrl.org/2003/instance"><body>
            <xbrli:context id="CurrentYearInstant"></xbrli:context>
            <ix:nonNumeric contextRef="CurrentYearInstant" name="jppfs_cor:IsConsolidated" format="ixt:booleantrue">yes</ix:nonNumeric>
        </body></html>"#;
        let (_, values) = parse_document_text(&Rc::new(html.to_string())).unwrap();
        let flag = values.iter().find(|v| v.name == "jppfs_cor_IsConsolidated").unwrap();
        assert_eq!(flag.value_str(), "True");
    }

    #[test]
    fn test_escaped_value_captures_inner_markup() {
        let html = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL" xmlns:xbrli="http://www.xbrl.org/2003/instance"><body>
            <xbrli:context id="CurrentYearInstant"></xbrli:context>
            <ix:nonNumeric contextRef="CurrentYearInstant" name="jppfs_cor:Notes" escape="true">pre<b>bold</b>post</ix:nonNumeric>
        </body></html>"#;
        let (_, values) = parse_document_text(&Rc::new(html.to_string())).unwrap();
        let notes = values.iter().find(|v| v.name == "jppfs_cor_Notes").unwrap();
        assert_eq!(notes.value_str(), "pre<b>bold</b>post");
    }
}
