//! # Dimension/Fact Resolver
//!
//! Given a schema- and label-enriched tree and a parsed instance document,
//! filters the instance's contexts down to the one reporting period the
//! caller asked for and attaches the matching fact to every reportable leaf.

use std::collections::HashMap;

use bon::Builder;
use garde::Validate;

use crate::error::{JpxError, JpxResult};
use crate::instance::{Context, InstanceAnalyzer};
use crate::linkbase::{LinkbaseTree, NodeId, Usage};

const PERIOD_START_LABEL_ROLE: &str = "http://www.xbrl.org/2003/role/periodStartLabel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// The caller selects no member on the consolidation axis; the engine
    /// requires that axis to carry exactly one member on its own.
    Default,
    /// The caller selects every axis explicitly, including consolidation.
    Explicit,
}

/// Parameters for one [`LinkbaseTree::read_instance_data`] call, built and
/// validated the way the teacher assembles `SurvivalFunctionParams`.
#[derive(Debug, Clone, Validate, Builder)]
#[garde(allow_unvalidated)]
pub struct ResolveParams {
    #[builder(into)]
    #[garde(length(min = 1))]
    pub role_id: String,
    #[builder(into)]
    #[garde(length(min = 1))]
    pub target_time: String,
    #[builder(into)]
    #[garde(length(min = 1))]
    pub one_before: String,
    #[builder(default = ResolveMode::Default)]
    pub mode: ResolveMode,
    #[builder(default)]
    pub axis_members: HashMap<String, String>,
}

impl ResolveParams {
    /// Run garde's field-level checks, then the cross-field check garde's
    /// attributes can't express.
    pub fn validate_all(&self) -> Result<(), garde::Report> {
        self.validate()?;
        self.validate_custom_constraints()
    }

    fn validate_custom_constraints(&self) -> Result<(), garde::Report> {
        let mut report = garde::Report::new();
        if self.target_time == self.one_before {
            report.append(
                garde::Path::new("one_before"),
                garde::Error::new("target_time and one_before must name different periods"),
            );
        }
        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }
}

impl LinkbaseTree {
    /// Attach exactly one fact per reportable leaf of `params.role_id`'s
    /// subtree, drawn from `instance`.
    pub fn read_instance_data(&mut self, instance: &InstanceAnalyzer, params: &ResolveParams) -> JpxResult<()> {
        params.validate_all().map_err(|e| JpxError::Other(e.to_string()))?;

        let root = self
            .role_node_id(&params.role_id)
            .ok_or_else(|| JpxError::RoleNotFound {
                role: params.role_id.clone(),
            })?;

        let table = build_table_structure(self, root);
        let consolidation_axis = table.keys().find(|axis| axis.contains("Consolidated")).cloned();

        if params.mode == ResolveMode::Default {
            if let Some(axis) = &consolidation_axis {
                if params.axis_members.contains_key(axis) {
                    return Err(JpxError::ConsolidationAxisForbidden { axis: axis.clone() });
                }
            }
        }

        let base_contexts: Vec<Context> = instance
            .contexts()
            .filter(|ctx| ctx.matches_axis_set(&table.keys().map(String::as_str).collect::<Vec<_>>()))
            .cloned()
            .collect();

        let mut filtered = base_contexts.clone();
        let mut used_axes: Vec<String> = Vec::new();

        for (axis, member) in &params.axis_members {
            let is_default = table
                .get(axis)
                .and_then(|members| members.iter().find(|m| &m.id == member))
                .map(|m| m.dimension_default)
                .unwrap_or(false);

            filtered = filtered
                .into_iter()
                .filter(|ctx| {
                    if is_default {
                        !ctx.scenario.iter().any(|(a, _)| a == axis)
                    } else {
                        ctx.scenario.iter().any(|(a, m)| a == axis && m == member)
                    }
                })
                .collect();
            used_axes.push(axis.clone());
        }

        if params.mode == ResolveMode::Default {
            if let Some(axis) = &consolidation_axis {
                let members = &table[axis];
                if members.len() != 1 {
                    return Err(JpxError::ConsolidationAxisAmbiguous {
                        axis: axis.clone(),
                        member_count: members.len(),
                    });
                }
                let member = &members[0].id;
                filtered = filtered
                    .into_iter()
                    .filter(|ctx| ctx.scenario.iter().any(|(a, m)| a == axis && m == member))
                    .collect();
                used_axes.push(axis.clone());
            }
        }

        let column_axis = table
            .keys()
            .find(|axis| !used_axes.contains(axis) && Some(axis.as_str()) != consolidation_axis.as_deref());
        if let Some(axis) = column_axis {
            if !table[axis].is_empty() {
                return Err(JpxError::TwoDimensionalTableRefused { axis: axis.clone() });
            }
        }

        let leaf_ids: Vec<NodeId> = self
            .walk(root)
            .filter(|&n| self.node(n).usage.map(Usage::is_reportable).unwrap_or(false))
            .collect();

        for leaf_id in leaf_ids {
            let node = self.node(leaf_id);
            let Some(period_type) = node.period_type else {
                continue;
            };
            let element_id = node.id.clone().unwrap_or_default();
            let preferred_label = node.preferred_label.clone();

            let use_one_before = period_type == crate::instance::PeriodType::Instant
                && preferred_label.as_deref() == Some(PERIOD_START_LABEL_ROLE);
            let period_token = if use_one_before { &params.one_before } else { &params.target_time };

            let candidates: Vec<&Context> = filtered
                .iter()
                .filter(|ctx| ctx.matches_period_type(period_type) && ctx.starts_with(period_token))
                .collect();

            if candidates.len() != 1 {
                return Err(JpxError::ContextNotUnique {
                    id: element_id,
                    role: params.role_id.clone(),
                    candidates: candidates.len(),
                });
            }

            let context = candidates[0];
            if let Some(fact) = instance
                .facts_for(&element_id)
                .into_iter()
                .find(|f| f.context.id == context.id)
            {
                self.node_mut(leaf_id).fact = Some(fact.clone());
            }
        }

        Ok(())
    }

    /// Copy every already-resolved fact in `source`'s `role_id` subtree onto
    /// this tree's matching nodes (by element id), for reusing a
    /// calculation tree's resolution against the presentation tree.
    pub fn read_instance_data_from_another_tree(&mut self, source: &LinkbaseTree, role_id: &str) -> JpxResult<()> {
        let source_root = source
            .role_node_id(role_id)
            .ok_or_else(|| JpxError::RoleNotFound { role: role_id.to_string() })?;
        let dest_root = self
            .role_node_id(role_id)
            .ok_or_else(|| JpxError::RoleNotFound { role: role_id.to_string() })?;

        let mut facts_by_id = HashMap::new();
        for node_id in source.walk(source_root) {
            let node = source.node(node_id);
            if let (Some(id), Some(fact)) = (&node.id, &node.fact) {
                facts_by_id.insert(id.clone(), fact.clone());
            }
        }

        let dest_ids: Vec<NodeId> = self.walk(dest_root).collect();
        for node_id in dest_ids {
            let id = self.node(node_id).id.clone();
            if let Some(id) = id {
                if let Some(fact) = facts_by_id.get(&id) {
                    self.node_mut(node_id).fact = Some(fact.clone());
                }
            }
        }

        Ok(())
    }
}

struct AxisMember {
    id: String,
    dimension_default: bool,
}

/// Map each `axis` node under `root` to the ordered list of its descendant
/// `member` nodes.
fn build_table_structure(tree: &LinkbaseTree, root: NodeId) -> HashMap<String, Vec<AxisMember>> {
    let mut table = HashMap::new();

    for node_id in tree.walk(root) {
        if tree.node(node_id).usage != Some(Usage::Axis) {
            continue;
        }
        let Some(axis_id) = tree.node(node_id).id.clone() else {
            continue;
        };

        let members: Vec<AxisMember> = tree
            .walk(node_id)
            .skip(1)
            .filter(|&n| tree.node(n).usage == Some(Usage::Member))
            .filter_map(|n| {
                tree.node(n).id.clone().map(|id| AxisMember {
                    id,
                    dimension_default: tree.node(n).dimension_default,
                })
            })
            .collect();

        table.insert(axis_id, members);
    }

    table
}
