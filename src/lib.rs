//! # jpxbrl
//!
//! Linkbase-driven tree reconstruction and dimensional fact resolution for
//! Japanese listed-company disclosures (TDnet/JPX inline-XBRL filings).
//!
//! ## What this crate does
//!
//! Given a filing directory containing an XSD schema, a label linkbase, the
//! three linkbase flavors (presentation/definition/calculation) and one or
//! more inline-XBRL instance documents, this crate reconstructs the
//! hierarchical, dimension-aware report that underlies a single named
//! section (a *role*, e.g. `rol_ConsolidatedBalanceSheet`) and resolves the
//! single fact that belongs at each leaf for a chosen reporting period.
//!
//! ## Pipeline
//!
//! 1. [`filing`] discovers the filing's files on disk.
//! 2. [`xmlsrc`] fetches and caches the raw XML/HTML behind those files.
//! 3. [`linkbase`] parses a presentation/definition/calculation linkbase into
//!    an ordered forest, repairing orphan subgraphs into a tree per role.
//! 4. [`schema`] classifies each node's usage from its XSD declaration.
//! 5. [`labels`] attaches human-readable labels from the label linkbase.
//! 6. [`instance`] extracts contexts and facts from the inline-XBRL
//!    documents.
//! 7. [`resolver`] filters contexts by axis/member/dimension-default and
//!    period, then attaches exactly one fact per reportable leaf.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use jpxbrl::prelude::*;
//!
//! let filing = FilingPaths::discover("./filings/example")?;
//! let xml_src = XmlSource::builder().build();
//!
//! let mut pre_tree = LinkbaseTree::load(&xml_src, &filing, LinkbaseKind::Presentation)?;
//! let def_tree = LinkbaseTree::load(&xml_src, &filing, LinkbaseKind::Definition)?;
//!
//! pre_tree.enrich_schema(&xml_src, "rol_ConsolidatedBalanceSheet")?;
//! pre_tree.enrich_labels(&xml_src, &filing, "rol_ConsolidatedBalanceSheet")?;
//! pre_tree.set_dimension_default(&def_tree, "rol_ConsolidatedBalanceSheet")?;
//!
//! let instance = InstanceAnalyzer::load(&xml_src, &filing.instance_documents())?;
//!
//! let params = ResolveParams::builder()
//!     .role_id("rol_ConsolidatedBalanceSheet")
//!     .target_time("CurrentYear")
//!     .one_before("Prior1Year")
//!     .build();
//!
//! pre_tree.read_instance_data(&instance, &params)?;
//! # JpxResult::Ok(())
//! ```

pub mod error;
pub mod filing;
pub mod instance;
pub mod labels;
pub mod linkbase;
pub mod prelude;
pub mod resolver;
pub mod schema;
pub mod tdnet;
pub mod xmlsrc;

pub use error::{JpxError, JpxResult};
