//! # jpxbrl Prelude
//!
//! Re-exports the types most callers need to run the full pipeline with a
//! single `use jpxbrl::prelude::*;`.

// Package Result type
pub use crate::{JpxError, JpxResult};

// Filing directory resolution
pub use crate::filing::FilingPaths;

// Raw XML/HTML fetching and caching
pub use crate::xmlsrc::XmlSource;

// Linkbase tree reconstruction
pub use crate::linkbase::{LinkbaseKind, LinkbaseTree, NodeData, NodeId, NodeKind, TreeWalk, Usage};

// Schema classification is attached via LinkbaseTree::enrich_schema, no
// additional public types beyond Usage above.

// Label lookup
pub use crate::labels::{LabelIndex, STANDARD_LABEL_ROLE};

// Instance document parsing
pub use crate::instance::{Context, InlineXbrlValue, InstanceAnalyzer, PeriodType, XbrlData};

// Dimension/fact resolution
pub use crate::resolver::{ResolveMode, ResolveParams};

// TDnet listing collaborator
pub use crate::tdnet::{TdnetAnalyzer, TdnetDisclosure};
