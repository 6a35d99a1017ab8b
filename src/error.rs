//! Crate-wide error type.
//!
//! Every fatal condition described by the resolution pipeline (linkbase
//! parsing, schema classification, label lookup, context resolution) is
//! represented as a variant here so that a failure message always names the
//! offending element id, role, or context — never just "something went
//! wrong".

use std::fmt;

/// Result alias used throughout the crate, playing the role the teacher
/// crate gives `RSLifeResult`.
pub type JpxResult<T> = Result<T, JpxError>;

#[derive(Debug)]
pub enum JpxError {
    Io(std::io::Error),
    Http(reqwest::Error),
    Xml(roxmltree::Error),
    Json(serde_json::Error),

    /// A filing directory slot that must hold exactly one file held zero or
    /// more than one.
    AmbiguousFilingFile { kind: String, dir: String },
    MissingFilingFile { kind: String, dir: String },

    /// No `link` element of the requested kind exists in the linkbase file.
    LinkElementMissing { role: String },
    /// No heading node could be found for a role after orphan repair.
    HeadingNodeMissing { role: String },
    /// Orphan repair could not place every parentless node.
    OrphanNodesRemain { role: String, remaining: usize },

    ElementNotDeclared { id: String, xsd_uri: String },
    UsageClassificationFailed { id: String, name: String, ty: String },

    ConsolidationAxisForbidden { axis: String },
    ConsolidationAxisAmbiguous { axis: String, member_count: usize },
    TwoDimensionalTableRefused { axis: String },
    ContextNotUnique { id: String, role: String, candidates: usize },
    PeriodTypeUnknown { context: String },

    RoleNotFound { role: String },

    Other(String),
}

impl fmt::Display for JpxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JpxError::Io(e) => write!(f, "I/O error: {e}"),
            JpxError::Http(e) => write!(f, "HTTP error: {e}"),
            JpxError::Xml(e) => write!(f, "XML parse error: {e}"),
            JpxError::Json(e) => write!(f, "label cache (de)serialization error: {e}"),
            JpxError::AmbiguousFilingFile { kind, dir } => {
                write!(f, "duplicate {kind} file found in filing directory {dir}")
            }
            JpxError::MissingFilingFile { kind, dir } => {
                write!(f, "no {kind} file found in filing directory {dir}")
            }
            JpxError::LinkElementMissing { role } => {
                write!(f, "linkbase has no link element for role {role}")
            }
            JpxError::HeadingNodeMissing { role } => {
                write!(f, "heading node does not exist for role {role}")
            }
            JpxError::OrphanNodesRemain { role, remaining } => {
                write!(f, "{remaining} parentless node(s) remain unresolved in role {role}")
            }
            JpxError::ElementNotDeclared { id, xsd_uri } => {
                write!(f, "element {id} not declared in schema {xsd_uri}")
            }
            JpxError::UsageClassificationFailed { id, name, ty } => write!(
                f,
                "could not classify usage of element {id} (name={name}, type={ty})"
            ),
            JpxError::ConsolidationAxisForbidden { axis } => write!(
                f,
                "default mode must not specify a member for consolidation axis {axis}"
            ),
            JpxError::ConsolidationAxisAmbiguous { axis, member_count } => write!(
                f,
                "default mode requires exactly one member on consolidation axis {axis}, found {member_count}"
            ),
            JpxError::TwoDimensionalTableRefused { axis } => write!(
                f,
                "column axis {axis} has members; this engine refuses 2-D tables"
            ),
            JpxError::ContextNotUnique { id, role, candidates } => write!(
                f,
                "element {id} in role {role} resolved to {candidates} contexts, expected exactly 1"
            ),
            JpxError::PeriodTypeUnknown { context } => {
                write!(f, "cannot infer period type from context id {context}")
            }
            JpxError::RoleNotFound { role } => write!(f, "role {role} not found in tree"),
            JpxError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for JpxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JpxError::Io(e) => Some(e),
            JpxError::Http(e) => Some(e),
            JpxError::Xml(e) => Some(e),
            JpxError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for JpxError {
    fn from(e: std::io::Error) -> Self {
        JpxError::Io(e)
    }
}

impl From<reqwest::Error> for JpxError {
    fn from(e: reqwest::Error) -> Self {
        JpxError::Http(e)
    }
}

impl From<roxmltree::Error> for JpxError {
    fn from(e: roxmltree::Error) -> Self {
        JpxError::Xml(e)
    }
}

impl From<serde_json::Error> for JpxError {
    fn from(e: serde_json::Error) -> Self {
        JpxError::Json(e)
    }
}

impl From<String> for JpxError {
    fn from(msg: String) -> Self {
        JpxError::Other(msg)
    }
}

impl From<&str> for JpxError {
    fn from(msg: &str) -> Self {
        JpxError::Other(msg.to_string())
    }
}
