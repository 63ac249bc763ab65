use pagemark_dom::{DomError, NodeId};
use thiserror::Error;

use crate::anchoring::normalize::NormalizeError;
use crate::records::StoreError;

/// Why a selection could not be anchored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionProblem {
    /// The endpoints coincide or enclose no text.
    #[error("selection is collapsed or covers no text")]
    Collapsed,

    #[error(transparent)]
    Unanchorable(#[from] NormalizeError),
}

/// Failures of the anchor/relocate/paint pipeline.
///
/// All of these are recoverable per highlight: a caller painting a batch
/// skips the failing highlight and carries on with the rest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("No text selected: {0}")]
    InvalidSelection(SelectionProblem),

    #[error("Malformed position descriptor {descriptor:?}: {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },

    #[error("Anchor not found: {0}")]
    AnchorNotFound(String),

    #[error("Node {0} is detached from the document")]
    DetachedNode(NodeId),
}

impl From<DomError> for AnchorError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::NoParent(node) => AnchorError::DetachedNode(node),
            other => AnchorError::AnchorNotFound(other.to_string()),
        }
    }
}

/// Anything that can go wrong while capturing, saving or deleting a highlight.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
