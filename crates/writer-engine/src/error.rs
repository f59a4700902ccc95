use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Unsupported selector: {0:?}")]
    InvalidSelector(String),

    #[error("Malformed HTML: {0}")]
    MalformedHtml(String),
}

/// Conditions reported by the editor. None of them is fatal: a failed
/// command leaves the region untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("No element matches selector {0:?}")]
    NoMatchingElement(String),

    #[error("No active selection has been captured yet")]
    NoActiveSelection,

    #[error("Stored selection anchor {0} is no longer inside the editable region")]
    SelectionOutsideRegion(NodeId),

    #[error("The editable region is disabled")]
    RegionDisabled,

    #[error(transparent)]
    Dom(#[from] DomError),
}
