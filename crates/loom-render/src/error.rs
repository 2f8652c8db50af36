//! Render errors

use crate::host::HostError;
use loom_dom::NodeId;

/// Error raised while reconciling or committing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Host rejected a mutation: {0}")]
    Host(#[from] HostError),

    #[error("Node {0} is not part of the rendered tree")]
    MissingNode(NodeId),

    #[error("Flush did not settle after {passes} commit passes")]
    FlushLimit { passes: usize },
}

pub type RenderResult<T> = Result<T, RenderError>;
