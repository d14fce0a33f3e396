use crate::agreement::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgreementError {
    #[error("unknown agreement node {0}")]
    UnknownNode(NodeId),

    #[error("unknown parent node {0}")]
    UnknownParent(NodeId),

    #[error("edge dump failed: {0}")]
    Io(#[from] std::io::Error),
}
