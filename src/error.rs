use crate::blocks::BlockId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("block '{0}' is not in the graph")]
    MissingBlock(BlockId),
    #[error("block '{0}' is already in the graph")]
    DuplicateBlock(BlockId),
}

/// Failure while turning a block into Ruby source.
///
/// Fatal for the emission call that hit it; sibling scripts are still emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("no Ruby emitter is registered for opcode '{opcode}' (block {block_id})")]
    UnknownOpcode { opcode: String, block_id: BlockId },
    #[error("block '{block_id}' has no '{field}' field")]
    MissingField { block_id: BlockId, field: String },
    #[error("block '{block_id}' is its own ancestor")]
    Cycle { block_id: BlockId },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A converter rule recognized a call but could not build blocks from it.
///
/// Distinct from "no match", which is `Ok(None)` and never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("'{method}' cannot take a statement block in its {input} input")]
    StatementInValueSlot { method: String, input: String },
    #[error("invalid argument to '{method}': {message}")]
    InvalidArgument { method: String, message: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
}
