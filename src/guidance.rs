use crate::blocks::{infer_shape, Block, BlockGraph, EditorFlags};
use crate::error::GraphError;
use serde::Deserialize;

const FIRST_Y: i64 = 10;
const STEP_Y: i64 = 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSteps {
    #[serde(default)]
    pub add_elements: Vec<HelpElement>,
    #[serde(default)]
    pub delete_elements: Vec<HelpElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpElement {
    pub element_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Guidance {
    pub add: BlockGraph,
    pub delete: BlockGraph,
}

pub fn build_guidance(next_steps: &NextSteps) -> Result<Guidance, GraphError> {
    Ok(Guidance {
        add: stack("add", &next_steps.add_elements)?,
        delete: stack("delete", &next_steps.delete_elements)?,
    })
}

fn stack(prefix: &str, elements: &[HelpElement]) -> Result<BlockGraph, GraphError> {
    let mut graph = BlockGraph::new();
    let mut y = FIRST_Y;
    for (index, element) in elements.iter().enumerate() {
        let opcode = element.element_name.as_str();
        let mut block = Block::new(format!("{}_{}", prefix, index + 1), opcode, infer_shape(opcode, false));
        block.top_level = true;
        block.y = y;
        block.editor = EditorFlags::locked();
        graph.insert(block)?;
        y += STEP_Y;
    }
    tracing::debug!(list = prefix, blocks = graph.len(), "built guidance blocks");
    Ok(graph)
}
