use crate::blocks::BlockGraph;
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// One sprite or the stage, with its scripts.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTarget {
    pub name: String,
    pub is_stage: bool,
    pub graph: BlockGraph,
}

/// Reads the targets of a `.sb3` archive or of a bare `project.json`.
pub fn read_project(input: &Path) -> Result<Vec<ProjectTarget>> {
    let is_sb3 = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("sb3"))
        .unwrap_or(false);
    let project_json = if is_sb3 {
        read_sb3(input)?
    } else {
        let raw = fs::read_to_string(input)
            .with_context(|| format!("Failed to read '{}'.", input.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("'{}' is not valid project JSON.", input.display()))?
    };
    targets_from_json(&project_json)
}

fn read_sb3(input: &Path) -> Result<Value> {
    let file =
        fs::File::open(input).with_context(|| format!("Failed to open '{}'.", input.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("'{}' is not a valid zip/.sb3 file.", input.display()))?;
    let mut project_json_str = String::new();
    zip.by_name("project.json")
        .map_err(|_| anyhow!("project.json not found in '{}'.", input.display()))?
        .read_to_string(&mut project_json_str)?;
    serde_json::from_str(&project_json_str)
        .with_context(|| format!("Invalid project.json inside '{}'.", input.display()))
}

pub fn targets_from_json(project_json: &Value) -> Result<Vec<ProjectTarget>> {
    let targets = project_json
        .get("targets")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("Invalid project.json: missing 'targets' array."))?;
    let mut out = Vec::with_capacity(targets.len());
    for (index, target) in targets.iter().enumerate() {
        let name = target
            .get("name")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("target{}", index + 1));
        let is_stage = target.get("isStage").and_then(Value::as_bool).unwrap_or(false);
        let graph = match target.get("blocks") {
            Some(blocks) => BlockGraph::from_json(blocks)
                .with_context(|| format!("Invalid blocks in target '{}'.", name))?,
            None => BlockGraph::new(),
        };
        out.push(ProjectTarget {
            name,
            is_stage,
            graph,
        });
    }
    Ok(out)
}

/// Minimal `project.json` carrying one sprite with `graph` as its blocks.
pub fn project_json_for(target_name: &str, graph: &BlockGraph) -> Value {
    json!({
        "targets": [{
            "isStage": false,
            "name": target_name,
            "blocks": graph.to_json()
        }]
    })
}
