//! Scratch block graph and its `project.json` encoding.

use crate::error::GraphError;
use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};

pub type BlockId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Reporter producing a number or text.
    Value,
    /// Reporter producing a boolean.
    Boolean,
    Statement,
    /// Script-starting statement such as `event_whenflagclicked`.
    Hat,
}

impl Shape {
    pub fn is_value(self) -> bool {
        matches!(self, Shape::Value | Shape::Boolean)
    }
}

/// Editor affordances. Code generation never looks at these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorFlags {
    pub movable: bool,
    pub deletable: bool,
    pub context_menu: bool,
}

impl EditorFlags {
    pub fn locked() -> Self {
        Self {
            movable: false,
            deletable: false,
            context_menu: false,
        }
    }
}

impl Default for EditorFlags {
    fn default() -> Self {
        Self {
            movable: true,
            deletable: true,
            context_menu: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub value: String,
    pub id: Option<String>,
}

impl Field {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Input {
    pub block: Option<BlockId>,
    pub shadow: Option<BlockId>,
}

impl Input {
    pub fn shadow(id: impl Into<BlockId>) -> Self {
        let id = id.into();
        Self {
            block: Some(id.clone()),
            shadow: Some(id),
        }
    }

    pub fn block(id: impl Into<BlockId>) -> Self {
        Self {
            block: Some(id.into()),
            shadow: None,
        }
    }

    /// The block actually plugged into the socket: the reporter if one is
    /// connected, otherwise the shadow.
    pub fn effective(&self) -> Option<&str> {
        self.block.as_deref().or(self.shadow.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub opcode: String,
    pub shape: Shape,
    pub fields: BTreeMap<String, Field>,
    pub inputs: BTreeMap<String, Input>,
    pub next: Option<BlockId>,
    pub parent: Option<BlockId>,
    pub shadow: bool,
    pub top_level: bool,
    pub x: i64,
    pub y: i64,
    pub editor: EditorFlags,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, opcode: impl Into<String>, shape: Shape) -> Self {
        Self {
            id: id.into(),
            opcode: opcode.into(),
            shape,
            fields: BTreeMap::new(),
            inputs: BTreeMap::new(),
            next: None,
            parent: None,
            shadow: false,
            top_level: false,
            x: 0,
            y: 0,
            editor: EditorFlags::default(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), Field::new(value));
        self
    }

    pub fn with_input(mut self, name: &str, input: Input) -> Self {
        self.inputs.insert(name.to_string(), input);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.value.as_str())
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockGraph {
    blocks: BTreeMap<BlockId, Block>,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.get_mut(id)
    }

    pub fn require(&self, id: &str) -> Result<&Block, GraphError> {
        self.blocks
            .get(id)
            .ok_or_else(|| GraphError::MissingBlock(id.to_string()))
    }

    pub fn require_mut(&mut self, id: &str) -> Result<&mut Block, GraphError> {
        self.blocks
            .get_mut(id)
            .ok_or_else(|| GraphError::MissingBlock(id.to_string()))
    }

    pub fn insert(&mut self, block: Block) -> Result<(), GraphError> {
        if self.blocks.contains_key(&block.id) {
            return Err(GraphError::DuplicateBlock(block.id));
        }
        self.blocks.insert(block.id.clone(), block);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Block> {
        self.blocks.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Effective child block connected to `name` on `block`.
    pub fn input_block(&self, block: &Block, name: &str) -> Option<&Block> {
        let id = block.input(name)?.effective()?;
        self.blocks.get(id)
    }

    pub fn set_next(&mut self, id: &str, next: Option<BlockId>) -> Result<(), GraphError> {
        if let Some(next_id) = &next {
            self.require_mut(next_id)?.parent = Some(id.to_string());
        }
        self.require_mut(id)?.next = next;
        Ok(())
    }

    /// Connects `input` under `name` and points the children back at `id`.
    pub fn set_input(&mut self, id: &str, name: &str, input: Input) -> Result<(), GraphError> {
        for child in [&input.block, &input.shadow].into_iter().flatten() {
            self.require_mut(child)?.parent = Some(id.to_string());
        }
        self.require_mut(id)?.inputs.insert(name.to_string(), input);
        Ok(())
    }

    /// Script roots ordered top to bottom, then left to right.
    pub fn top_level_ids(&self) -> Vec<BlockId> {
        let mut roots: Vec<&Block> = self.blocks.values().filter(|b| b.top_level).collect();
        roots.sort_by(|a, b| (a.y, a.x, &a.id).cmp(&(b.y, b.x, &b.id)));
        roots.into_iter().map(|b| b.id.clone()).collect()
    }

    /// Blocks reachable from `start` through `next` links. Stops at the first
    /// repeated id or dangling link.
    pub fn chain(&self, start: &str) -> Vec<&Block> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if !visited.insert(id) {
                tracing::warn!(block = id, "cyclic block chain");
                break;
            }
            let Some(block) = self.blocks.get(id) else {
                break;
            };
            out.push(block);
            current = block.next.as_deref();
        }
        out
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| anyhow!("Expected a blocks object."))?;
        let mut graph = BlockGraph::new();
        let mut value_children = HashSet::new();
        for (id, raw) in obj {
            // Top-level variable/list reporters are stored as bare arrays.
            let Some(raw_obj) = raw.as_object() else {
                continue;
            };
            let mut block = read_block(id, raw_obj)?;
            let inputs = raw_obj.get("inputs").and_then(Value::as_object);
            for (name, input_val) in inputs.into_iter().flatten() {
                let input = read_input(&mut graph, id, name, input_val)?;
                if !name.starts_with("SUBSTACK") {
                    value_children.extend(input.block.iter().cloned());
                    value_children.extend(input.shadow.iter().cloned());
                }
                block.inputs.insert(name.clone(), input);
            }
            graph.blocks.insert(id.clone(), block);
        }
        for block in graph.blocks.values_mut() {
            block.shape = infer_shape(&block.opcode, block.shadow || value_children.contains(&block.id));
        }
        Ok(graph)
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for block in self.blocks.values() {
            let mut inputs = Map::new();
            for (name, input) in &block.inputs {
                let encoded = match (&input.block, &input.shadow) {
                    (Some(b), Some(s)) if b == s => json!([1, b]),
                    (Some(b), Some(s)) => json!([3, b, s]),
                    (Some(b), None) => json!([2, b]),
                    (None, Some(s)) => json!([1, s]),
                    (None, None) => continue,
                };
                inputs.insert(name.clone(), encoded);
            }
            let mut fields = Map::new();
            for (name, field) in &block.fields {
                fields.insert(name.clone(), json!([field.value, field.id]));
            }
            let mut entry = json!({
                "opcode": block.opcode,
                "next": block.next,
                "parent": block.parent,
                "inputs": inputs,
                "fields": fields,
                "shadow": block.shadow,
                "topLevel": block.top_level
            });
            if let Some(obj) = entry.as_object_mut() {
                if block.top_level {
                    obj.insert("x".to_string(), json!(block.x));
                    obj.insert("y".to_string(), json!(block.y));
                }
                // Only locked affordances are written; absent keys mean enabled.
                for (key, enabled) in [
                    ("movable", block.editor.movable),
                    ("deletable", block.editor.deletable),
                    ("contextMenu", block.editor.context_menu),
                ] {
                    if !enabled {
                        obj.insert(key.to_string(), json!(false));
                    }
                }
            }
            out.insert(block.id.clone(), entry);
        }
        Value::Object(out)
    }
}

fn read_block(id: &str, raw: &Map<String, Value>) -> Result<Block> {
    let opcode = raw
        .get("opcode")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Block '{}' missing opcode.", id))?;
    let mut block = Block::new(id, opcode, Shape::Statement);
    block.next = raw.get("next").and_then(Value::as_str).map(ToString::to_string);
    block.parent = raw.get("parent").and_then(Value::as_str).map(ToString::to_string);
    block.shadow = raw.get("shadow").and_then(Value::as_bool).unwrap_or(false);
    block.top_level = raw.get("topLevel").and_then(Value::as_bool).unwrap_or(false);
    block.x = raw.get("x").and_then(Value::as_f64).unwrap_or(0.0) as i64;
    block.y = raw.get("y").and_then(Value::as_f64).unwrap_or(0.0) as i64;
    let flag = |key: &str| raw.get(key).and_then(Value::as_bool).unwrap_or(true);
    block.editor = EditorFlags {
        movable: flag("movable"),
        deletable: flag("deletable"),
        context_menu: flag("contextMenu"),
    };
    let fields = raw.get("fields").and_then(Value::as_object);
    for (name, field_val) in fields.into_iter().flatten() {
        let arr = field_val.as_array();
        let value = arr
            .and_then(|a| a.first())
            .map(scalar_text)
            .unwrap_or_default();
        let field_id = arr
            .and_then(|a| a.get(1))
            .and_then(Value::as_str)
            .map(ToString::to_string);
        block.fields.insert(name.clone(), Field { value, id: field_id });
    }
    Ok(block)
}

fn read_input(graph: &mut BlockGraph, parent_id: &str, name: &str, raw: &Value) -> Result<Input> {
    let arr = raw
        .as_array()
        .ok_or_else(|| anyhow!("Input '{}' of block '{}' is not an array.", name, parent_id))?;
    let mode = arr.first().and_then(Value::as_i64).unwrap_or_default();
    let slot = |index: usize, graph: &mut BlockGraph| -> Result<Option<BlockId>> {
        match arr.get(index) {
            Some(Value::String(id)) => Ok(Some(id.clone())),
            Some(Value::Array(primitive)) => {
                let id = format!("{}-{}-{}", parent_id, name, index);
                let block = expand_primitive(&id, parent_id, primitive)
                    .ok_or_else(|| anyhow!("Unsupported primitive in input '{}' of block '{}'.", name, parent_id))?;
                graph.blocks.insert(id.clone(), block);
                Ok(Some(id))
            }
            _ => Ok(None),
        }
    };
    let input = match mode {
        1 => {
            let id = slot(1, graph)?;
            Input {
                block: id.clone(),
                shadow: id,
            }
        }
        2 => Input {
            block: slot(1, graph)?,
            shadow: None,
        },
        3 => Input {
            block: slot(1, graph)?,
            shadow: slot(2, graph)?,
        },
        other => return Err(anyhow!("Unknown input mode {} on block '{}'.", other, parent_id)),
    };
    Ok(input)
}

fn expand_primitive(id: &str, parent_id: &str, primitive: &[Value]) -> Option<Block> {
    let kind = primitive.first()?.as_i64()?;
    let value = primitive.get(1).map(scalar_text).unwrap_or_default();
    let (opcode, field, shadow) = match kind {
        4 => ("math_number", "NUM", true),
        5 => ("math_positive_number", "NUM", true),
        6 => ("math_whole_number", "NUM", true),
        7 => ("math_integer", "NUM", true),
        8 => ("math_angle", "NUM", true),
        9 => ("colour_picker", "COLOUR", true),
        10 => ("text", "TEXT", true),
        11 => ("event_broadcast_menu", "BROADCAST_OPTION", true),
        12 => ("data_variable", "VARIABLE", false),
        13 => ("data_listcontents", "LIST", false),
        _ => return None,
    };
    let mut block = Block::new(id, opcode, Shape::Value);
    block.shadow = shadow;
    block.parent = Some(parent_id.to_string());
    block.fields.insert(
        field.to_string(),
        Field {
            value,
            id: primitive.get(2).and_then(Value::as_str).map(ToString::to_string),
        },
    );
    Some(block)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Shape of a block loaded from JSON, where shape is not stored.
pub fn infer_shape(opcode: &str, used_as_value: bool) -> Shape {
    if is_boolean_opcode(opcode) {
        Shape::Boolean
    } else if opcode.starts_with("event_when") {
        Shape::Hat
    } else if used_as_value || is_reporter_opcode(opcode) {
        Shape::Value
    } else {
        Shape::Statement
    }
}

fn is_reporter_opcode(opcode: &str) -> bool {
    opcode.starts_with("operator_")
        || opcode.starts_with("math_")
        || opcode == "text"
        || opcode.contains("_menu_")
}

fn is_boolean_opcode(opcode: &str) -> bool {
    matches!(
        opcode,
        "operator_lt"
            | "operator_gt"
            | "operator_equals"
            | "operator_and"
            | "operator_or"
            | "operator_not"
            | "operator_contains"
            | "sensing_touchingobject"
            | "sensing_keypressed"
            | "sensing_mousedown"
            | "data_listcontainsitem"
    )
}
