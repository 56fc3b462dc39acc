mod boost;
mod control;
mod event;
mod operators;

use crate::blocks::{Block, BlockGraph, BlockId, Input, Shape};
use crate::error::ConversionError;
use crate::ruby_ast::{Node, SendExpression};
use crate::ruby_generator::format_number;
use std::sync::OnceLock;

const SCRIPT_SPACING: i64 = 100;

/// A call argument after nested calls have been converted.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Sym(String),
    /// A nested call that converted into this block.
    Block(BlockId),
    /// Anything with no block counterpart (local variables, constants,
    /// unrecognized calls). Holds a label for diagnostics.
    Opaque(String),
}

impl Arg {
    pub fn is_number(&self) -> bool {
        matches!(self, Arg::Int(_) | Arg::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Arg::Str(_))
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Arg::Block(_))
    }

    pub fn is_number_or_block(&self) -> bool {
        self.is_number() || self.is_block()
    }

    pub fn is_string_or_block(&self) -> bool {
        self.is_string() || self.is_block()
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Arg::Int(v) => Some(*v as f64),
            Arg::Float(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Receiver {
    /// No receiver written: the call goes to the current sprite.
    Implicit,
    SelfRef,
    Value(Arg),
}

impl Receiver {
    pub fn is_self_or_implicit(&self) -> bool {
        matches!(self, Receiver::Implicit | Receiver::SelfRef)
    }

    pub fn value(&self) -> Option<&Arg> {
        match self {
            Receiver::Value(arg) => Some(arg),
            _ => None,
        }
    }
}

/// The call shape a rule inspects.
#[derive(Debug, Clone)]
pub struct SendCall<'n> {
    pub receiver: Receiver,
    pub name: &'n str,
    pub args: Vec<Arg>,
    /// Statements of an attached `do ... end` block, if any.
    pub body: Option<&'n [Node]>,
}

pub type ConverterRule =
    fn(&mut RubyToBlocksConverter<'_>, &SendCall<'_>) -> Result<Option<BlockId>, ConversionError>;

#[derive(Clone, Default)]
pub struct ConverterRegistry {
    rules: Vec<(String, ConverterRule)>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_rules() -> Self {
        let mut registry = Self::new();
        event::install(&mut registry);
        control::install(&mut registry);
        operators::install(&mut registry);
        boost::install(&mut registry);
        registry
    }

    /// Adds the rule for `domain`. Installing a domain again replaces its rule
    /// and keeps its place in the order.
    pub fn register(&mut self, domain: &str, rule: ConverterRule) {
        if let Some(slot) = self.rules.iter_mut().find(|(name, _)| name == domain) {
            slot.1 = rule;
        } else {
            self.rules.push((domain.to_string(), rule));
        }
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub fn default_registry() -> &'static ConverterRegistry {
    static REGISTRY: OnceLock<ConverterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ConverterRegistry::with_default_rules)
}

/// What happened to one top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    Converted(BlockId),
    /// No rule recognized the statement; it is left out of the graph.
    Unrecognized { source: String },
    Failed { source: String, error: ConversionError },
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub target: String,
    pub graph: BlockGraph,
    pub outcomes: Vec<StatementOutcome>,
    /// Statements skipped inside block bodies.
    pub diagnostics: Vec<String>,
}

impl Conversion {
    pub fn converted(&self) -> impl Iterator<Item = &BlockId> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            StatementOutcome::Converted(id) => Some(id),
            _ => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
            && self
                .outcomes
                .iter()
                .all(|outcome| matches!(outcome, StatementOutcome::Converted(_)))
    }
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    blocks: usize,
    diagnostics: usize,
}

pub struct RubyToBlocksConverter<'r> {
    registry: &'r ConverterRegistry,
    target: String,
    graph: BlockGraph,
    created: Vec<BlockId>,
    id_counter: usize,
    diagnostics: Vec<String>,
}

impl RubyToBlocksConverter<'static> {
    pub fn new(target: &str) -> Self {
        Self::with_registry(default_registry(), target)
    }
}

impl<'r> RubyToBlocksConverter<'r> {
    pub fn with_registry(registry: &'r ConverterRegistry, target: &str) -> Self {
        Self {
            registry,
            target: target.to_string(),
            graph: BlockGraph::new(),
            created: Vec::new(),
            id_counter: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Name of the sprite the program is being translated for.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn graph(&self) -> &BlockGraph {
        &self.graph
    }

    /// Converts a whole program. Each top-level statement is tried on its own;
    /// converted statements are chained in order and hats start new scripts.
    pub fn convert_program(mut self, nodes: &[Node]) -> Conversion {
        let _span = tracing::info_span!("convert", target = %self.target).entered();
        let mut outcomes = Vec::with_capacity(nodes.len());
        let mut tail: Option<BlockId> = None;
        let mut scripts = 0i64;
        for node in nodes {
            let mark = self.mark();
            match self.convert_unit(node, tail.as_deref()) {
                Ok(Some(id)) => {
                    let shape = self.graph.get(&id).map(|b| b.shape);
                    if tail.is_none() || shape == Some(Shape::Hat) {
                        if let Some(block) = self.graph.get_mut(&id) {
                            block.top_level = true;
                            block.y = scripts * SCRIPT_SPACING;
                        }
                        scripts += 1;
                    }
                    tail = if shape == Some(Shape::Hat) {
                        None
                    } else {
                        self.graph.chain(&id).last().map(|b| b.id.clone())
                    };
                    outcomes.push(StatementOutcome::Converted(id));
                }
                Ok(None) => {
                    self.rollback(mark);
                    let source = node.describe();
                    tracing::warn!(statement = %source, "no converter rule matched");
                    outcomes.push(StatementOutcome::Unrecognized { source });
                }
                Err(error) => {
                    self.rollback(mark);
                    let source = node.describe();
                    tracing::warn!(statement = %source, error = %error, "statement not converted");
                    outcomes.push(StatementOutcome::Failed { source, error });
                }
            }
        }
        Conversion {
            target: self.target,
            graph: self.graph,
            outcomes,
            diagnostics: self.diagnostics,
        }
    }

    fn convert_unit(
        &mut self,
        node: &Node,
        tail: Option<&str>,
    ) -> Result<Option<BlockId>, ConversionError> {
        let Some(id) = self.convert_statement(node)? else {
            return Ok(None);
        };
        if let Some(tail) = tail {
            if self.graph.require(&id)?.shape != Shape::Hat {
                self.graph.set_next(tail, Some(id.clone()))?;
            }
        }
        Ok(Some(id))
    }

    /// Converts one statement. Only statement and hat blocks are accepted in
    /// statement position.
    pub fn convert_statement(&mut self, node: &Node) -> Result<Option<BlockId>, ConversionError> {
        let converted = match node {
            Node::Send(send) => self.convert(send)?,
            Node::If {
                cond,
                then_body,
                else_body,
            } => self.convert_if(cond, then_body, else_body.as_deref())?,
            _ => None,
        };
        let Some(id) = converted else {
            return Ok(None);
        };
        if self.graph.require(&id)?.shape.is_value() {
            return Ok(None);
        }
        Ok(Some(id))
    }

    /// Runs the rule fold for one call. Nested calls in the receiver and
    /// arguments are converted first.
    pub fn convert(&mut self, send: &SendExpression) -> Result<Option<BlockId>, ConversionError> {
        let receiver = match send.receiver.as_deref() {
            None => Receiver::Implicit,
            Some(Node::SelfRef) => Receiver::SelfRef,
            Some(node) => Receiver::Value(self.lower(node)?),
        };
        let mut args = Vec::with_capacity(send.args.len());
        for arg in &send.args {
            args.push(self.lower(arg)?);
        }
        let call = SendCall {
            receiver,
            name: &send.name,
            args,
            body: send.block.as_ref().map(|b| b.body.as_slice()),
        };
        let registry = self.registry;
        for (domain, rule) in &registry.rules {
            if let Some(id) = rule(self, &call)? {
                tracing::debug!(method = %send.name, domain = %domain, block = %id, "converted");
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Converts a `do ... end` body or branch into a chain and returns its
    /// first block. Statements that do not convert are skipped and recorded.
    pub fn convert_body(&mut self, nodes: &[Node]) -> Result<Option<BlockId>, ConversionError> {
        let mut first: Option<BlockId> = None;
        let mut tail: Option<BlockId> = None;
        for node in nodes {
            let mark = self.mark();
            let reason = match self.convert_statement(node) {
                Ok(Some(id)) => {
                    if self.graph.require(&id)?.shape == Shape::Hat {
                        "a script header cannot be nested".to_string()
                    } else {
                        match &tail {
                            Some(prev) => self.graph.set_next(prev, Some(id.clone()))?,
                            None => first = Some(id.clone()),
                        }
                        tail = self.graph.chain(&id).last().map(|b| b.id.clone());
                        continue;
                    }
                }
                Ok(None) => "no converter rule matched".to_string(),
                Err(error) => error.to_string(),
            };
            self.rollback(mark);
            let message = format!("skipped '{}': {}", node.describe(), reason);
            tracing::warn!("{}", message);
            self.diagnostics.push(message);
        }
        Ok(first)
    }

    fn convert_if(
        &mut self,
        cond: &Node,
        then_body: &[Node],
        else_body: Option<&[Node]>,
    ) -> Result<Option<BlockId>, ConversionError> {
        let condition = self.lower(cond)?;
        let Arg::Block(cond_id) = &condition else {
            return Err(ConversionError::InvalidArgument {
                method: "if".to_string(),
                message: format!("condition '{}' has no block form", cond.describe()),
            });
        };
        let opcode = if else_body.is_some() {
            "control_if_else"
        } else {
            "control_if"
        };
        let block = self.create_block(opcode, Shape::Statement)?;
        self.add_input(&block, "CONDITION", cond_id, None)?;
        self.add_substack(&block, "SUBSTACK", Some(then_body))?;
        if let Some(else_body) = else_body {
            self.add_substack(&block, "SUBSTACK2", Some(else_body))?;
        }
        Ok(Some(block))
    }

    fn lower(&mut self, node: &Node) -> Result<Arg, ConversionError> {
        let arg = match node {
            Node::Nil => Arg::Nil,
            Node::True => Arg::Bool(true),
            Node::False => Arg::Bool(false),
            Node::Int { value } => Arg::Int(*value),
            Node::Float { value } => Arg::Float(*value),
            Node::Str { value } => Arg::Str(value.clone()),
            Node::Sym { value } => Arg::Sym(value.clone()),
            Node::Send(send) => {
                let mark = self.mark();
                match self.convert(send)? {
                    Some(id) => Arg::Block(id),
                    None => {
                        self.rollback(mark);
                        Arg::Opaque(node.describe())
                    }
                }
            }
            other => Arg::Opaque(other.describe()),
        };
        Ok(arg)
    }

    fn mark(&self) -> Mark {
        Mark {
            blocks: self.created.len(),
            diagnostics: self.diagnostics.len(),
        }
    }

    /// Drops every block and diagnostic recorded since `mark`.
    fn rollback(&mut self, mark: Mark) {
        for id in self.created.drain(mark.blocks..) {
            self.graph.remove(&id);
        }
        self.diagnostics.truncate(mark.diagnostics);
    }

    fn new_id(&mut self, prefix: &str) -> String {
        self.id_counter += 1;
        format!("{}_{}", prefix, self.id_counter)
    }

    pub fn create_block(&mut self, opcode: &str, shape: Shape) -> Result<BlockId, ConversionError> {
        let id = self.new_id("block");
        self.graph.insert(Block::new(id.clone(), opcode, shape))?;
        self.created.push(id.clone());
        Ok(id)
    }

    pub fn create_shadow(&mut self, opcode: &str, field: &str, value: &str) -> Result<BlockId, ConversionError> {
        let id = self.new_id("shadow");
        let mut block = Block::new(id.clone(), opcode, Shape::Value).with_field(field, value);
        block.shadow = true;
        self.graph.insert(block)?;
        self.created.push(id.clone());
        Ok(id)
    }

    /// Menu block carrying `arg` in `field`. An expression argument is
    /// returned as the input block, with a menu shadow holding `default`
    /// underneath it.
    pub fn create_field_block(
        &mut self,
        opcode: &str,
        field: &str,
        arg: &Arg,
        default: &str,
    ) -> Result<(BlockId, Option<BlockId>), ConversionError> {
        match arg {
            Arg::Block(id) => {
                let shadow = self.create_shadow(opcode, field, default)?;
                Ok((id.clone(), Some(shadow)))
            }
            Arg::Str(value) | Arg::Sym(value) => Ok((self.create_shadow(opcode, field, value)?, None)),
            other => Err(ConversionError::InvalidArgument {
                method: opcode.to_string(),
                message: format!("{:?} cannot fill the {} menu", other, field),
            }),
        }
    }

    /// Plugs `input_block` into `name`. A shadow plugged in directly doubles
    /// as its own fallback. Statement blocks are refused.
    pub fn add_input(
        &mut self,
        block: &str,
        name: &str,
        input_block: &str,
        shadow: Option<BlockId>,
    ) -> Result<(), ConversionError> {
        self.expect_value(block, name, input_block)?;
        let shadow = match shadow {
            Some(id) => Some(id),
            None if self.graph.require(input_block)?.shadow => Some(input_block.to_string()),
            None => None,
        };
        self.graph.set_input(
            block,
            name,
            Input {
                block: Some(input_block.to_string()),
                shadow,
            },
        )?;
        Ok(())
    }

    /// Numeric socket: a number literal becomes a `shadow_opcode` shadow, an
    /// expression is plugged in over a shadow holding `default`, and anything
    /// else falls back to `default`.
    pub fn add_number_input(
        &mut self,
        block: &str,
        name: &str,
        shadow_opcode: &str,
        arg: &Arg,
        default: f64,
    ) -> Result<(), ConversionError> {
        match arg {
            Arg::Block(id) => {
                let shadow = self.create_shadow(shadow_opcode, "NUM", &format_number(default))?;
                self.add_input(block, name, id, Some(shadow))
            }
            _ => {
                let value = arg.as_number().unwrap_or(default);
                let shadow = self.create_shadow(shadow_opcode, "NUM", &number_text(arg, value))?;
                self.add_input(block, name, &shadow, None)
            }
        }
    }

    pub fn add_text_input(
        &mut self,
        block: &str,
        name: &str,
        arg: &Arg,
        default: &str,
    ) -> Result<(), ConversionError> {
        match arg {
            Arg::Block(id) => {
                let shadow = self.create_shadow("text", "TEXT", default)?;
                self.add_input(block, name, id, Some(shadow))
            }
            Arg::Str(value) => {
                let shadow = self.create_shadow("text", "TEXT", value)?;
                self.add_input(block, name, &shadow, None)
            }
            Arg::Int(_) | Arg::Float(_) => {
                let value = arg.as_number().unwrap_or_default();
                let shadow = self.create_shadow("text", "TEXT", &number_text(arg, value))?;
                self.add_input(block, name, &shadow, None)
            }
            _ => {
                let shadow = self.create_shadow("text", "TEXT", default)?;
                self.add_input(block, name, &shadow, None)
            }
        }
    }

    /// Boolean sockets have no shadow; only a converted block can fill one.
    pub fn add_boolean_input(&mut self, block: &str, name: &str, arg: &Arg) -> Result<(), ConversionError> {
        if let Arg::Block(id) = arg {
            self.add_input(block, name, id, None)?;
        }
        Ok(())
    }

    pub fn add_substack(
        &mut self,
        block: &str,
        name: &str,
        body: Option<&[Node]>,
    ) -> Result<(), ConversionError> {
        let Some(body) = body else {
            return Ok(());
        };
        if let Some(first) = self.convert_body(body)? {
            self.graph.set_input(block, name, Input::block(first))?;
        }
        Ok(())
    }

    pub fn set_next(&mut self, block: &str, next: Option<BlockId>) -> Result<(), ConversionError> {
        self.graph.set_next(block, next)?;
        Ok(())
    }

    fn expect_value(&self, block: &str, input: &str, child: &str) -> Result<(), ConversionError> {
        if self.graph.require(child)?.shape.is_value() {
            return Ok(());
        }
        let method = self
            .graph
            .get(block)
            .map(|b| b.opcode.clone())
            .unwrap_or_else(|| block.to_string());
        Err(ConversionError::StatementInValueSlot {
            method,
            input: input.to_string(),
        })
    }
}

fn number_text(arg: &Arg, value: f64) -> String {
    match arg {
        Arg::Int(v) => v.to_string(),
        _ => format_number(value),
    }
}
