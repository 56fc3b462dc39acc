mod boost;
mod control;
mod event;
mod math;
mod operators;
mod text;

pub use math::{format_number, number_literal, parse_float};

use crate::blocks::{Block, BlockGraph, BlockId, Shape};
use crate::error::EmitError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Ruby operator precedence. Lower binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Order(pub u8);

impl Order {
    pub const ATOMIC: Order = Order(0);
    pub const COLLECTION: Order = Order(1);
    pub const STRING_CONVERSION: Order = Order(1);
    pub const MEMBER: Order = Order(2);
    pub const FUNCTION_CALL: Order = Order(2);
    pub const INDEX: Order = Order(3);
    pub const EXPONENTIATION: Order = Order(4);
    pub const UNARY_SIGN: Order = Order(5);
    pub const BITWISE_NOT: Order = Order(5);
    pub const MULTIPLICATIVE: Order = Order(6);
    pub const ADDITIVE: Order = Order(7);
    pub const BITWISE_SHIFT: Order = Order(8);
    pub const BITWISE_AND: Order = Order(9);
    pub const BITWISE_XOR: Order = Order(10);
    pub const BITWISE_OR: Order = Order(11);
    pub const RELATIONAL: Order = Order(12);
    pub const LOGICAL_NOT: Order = Order(13);
    pub const LOGICAL_AND: Order = Order(14);
    pub const LOGICAL_OR: Order = Order(15);
    pub const CONDITIONAL: Order = Order(16);
    pub const LAMBDA: Order = Order(17);
    pub const NONE: Order = Order(99);

    /// Whether an expression of order `self` must be wrapped when placed in a
    /// slot that requires `outer`.
    pub fn needs_parens_in(self, outer: Order) -> bool {
        if outer > self {
            return false;
        }
        !(outer == self && (outer == Order::ATOMIC || outer == Order::NONE))
    }
}

pub type EmitterRule = fn(&RubyGenerator<'_>, &Block) -> Result<(String, Order), EmitError>;

#[derive(Clone, Default)]
pub struct EmitterRegistry {
    rules: HashMap<String, EmitterRule>,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in rule module installed.
    pub fn with_default_rules() -> Self {
        let mut registry = Self::new();
        math::install(&mut registry);
        text::install(&mut registry);
        operators::install(&mut registry);
        control::install(&mut registry);
        event::install(&mut registry);
        boost::install(&mut registry);
        registry
    }

    /// Installs `rule` for `opcode`, replacing any earlier rule.
    pub fn register(&mut self, opcode: &str, rule: EmitterRule) {
        self.rules.insert(opcode.to_string(), rule);
    }

    pub fn register_aliases(&mut self, opcodes: &[&str], rule: EmitterRule) {
        for opcode in opcodes {
            self.register(opcode, rule);
        }
    }

    pub fn get(&self, opcode: &str) -> Option<EmitterRule> {
        self.rules.get(opcode).copied()
    }

    pub fn contains(&self, opcode: &str) -> bool {
        self.rules.contains_key(opcode)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Process-wide registry, built on first use and read-only afterwards.
pub fn default_registry() -> &'static EmitterRegistry {
    static REGISTRY: OnceLock<EmitterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(EmitterRegistry::with_default_rules)
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub indent: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

pub struct RubyGenerator<'a> {
    graph: &'a BlockGraph,
    registry: &'a EmitterRegistry,
    options: GeneratorOptions,
    // Blocks whose rule is currently running, outermost first.
    active: RefCell<Vec<BlockId>>,
}

impl<'a> RubyGenerator<'a> {
    pub fn new(graph: &'a BlockGraph) -> Self {
        Self::with_registry(graph, default_registry())
    }

    pub fn with_registry(graph: &'a BlockGraph, registry: &'a EmitterRegistry) -> Self {
        Self {
            graph,
            registry,
            options: GeneratorOptions::default(),
            active: RefCell::new(Vec::new()),
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn graph(&self) -> &'a BlockGraph {
        self.graph
    }

    pub fn emit(&self, block: &Block) -> Result<(String, Order), EmitError> {
        let rule = self
            .registry
            .get(&block.opcode)
            .ok_or_else(|| EmitError::UnknownOpcode {
                opcode: block.opcode.clone(),
                block_id: block.id.clone(),
            })?;
        if self.active.borrow().contains(&block.id) {
            return Err(EmitError::Cycle {
                block_id: block.id.clone(),
            });
        }
        tracing::debug!(opcode = %block.opcode, block = %block.id, "emitting");
        self.active.borrow_mut().push(block.id.clone());
        let emitted = rule(self, block);
        self.active.borrow_mut().pop();
        emitted
    }

    /// Code for the value plugged into `name`, parenthesized for a slot of
    /// order `outer`. `None` when nothing is connected.
    pub fn value_to_code(
        &self,
        block: &Block,
        name: &str,
        outer: Order,
    ) -> Result<Option<String>, EmitError> {
        let Some(child) = self.graph.input_block(block, name) else {
            return Ok(None);
        };
        let (code, inner) = self.emit(child)?;
        if code.is_empty() {
            return Ok(None);
        }
        if inner.needs_parens_in(outer) {
            Ok(Some(format!("({})", code)))
        } else {
            Ok(Some(code))
        }
    }

    pub fn value_or(
        &self,
        block: &Block,
        name: &str,
        outer: Order,
        default: &str,
    ) -> Result<String, EmitError> {
        Ok(self
            .value_to_code(block, name, outer)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Indented code for the statement chain hanging from a substack input.
    pub fn statement_to_code(&self, block: &Block, name: &str) -> Result<String, EmitError> {
        match self.graph.input_block(block, name) {
            Some(child) => Ok(self.indent(&self.block_to_code(child)?)),
            None => Ok(String::new()),
        }
    }

    /// Indented code for everything after `block`. Used by hat blocks, which
    /// wrap the rest of their script.
    pub fn next_to_code(&self, block: &Block) -> Result<String, EmitError> {
        let Some(next_id) = block.next.as_deref() else {
            return Ok(String::new());
        };
        let next = self.graph.require(next_id)?;
        Ok(self.indent(&self.block_to_code(next)?))
    }

    /// Code for `start` and every block chained after it.
    pub fn block_to_code(&self, start: &Block) -> Result<String, EmitError> {
        let mut code = String::new();
        for block in self.graph.chain(&start.id) {
            let (fragment, _) = self.emit(block)?;
            code.push_str(&fragment);
            if !code.ends_with('\n') {
                code.push('\n');
            }
            // The hat's rule already consumed the rest of the chain.
            if block.shape == Shape::Hat {
                break;
            }
        }
        Ok(code)
    }

    pub fn script_to_code(&self, top_id: &str) -> Result<String, EmitError> {
        let top = self.graph.require(top_id)?;
        self.block_to_code(top)
    }

    /// Every script in the graph, top to bottom. A script that cannot be
    /// emitted becomes a comment so the rest of the program survives.
    pub fn workspace_to_code(&self) -> String {
        let mut scripts = Vec::new();
        for id in self.graph.top_level_ids() {
            match self.script_to_code(&id) {
                Ok(code) => scripts.push(code),
                Err(err) => {
                    tracing::warn!(script = %id, error = %err, "script skipped");
                    scripts.push(comment_lines(&err.to_string()));
                }
            }
        }
        scripts.join("\n")
    }

    fn indent(&self, code: &str) -> String {
        let mut out = String::with_capacity(code.len());
        for line in code.split_inclusive('\n') {
            if line.trim().is_empty() {
                out.push_str(line);
            } else {
                out.push_str(&self.options.indent);
                out.push_str(line);
            }
        }
        out
    }
}

fn comment_lines(message: &str) -> String {
    message.lines().map(|line| format!("# {}\n", line)).collect()
}

/// Double-quoted Ruby string literal.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '#' if matches!(chars.peek(), Some(&'{') | Some(&'$') | Some(&'@')) => out.push_str("\\#"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn parenthesizes_looser_children() {
        let mut graph = BlockGraph::new();
        number(&mut graph, "one", "1");
        number(&mut graph, "two", "2");
        number(&mut graph, "three", "3");
        reporter(&mut graph, "add", "operator_add", &[("NUM1", "one"), ("NUM2", "two")]);
        reporter(&mut graph, "mul", "operator_multiply", &[("NUM1", "add"), ("NUM2", "three")]);
        let gen = RubyGenerator::new(&graph);
        let (code, order) = gen.emit(graph.get("mul").unwrap()).unwrap();
        assert_eq!(code, "(1 + 2) * 3");
        assert_eq!(order, Order::MULTIPLICATIVE);
    }

    #[test]
    fn keeps_tighter_children_bare() {
        let mut graph = BlockGraph::new();
        number(&mut graph, "one", "1");
        number(&mut graph, "two", "2");
        number(&mut graph, "three", "3");
        reporter(&mut graph, "mul", "operator_multiply", &[("NUM1", "two"), ("NUM2", "three")]);
        reporter(&mut graph, "add", "operator_add", &[("NUM1", "one"), ("NUM2", "mul")]);
        let gen = RubyGenerator::new(&graph);
        assert_eq!(gen.emit(graph.get("add").unwrap()).unwrap().0, "1 + 2 * 3");
    }

    #[test]
    fn unknown_opcode_is_reported() {
        let mut graph = BlockGraph::new();
        statement(&mut graph, "s", "looks_nosuchthing", &[]);
        let gen = RubyGenerator::new(&graph);
        let err = gen.emit(graph.get("s").unwrap()).unwrap_err();
        assert_eq!(
            err,
            EmitError::UnknownOpcode {
                opcode: "looks_nosuchthing".to_string(),
                block_id: "s".to_string()
            }
        );
    }

    #[test]
    fn workspace_keeps_going_after_a_failed_script() {
        let mut graph = BlockGraph::new();
        number(&mut graph, "secs", "2");
        statement(&mut graph, "bad", "looks_nosuchthing", &[]);
        statement(&mut graph, "good", "control_wait", &[("DURATION", "secs")]);
        {
            let bad = graph.get_mut("bad").unwrap();
            bad.top_level = true;
            bad.y = 0;
        }
        {
            let good = graph.get_mut("good").unwrap();
            good.top_level = true;
            good.y = 100;
        }
        let code = RubyGenerator::new(&graph).workspace_to_code();
        assert_eq!(
            code,
            "# no Ruby emitter is registered for opcode 'looks_nosuchthing' (block bad)\n\nsleep(2)\n"
        );
    }

    #[test]
    fn re_registration_overwrites() {
        fn shout(_: &RubyGenerator<'_>, _: &Block) -> Result<(String, Order), EmitError> {
            Ok(("SHOUT".to_string(), Order::ATOMIC))
        }
        let mut registry = EmitterRegistry::with_default_rules();
        let before = registry.len();
        registry.register("math_number", shout);
        math::install(&mut registry);
        registry.register("math_number", shout);
        assert_eq!(registry.len(), before);

        let mut graph = BlockGraph::new();
        number(&mut graph, "n", "4");
        let gen = RubyGenerator::with_registry(&graph, &registry);
        assert_eq!(gen.emit(graph.get("n").unwrap()).unwrap().0, "SHOUT");
    }

    #[test]
    fn order_parenthesization_rule() {
        assert!(Order::ADDITIVE.needs_parens_in(Order::MULTIPLICATIVE));
        assert!(Order::ADDITIVE.needs_parens_in(Order::ADDITIVE));
        assert!(!Order::MULTIPLICATIVE.needs_parens_in(Order::ADDITIVE));
        assert!(!Order::ATOMIC.needs_parens_in(Order::ATOMIC));
        assert!(!Order::NONE.needs_parens_in(Order::NONE));
        assert!(!Order::RELATIONAL.needs_parens_in(Order::NONE));
    }

    fn top_level(graph: &mut BlockGraph, id: &str, y: i64) {
        let block = graph.get_mut(id).unwrap();
        block.top_level = true;
        block.y = y;
    }

    #[test]
    fn substack_cycle_becomes_a_comment() {
        let mut graph = BlockGraph::from_json(&serde_json::json!({
            "a": {"opcode": "control_forever", "next": null, "parent": null,
                  "inputs": {"SUBSTACK": [2, "a"]}, "fields": {},
                  "shadow": false, "topLevel": true, "x": 0, "y": 0}
        }))
        .unwrap();
        number(&mut graph, "secs", "2");
        statement(&mut graph, "good", "control_wait", &[("DURATION", "secs")]);
        top_level(&mut graph, "good", 100);
        assert_eq!(
            RubyGenerator::new(&graph).workspace_to_code(),
            "# block 'a' is its own ancestor\n\nsleep(2)\n"
        );
    }

    #[test]
    fn value_input_cycle_is_an_error() {
        let mut graph = BlockGraph::new();
        reporter(&mut graph, "add", "operator_add", &[("NUM1", "add")]);
        let gen = RubyGenerator::new(&graph);
        let err = gen.emit(graph.get("add").unwrap()).unwrap_err();
        assert_eq!(
            err,
            EmitError::Cycle {
                block_id: "add".to_string()
            }
        );
        number(&mut graph, "n", "1");
        let gen = RubyGenerator::new(&graph);
        assert_eq!(gen.emit(graph.get("n").unwrap()).unwrap().0, "1");
    }

    #[test]
    fn failure_comment_covers_every_line() {
        let mut graph = BlockGraph::new();
        statement(&mut graph, "x", "looks_evil\nsystem(\"rm -rf ~\")\n", &[]);
        top_level(&mut graph, "x", 0);
        let code = RubyGenerator::new(&graph).workspace_to_code();
        assert!(code.contains("# system("), "{code}");
        assert!(code.lines().all(|line| line.starts_with("# ")), "{code}");
    }

    #[test]
    fn loose_reporter_ends_its_line() {
        let mut graph = BlockGraph::new();
        number(&mut graph, "one", "1");
        number(&mut graph, "two", "2");
        statement(&mut graph, "sum", "operator_add", &[("NUM1", "one"), ("NUM2", "two")]);
        top_level(&mut graph, "sum", 0);
        assert_eq!(RubyGenerator::new(&graph).workspace_to_code(), "1 + 2\n");
    }

    #[test]
    fn quotes_ruby_strings() {
        assert_eq!(quote_string("A"), "\"A\"");
        assert_eq!(quote_string("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(quote_string("#{x} #1"), "\"\\#{x} #1\"");
    }
}
