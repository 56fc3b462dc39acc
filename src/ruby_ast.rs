//! Call tree as serialized by the external Ruby parser.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Nil,
    True,
    False,
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Str {
        value: String,
    },
    Sym {
        value: String,
    },
    #[serde(rename = "self")]
    SelfRef,
    Lvar {
        name: String,
    },
    Const {
        name: String,
    },
    Send(SendExpression),
    If {
        cond: Box<Node>,
        #[serde(rename = "then", default)]
        then_body: Vec<Node>,
        #[serde(rename = "else", default)]
        else_body: Option<Vec<Node>>,
    },
}

/// One method call: `receiver.name(args) do |params| body end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendExpression {
    #[serde(default)]
    pub receiver: Option<Box<Node>>,
    pub name: String,
    #[serde(default)]
    pub args: Vec<Node>,
    #[serde(default)]
    pub block: Option<RubyBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RubyBlock {
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub body: Vec<Node>,
}

impl SendExpression {
    pub fn new(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self {
            receiver: None,
            name: name.into(),
            args,
            block: None,
        }
    }

    pub fn on(mut self, receiver: Node) -> Self {
        self.receiver = Some(Box::new(receiver));
        self
    }

    pub fn with_block(mut self, params: Vec<String>, body: Vec<Node>) -> Self {
        self.block = Some(RubyBlock { params, body });
        self
    }
}

impl Node {
    pub fn int(value: i64) -> Self {
        Node::Int { value }
    }

    pub fn float(value: f64) -> Self {
        Node::Float { value }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Node::Str {
            value: value.into(),
        }
    }

    pub fn sym(value: impl Into<String>) -> Self {
        Node::Sym {
            value: value.into(),
        }
    }

    pub fn lvar(name: impl Into<String>) -> Self {
        Node::Lvar { name: name.into() }
    }

    pub fn send(expr: SendExpression) -> Self {
        Node::Send(expr)
    }

    /// Short human-readable label used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Node::Nil => "nil".to_string(),
            Node::True => "true".to_string(),
            Node::False => "false".to_string(),
            Node::Int { value } => value.to_string(),
            Node::Float { value } => value.to_string(),
            Node::Str { value } => format!("{:?}", value),
            Node::Sym { value } => format!(":{}", value),
            Node::SelfRef => "self".to_string(),
            Node::Lvar { name } | Node::Const { name } => name.clone(),
            Node::Send(send) => match &send.receiver {
                Some(receiver) => format!("{}.{}", receiver.describe(), send.name),
                None => send.name.clone(),
            },
            Node::If { .. } => "if".to_string(),
        }
    }
}
