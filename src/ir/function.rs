//! Programs, functions, and constant data segments.

use super::instruction::Instr;
use indexmap::IndexMap;
use std::fmt;

/// A complete parsed Vapor program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Constant data segments, in declaration order.
    pub segments: Vec<DataSegment>,
    /// Functions, in declaration order.
    pub functions: Vec<Function>,
}

/// A constant data segment: a name plus ordered static values.
#[derive(Debug, Clone)]
pub struct DataSegment {
    pub name: String,
    pub values: Vec<DataValue>,
}

/// A static value inside a data segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    Int(i64),
    Label(String),
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Int(value) => write!(f, "{value}"),
            DataValue::Label(name) => write!(f, ":{name}"),
        }
    }
}

/// One Vapor function: an identifier, ordered parameters, a flat instruction
/// list, and a label table mapping names to instruction indices.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Instr>,
    /// Label name -> instruction index. Declaration order is preserved so
    /// labels sharing an index print in source order.
    pub labels: IndexMap<String, usize>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: Vec::new(),
            labels: IndexMap::new(),
        }
    }

    /// Resolve a label to its instruction index.
    pub fn resolve_label(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    /// Labels bound to the given instruction index, in declaration order.
    pub fn labels_at(&self, index: usize) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, &i)| i == index)
            .map(|(name, _)| name.as_str())
    }
}
