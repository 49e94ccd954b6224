use crate::action::{Action, Jq};
use crate::node::{NodeCollection, NodeRef};
use std::fmt;

/// A raw value handed to a node constructor, before conversion.
///
/// `Default` is the "not supplied" marker: a constructor substitutes its own
/// default for it, and collections ignore it.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Default,
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Node(NodeRef),
    Nodes(NodeCollection),
    Action(Action),
}

impl Value {
    pub fn is_default(&self) -> bool {
        matches!(self, Value::Default)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Truthiness in the usual dynamic-language sense: empty and zero values are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Default | Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Node(_) => true,
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::Action(action) => action.is_some(),
        }
    }

    /// Name of the variant, used in conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Default => "default",
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Node(_) => "node",
            Value::Nodes(_) => "nodes",
            Value::Action(_) => "action",
        }
    }

    fn fmt_item(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "'{}'", s),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Default | Value::None => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_item(f)?;
                }
                write!(f, "]")
            }
            Value::Node(node) => write!(f, "{}", node),
            Value::Nodes(nodes) => write!(f, "{}", nodes),
            Value::Action(action) => write!(f, "{}", action),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<NodeRef> for Value {
    fn from(node: NodeRef) -> Self {
        Value::Node(node)
    }
}

impl From<&NodeRef> for Value {
    fn from(node: &NodeRef) -> Self {
        Value::Node(node.clone())
    }
}

impl From<NodeCollection> for Value {
    fn from(nodes: NodeCollection) -> Self {
        Value::Nodes(nodes)
    }
}

impl From<&NodeCollection> for Value {
    fn from(nodes: &NodeCollection) -> Self {
        Value::Nodes(nodes.clone())
    }
}

impl From<Action> for Value {
    fn from(action: Action) -> Self {
        Value::Action(action)
    }
}

impl From<Jq> for Value {
    fn from(jq: Jq) -> Self {
        Value::Action(jq.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::None)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Default.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from(Vec::<Value>::new()).is_truthy());
        assert!(!Value::from(Action::None).is_truthy());
        assert!(Value::from("false").is_truthy());
        assert!(Value::from(0.5).is_truthy());
        assert!(Value::from(vec![0]).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(123).to_string(), "123");
        assert_eq!(Value::from(vec![123]).to_string(), "[123]");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "['a', 'b']");
        assert_eq!(Value::None.to_string(), "");
    }

    #[test]
    fn test_option_conversion() {
        assert!(Value::from(None::<&str>).is_none());
        assert_eq!(Value::from(Some("x")).to_string(), "x");
    }
}
