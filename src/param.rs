//! Conversion rules applied to constructor arguments.
//!
//! Every node field is converted by exactly one rule when the node is built, so the
//! node always holds a canonical value no matter what the caller passed in.

use crate::action::Action;
use crate::enumeration::Enumeration;
use crate::error::{RenderError, RenderResult};
use crate::escape::{escape_html, quote_url};
use crate::node::{Node, NodeBase, NodeCollection, NodeRef};
use crate::value::Value;
use std::marker::PhantomData;

/// A conversion rule from a raw [`Value`] to a canonical field value
pub trait Converter {
    type Output;

    /// Rule name reported in conversion errors
    fn rule(&self) -> &'static str;

    fn convert(&self, value: Value, owner: &NodeBase) -> RenderResult<Self::Output>;
}

/// HTML-escaped text. `None` becomes the empty string.
pub struct StringParam;

impl Converter for StringParam {
    type Output = String;

    fn rule(&self) -> &'static str {
        "string"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<String> {
        Ok(escape_html(&value.to_string()))
    }
}

/// Unescaped text. Be careful: the result is emitted verbatim.
pub struct RawParam;

impl Converter for RawParam {
    type Output = String;

    fn rule(&self) -> &'static str {
        "raw"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<String> {
        Ok(value.to_string())
    }
}

/// Truthiness, except that the strings "false", "none" and "0" (any case) are false.
pub struct BooleanParam;

impl Converter for BooleanParam {
    type Output = bool;

    fn rule(&self) -> &'static str {
        "boolean"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<bool> {
        if let Value::Str(s) = &value {
            if matches!(s.to_lowercase().as_str(), "false" | "none" | "0") {
                return Ok(false);
            }
        }
        Ok(value.is_truthy())
    }
}

pub struct IntegerParam;

impl Converter for IntegerParam {
    type Output = Option<i64>;

    fn rule(&self) -> &'static str {
        "integer"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<Option<i64>> {
        match value {
            Value::Default | Value::None => Ok(None),
            Value::Int(i) => Ok(Some(i)),
            Value::Bool(b) => Ok(Some(i64::from(b))),
            Value::Float(f) if f.is_finite() => {
                let whole = f.trunc();
                // i64::MAX as f64 rounds up to 2^63, which is already out of range
                if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
                    return Err(RenderError::conversion(self.rule(), f, "out of range"));
                }
                Ok(Some(whole as i64))
            }
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|e| RenderError::conversion(self.rule(), format!("'{}'", s), e.to_string())),
            other => Err(RenderError::conversion(
                self.rule(),
                other.kind(),
                "not a number",
            )),
        }
    }
}

pub struct FloatParam;

impl Converter for FloatParam {
    type Output = Option<f64>;

    fn rule(&self) -> &'static str {
        "float"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<Option<f64>> {
        match value {
            Value::Default | Value::None => Ok(None),
            Value::Float(f) => Ok(Some(f)),
            Value::Int(i) => Ok(Some(i as f64)),
            Value::Bool(b) => Ok(Some(if b { 1.0 } else { 0.0 })),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|e| RenderError::conversion(self.rule(), format!("'{}'", s), e.to_string())),
            other => Err(RenderError::conversion(
                self.rule(),
                other.kind(),
                "not a number",
            )),
        }
    }
}

/// Normalises to a list: `None` is empty, lists pass through, collections are
/// materialised and anything else becomes a one-element list.
pub struct ListParam;

impl Converter for ListParam {
    type Output = Vec<Value>;

    fn rule(&self) -> &'static str {
        "list"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<Vec<Value>> {
        Ok(match value {
            Value::Default | Value::None => Vec::new(),
            Value::List(items) => items,
            Value::Nodes(nodes) => nodes.nodes().into_iter().map(Value::Node).collect(),
            other => vec![other],
        })
    }
}

/// Shared shape of the three action rules: falsy → no action, actions pass through,
/// everything else is stringified and wrapped.
fn wrap_action(value: Value, wrap: impl FnOnce(String) -> Action) -> Action {
    if !value.is_truthy() {
        return Action::None;
    }
    match value {
        Value::Action(action) => action,
        other => wrap(other.to_string()),
    }
}

/// Values are taken to be URLs
pub struct UrlParam;

impl Converter for UrlParam {
    type Output = Action;

    fn rule(&self) -> &'static str {
        "url"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<Action> {
        Ok(wrap_action(value, |s| Action::url(&s)))
    }
}

/// Values are taken to be JavaScript
pub struct JavascriptParam;

impl Converter for JavascriptParam {
    type Output = Action;

    fn rule(&self) -> &'static str {
        "javascript"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<Action> {
        Ok(wrap_action(value, Action::Script))
    }
}

/// Values are taken to be server-side action names
pub struct ActionParam;

impl Converter for ActionParam {
    type Output = Action;

    fn rule(&self) -> &'static str {
        "action"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<Action> {
        Ok(wrap_action(value, Action::server))
    }
}

/// URL-quoted query string text
pub struct QueryStringParam;

impl Converter for QueryStringParam {
    type Output = String;

    fn rule(&self) -> &'static str {
        "query_string"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<String> {
        Ok(quote_url(&value.to_string()))
    }
}

/// HTML-escaped text for use inside a CSS attribute value
pub struct CssAttributeParam;

impl Converter for CssAttributeParam {
    type Output = String;

    fn rule(&self) -> &'static str {
        "css_attribute"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<String> {
        Ok(escape_html(&value.to_string()))
    }
}

/// Wraps the value in a [`NodeCollection`] owned by the node being built.
pub struct NodesParam;

impl Converter for NodesParam {
    type Output = NodeCollection;

    fn rule(&self) -> &'static str {
        "nodes"
    }

    fn convert(&self, value: Value, owner: &NodeBase) -> RenderResult<NodeCollection> {
        let collection = NodeCollection::from_value(value);
        collection.set_owner(owner);
        Ok(collection)
    }
}

/// Accepts `None` or a node of type `T`.
pub struct NodeParam<T>(PhantomData<T>);

impl<T> NodeParam<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for NodeParam<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Node> Converter for NodeParam<T> {
    type Output = Option<NodeRef>;

    fn rule(&self) -> &'static str {
        "node"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<Option<NodeRef>> {
        match value {
            Value::Default | Value::None => Ok(None),
            Value::Node(node) if node.is::<T>() => Ok(Some(node)),
            other => Err(RenderError::conversion(
                self.rule(),
                other.kind(),
                format!("parameter not of class {}", crate::node::short_type_name::<T>()),
            )),
        }
    }
}

/// Symbolic name or integer of an [`Enumeration`]
pub struct EnumParam(pub &'static Enumeration);

impl Converter for EnumParam {
    type Output = Option<i64>;

    fn rule(&self) -> &'static str {
        "enumeration"
    }

    fn convert(&self, value: Value, _owner: &NodeBase) -> RenderResult<Option<i64>> {
        match value {
            Value::Default | Value::None => Ok(None),
            Value::Int(i) => Ok(Some(i)),
            other => {
                let text = other.to_string();
                self.0.from_str(&text).map(Some).ok_or_else(|| {
                    RenderError::conversion(
                        self.rule(),
                        format!("'{}'", text),
                        format!("parameter isn't of type {}", self.0.type_name()),
                    )
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Attrs;
    use crate::nodes::Text;
    use pretty_assertions::assert_eq;

    const XSS_OPEN_BRACKET_VARIATIONS: &[&str] = &[
        "<", "&lt", "&lt;", "&LT", "&LT;", "&#60", "&#060", "&#0060", "&#00060", "&#000060",
        "&#0000060", "&#60;", "&#060;", "&#0060;", "&#00060;", "&#000060;", "&#0000060;",
        "&#x3c", "&#x03c", "&#x003c", "&#x0003c", "&#x00003c", "&#x000003c", "&#x3c;",
        "&#x03c;", "&#x003c;", "&#x0003c;", "&#x00003c;", "&#x000003c;", "&#X3c", "&#X03c",
        "&#X003c", "&#X0003c", "&#X00003c", "&#X000003c", "&#X3c;", "&#X03c;", "&#X003c;",
        "&#X0003c;", "&#X00003c;", "&#X000003c;", "&#x3C", "&#x03C", "&#x003C", "&#x0003C",
        "&#x00003C", "&#x000003C", "&#x3C;", "&#x03C;", "&#x003C;", "&#x0003C;", "&#x00003C;",
        "&#x000003C;", "&#X3C", "&#X03C", "&#X003C", "&#X0003C", "&#X00003C", "&#X000003C",
        "&#X3C;", "&#X03C;", "&#X003C;", "&#X0003C;", "&#X00003C;", "&#X000003C;",
    ];

    fn owner() -> NodeBase {
        NodeBase::named("Owner", Attrs::new())
    }

    #[test]
    fn test_string_param() {
        let o = owner();
        assert_eq!(StringParam.convert(Value::None, &o).unwrap(), "");
        assert_eq!(StringParam.convert("Test".into(), &o).unwrap(), "Test");
        assert_eq!(StringParam.convert(123.into(), &o).unwrap(), "123");
        assert_eq!(StringParam.convert(vec![123].into(), &o).unwrap(), "[123]");
        assert_eq!(StringParam.convert("<b>".into(), &o).unwrap(), "&lt;b&gt;");
    }

    #[test]
    fn test_string_param_escapes_xss() {
        let o = owner();
        for text in XSS_OPEN_BRACKET_VARIATIONS {
            assert_ne!(StringParam.convert((*text).into(), &o).unwrap(), *text);
        }
    }

    #[test]
    fn test_raw_param() {
        let o = owner();
        assert_eq!(RawParam.convert(Value::None, &o).unwrap(), "");
        assert_eq!(RawParam.convert("<b>x</b>".into(), &o).unwrap(), "<b>x</b>");
        assert_eq!(RawParam.convert(1.5.into(), &o).unwrap(), "1.5");
    }

    #[test]
    fn test_boolean_param() {
        let o = owner();
        for falsy in ["false", "None", "0", "FALSE", "nOnE"] {
            assert!(!BooleanParam.convert(falsy.into(), &o).unwrap(), "{}", falsy);
        }
        assert!(!BooleanParam.convert(Value::None, &o).unwrap());
        assert!(!BooleanParam.convert("".into(), &o).unwrap());
        assert!(!BooleanParam.convert(0.into(), &o).unwrap());
        assert!(BooleanParam.convert("1".into(), &o).unwrap());
        assert!(BooleanParam.convert("yes".into(), &o).unwrap());
        assert!(BooleanParam.convert(1.into(), &o).unwrap());
        assert!(BooleanParam.convert(vec!["x"].into(), &o).unwrap());
    }

    #[test]
    fn test_integer_param() {
        let o = owner();
        assert_eq!(IntegerParam.convert(Value::None, &o).unwrap(), None);
        assert_eq!(IntegerParam.convert(" 42 ".into(), &o).unwrap(), Some(42));
        assert_eq!(IntegerParam.convert(3.9.into(), &o).unwrap(), Some(3));
        let err = IntegerParam.convert("abc".into(), &o).unwrap_err();
        assert!(matches!(err, RenderError::Conversion { rule: "integer", .. }));
        let err = IntegerParam.convert(vec![1].into(), &o).unwrap_err();
        assert!(matches!(err, RenderError::Conversion { rule: "integer", .. }));
    }

    #[test]
    fn test_integer_param_out_of_range() {
        let o = owner();
        for value in [1e300, -1e300, 9.3e18] {
            let err = IntegerParam.convert(Value::Float(value), &o).unwrap_err();
            assert!(matches!(err, RenderError::Conversion { rule: "integer", .. }));
        }
        let err = IntegerParam.convert("1e300".into(), &o).unwrap_err();
        assert!(matches!(err, RenderError::Conversion { rule: "integer", .. }));
        assert_eq!(IntegerParam.convert(Value::Float(-9.0e18), &o).unwrap(), Some(-9_000_000_000_000_000_000));
    }

    #[test]
    fn test_float_param() {
        let o = owner();
        assert_eq!(FloatParam.convert(Value::None, &o).unwrap(), None);
        assert_eq!(FloatParam.convert("2.5".into(), &o).unwrap(), Some(2.5));
        assert_eq!(FloatParam.convert(2.into(), &o).unwrap(), Some(2.0));
        assert!(matches!(
            FloatParam.convert("x1".into(), &o),
            Err(RenderError::Conversion { rule: "float", .. })
        ));
    }

    #[test]
    fn test_list_param() {
        let o = owner();
        assert!(ListParam.convert(Value::None, &o).unwrap().is_empty());
        assert_eq!(ListParam.convert(vec![1, 2].into(), &o).unwrap().len(), 2);
        let single = ListParam.convert("abc".into(), &o).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].to_string(), "abc");
        let nodes = NodeCollection::from_value(vec!["a", "b"]);
        assert_eq!(ListParam.convert(nodes.into(), &o).unwrap().len(), 2);
    }

    #[test]
    fn test_action_params() {
        let o = owner();
        assert_eq!(UrlParam.convert("".into(), &o).unwrap(), Action::None);
        assert_eq!(UrlParam.convert(Value::None, &o).unwrap(), Action::None);
        assert_eq!(
            UrlParam.convert("/a b".into(), &o).unwrap(),
            Action::Url("/a%20b".to_string())
        );
        assert_eq!(
            UrlParam.convert(Action::script("x()").into(), &o).unwrap(),
            Action::script("x()")
        );
        assert_eq!(UrlParam.convert(5.into(), &o).unwrap(), Action::Url("5".to_string()));
        assert_eq!(
            JavascriptParam.convert("go()".into(), &o).unwrap(),
            Action::script("go()")
        );
        assert_eq!(ActionParam.convert("save".into(), &o).unwrap(), Action::server("save"));
        assert_eq!(ActionParam.convert(0.into(), &o).unwrap(), Action::None);
    }

    #[test]
    fn test_query_string_and_css_params() {
        let o = owner();
        assert_eq!(QueryStringParam.convert(Value::None, &o).unwrap(), "");
        assert_eq!(QueryStringParam.convert("a b".into(), &o).unwrap(), "a%20b");
        assert_eq!(
            CssAttributeParam.convert("\"red\"".into(), &o).unwrap(),
            "&quot;red&quot;"
        );
    }

    #[test]
    fn test_nodes_param_sets_owner() {
        let holder = Text::from_display("holder");
        let collection = NodesParam.convert(vec![123, 456].into(), holder.base()).unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.owner().unwrap().ptr_eq(&holder));

        let existing = NodeCollection::from_value("Test");
        let converted = NodesParam.convert(existing.clone().into(), holder.base()).unwrap();
        assert!(converted.ptr_eq(&existing));

        let empty = NodesParam.convert(vec![Value::None, Value::None].into(), holder.base()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_node_param() {
        let o = owner();
        let text = Text::from_display("a");
        assert!(NodeParam::<Text>::new().convert(text.into(), &o).unwrap().is_some());
        assert!(NodeParam::<Text>::new().convert(Value::None, &o).unwrap().is_none());
        assert!(matches!(
            NodeParam::<Text>::new().convert("a".into(), &o),
            Err(RenderError::Conversion { rule: "node", .. })
        ));
    }

    #[test]
    fn test_param_default_marker() {
        let o = owner();
        assert_eq!(o.param(3.into(), Value::Default, &StringParam).unwrap(), "3");
        assert_eq!(o.param(Value::Default, 3.into(), &StringParam).unwrap(), "3");
        assert_eq!(o.param(Value::Default, Value::Default, &StringParam).unwrap(), "");
        assert_eq!(
            o.optional_param(Value::Default, Value::Default, &BooleanParam).unwrap(),
            None
        );
        assert_eq!(
            o.optional_param("0".into(), Value::Default, &BooleanParam).unwrap(),
            Some(false)
        );
    }
}
