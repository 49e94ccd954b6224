//! Partial updates.
//!
//! A page keeps some of its nodes across requests by sending back their
//! [`NodeRef::serialize`](crate::node::NodeRef::serialize) records. On the next request each
//! record becomes a [`Placeholder`] that can capture new content and queue jQuery
//! statements against the element already in the browser. [`PartialUpdate`] renders
//! everything into a single script payload.

use crate::action::Jq;
use crate::error::{RenderError, RenderResult};
use crate::node::NodeCollection;
use crate::renderer::Renderer;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Stand-in for a node rendered by an earlier request, known only by id and type name
#[derive(Debug, Clone, Deserialize)]
pub struct Placeholder {
    pub id: String,
    pub class_name: String,
    #[serde(skip)]
    variables: IndexMap<String, NodeCollection>,
    #[serde(skip)]
    statements: Vec<Jq>,
}

impl Placeholder {
    pub fn new(id: &str, class_name: &str) -> Self {
        Self {
            id: id.to_string(),
            class_name: class_name.to_string(),
            variables: IndexMap::new(),
            statements: Vec::new(),
        }
    }

    /// Captures `value` for deferred rendering; returns the script variable name.
    pub fn add_variable(&mut self, value: impl Into<Value>) -> String {
        let name = format!("{}_{}", self.id.to_lowercase(), self.variables.len() + 1);
        self.variables
            .insert(name.clone(), NodeCollection::from_value(value));
        name
    }

    /// Selector for the element in the browser
    pub fn jq(&self) -> Jq {
        Jq::by_id(&self.id)
    }

    /// Queues a statement to run after the update's own script.
    pub fn queue(&mut self, statement: Jq) {
        self.statements.push(statement);
    }

    /// Queues `attr('src', src)`, for images and frames.
    pub fn src(&mut self, src: &str) {
        let statement = self.jq().attr("src", src);
        self.queue(statement);
    }

    fn take_variables(&mut self) -> IndexMap<String, NodeCollection> {
        std::mem::take(&mut self.variables)
    }

    fn queued_script(&self) -> String {
        self.statements.iter().map(Jq::to_script).collect()
    }
}

/// Wire payload of a partial update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialResponse {
    pub html: String,
    pub script: String,
    pub data: String,
}

impl PartialResponse {
    pub fn to_json(&self) -> RenderResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Collects everything a partial-update request produces.
pub struct PartialUpdate {
    renderer: Renderer,
    placeholders: IndexMap<String, Placeholder>,
    page_script: Vec<String>,
    items: NodeCollection,
}

impl Default for PartialUpdate {
    fn default() -> Self {
        Self::new(Renderer::new())
    }
}

impl PartialUpdate {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            placeholders: IndexMap::new(),
            page_script: Vec::new(),
            items: NodeCollection::new(),
        }
    }

    /// Restores placeholders from `{"<variable>": {"id": ..., "class_name": ...}}`.
    pub fn keep_variables(mut self, json: &str) -> RenderResult<Self> {
        if json.trim().is_empty() {
            return Ok(self);
        }
        let kept: IndexMap<String, Placeholder> = serde_json::from_str(json)?;
        tracing::debug!(count = kept.len(), "restored placeholders");
        self.placeholders.extend(kept);
        Ok(self)
    }

    pub fn add_placeholder(&mut self, name: &str, placeholder: Placeholder) {
        self.placeholders.insert(name.to_string(), placeholder);
    }

    pub fn placeholder(&self, name: &str) -> Option<&Placeholder> {
        self.placeholders.get(name)
    }

    pub fn placeholder_mut(&mut self, name: &str) -> Option<&mut Placeholder> {
        self.placeholders.get_mut(name)
    }

    /// Adds page-level script. Actions contribute their script form, nodes are
    /// rendered with the update and lists add one statement per element.
    pub fn add_javascript(&mut self, script: impl Into<Value>) -> RenderResult<()> {
        let js = match script.into() {
            Value::Default | Value::None => return Ok(()),
            value @ (Value::Node(_) | Value::Nodes(_)) => {
                self.items.append(value);
                return Ok(());
            }
            Value::List(values) => {
                for value in values {
                    self.add_javascript(value)?;
                }
                return Ok(());
            }
            Value::Action(action) => action.to_script(),
            Value::Str(s) => s,
            other => {
                return Err(RenderError::TypeConflict {
                    operation: "add_javascript",
                    reason: format!("{} is not a script statement", other.kind()),
                })
            }
        };
        let js = js.trim();
        if js.is_empty() {
            return Ok(());
        }
        if js.ends_with(';') {
            self.page_script.push(js.to_string());
        } else {
            self.page_script.push(format!("{};", js));
        }
        Ok(())
    }

    /// Adds nodes whose script (and any captured variables) go into the update.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.append(value);
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Page script, then placeholder variables, then the rendered items' script, then
    /// the statements queued on placeholders.
    pub fn finish(mut self) -> RenderResult<PartialResponse> {
        for placeholder in self.placeholders.values_mut() {
            let variables = placeholder.take_variables();
            self.renderer.render_variables(variables)?;
        }
        self.renderer.render_all(self.items.clone())?;
        self.renderer.flush_variables()?;

        let mut script: String = self.page_script.concat();
        script.push_str(&self.renderer.script());
        for placeholder in self.placeholders.values() {
            script.push_str(&placeholder.queued_script());
        }

        Ok(PartialResponse {
            html: String::new(),
            script,
            data: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::node::Attrs;
    use crate::nodes::{Div, Script, Text};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_placeholder_from_serialized_node() {
        let div = Div::new("x", Attrs::new().id("Div_42")).unwrap();
        let record = serde_json::json!({ "panel": div.serialize() }).to_string();
        let update = PartialUpdate::default().keep_variables(&record).unwrap();
        let placeholder = update.placeholder("panel").unwrap();
        assert_eq!(placeholder.id, "Div_42");
        assert_eq!(placeholder.class_name, "Div");
    }

    #[test]
    fn test_placeholder_variable_names() {
        let mut placeholder = Placeholder::new("Modal_3", "Modal");
        assert_eq!(placeholder.add_variable("a"), "modal_3_1");
        assert_eq!(placeholder.add_variable("b"), "modal_3_2");
    }

    #[test]
    fn test_empty_update() {
        let response = PartialUpdate::default().finish().unwrap();
        assert_eq!(
            response,
            PartialResponse {
                html: String::new(),
                script: String::new(),
                data: String::new(),
            }
        );
        assert_eq!(response.to_json().unwrap(), r#"{"html":"","script":"","data":""}"#);
    }

    #[test]
    fn test_payload_order() {
        let mut update = PartialUpdate::default()
            .keep_variables(r#"{"box": {"id": "Box_1", "class_name": "Div"}}"#)
            .unwrap();
        update.add_javascript("first()").unwrap();
        update.add_javascript(Action::script("second();")).unwrap();

        let placeholder = update.placeholder_mut("box").unwrap();
        let name = placeholder.add_variable(Text::from_display("<i>new</i>"));
        let statement = placeholder.jq().html("");
        placeholder.queue(statement);
        placeholder.src("/img.png");

        update.push(Script::new("third()", Attrs::new()).unwrap());

        let response = update.finish().unwrap();
        assert_eq!(
            response.script,
            format!(
                "first();second();var {0} = \"&lt;i&gt;new&lt;/i&gt;\";\r\nfunction func_{0}(){{}};\r\nthird();$('#Box_1').html(\"\");$('#Box_1').attr(\"src\", \"/img.png\");",
                name
            )
        );
        assert_eq!(response.html, "");
    }

    #[test]
    fn test_add_javascript_accepts_nodes() {
        let mut update = PartialUpdate::default();
        update.add_javascript(Script::new("a()", Attrs::new()).unwrap()).unwrap();
        update.add_javascript(Jq::by_id("x").hide()).unwrap();
        update.add_javascript("   ").unwrap();
        update.add_javascript(Value::None).unwrap();
        let response = update.finish().unwrap();
        assert_eq!(response.script, "$('#x').hide();a();");
    }

    #[test]
    fn test_add_javascript_list_adds_each_statement() {
        let mut update = PartialUpdate::default();
        update.add_javascript(vec!["a()", "b();"]).unwrap();
        let response = update.finish().unwrap();
        assert_eq!(response.script, "a();b();");
    }

    #[test]
    fn test_add_javascript_rejects_scalars() {
        let mut update = PartialUpdate::default();
        let err = update.add_javascript(42i64).unwrap_err();
        assert!(matches!(err, RenderError::TypeConflict { operation: "add_javascript", .. }));
        let err = update.add_javascript(vec![Value::from("ok()"), Value::from(true)]).unwrap_err();
        assert!(matches!(err, RenderError::TypeConflict { .. }));
    }
}
