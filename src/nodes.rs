//! Built-in nodes.
//!
//! A deliberately small set: plain and raw text, script, a generic container, links,
//! headings and a form with text fields. Applications define their own nodes the same way.

use crate::action::Action;
use crate::enumeration::QUICK_FLOAT;
use crate::error::{RenderError, RenderResult};
use crate::escape::escape_html;
use crate::node::{Attrs, Node, NodeBase, NodeCollection, NodeRef};
use crate::param::{
    BooleanParam, EnumParam, IntegerParam, JavascriptParam, NodesParam, RawParam, StringParam,
    UrlParam,
};
use crate::renderer::Renderer;
use crate::resources::ResourceKind;
use crate::value::Value;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;

const VALIDATOR_SCRIPT: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/1000hz-bootstrap-validator/0.10.1/validator.min.js";

/// ` name="value"`, or nothing when the value is empty
fn attr(name: &str, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!(" {}=\"{}\"", name, value)
    }
}

/// Plain text, HTML-escaped at construction.
pub struct Text {
    base: NodeBase,
    text: String,
}

impl Text {
    pub fn new(text: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        let base = NodeBase::new::<Self>(attrs);
        let text = base.param(text.into(), Value::from(""), &StringParam)?;
        Ok(NodeRef::new(Self { base, text }))
    }

    /// Text node from anything printable; used when collections wrap scalars.
    pub fn from_display(value: impl fmt::Display) -> NodeRef {
        NodeRef::new(Self {
            base: NodeBase::new::<Self>(Attrs::new()),
            text: escape_html(&value.to_string()),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Node for Text {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        renderer.append(&self.text);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Markup emitted verbatim. Never feed it user input.
pub struct Raw {
    base: NodeBase,
    text: String,
}

impl Raw {
    pub fn new(text: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        let base = NodeBase::new::<Self>(attrs);
        let text = base.param(text.into(), Value::from(""), &RawParam)?;
        Ok(NodeRef::new(Self { base, text }))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Node for Raw {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        renderer.append(&self.text);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Contributes a script statement and no markup.
pub struct Script {
    base: NodeBase,
    script: Action,
}

impl Script {
    pub fn new(script: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        let base = NodeBase::new::<Self>(attrs);
        let script = base.param(script.into(), Value::Default, &JavascriptParam)?;
        Ok(NodeRef::new(Self { base, script }))
    }
}

impl Node for Script {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        let js = self.script.to_script();
        if !js.trim().is_empty() {
            renderer.append_script(&js);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A `<div>` around arbitrary items.
pub struct Div {
    base: NodeBase,
    items: NodeCollection,
}

impl Div {
    pub fn new(items: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        Self::build(items, Value::Default, Value::Default, attrs)
    }

    /// `quick_float` is a [`QUICK_FLOAT`] name or value; `centered` adds `center-box`.
    pub fn build(
        items: impl Into<Value>,
        quick_float: impl Into<Value>,
        centered: impl Into<Value>,
        attrs: Attrs,
    ) -> RenderResult<NodeRef> {
        let base = NodeBase::new::<Self>(attrs);
        let items = base.param(items.into(), Value::Default, &NodesParam)?;
        let quick_float = base.param(quick_float.into(), Value::Default, &EnumParam(&QUICK_FLOAT))?;
        let centered = base.param(centered.into(), Value::from(false), &BooleanParam)?;

        if let Some(name) = quick_float.filter(|v| *v != 0).and_then(|v| QUICK_FLOAT.name(v)) {
            base.add_class(&format!("pull-{}", name));
        }
        if centered {
            base.add_class("center-box");
        }

        Ok(NodeRef::new(Self { base, items }))
    }
}

impl Node for Div {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        renderer.append(&format!("<div{}>", self.base.base_attributes()));
        renderer.render("    ", &self.items)?;
        renderer.append("</div>");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn items(&self) -> Option<&NodeCollection> {
        Some(&self.items)
    }
}

/// A link. Script and server actions fall back to `onclick`.
pub struct Anchor {
    base: NodeBase,
    text: NodeCollection,
    url: Action,
    new_window: Option<bool>,
}

impl Anchor {
    pub fn new(text: impl Into<Value>, url: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        Self::build(text, url, Value::Default, attrs)
    }

    /// `new_window` left at the default opens absolute URLs in a new window.
    pub fn build(
        text: impl Into<Value>,
        url: impl Into<Value>,
        new_window: impl Into<Value>,
        attrs: Attrs,
    ) -> RenderResult<NodeRef> {
        let base = NodeBase::new::<Self>(attrs);
        let text = base.param(text.into(), Value::Default, &NodesParam)?;
        let url = base.param(url.into(), Value::from(""), &UrlParam)?;
        let new_window = base.optional_param(new_window.into(), Value::Default, &BooleanParam)?;
        Ok(NodeRef::new(Self {
            base,
            text,
            url,
            new_window,
        }))
    }

    pub fn url(&self) -> &Action {
        &self.url
    }

    fn opens_new_window(&self) -> bool {
        self.new_window.unwrap_or_else(|| {
            let href = self.url.href();
            href.contains("://") || href.starts_with("//")
        })
    }
}

impl Node for Anchor {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        let target = if self.opens_new_window() {
            " target=\"_blank\""
        } else {
            ""
        };
        renderer.append(&format!(
            "<a{}{}{}>",
            self.url.open_attribute(),
            self.base.base_attributes(),
            target
        ));
        renderer.inline_render(&self.text)?;
        renderer.append("</a>");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn items(&self) -> Option<&NodeCollection> {
        Some(&self.text)
    }
}

/// `<h1>` to `<h6>`, with an optional `<small>` sub-heading.
pub struct Heading {
    base: NodeBase,
    text: NodeCollection,
    level: i64,
    subtext: NodeCollection,
}

impl Heading {
    pub fn new(text: impl Into<Value>, level: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        Self::build(text, level, Value::Default, attrs)
    }

    pub fn build(
        text: impl Into<Value>,
        level: impl Into<Value>,
        subtext: impl Into<Value>,
        attrs: Attrs,
    ) -> RenderResult<NodeRef> {
        let base = NodeBase::new::<Self>(attrs);
        let text = base.param(text.into(), Value::Default, &NodesParam)?;
        let level = base
            .param(level.into(), Value::from(1), &IntegerParam)?
            .unwrap_or(1)
            .clamp(1, 6);
        let subtext = base.param(subtext.into(), Value::Default, &NodesParam)?;
        Ok(NodeRef::new(Self {
            base,
            text,
            level,
            subtext,
        }))
    }

    pub fn level(&self) -> i64 {
        self.level
    }
}

impl Node for Heading {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        renderer.append(&format!("<h{}{}>", self.level, self.base.base_attributes()));
        renderer.inline_render(&self.text)?;
        if self.subtext.is_empty() {
            renderer.append(&format!("</h{}>", self.level));
        } else {
            renderer.append(" <small>");
            renderer.inline_render(&self.subtext)?;
            renderer.append(&format!("</small></h{}>", self.level));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn items(&self) -> Option<&NodeCollection> {
        Some(&self.text)
    }
}

/// A form posting back to the page. Fields rendered inside it register their names.
pub struct Form {
    base: NodeBase,
    items: NodeCollection,
    fields: RefCell<Vec<String>>,
}

impl Form {
    pub fn new(items: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        Self::build(items, Value::Default, attrs)
    }

    /// `style` of "inline" or "horizontal" adds `form-<style>`.
    pub fn build(items: impl Into<Value>, style: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        let base = NodeBase::new::<Self>(attrs);
        let items = base.param(items.into(), Value::Default, &NodesParam)?;
        let style = base.param(style.into(), Value::from(""), &StringParam)?;
        if !style.is_empty() {
            base.add_class(&format!("form-{}", style));
        }
        base.id_needed();
        Ok(NodeRef::new(Self {
            base,
            items,
            fields: RefCell::new(Vec::new()),
        }))
    }

    pub fn register_field(&self, name: &str) {
        let mut fields = self.fields.borrow_mut();
        if !fields.iter().any(|f| f == name) {
            fields.push(name.to_string());
        }
    }

    /// Names of the fields rendered inside this form, in render order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.borrow().clone()
    }
}

impl Node for Form {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        renderer.append(&format!(
            "<form{} role=\"form\" data-toggle=\"validator\" data-async>",
            self.base.base_attributes()
        ));
        renderer.append("    <input type=\"hidden\" name=\"action\" value=\"_form_post\">");
        renderer.render("    ", &self.items)?;
        renderer.append(&format!(
            "    <input type=\"hidden\" name=\"fields\" value=\"{}\">",
            escape_html(&self.field_names().join(","))
        ));
        renderer.append("</form>");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn items(&self) -> Option<&NodeCollection> {
        Some(&self.items)
    }
}

/// A labelled text input. Rendered outside a [`Form`], it wraps itself in one.
pub struct TextField {
    base: NodeBase,
    name: String,
    label: String,
    placeholder: String,
    value: String,
}

impl TextField {
    pub fn new(name: impl Into<Value>, label: impl Into<Value>, attrs: Attrs) -> RenderResult<NodeRef> {
        Self::build(name, label, Value::Default, Value::Default, Value::Default, attrs)
    }

    pub fn build(
        name: impl Into<Value>,
        label: impl Into<Value>,
        placeholder: impl Into<Value>,
        value: impl Into<Value>,
        required: impl Into<Value>,
        attrs: Attrs,
    ) -> RenderResult<NodeRef> {
        let base = NodeBase::new::<Self>(attrs);
        let name = base.param(name.into(), Value::from(""), &StringParam)?;
        let label = base.param(label.into(), Value::from(""), &StringParam)?;
        let placeholder = base.param(placeholder.into(), Value::from(""), &StringParam)?;
        let value = base.param(value.into(), Value::from(""), &StringParam)?;
        let required = base.param(required.into(), Value::from(false), &BooleanParam)?;

        base.add_class("form-control");
        if required {
            base.add_attribute("required", "required");
        }

        Ok(NodeRef::new(Self {
            base,
            name,
            label,
            placeholder,
            value,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The label, or the name in title case when no label was given
    pub fn display_label(&self) -> String {
        if !self.label.is_empty() {
            return self.label.clone();
        }
        self.name
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    fn render_wrapped(&self, renderer: &mut Renderer) -> RenderResult<()> {
        let handle = self.base.handle().ok_or_else(|| RenderError::Render {
            node: self.base.type_name().to_string(),
            message: "field is not attached to a node handle".to_string(),
        })?;
        let parent = self.base.parent();
        let form = Form::new(&handle, Attrs::new())?;
        let result = renderer.render("", &form);
        self.base.restore_parent(parent);
        result
    }
}

impl Node for TextField {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        let Some(form) = renderer.find_ancestor::<Form>() else {
            return self.render_wrapped(renderer);
        };
        if let Some(form) = form.downcast_ref::<Form>() {
            form.register_field(&self.name);
        }

        renderer.add_resource(VALIDATOR_SCRIPT, ResourceKind::Script, "validator", "main");

        let label = self.display_label();
        if !label.is_empty() {
            renderer.append(&format!("<label for=\"{}\">{}</label>", self.base.id(), label));
        }
        renderer.append(&format!(
            "<input type=\"text\"{}{}{}{}>",
            self.base.base_attributes(),
            attr("name", &self.name),
            attr("value", &self.value),
            attr("placeholder", &self.placeholder)
        ));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
