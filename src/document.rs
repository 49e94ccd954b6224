//! YAML page descriptions.
//!
//! A page is either a bare list of nodes or a mapping with a `page` list plus the
//! resources and CSS it needs:
//!
//! ```yaml
//! resources:
//!   - { url: /static/site.css, kind: style, module: site, name: main }
//! page:
//!   - heading: { text: Welcome, level: 1 }
//!   - div:
//!       id: main
//!       style: "color:red;"
//!       items:
//!         - Plain strings become text
//!         - anchor: { text: Docs, url: /docs }
//! ```

use crate::action::Action;
use crate::error::{RenderError, RenderResult};
use crate::node::{Attrs, NodeCollection, NodeRef};
use crate::nodes::{Anchor, Div, Form, Heading, Raw, Script, TextField};
use crate::renderer::Renderer;
use crate::resources::Resource;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A parsed page description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PageDocument {
    /// Just a list of nodes
    Classic(Vec<NodeSpec>),
    /// Nodes plus the resources and CSS they need
    Full(FullPage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullPage {
    pub page: Vec<NodeSpec>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub css: Vec<String>,
}

/// One entry of a node list: a bare scalar (rendered as text) or a tagged node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Scalar(Scalar),
    Node(TaggedNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Children given either as a single entry or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Many(Vec<NodeSpec>),
    One(Box<NodeSpec>),
}

impl Default for Content {
    fn default() -> Self {
        Content::Many(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaggedNode {
    Raw(String),
    Script(String),
    Div(DivSpec),
    Anchor(AnchorSpec),
    Heading(HeadingSpec),
    Form(FormSpec),
    TextField(TextFieldSpec),
}

/// Attributes every tagged node accepts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivSpec {
    #[serde(default)]
    pub items: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_float: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centered: Option<bool>,
    #[serde(flatten)]
    pub common: CommonSpec,
}

/// A link; `url`, `script` and `action` are tried in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSpec {
    #[serde(default)]
    pub text: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_window: Option<bool>,
    #[serde(flatten)]
    pub common: CommonSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingSpec {
    #[serde(default)]
    pub text: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default)]
    pub subtext: Content,
    #[serde(flatten)]
    pub common: CommonSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSpec {
    #[serde(default)]
    pub items: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(flatten)]
    pub common: CommonSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFieldSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(flatten)]
    pub common: CommonSpec,
}

/// Absent keys map to the `Default` marker so node defaults apply.
fn given<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Default, Into::into)
}

impl From<&Scalar> for Value {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::Int(*i),
            Scalar::Float(f) => Value::Float(*f),
            Scalar::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl CommonSpec {
    fn attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        if let Some(id) = &self.id {
            attrs = attrs.id(id);
        }
        if let Some(class) = &self.class {
            attrs = attrs.class(class);
        }
        if let Some(style) = &self.style {
            attrs = attrs.style(style);
        }
        for (key, value) in &self.attributes {
            attrs = attrs.attr(key, value);
        }
        attrs
    }
}

impl Content {
    pub fn build(&self) -> RenderResult<Value> {
        match self {
            Content::Many(specs) => specs
                .iter()
                .map(NodeSpec::build)
                .collect::<RenderResult<Vec<Value>>>()
                .map(Value::List),
            Content::One(spec) => spec.build(),
        }
    }
}

impl NodeSpec {
    pub fn build(&self) -> RenderResult<Value> {
        match self {
            NodeSpec::Scalar(scalar) => Ok(scalar.into()),
            NodeSpec::Node(node) => node.build().map(Value::Node),
        }
    }
}

impl TaggedNode {
    pub fn build(&self) -> RenderResult<NodeRef> {
        match self {
            TaggedNode::Raw(text) => Raw::new(text, Attrs::new()),
            TaggedNode::Script(js) => Script::new(js, Attrs::new()),
            TaggedNode::Div(spec) => Div::build(
                spec.items.build()?,
                given(spec.quick_float.as_ref()),
                given(spec.centered),
                spec.common.attrs(),
            ),
            TaggedNode::Anchor(spec) => {
                let url = match (&spec.url, &spec.script, &spec.action) {
                    (Some(url), _, _) => Value::from(url),
                    (None, Some(js), _) => Value::Action(Action::script(js.as_str())),
                    (None, None, Some(name)) => Value::Action(Action::server(name.as_str())),
                    (None, None, None) => Value::Default,
                };
                Anchor::build(spec.text.build()?, url, given(spec.new_window), spec.common.attrs())
            }
            TaggedNode::Heading(spec) => Heading::build(
                spec.text.build()?,
                given(spec.level),
                spec.subtext.build()?,
                spec.common.attrs(),
            ),
            TaggedNode::Form(spec) => Form::build(
                spec.items.build()?,
                given(spec.style.as_ref()),
                spec.common.attrs(),
            ),
            TaggedNode::TextField(spec) => TextField::build(
                &spec.name,
                given(spec.label.as_ref()),
                given(spec.placeholder.as_ref()),
                given(spec.value.as_ref()),
                given(spec.required),
                spec.common.attrs(),
            ),
        }
    }
}

impl PageDocument {
    pub fn nodes(&self) -> &[NodeSpec] {
        match self {
            PageDocument::Classic(nodes) => nodes,
            PageDocument::Full(page) => &page.page,
        }
    }

    /// Builds a fresh node tree for the page.
    pub fn build(&self) -> RenderResult<NodeCollection> {
        let nodes = self
            .nodes()
            .iter()
            .map(NodeSpec::build)
            .collect::<RenderResult<Vec<Value>>>()?;
        Ok(NodeCollection::from_value(nodes))
    }

    /// Registers the page's resources and CSS, then renders its nodes.
    pub fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        if let PageDocument::Full(page) = self {
            for resource in &page.resources {
                renderer.add_resource(&resource.url, resource.kind, &resource.module, &resource.name);
            }
            for css in &page.css {
                renderer.append_css(css);
            }
        }
        renderer.render_all(self.build()?)
    }
}

/// Parse a page description. Empty input is an empty page.
pub fn parse_document(yaml: &str) -> RenderResult<PageDocument> {
    let raw: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    match raw {
        serde_yaml::Value::Null => Ok(PageDocument::Classic(Vec::new())),
        serde_yaml::Value::Sequence(_) => Ok(PageDocument::Classic(serde_yaml::from_value(raw)?)),
        serde_yaml::Value::Mapping(_) => Ok(PageDocument::Full(serde_yaml::from_value(raw)?)),
        _ => Err(RenderError::Yaml(
            "page description must be a list of nodes or a mapping with a 'page' key".to_string(),
        )),
    }
}

/// Parse a page description straight into a node tree.
pub fn parse_page(yaml: &str) -> RenderResult<NodeCollection> {
    parse_document(yaml)?.build()
}
