//! The traversal engine.
//!
//! A [`Renderer`] walks a node tree depth first and accumulates markup lines, script
//! statements and CSS. One renderer serves one request; it is never shared.

use crate::config::RendererConfig;
use crate::error::RenderResult;
use crate::node::{next_object_number, Node, NodeCollection, NodeRef, Renderable};
use crate::resources::{Resource, ResourceKind, Resources};
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

const CSS_SEPARATOR: &str = "\r\n";

/// Everything the page shell needs after a render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub css: String,
    pub script: String,
    pub style_resources: Vec<Resource>,
    pub script_resources: Vec<Resource>,
}

#[derive(Debug)]
pub struct Renderer {
    id: String,
    config: RendererConfig,
    output: Vec<String>,
    script: Vec<String>,
    css: Vec<String>,
    css_classes: IndexMap<String, String>,
    indent: usize,
    separator: String,
    omit_next_indent: bool,
    /// Innermost ancestor last
    ancestors: Vec<NodeRef>,
    variables: IndexMap<String, NodeCollection>,
    resources: Resources,
    render_count: usize,
}

/// Buffers and flags swapped out during a nested render
struct SavedTarget {
    output: Vec<String>,
    script: Option<Vec<String>>,
    omit_next_indent: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::build(RendererConfig::default())
    }

    pub fn with_config(config: RendererConfig) -> RenderResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RendererConfig) -> Self {
        Self {
            id: format!("Renderer_{}", next_object_number("Renderer")),
            separator: config.line_separator.clone(),
            config,
            output: Vec::new(),
            script: Vec::new(),
            css: Vec::new(),
            css_classes: IndexMap::new(),
            indent: 0,
            omit_next_indent: false,
            ancestors: Vec::new(),
            variables: IndexMap::new(),
            resources: Resources::new(),
            render_count: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Number of `render` calls so far, nested ones included
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// Generated class name for an inline style, stable per style text.
    pub fn add_css_class(&mut self, style: &str) -> String {
        let next = format!("{}{}", self.config.inline_style_class_base, self.css_classes.len());
        self.css_classes
            .entry(style.to_string())
            .or_insert(next)
            .clone()
    }

    /// Emits one line at the current indentation.
    pub fn append(&mut self, text: &str) {
        let indent = if self.omit_next_indent {
            String::new()
        } else {
            " ".repeat(self.indent)
        };
        self.output
            .push(format!("{}{}{}", indent, text, self.separator));
        self.omit_next_indent = false;
    }

    pub fn append_css(&mut self, css: &str) {
        self.css.push(css.trim().to_string());
    }

    /// Queues a script statement, terminating it with `;` if needed.
    pub fn append_script(&mut self, js: &str) {
        let mut js = js.trim().to_string();
        if !js.ends_with(';') {
            js.push(';');
        }
        self.script.push(js);
    }

    /// Captures `value` for deferred rendering; returns its variable name.
    pub fn capture_variable(&mut self, value: impl Into<Value>) -> String {
        let name = format!("{}_{}", self.id.to_lowercase(), self.variables.len() + 1);
        self.variables
            .insert(name.clone(), NodeCollection::from_value(value));
        name
    }

    /// Renders each variable into `var <name> = "<html>";` plus a `func_<name>` that
    /// replays the variable's script. Drains in insertion order.
    pub fn render_variables(&mut self, variables: IndexMap<String, NodeCollection>) -> RenderResult<()> {
        for (name, nodes) in variables {
            let (html, js) = self.render_to_string_and_script(&nodes)?;
            tracing::debug!(variable = %name, "flushing deferred variable");
            self.append_script(&format!("var {} = {};", name, serde_json::to_string(&html)?));
            self.append_script(&format!("function func_{}(){{{}}};", name, js));
        }
        Ok(())
    }

    /// Drains the variables captured on this renderer, including ones captured while
    /// flushing.
    pub fn flush_variables(&mut self) -> RenderResult<()> {
        while !self.variables.is_empty() {
            let variables = std::mem::take(&mut self.variables);
            self.render_variables(variables)?;
        }
        Ok(())
    }

    /// Drains and renders the variables captured on `node`.
    pub fn flush_node_variables(&mut self, node: &NodeRef) -> RenderResult<()> {
        loop {
            let variables = node.base().take_variables();
            if variables.is_empty() {
                return Ok(());
            }
            self.render_variables(variables)?;
        }
    }

    /// Renders `node` with its indentation increased by the character count of `indent`.
    pub fn render<R: Renderable + ?Sized>(&mut self, indent: &str, node: &R) -> RenderResult<()> {
        self.render_count += 1;
        if node.is_blank() {
            return Ok(());
        }

        let width = indent.chars().count();
        self.indent += width;

        if self.config.translate_inline_styles_to_classes {
            if let Some(base) = node.hoist_target() {
                if let Some(style) = base.attribute("style").filter(|s| !s.is_empty()) {
                    let class_name = self.add_css_class(&style);
                    base.add_class(&class_name);
                    base.remove_attribute("style");
                }
            }
        }

        let parent = node.structural_parent();
        if let Some(parent) = &parent {
            self.ancestors.push(parent.clone());
        }
        let result = node.emit(self);
        if parent.is_some() {
            self.ancestors.pop();
        }

        self.indent -= width;
        result
    }

    /// Wraps any value in a collection and renders it at the current indentation.
    pub fn render_all(&mut self, value: impl Into<Value>) -> RenderResult<()> {
        let nodes = NodeCollection::from_value(value);
        let span = tracing::debug_span!("render_all", renderer = %self.id);
        let _guard = span.enter();
        self.render("", &nodes)?;
        tracing::debug!(render_count = self.render_count, "render finished");
        Ok(())
    }

    /// Renders `node` on the same line as the previously emitted text.
    pub fn inline_render<R: Renderable + ?Sized>(&mut self, node: &R) -> RenderResult<()> {
        if !self.separator.is_empty() {
            if let Some(last) = self.output.last_mut() {
                if last.ends_with(self.separator.as_str()) {
                    let keep = last.len() - self.separator.len();
                    last.truncate(keep);
                }
            }
        }

        let mut result = Ok(());
        if !node.is_blank() {
            let old_separator = std::mem::take(&mut self.separator);
            let old_indent = std::mem::replace(&mut self.indent, 0);
            result = node.emit(self);
            self.indent = old_indent;
            self.separator = old_separator;
        }

        self.omit_next_indent = true;
        result
    }

    fn swap_target(&mut self, with_script: bool) -> SavedTarget {
        SavedTarget {
            output: std::mem::take(&mut self.output),
            script: with_script.then(|| std::mem::take(&mut self.script)),
            omit_next_indent: std::mem::replace(&mut self.omit_next_indent, false),
        }
    }

    /// Puts the saved buffers back and returns the nested (html, script) text.
    fn restore_target(&mut self, saved: SavedTarget) -> (String, String) {
        let html = std::mem::replace(&mut self.output, saved.output).concat();
        let script = match saved.script {
            Some(script) => std::mem::replace(&mut self.script, script)
                .join(&self.config.line_separator),
            None => String::new(),
        };
        self.omit_next_indent = saved.omit_next_indent;
        (html, script)
    }

    /// Renders into a fresh buffer and returns the markup, leaving the main output untouched.
    pub fn render_to_string<R: Renderable + ?Sized>(&mut self, node: &R) -> RenderResult<String> {
        let saved = self.swap_target(false);
        let result = self.render("", node);
        let (html, _) = self.restore_target(saved);
        result.map(|_| html)
    }

    /// Inline-renders into fresh markup and script buffers and returns both.
    pub fn render_to_string_and_script<R: Renderable + ?Sized>(
        &mut self,
        node: &R,
    ) -> RenderResult<(String, String)> {
        let saved = self.swap_target(true);
        let result = self.inline_render(node);
        let captured = self.restore_target(saved);
        result.map(|_| captured)
    }

    pub(crate) fn push_ancestor(&mut self, node: NodeRef) {
        self.ancestors.push(node);
    }

    pub(crate) fn pop_ancestor(&mut self) {
        self.ancestors.pop();
    }

    /// Innermost ancestor of type `T` currently being rendered.
    pub fn find_ancestor<T: Node>(&self) -> Option<NodeRef> {
        self.ancestors.iter().rev().find(|node| node.is::<T>()).cloned()
    }

    /// Ancestors currently being rendered, innermost first
    pub fn ancestors(&self) -> impl Iterator<Item = &NodeRef> {
        self.ancestors.iter().rev()
    }

    pub fn add_resource(&mut self, url: &str, kind: ResourceKind, module: &str, name: &str) {
        self.resources.add(url, kind, module, name);
    }

    pub fn replace_resource(&mut self, url: &str, kind: ResourceKind, module: &str, name: &str) {
        self.resources.replace(url, kind, module, name);
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    /// Markup of the current output target
    pub fn html(&self) -> String {
        self.output.concat()
    }

    /// Explicit CSS followed by one rule per hoisted inline style, always `\r\n`-joined
    pub fn css(&self) -> String {
        let mut css = self.css.clone();
        for (style, class_name) in &self.css_classes {
            css.push(format!(".{}{{{}}}", class_name, style));
        }
        css.join(CSS_SEPARATOR)
    }

    pub fn script(&self) -> String {
        self.script.join(&self.config.line_separator)
    }

    /// Everything rendered so far, with the registry split by kind
    pub fn finish(&self) -> RenderOutput {
        RenderOutput {
            html: self.html(),
            css: self.css(),
            script: self.script(),
            style_resources: self.resources.styles(),
            script_resources: self.resources.scripts(),
        }
    }
}
