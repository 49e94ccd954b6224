//! # shark-render
//!
//! Server-side component-tree renderer: builds HTML, CSS and JavaScript from a tree of
//! typed nodes in a single traversal.
//!
//! ## Features
//! - Nodes with lazily generated ids, ordered attributes and weak parent links
//! - Flattening node collections that wrap plain values in text nodes
//! - Inline styles hoisted into shared generated classes
//! - Ancestor lookup during rendering (a field finds its enclosing form)
//! - Resource registry for the scripts and stylesheets a page needs
//! - Deferred variables and placeholders for partial updates
//! - YAML page descriptions
//!
//! ## Example
//! ```ignore
//! use shark_render::{Attrs, Div, Heading, Renderer};
//!
//! let page = Div::new(
//!     vec![Heading::new("Hello", 1, Attrs::new())?.into(), "World".into()],
//!     Attrs::new().style("color:red;"),
//! )?;
//!
//! let mut renderer = Renderer::new();
//! renderer.render_all(page)?;
//! let output = renderer.finish();
//! println!("{}", output.html);
//! println!("{}", output.css);
//! ```
//!
//! ## Example — YAML page
//! ```ignore
//! use shark_render::{parse_page, render};
//!
//! let page = parse_page("- heading: { text: Hello }\n- World")?;
//! let output = render(page)?;
//! ```

pub mod action;
pub mod config;
pub mod document;
pub mod enumeration;
pub mod error;
pub mod escape;
pub mod node;
pub mod nodes;
pub mod param;
pub mod partial;
pub mod renderer;
pub mod resources;
pub mod value;

// --- Core types ---
pub use action::{Action, Jq};
pub use config::RendererConfig;
pub use error::{RenderError, RenderResult};
pub use node::{Attrs, Node, NodeBase, NodeCollection, NodeRef, Parent};
pub use renderer::{RenderOutput, Renderer};
pub use resources::{Resource, ResourceKind, Resources};
pub use value::Value;

// --- Built-in nodes ---
pub use nodes::{Anchor, Div, Form, Heading, Raw, Script, Text, TextField};

// --- Pages and partial updates ---
pub use document::{parse_document, parse_page, PageDocument};
pub use partial::{PartialResponse, PartialUpdate, Placeholder};

/// Render any value with a default [`Renderer`] and collect the output.
pub fn render(value: impl Into<Value>) -> RenderResult<RenderOutput> {
    let mut renderer = Renderer::new();
    renderer.render_all(value)?;
    Ok(renderer.finish())
}

/// Like [`render`], with a custom configuration.
pub fn render_with_config(value: impl Into<Value>, config: RendererConfig) -> RenderResult<RenderOutput> {
    let mut renderer = Renderer::with_config(config)?;
    renderer.render_all(value)?;
    Ok(renderer.finish())
}
