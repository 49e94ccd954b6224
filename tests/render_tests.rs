use pretty_assertions::assert_eq;
use shark_render::{
    parse_document, parse_page, render, render_with_config, Action, Anchor, Attrs, Div, Form,
    Heading, Node, NodeBase, NodeCollection, NodeRef, PartialUpdate, RenderError, RenderResult,
    Renderer, RendererConfig, ResourceKind, Text, TextField, Value,
};
use std::any::Any;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

fn get_demo_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("demos");
    path.push(filename);
    path
}

/// An application-defined node: a badge that reports the closest enclosing [`Div`].
struct Badge {
    base: NodeBase,
    label: String,
}

impl Badge {
    fn create(label: &str) -> NodeRef {
        NodeRef::new(Self {
            base: NodeBase::new::<Self>(Attrs::new()),
            label: label.to_string(),
        })
    }
}

impl Node for Badge {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn render(&self, renderer: &mut Renderer) -> RenderResult<()> {
        let inside = renderer
            .find_ancestor::<Div>()
            .map(|div| div.id())
            .unwrap_or_else(|| "none".to_string());
        renderer.append(&format!(
            "<span{} data-inside=\"{}\">{}</span>",
            self.base.base_attributes(),
            inside,
            self.label
        ));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_render_text_end_to_end() {
    let output = render(Text::new("Test", Attrs::new()).unwrap()).unwrap();
    assert_eq!(output.html, "Test\r\n");
    assert_eq!(output.css, "");
    assert_eq!(output.script, "");
    assert!(output.style_resources.is_empty());
    assert!(output.script_resources.is_empty());
}

#[test]
fn test_none_values_elided() {
    let nodes = NodeCollection::from_value(vec![Value::None, "a".into(), Value::None, "b".into()]);
    assert_eq!(nodes.len(), 2);
    let output = render(nodes).unwrap();
    assert_eq!(output.html, "a\r\nb\r\n");
}

#[test]
fn test_identical_styles_share_one_class() {
    let first = Div::new("one", Attrs::new().style("color:red;")).unwrap();
    let second = Div::new("two", Attrs::new().style("color:red;")).unwrap();
    let third = Div::new("three", Attrs::new().style("color:blue;")).unwrap();
    let output = render(vec![first.clone(), second.clone(), third.clone()]).unwrap();

    assert_eq!(output.css, ".style_0{color:red;}\r\n.style_1{color:blue;}");
    assert_eq!(first.base().attribute("class").as_deref(), Some("style_0"));
    assert_eq!(second.base().attribute("class").as_deref(), Some("style_0"));
    assert_eq!(third.base().attribute("class").as_deref(), Some("style_1"));
    assert_eq!(first.base().attribute("style"), None);
    assert!(output.html.starts_with("<div class=\"style_0\">\r\n"));
}

#[test]
fn test_custom_class_base_and_separator() {
    let config = RendererConfig::from_yaml("inlineStyleClassBase: s-\nlineSeparator: \"\\n\"").unwrap();
    let div = Div::new("x", Attrs::new().style("margin:0;")).unwrap();
    let output = render_with_config(div, config).unwrap();
    assert_eq!(output.html, "<div class=\"s-0\">\n    x\n</div>\n");
    assert_eq!(output.css, ".s-0{margin:0;}");
}

#[test]
fn test_invalid_config_rejected() {
    let config = RendererConfig {
        inline_style_class_base: "0bad".to_string(),
        ..RendererConfig::default()
    };
    assert!(matches!(Renderer::with_config(config), Err(RenderError::InvalidConfig(_))));
}

#[test]
fn test_generated_ids_unique() {
    let nodes: Vec<NodeRef> = (0..20).map(|_| Badge::create("x")).collect();
    let ids: HashSet<String> = nodes.iter().map(NodeRef::id).collect();
    assert_eq!(ids.len(), 20);
    for node in &nodes {
        assert!(node.id().starts_with("Badge_"));
        assert_eq!(node.id(), node.id());
    }
}

#[test]
fn test_ancestor_lookup_from_custom_node() {
    let badge = Badge::create("new");
    let inner = Div::new(&badge, Attrs::new().id("inner")).unwrap();
    let outer = Div::new(&inner, Attrs::new().id("outer")).unwrap();
    let output = render(&outer).unwrap();
    assert!(output.html.contains("data-inside=\"inner\">new</span>"));

    let alone = render(Badge::create("solo")).unwrap();
    assert!(alone.html.contains("data-inside=\"none\""));
}

#[test]
fn test_resources_first_add_wins() {
    let mut renderer = Renderer::new();
    renderer.add_resource("a.js", ResourceKind::Script, "x", "main");
    renderer.add_resource("b.js", ResourceKind::Script, "x", "main");
    let output = renderer.finish();
    assert_eq!(output.script_resources.len(), 1);
    assert_eq!(output.script_resources[0].url, "a.js");
}

#[test]
fn test_conversion_error_at_construction() {
    let result = Heading::new("Title", "large", Attrs::new());
    assert!(matches!(result, Err(RenderError::Conversion { rule: "integer", .. })));
}

#[test]
fn test_collection_concat_conflict() {
    let left = NodeCollection::from_value("a");
    let right = NodeCollection::from_value("b");
    assert!(matches!(left.concat(&right), Err(RenderError::TypeConflict { .. })));

    left.append(&right);
    assert_eq!(left.len(), 2);
}

#[test]
fn test_field_in_form_registers_and_adds_resource() {
    let form = Form::new(
        vec![
            Value::from(TextField::new("user_name", Value::Default, Attrs::new()).unwrap()),
            Value::from(Div::new(TextField::new("password", "Password", Attrs::new()).unwrap(), Attrs::new()).unwrap()),
        ],
        Attrs::new().id("login"),
    )
    .unwrap();
    let output = render(&form).unwrap();

    let form = form.downcast_ref::<Form>().unwrap();
    assert_eq!(form.field_names(), vec!["user_name", "password"]);
    assert!(output.html.contains("<input type=\"hidden\" name=\"fields\" value=\"user_name,password\">"));
    assert!(output.html.contains(">User Name</label>"));
    assert_eq!(output.script_resources.len(), 1);
}

#[test]
fn test_inline_anchor_in_heading() {
    let link = Anchor::new("docs", "/docs", Attrs::new()).unwrap();
    let heading = Heading::new(vec![Value::from("Read the "), Value::from(link)], 3, Attrs::new()).unwrap();
    let output = render(heading).unwrap();
    assert_eq!(output.html, "<h3>Read the <a href=\"/docs\">docs</a></h3>\r\n");
}

#[test]
fn test_server_action_anchor() {
    let action = Action::server("delete").with_param("id", 3);
    let anchor = Anchor::new("Delete", action, Attrs::new()).unwrap();
    let output = render(anchor).unwrap();
    assert_eq!(
        output.html,
        "<a onclick=\"do_action(&quot;delete&quot;, {&quot;id&quot;:3});\">Delete</a>\r\n"
    );
}

#[test]
fn test_partial_update_round_trip() {
    let panel = Div::new("Initial", Attrs::new()).unwrap();
    let first = render(&panel).unwrap();
    assert_eq!(first.html, "<div>\r\n    Initial\r\n</div>\r\n");

    let kept = serde_json::json!({ "panel": panel.serialize() }).to_string();
    let mut update = PartialUpdate::default().keep_variables(&kept).unwrap();
    let placeholder = update.placeholder_mut("panel").unwrap();
    let name = placeholder.add_variable("Updated");
    let statement = placeholder.jq().fade_in();
    placeholder.queue(statement);

    let json = update.finish().unwrap().to_json().unwrap();
    let payload: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(payload["html"], "");
    assert_eq!(payload["data"], "");
    let script = payload["script"].as_str().unwrap();
    assert!(script.starts_with(&format!("var {} = \"Updated\";", name)));
    assert!(script.ends_with(&format!("$('#{}').fadeIn();", panel.id())));
}

#[test]
fn test_demo_page_renders() {
    let yaml = fs::read_to_string(get_demo_path("landing.yaml")).unwrap();
    let document = parse_document(&yaml).unwrap();

    let mut renderer = Renderer::new();
    document.render(&mut renderer).unwrap();
    let output = renderer.finish();

    assert!(output.html.contains("<h1>Welcome <small>to the demo</small></h1>"));
    assert!(output.html.contains("Plain strings become text nodes &amp; are escaped."));
    assert!(output.html.contains("target=\"_blank\">Source</a>"));
    assert!(output.html.contains("<label for=\"TextField_"));
    assert_eq!(output.css, "body{margin:0}\r\n.style_0{color:#333;}");
    assert_eq!(output.script, "console.log('ready');");
    assert_eq!(output.style_resources.len(), 1);
    assert_eq!(output.script_resources.len(), 1);
}

#[test]
fn test_yaml_page_convenience() {
    let page = parse_page("- heading: { text: Hello }\n- World").unwrap();
    let output = render(page).unwrap();
    assert_eq!(output.html, "<h1>Hello</h1>\r\nWorld\r\n");
}
