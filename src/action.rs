use crate::escape::{escape_attribute_quotes, escape_html, quote_url};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// What happens when a user interacts with an element.
///
/// Anchors open URLs, buttons run script, forms invoke server-side actions; any of
/// them can be used wherever a node accepts an action.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Action {
    #[default]
    None,
    /// Navigate to a (percent-quoted) URL
    Url(String),
    /// Run raw JavaScript
    Script(String),
    /// Invoke a named server-side action with JSON parameters
    Server {
        name: String,
        params: Map<String, JsonValue>,
    },
}

impl Action {
    pub fn url(target: &str) -> Self {
        Action::Url(quote_url(target))
    }

    pub fn script(js: impl Into<String>) -> Self {
        Action::Script(js.into())
    }

    pub fn server(name: impl Into<String>) -> Self {
        Action::Server {
            name: name.into(),
            params: Map::new(),
        }
    }

    /// Adds a parameter to a server action. Other variants are returned unchanged.
    pub fn with_param(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        if let Action::Server { params, .. } = &mut self {
            params.insert(key.to_string(), value.into());
        }
        self
    }

    /// True for every variant except [`Action::None`]
    pub fn is_some(&self) -> bool {
        !matches!(self, Action::None)
    }

    /// Plain URL for elements that support `href`; empty for non-URL actions
    pub fn href(&self) -> &str {
        match self {
            Action::Url(url) => url,
            _ => "",
        }
    }

    /// Script form of any action, URLs included
    pub fn to_script(&self) -> String {
        match self {
            Action::None => String::new(),
            Action::Url(url) if url.is_empty() => String::new(),
            Action::Url(url) => format!("window.location.href=\"{}\";", url),
            Action::Script(js) => js.clone(),
            Action::Server { name, params } => format!(
                "do_action(\"{}\", {});",
                escape_html(name),
                JsonValue::Object(params.clone())
            ),
        }
    }

    /// Attribute for elements that support `href`; script actions fall back to `onclick`.
    pub fn open_attribute(&self) -> String {
        let href = self.href();
        if !href.is_empty() {
            return format!(" href=\"{}\"", href);
        }
        let script = self.to_script();
        if !script.is_empty() {
            return format!(" onclick=\"{}\"", escape_attribute_quotes(&script));
        }
        String::new()
    }

    /// Attribute for elements without `href` support
    pub fn click_attribute(&self) -> String {
        if !self.is_some() {
            return String::new();
        }
        format!(" onclick=\"{}\"", escape_attribute_quotes(&self.to_script()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Url(url) => write!(f, "{}", url),
            _ => write!(f, "{}", self.to_script()),
        }
    }
}

/// jQuery statement builder, e.g. `$('#Div_3').fadeIn()`
#[derive(Debug, Clone, PartialEq)]
pub struct Jq {
    chain: String,
}

impl Jq {
    pub fn new(selector: &str) -> Self {
        Self {
            chain: format!("$('{}')", selector),
        }
    }

    pub fn by_id(id: &str) -> Self {
        Self::new(&format!("#{}", id))
    }

    pub fn show(&self) -> Self {
        self.call("show()")
    }

    pub fn hide(&self) -> Self {
        self.call("hide()")
    }

    pub fn fade_in(&self) -> Self {
        self.call("fadeIn()")
    }

    pub fn fade_out(&self) -> Self {
        self.call("fadeOut()")
    }

    pub fn attr(&self, name: &str, value: &str) -> Self {
        self.call(&format!(
            "attr({}, {})",
            JsonValue::from(name),
            JsonValue::from(value)
        ))
    }

    /// Replaces the element's content with raw markup
    pub fn html(&self, markup: &str) -> Self {
        self.call(&format!("html({})", JsonValue::from(markup)))
    }

    pub fn append_raw(&self, markup: &str) -> Self {
        self.call(&format!("append({})", JsonValue::from(markup)))
    }

    pub fn to_script(&self) -> String {
        format!("{};", self.chain)
    }

    fn call(&self, method: &str) -> Self {
        Self {
            chain: format!("{}.{}", self.chain, method),
        }
    }
}

impl From<Jq> for Action {
    fn from(jq: Jq) -> Self {
        Action::Script(jq.to_script())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_action_is_empty() {
        let action = Action::None;
        assert!(!action.is_some());
        assert_eq!(action.href(), "");
        assert_eq!(action.to_script(), "");
        assert_eq!(action.open_attribute(), "");
        assert_eq!(action.click_attribute(), "");
    }

    #[test]
    fn test_url_action() {
        let action = Action::url("/docs/start");
        assert_eq!(action.open_attribute(), " href=\"/docs/start\"");
        assert_eq!(
            action.click_attribute(),
            " onclick=\"window.location.href=&quot;/docs/start&quot;;\""
        );
        assert_eq!(action.to_script(), "window.location.href=\"/docs/start\";");
    }

    #[test]
    fn test_script_action_opens_with_onclick() {
        let action = Action::script("alert(\"hi\");");
        assert_eq!(action.href(), "");
        assert_eq!(action.open_attribute(), " onclick=\"alert(&quot;hi&quot;);\"");
        assert_eq!(action.click_attribute(), action.open_attribute());
    }

    #[test]
    fn test_server_action_script() {
        let action = Action::server("save<1>").with_param("id", 7);
        assert_eq!(action.to_script(), "do_action(\"save&lt;1&gt;\", {\"id\":7});");
        assert_eq!(
            action.click_attribute(),
            " onclick=\"do_action(&quot;save&lt;1&gt;&quot;, {&quot;id&quot;:7});\""
        );
    }

    #[test]
    fn test_with_param_ignored_for_url() {
        let action = Action::url("/a").with_param("x", 1);
        assert_eq!(action, Action::Url("/a".to_string()));
    }

    #[test]
    fn test_jq_chain() {
        let jq = Jq::by_id("Div_1").hide().fade_in();
        assert_eq!(jq.to_script(), "$('#Div_1').hide().fadeIn();");
        assert_eq!(
            Jq::by_id("Image_2").attr("src", "/a.png").to_script(),
            "$('#Image_2').attr(\"src\", \"/a.png\");"
        );
        assert_eq!(
            Action::from(Jq::new(".row").show()),
            Action::Script("$('.row').show();".to_string())
        );
    }
}
