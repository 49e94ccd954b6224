use crate::error::{RenderError, RenderResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const ALLOWED_SEPARATORS: &[&str] = &["", "\n", "\r\n"];

/// Renderer settings, usually left at their defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererConfig {
    /// Prefix of the class names generated for hoisted inline styles
    pub inline_style_class_base: String,
    /// Turn `style="..."` attributes into shared generated classes
    pub translate_inline_styles_to_classes: bool,
    /// Appended after every emitted line; also joins script statements. CSS rules are
    /// always joined by `\r\n`.
    pub line_separator: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            inline_style_class_base: "style_".to_string(),
            translate_inline_styles_to_classes: true,
            line_separator: "\r\n".to_string(),
        }
    }
}

impl RendererConfig {
    /// Parse and validate a YAML configuration. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> RenderResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RendererConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RenderResult<()> {
        static CLASS_BASE_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = CLASS_BASE_REGEX
            .get_or_init(|| Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").unwrap());

        if !re.is_match(&self.inline_style_class_base) {
            return Err(RenderError::InvalidConfig(format!(
                "inlineStyleClassBase '{}' is not a valid CSS class prefix",
                self.inline_style_class_base
            )));
        }

        if !ALLOWED_SEPARATORS.contains(&self.line_separator.as_str()) {
            return Err(RenderError::InvalidConfig(format!(
                "lineSeparator {:?} must be empty, \"\\n\" or \"\\r\\n\"",
                self.line_separator
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RendererConfig::default();
        assert_eq!(config.inline_style_class_base, "style_");
        assert!(config.translate_inline_styles_to_classes);
        assert_eq!(config.line_separator, "\r\n");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = RendererConfig::from_yaml("inlineStyleClassBase: s-\nlineSeparator: \"\\n\"")
            .unwrap();
        assert_eq!(config.inline_style_class_base, "s-");
        assert_eq!(config.line_separator, "\n");
        assert!(config.translate_inline_styles_to_classes);
    }

    #[test]
    fn test_from_yaml_empty() {
        assert_eq!(RendererConfig::from_yaml("").unwrap(), RendererConfig::default());
    }

    #[test]
    fn test_invalid_class_base() {
        let result = RendererConfig::from_yaml("inlineStyleClassBase: \"9 bad\"");
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_separator() {
        let result = RendererConfig::from_yaml("lineSeparator: \";\"");
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = RendererConfig::from_yaml("translateInlineStylesToClasses: [1, 2");
        assert!(matches!(result, Err(RenderError::Yaml(_))));
    }
}
