//! Declarative node selection
//!
//! A [`SelectorSpec`] is a tag name plus attribute-equality predicates. It is
//! deliberately narrower than CSS: values are compared verbatim, so ids with
//! characters CSS would need escaped (`b3-b4-b1-...`, `a.b`) just work.

use crate::error::{ConversionError, Result};
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag wrapper id used by the pages this tool was first pointed at
pub const DEFAULT_WRAPPER_ID: &str = "b3-b4-b1-InjectHTMLWrapper";

/// Which DOM nodes survive conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Element tag name; None matches any element
    #[serde(default)]
    pub tag: Option<String>,
    /// Attribute name -> required value
    #[serde(default, alias = "attribute_equals")]
    pub attributes: BTreeMap<String, String>,
}

impl Default for SelectorSpec {
    fn default() -> Self {
        Self::tag("div").with_attr("id", DEFAULT_WRAPPER_ID)
    }
}

impl SelectorSpec {
    /// Match elements with this tag name
    pub fn tag<S: Into<String>>(tag: S) -> Self {
        Self {
            tag: Some(tag.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Match any element
    pub fn any() -> Self {
        Self {
            tag: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Require `name` to equal `value`
    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Parse a `name=value` pair as given on the command line
    pub fn parse_attr(pair: &str) -> std::result::Result<(String, String), String> {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected name=value, got {pair:?}"))?;
        let name = name.trim();
        if !is_identifier(name) {
            return Err(format!("invalid attribute name {name:?}"));
        }
        Ok((name.to_string(), value.to_string()))
    }

    /// Check tag and attribute names before a batch starts
    pub fn validate(&self) -> Result<()> {
        if let Some(tag) = &self.tag {
            if !is_tag_name(tag) {
                return Err(ConversionError::InvalidSelector(format!("tag {tag:?}")).into());
            }
        }
        for name in self.attributes.keys() {
            if !is_identifier(name) {
                return Err(
                    ConversionError::InvalidSelector(format!("attribute name {name:?}")).into(),
                );
            }
        }
        Ok(())
    }

    /// The tag-only part as a scraper selector; attributes are checked by [`Self::matches`]
    pub(crate) fn tag_selector(&self) -> Result<Selector> {
        self.validate()?;
        let css = self.tag.as_deref().unwrap_or("*");
        Selector::parse(css)
            .map_err(|e| ConversionError::InvalidSelector(format!("{css}: {e}")).into())
    }

    /// Whether an element satisfies every attribute predicate
    pub(crate) fn matches(&self, element: &ElementRef<'_>) -> bool {
        let el = element.value();
        self.attributes
            .iter()
            .all(|(name, expected)| el.attr(name) == Some(expected.as_str()))
    }
}

impl fmt::Display for SelectorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag.as_deref().unwrap_or("*"))?;
        for (name, value) in &self.attributes {
            write!(f, "[{name}={value:?}]")?;
        }
        Ok(())
    }
}

/// Tag names go through the CSS parser, where `:` starts a pseudo-class
fn is_tag_name(s: &str) -> bool {
    is_identifier(s) && !s.contains(':')
}

/// Attribute names are compared directly, so namespaced names like `xlink:href` are fine
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_wrapper_div() {
        let spec = SelectorSpec::default();
        assert_eq!(spec.tag.as_deref(), Some("div"));
        assert_eq!(spec.attributes.get("id").unwrap(), DEFAULT_WRAPPER_ID);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_display() {
        let spec = SelectorSpec::tag("div").with_attr("id", "x");
        assert_eq!(spec.to_string(), "div[id=\"x\"]");
        assert_eq!(SelectorSpec::any().to_string(), "*");
    }

    #[test]
    fn test_parse_attr() {
        assert_eq!(
            SelectorSpec::parse_attr("id=main=1").unwrap(),
            ("id".to_string(), "main=1".to_string())
        );
        assert_eq!(
            SelectorSpec::parse_attr("data-role=").unwrap(),
            ("data-role".to_string(), String::new())
        );
        assert!(SelectorSpec::parse_attr("id").is_err());
        assert!(SelectorSpec::parse_attr("=x").is_err());
    }

    #[test]
    fn test_validate_rejects_css_injection() {
        assert!(SelectorSpec::tag("div > p").validate().is_err());
        assert!(SelectorSpec::tag("").validate().is_err());
        assert!(SelectorSpec::any().with_attr("1d", "x").validate().is_err());
        assert!(SelectorSpec::tag("svg:rect").validate().is_err());
        assert!(SelectorSpec::any().with_attr("xlink:href", "#a").validate().is_ok());
    }

    #[test]
    fn test_valid_tags_always_parse() {
        for tag in ["div", "h1", "my-element", "x_y", "DIV"] {
            let spec = SelectorSpec::tag(tag);
            assert!(spec.validate().is_ok(), "{tag}");
            assert!(spec.tag_selector().is_ok(), "{tag}");
        }
    }

    #[test]
    fn test_matches_attribute_values_verbatim() {
        let html = scraper::Html::parse_fragment(
            r#"<div id="a.b">one</div><div id="a">two</div><div>three</div>"#,
        );
        let spec = SelectorSpec::tag("div").with_attr("id", "a.b");
        let selector = spec.tag_selector().unwrap();
        let hits: Vec<_> = html
            .select(&selector)
            .filter(|el| spec.matches(el))
            .map(|el| el.text().collect::<String>())
            .collect();
        assert_eq!(hits, vec!["one"]);
    }
}
