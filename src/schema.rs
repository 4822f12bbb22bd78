//! Typed selector schema
//!
//! A schema describes everything to extract from one page: an ordered list of
//! named rules. Build one with [`crate::validate`]; it is immutable afterwards.

use serde_json::{Map, Value};

/// One extraction rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorRule {
    Css(QueryRule),
    XPath(QueryRule),
    Group(GroupRule),
}

/// A CSS or XPath query with its extraction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRule {
    pub query: String,
    /// Extract this attribute instead of the text content
    pub attribute: Option<String>,
    pub multiple: bool,
}

/// A container query whose matches scope a nested schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    /// CSS selector for the container elements
    pub container: String,
    pub fields: SelectorSchema,
    pub multiple: bool,
}

impl SelectorRule {
    /// The `type` discriminator as written in configuration
    pub fn kind_name(&self) -> &'static str {
        match self {
            SelectorRule::Css(_) => "css",
            SelectorRule::XPath(_) => "xpath",
            SelectorRule::Group(_) => "group",
        }
    }

    pub fn is_multiple(&self) -> bool {
        match self {
            SelectorRule::Css(rule) | SelectorRule::XPath(rule) => rule.multiple,
            SelectorRule::Group(group) => group.multiple,
        }
    }

    /// Serialize back to the configuration shape, omitting defaulted options
    pub fn to_raw(&self) -> Value {
        let mut raw = Map::new();
        raw.insert("type".into(), Value::String(self.kind_name().into()));

        match self {
            SelectorRule::Css(rule) | SelectorRule::XPath(rule) => {
                raw.insert("query".into(), Value::String(rule.query.clone()));
                if let Some(attr) = &rule.attribute {
                    raw.insert("attribute".into(), Value::String(attr.clone()));
                }
            }
            SelectorRule::Group(group) => {
                raw.insert("container".into(), Value::String(group.container.clone()));
                raw.insert("fields".into(), group.fields.to_raw());
            }
        }

        if self.is_multiple() {
            raw.insert("multiple".into(), Value::Bool(true));
        }

        Value::Object(raw)
    }
}

/// Named rules in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorSchema {
    fields: Vec<(String, SelectorRule)>,
}

impl SelectorSchema {
    pub(crate) fn from_fields(fields: Vec<(String, SelectorRule)>) -> Self {
        Self { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SelectorRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&SelectorRule> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, rule)| rule)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize back to the raw `name -> rule` mapping
    pub fn to_raw(&self) -> Value {
        let map = self
            .fields
            .iter()
            .map(|(name, rule)| (name.clone(), rule.to_raw()))
            .collect::<Map<String, Value>>();
        Value::Object(map)
    }
}
