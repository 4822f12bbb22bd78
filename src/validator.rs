//! Converts a raw selector mapping (as loaded from JSON or YAML) into a
//! typed [`SelectorSchema`].
//!
//! Validation is purely structural: queries are not compiled here, so a
//! syntactically broken selector only surfaces at extraction time.

use serde_json::{Map, Value};

use crate::error::{QueryKind, SchemaError};
use crate::schema::{GroupRule, QueryRule, SelectorRule, SelectorSchema};

/// Validate a raw `name -> rule` mapping.
///
/// Unknown keys on a rule are ignored. Nested group fields are validated
/// recursively and reported with a dotted path (`comments.text`).
pub fn validate(raw: &Value) -> Result<SelectorSchema, SchemaError> {
    validate_fields(raw, "")
}

fn validate_fields(raw: &Value, prefix: &str) -> Result<SelectorSchema, SchemaError> {
    let map = raw.as_object().ok_or_else(|| SchemaError::NotAMapping {
        path: prefix.to_string(),
    })?;

    let mut fields = Vec::with_capacity(map.len());
    for (name, rule) in map {
        let path = join_path(prefix, name);
        let rule = validate_rule(rule, &path)?;
        fields.push((name.clone(), rule));
    }

    Ok(SelectorSchema::from_fields(fields))
}

fn validate_rule(raw: &Value, path: &str) -> Result<SelectorRule, SchemaError> {
    let rule = raw.as_object().ok_or_else(|| SchemaError::NotAMapping {
        path: path.to_string(),
    })?;

    // `type` is the documented key; `kind` is accepted as an alias
    let kind = match rule.get("type").or_else(|| rule.get("kind")) {
        None | Some(Value::Null) => {
            return Err(SchemaError::MissingKind {
                path: path.to_string(),
            })
        }
        Some(Value::String(kind)) => kind.as_str(),
        Some(_) => {
            return Err(SchemaError::InvalidValue {
                path: path.to_string(),
                key: "type".to_string(),
                expected: "a string",
            })
        }
    };

    let multiple = optional_bool(rule, "multiple", path)?.unwrap_or(false);

    match kind.to_ascii_lowercase().as_str() {
        "css" => Ok(SelectorRule::Css(query_rule(rule, path, QueryKind::Css, multiple)?)),
        "xpath" => Ok(SelectorRule::XPath(query_rule(rule, path, QueryKind::Xpath, multiple)?)),
        "group" => {
            let container = match optional_str(rule, "container", path)? {
                Some(container) if !container.trim().is_empty() => container.to_string(),
                _ => {
                    return Err(SchemaError::MissingContainer {
                        path: path.to_string(),
                    })
                }
            };

            let fields = match rule.get("fields") {
                None | Some(Value::Null) => {
                    return Err(SchemaError::MissingFields {
                        path: path.to_string(),
                    })
                }
                Some(Value::Object(map)) if map.is_empty() => {
                    return Err(SchemaError::MissingFields {
                        path: path.to_string(),
                    })
                }
                Some(fields @ Value::Object(_)) => validate_fields(fields, path)?,
                Some(_) => {
                    return Err(SchemaError::InvalidValue {
                        path: path.to_string(),
                        key: "fields".to_string(),
                        expected: "a mapping",
                    })
                }
            };

            Ok(SelectorRule::Group(GroupRule {
                container,
                fields,
                multiple,
            }))
        }
        _ => Err(SchemaError::UnknownKind {
            path: path.to_string(),
            kind: kind.to_string(),
        }),
    }
}

fn query_rule(
    rule: &Map<String, Value>,
    path: &str,
    kind: QueryKind,
    multiple: bool,
) -> Result<QueryRule, SchemaError> {
    let query = match optional_str(rule, "query", path)? {
        Some(query) if !query.trim().is_empty() => query.to_string(),
        _ => {
            return Err(SchemaError::MissingQuery {
                path: path.to_string(),
                kind,
            })
        }
    };

    let attribute = optional_str(rule, "attribute", path)?
        .filter(|attr| !attr.is_empty())
        .map(String::from);

    Ok(QueryRule {
        query,
        attribute,
        multiple,
    })
}

fn optional_str<'a>(
    rule: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'a str>, SchemaError> {
    match rule.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(SchemaError::InvalidValue {
            path: path.to_string(),
            key: key.to_string(),
            expected: "a string",
        }),
    }
}

fn optional_bool(
    rule: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<bool>, SchemaError> {
    match rule.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(SchemaError::InvalidValue {
            path: path.to_string(),
            key: key.to_string(),
            expected: "a boolean",
        }),
    }
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}
