//! Group rules: repeated structured items

use serde_json::Value;

use crate::document::{Document, Node};
use crate::error::{ExtractionError, QueryError};
use crate::schema::{GroupRule, SelectorRule, SelectorSchema};
use crate::validator::join_path;

use super::{extract_fields, record_error};

/// Evaluate a group rule.
///
/// Containers are always matched with CSS. Each container scopes one
/// extraction of the nested fields; `multiple` returns all of them (possibly
/// `[]`), otherwise the first record or `null`. Errors from nested fields go
/// to `errors` under `path`; only a rejected container query is returned.
/// With no containers the nested queries are still compiled, so a broken
/// field is reported whether or not the page has any items.
pub fn extract_group<'a>(
    doc: &'a Document,
    group: &GroupRule,
    context: Option<Node<'a>>,
    path: &str,
    errors: &mut Vec<ExtractionError>,
) -> Result<Value, QueryError> {
    let containers = doc.css_select(&group.container, context)?;
    tracing::debug!(field = %path, containers = containers.len(), "matched group containers");

    if containers.is_empty() {
        check_queries(&group.fields, path, errors);
    }

    if !group.multiple {
        return Ok(containers.first().map_or(Value::Null, |container| {
            Value::Object(extract_fields(doc, &group.fields, Some(*container), path, errors))
        }));
    }

    let records = containers
        .into_iter()
        .map(|container| {
            Value::Object(extract_fields(doc, &group.fields, Some(container), path, errors))
        })
        .collect();

    Ok(Value::Array(records))
}

/// Compile every query under `schema` without evaluating it
fn check_queries(schema: &SelectorSchema, prefix: &str, errors: &mut Vec<ExtractionError>) {
    for (name, rule) in schema.iter() {
        let path = join_path(prefix, name);
        let checked = match rule {
            SelectorRule::Css(rule) => Document::check_css(&rule.query),
            SelectorRule::XPath(rule) => Document::check_xpath(&rule.query),
            SelectorRule::Group(group) => Document::check_css(&group.container).map(|()| {
                check_queries(&group.fields, &path, errors);
            }),
        };

        if let Err(err) = checked {
            record_error(errors, path, err);
        }
    }
}
