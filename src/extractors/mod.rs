//! Schema-driven extraction
//!
//! Each rule kind has its own module; [`extract`] walks a schema and
//! dispatches on the rule variant. Group rules recurse back into the same
//! walk with the matched container as context.

mod css_extractor;
mod group_extractor;
mod xpath_extractor;

pub use css_extractor::*;
pub use group_extractor::*;
pub use xpath_extractor::*;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::{Document, Fragment, Node};
use crate::error::{ExtractionError, QueryError};
use crate::schema::{QueryRule, SelectorRule, SelectorSchema};
use crate::validator::join_path;

/// Field name -> extracted value, in schema order
pub type Record = Map<String, Value>;

/// Result of one extraction pass: the record plus every field-level failure.
///
/// A field whose query was rejected is `null` in `record`, so the record
/// always has exactly the schema's keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub record: Record,
    pub errors: Vec<ExtractionError>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fail the whole page on the first field error
    pub fn into_result(self) -> Result<Record, ExtractionError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.record),
        }
    }
}

/// Apply `schema` to `doc`, or to the subtree under `context` when given.
pub fn extract<'a>(
    doc: &'a Document,
    schema: &SelectorSchema,
    context: Option<Node<'a>>,
) -> Extraction {
    let mut errors = Vec::new();
    let record = extract_fields(doc, schema, context, "", &mut errors);
    Extraction { record, errors }
}

/// Parse `html` and apply `schema` to the whole page
pub fn extract_html(html: &str, schema: &SelectorSchema) -> Extraction {
    let doc = Document::parse(html);
    extract(&doc, schema, None)
}

pub(crate) fn extract_fields<'a>(
    doc: &'a Document,
    schema: &SelectorSchema,
    context: Option<Node<'a>>,
    prefix: &str,
    errors: &mut Vec<ExtractionError>,
) -> Record {
    let mut record = Record::new();
    // Re-parsed once per context, shared by every XPath field under it
    let mut fragment: Option<Fragment> = None;

    for (name, rule) in schema.iter() {
        let path = join_path(prefix, name);

        let value = match rule {
            SelectorRule::Css(rule) => extract_css(doc, rule, context),
            SelectorRule::XPath(rule) => match context {
                None => extract_xpath(doc, rule, None),
                Some(node) => xpath_in_context(doc, rule, node, &mut fragment),
            },
            SelectorRule::Group(group) => extract_group(doc, group, context, &path, errors),
        };

        let value = match value {
            Ok(value) => {
                tracing::trace!(field = %path, kind = rule.kind_name(), "extracted field");
                value
            }
            Err(err) => {
                record_error(errors, path, err);
                Value::Null
            }
        };

        record.insert(name.to_string(), value);
    }

    record
}

fn xpath_in_context(
    doc: &Document,
    rule: &QueryRule,
    node: Node<'_>,
    cache: &mut Option<Fragment>,
) -> Result<Value, QueryError> {
    let fragment = match cache.take() {
        Some(fragment) => fragment,
        None => doc.fragment(node)?,
    };
    let value = extract_xpath_in(&fragment, rule);
    *cache = Some(fragment);
    value
}

pub(crate) fn record_error(errors: &mut Vec<ExtractionError>, path: String, err: QueryError) {
    tracing::warn!(field = %path, query = %err.query, "{}", err);
    // A group repeats its fields per container; report each path once
    if !errors.iter().any(|existing| existing.field == path) {
        errors.push(ExtractionError::from_query(path, err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use serde_json::json;

    const PAGE: &str = r#"
    <html>
    <head><title>Blog</title></head>
    <body>
        <h1 class="article-title">Hello World</h1>
        <span class="publish-date"> 2024-01-02 </span>
        <div class="comment"><b class="author">ann</b><p>Great post!</p></div>
        <div class="comment"><b class="author">bob</b><p>Very helpful.</p></div>
    </body>
    </html>
    "#;

    #[test]
    fn test_record_has_schema_keys_in_order() {
        let schema = validate(&json!({
            "title": {"type": "css", "query": "h1"},
            "missing": {"type": "css", "query": "h2"},
            "date": {"type": "xpath", "query": "//span[@class='publish-date']/text()"},
            "authors": {"type": "css", "query": "b.author", "multiple": true}
        }))
        .unwrap();

        let extraction = extract_html(PAGE, &schema);
        assert!(extraction.is_complete());
        assert_eq!(
            extraction.record.keys().collect::<Vec<_>>(),
            vec!["title", "missing", "date", "authors"]
        );
        assert_eq!(
            Value::Object(extraction.record),
            json!({
                "title": "Hello World",
                "missing": null,
                "date": "2024-01-02",
                "authors": ["ann", "bob"]
            })
        );
    }

    #[test]
    fn test_bad_query_isolated_to_its_field() {
        let schema = validate(&json!({
            "title": {"type": "css", "query": "h1"},
            "broken": {"type": "css", "query": "div[["},
            "also_broken": {"type": "xpath", "query": "//div[", "multiple": true}
        }))
        .unwrap();

        let extraction = extract_html(PAGE, &schema);
        assert_eq!(extraction.record["title"], json!("Hello World"));
        assert_eq!(extraction.record["broken"], Value::Null);
        assert_eq!(extraction.record["also_broken"], Value::Null);

        let fields: Vec<&str> = extraction.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["broken", "also_broken"]);
        assert_eq!(extraction.errors[0].query, "div[[");

        let err = extraction.into_result().unwrap_err();
        assert_eq!(err.field, "broken");
    }

    #[test]
    fn test_nested_error_reported_once() {
        let schema = validate(&json!({
            "comments": {
                "type": "group",
                "container": "div.comment",
                "multiple": true,
                "fields": {
                    "author": {"type": "css", "query": ".author"},
                    "text": {"type": "css", "query": "p:::bad"}
                }
            }
        }))
        .unwrap();

        let extraction = extract_html(PAGE, &schema);
        assert_eq!(extraction.errors.len(), 1);
        assert_eq!(extraction.errors[0].field, "comments.text");
        assert_eq!(
            extraction.record["comments"],
            json!([
                {"author": "ann", "text": null},
                {"author": "bob", "text": null}
            ])
        );
    }

    #[test]
    fn test_nested_error_reported_without_containers() {
        let schema = validate(&json!({
            "replies": {
                "type": "group",
                "container": "li.reply",
                "multiple": true,
                "fields": {
                    "text": {"type": "xpath", "query": "./p[", "multiple": true},
                    "author": {"type": "css", "query": ".author"}
                }
            }
        }))
        .unwrap();

        let extraction = extract_html(PAGE, &schema);
        assert_eq!(extraction.record["replies"], json!([]));
        assert!(!extraction.is_complete());
        assert_eq!(extraction.errors.len(), 1);
        assert_eq!(extraction.errors[0].field, "replies.text");
    }

    #[test]
    fn test_xpath_fields_share_container() {
        let schema = validate(&json!({
            "comments": {
                "type": "group",
                "container": "div.comment",
                "multiple": true,
                "fields": {
                    "author": {"type": "xpath", "query": "./b/text()"},
                    "text": {"type": "xpath", "query": "./p"},
                    "class": {"type": "xpath", "query": ".", "attribute": "class"}
                }
            }
        }))
        .unwrap();

        let extraction = extract_html(PAGE, &schema);
        assert!(extraction.is_complete());
        assert_eq!(
            extraction.record["comments"],
            json!([
                {"author": "ann", "text": "Great post!", "class": "comment"},
                {"author": "bob", "text": "Very helpful.", "class": "comment"}
            ])
        );
    }

    #[test]
    fn test_into_result_ok_when_complete() {
        let schema = validate(&json!({"title": {"type": "css", "query": "title"}})).unwrap();
        let record = extract_html(PAGE, &schema).into_result().unwrap();
        assert_eq!(record["title"], json!("Blog"));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let schema = validate(&json!({
            "title": {"type": "css", "query": "h1"},
            "comments": {
                "type": "group",
                "container": "div.comment",
                "multiple": true,
                "fields": {"text": {"type": "xpath", "query": "./p/text()"}}
            }
        }))
        .unwrap();

        let doc = Document::parse(PAGE);
        let first = extract(&doc, &schema, None);
        let second = extract(&doc, &schema, None);
        assert_eq!(first, second);
    }
}
