//! CSS selector rules
//!
//! Uses the scraper tree of the [`Document`].

use serde_json::Value;

use crate::document::{Document, Node};
use crate::error::QueryError;
use crate::schema::QueryRule;

/// Evaluate a CSS rule.
///
/// `multiple` yields a (possibly empty) list; otherwise the first match or
/// `null`. With `attribute` set, the raw attribute value is taken and nodes
/// lacking it are skipped; without it, the trimmed text content.
pub fn extract_css<'a>(
    doc: &'a Document,
    rule: &QueryRule,
    context: Option<Node<'a>>,
) -> Result<Value, QueryError> {
    let nodes = doc.css_select(&rule.query, context)?;
    let attribute = rule.attribute.as_deref();

    if rule.multiple {
        let values = nodes
            .iter()
            .filter_map(|node| node_value(node, attribute))
            .map(Value::String)
            .collect();
        return Ok(Value::Array(values));
    }

    Ok(nodes
        .first()
        .and_then(|node| node_value(node, attribute))
        .map_or(Value::Null, Value::String))
}

fn node_value(node: &Node<'_>, attribute: Option<&str>) -> Option<String> {
    match attribute {
        Some(name) => node.attr(name).map(String::from),
        None => Some(node.text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(query: &str, attribute: Option<&str>, multiple: bool) -> QueryRule {
        QueryRule {
            query: query.to_string(),
            attribute: attribute.map(String::from),
            multiple,
        }
    }

    #[test]
    fn test_css_extract() {
        let doc = Document::parse(
            r#"
        <html>
        <body>
            <div class="price">$19.99</div>
            <div class="price">$29.99</div>
            <a href="/product/123" class="link">Product</a>
        </body>
        </html>
        "#,
        );

        let prices = extract_css(&doc, &rule(".price", None, true), None).unwrap();
        assert_eq!(prices, json!(["$19.99", "$29.99"]));

        let first_price = extract_css(&doc, &rule(".price", None, false), None).unwrap();
        assert_eq!(first_price, json!("$19.99"));

        let href = extract_css(&doc, &rule(".link", Some("href"), false), None).unwrap();
        assert_eq!(href, json!("/product/123"));
    }

    #[test]
    fn test_no_match() {
        let doc = Document::parse("<div class=\"c\"><h1>T</h1></div>");

        let single = extract_css(&doc, &rule("img", Some("src"), false), None).unwrap();
        assert_eq!(single, Value::Null);

        let many = extract_css(&doc, &rule("img", Some("src"), true), None).unwrap();
        assert_eq!(many, json!([]));
    }

    #[test]
    fn test_attribute_values_not_stripped() {
        let doc = Document::parse(
            r#"
            <img src=" a.png ">
            <img alt="no source">
            <img src="c.png">
            "#,
        );

        let srcs = extract_css(&doc, &rule("img", Some("src"), true), None).unwrap();
        assert_eq!(srcs, json!([" a.png ", "c.png"]));
    }

    #[test]
    fn test_first_match_without_attribute_is_null() {
        let doc = Document::parse(r#"<a>no link</a><a href="/x">link</a>"#);
        let href = extract_css(&doc, &rule("a", Some("href"), false), None).unwrap();
        assert_eq!(href, Value::Null);
    }

    #[test]
    fn test_complex_selectors() {
        let doc = Document::parse(
            r#"
        <div class="product">
            <span class="name">Product A</span>
            <span class="unit-price">
                €1.50/kg
            </span>
        </div>
        <ul><li data-id="1">Item 1</li><li data-id="2">Item 2</li></ul>
        "#,
        );

        let unit_price =
            extract_css(&doc, &rule("div.product .unit-price", None, false), None).unwrap();
        assert_eq!(unit_price, json!("€1.50/kg"));

        let second = extract_css(&doc, &rule(r#"li[data-id="2"]"#, None, false), None).unwrap();
        assert_eq!(second, json!("Item 2"));
    }

    #[test]
    fn test_context_limits_search() {
        let doc = Document::parse(
            r#"<h2>outside</h2><section><h2>inside</h2></section>"#,
        );
        let section = doc.css_select("section", None).unwrap()[0];

        let heading = extract_css(&doc, &rule("h2", None, true), Some(section)).unwrap();
        assert_eq!(heading, json!(["inside"]));
    }

    #[test]
    fn test_malformed_selector_is_error() {
        let doc = Document::parse("<p>x</p>");
        let err = extract_css(&doc, &rule("p >", None, false), None).unwrap_err();
        assert_eq!(err.query, "p >");
    }
}
