//! XPath rules

use serde_json::Value;

use crate::document::{Document, Fragment, Node, XPathItem};
use crate::error::QueryError;
use crate::schema::QueryRule;

/// Evaluate an XPath rule.
///
/// Raw string results (text nodes, attribute nodes, scalar expressions) are
/// stripped. Element results give their stripped text, or the raw value of
/// `attribute` when one is set. An empty result is `null` for a singular
/// rule and `[]` for a multiple one.
pub fn extract_xpath(
    doc: &Document,
    rule: &QueryRule,
    context: Option<Node<'_>>,
) -> Result<Value, QueryError> {
    let items = doc.xpath_eval(&rule.query, context)?;
    Ok(rule_value(&items, rule))
}

/// Evaluate an XPath rule inside an already re-parsed container
pub fn extract_xpath_in(fragment: &Fragment, rule: &QueryRule) -> Result<Value, QueryError> {
    let items = fragment.xpath_eval(&rule.query)?;
    Ok(rule_value(&items, rule))
}

fn rule_value(items: &[XPathItem], rule: &QueryRule) -> Value {
    let attribute = rule.attribute.as_deref();

    if rule.multiple {
        let values = items
            .iter()
            .filter_map(|item| item_value(item, attribute))
            .map(Value::String)
            .collect();
        return Value::Array(values);
    }

    items
        .first()
        .and_then(|item| item_value(item, attribute))
        .map_or(Value::Null, Value::String)
}

fn item_value(item: &XPathItem, attribute: Option<&str>) -> Option<String> {
    match item {
        XPathItem::Text(text) => Some(text.trim().to_string()),
        XPathItem::Element(element) => match attribute {
            Some(name) => element.attr(name).map(String::from),
            None => Some(element.text.trim().to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"
    <html>
    <body>
        <div class="price"> $199 </div>
        <a href="/docs/file.pdf">Download</a>
        <a href="/about">About</a>
        <ul>
            <li data-id="1"> one </li>
            <li> two </li>
        </ul>
    </body>
    </html>
    "#;

    fn rule(query: &str, attribute: Option<&str>, multiple: bool) -> QueryRule {
        QueryRule {
            query: query.to_string(),
            attribute: attribute.map(String::from),
            multiple,
        }
    }

    #[test]
    fn test_text_axis() {
        let doc = Document::parse(PAGE);
        let price = extract_xpath(&doc, &rule("//div[@class='price']/text()", None, false), None)
            .unwrap();
        assert_eq!(price, json!("$199"));
    }

    #[test]
    fn test_attribute_axis() {
        let doc = Document::parse(PAGE);
        let link = extract_xpath(
            &doc,
            &rule("//a[contains(text(),'Download')]/@href", None, false),
            None,
        )
        .unwrap();
        assert_eq!(link, json!("/docs/file.pdf"));

        let links = extract_xpath(&doc, &rule("//a[@href]/@href", None, true), None).unwrap();
        assert_eq!(links, json!(["/docs/file.pdf", "/about"]));
    }

    #[test]
    fn test_element_results_give_text() {
        let doc = Document::parse(PAGE);
        let items = extract_xpath(&doc, &rule("//li", None, true), None).unwrap();
        assert_eq!(items, json!(["one", "two"]));

        let first = extract_xpath(&doc, &rule("//li", None, false), None).unwrap();
        assert_eq!(first, json!("one"));
    }

    #[test]
    fn test_element_results_with_attribute() {
        let doc = Document::parse(PAGE);
        let ids = extract_xpath(&doc, &rule("//li", Some("data-id"), true), None).unwrap();
        assert_eq!(ids, json!(["1"]));
    }

    #[test]
    fn test_singular_attribute_missing_on_first_element() {
        let doc = Document::parse(r#"<ul><li>plain</li><li data-id="7">tagged</li></ul>"#);
        let id = extract_xpath(&doc, &rule("//li", Some("data-id"), false), None).unwrap();
        assert_eq!(id, Value::Null);
    }

    #[test]
    fn test_extract_within_fragment() {
        let doc = Document::parse(PAGE);
        let list = doc.css_select("ul", None).unwrap()[0];
        let fragment = doc.fragment(list).unwrap();

        let items = extract_xpath_in(&fragment, &rule("./li", None, true)).unwrap();
        assert_eq!(items, json!(["one", "two"]));

        let id = extract_xpath_in(&fragment, &rule("./li", Some("data-id"), false)).unwrap();
        assert_eq!(id, json!("1"));
    }

    #[test]
    fn test_empty_results() {
        let doc = Document::parse("<p>no links here</p>");

        let many = extract_xpath(&doc, &rule("//a[@href]/@href", None, true), None).unwrap();
        assert_eq!(many, json!([]));

        let single = extract_xpath(&doc, &rule("//a[@href]/@href", None, false), None).unwrap();
        assert_eq!(single, Value::Null);
    }

    #[test]
    fn test_scalar_result() {
        let doc = Document::parse(PAGE);
        let count = extract_xpath(&doc, &rule("count(//li)", None, false), None).unwrap();
        assert_eq!(count, json!("2"));
    }
}
