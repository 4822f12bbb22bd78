//! Document adapter
//!
//! Wraps two trees parsed from the same HTML string: a `scraper` tree for CSS
//! selectors and an `sxd_document` tree for XPath. Both are built by html5ever,
//! so element structure agrees between them. Callers only ever see [`Node`]
//! handles from the CSS tree and materialized [`XPathItem`]s.
//!
//! XPath evaluation scoped to a CSS-matched node re-serializes that node and
//! re-parses it, then evaluates with the re-rooted element as context. Child
//! and descendant axis queries behave as on the full tree; ancestor, sibling
//! and absolute (`//`) queries only see the re-rooted fragment. A
//! [`Fragment`] keeps one such re-parse for repeated queries.

use scraper::{ElementRef, Html, Selector};
use sxd_document::Package;
use sxd_xpath::nodeset::Node as XmlNode;
use sxd_xpath::{Context, Factory, Value as XmlValue, XPath};

use crate::error::QueryError;

/// A parsed HTML page. Read-only after construction.
pub struct Document {
    html: Html,
    xml: Package,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            xml: sxd_html::parse_html(html),
        }
    }

    /// The `<html>` element
    pub fn root(&self) -> Node<'_> {
        Node(self.html.root_element())
    }

    /// All elements matching a CSS selector, in document order.
    ///
    /// With a context node only its descendants are searched.
    pub fn css_select<'a>(
        &'a self,
        query: &str,
        context: Option<Node<'a>>,
    ) -> Result<Vec<Node<'a>>, QueryError> {
        let selector = compile_css(query)?;

        let nodes = match context {
            Some(node) => node.0.select(&selector).map(Node).collect(),
            None => self.html.select(&selector).map(Node).collect(),
        };

        Ok(nodes)
    }

    /// Evaluate an XPath expression against the document or a context node.
    ///
    /// Node-set results come back in document order. Scalar results
    /// (`string()`, `count()`, booleans) come back as a single text item.
    /// Running several queries under one context is cheaper through
    /// [`Document::fragment`].
    pub fn xpath_eval(
        &self,
        query: &str,
        context: Option<Node<'_>>,
    ) -> Result<Vec<XPathItem>, QueryError> {
        match context {
            None => {
                let xpath = compile_xpath(query)?;
                let document = self.xml.as_document();
                evaluate(&xpath, query, document.root())
            }
            Some(node) => self.fragment(node)?.xpath_eval(query),
        }
    }

    /// Re-parse `node` into its own XPath tree
    pub fn fragment(&self, node: Node<'_>) -> Result<Fragment, QueryError> {
        let (html, locator) = wrap_fragment(node);
        let locator = compile_xpath(locator)?;
        Ok(Fragment {
            package: sxd_html::parse_html(&html),
            locator,
            element: node.name().to_string(),
        })
    }

    /// Compile a CSS selector without running it
    pub fn check_css(query: &str) -> Result<(), QueryError> {
        compile_css(query).map(|_| ())
    }

    /// Compile an XPath expression without running it
    pub fn check_xpath(query: &str) -> Result<(), QueryError> {
        compile_xpath(query).map(|_| ())
    }
}

/// A CSS-matched element re-parsed for XPath, with the expression that
/// finds it again inside the re-parsed tree
pub struct Fragment {
    package: Package,
    locator: XPath,
    element: String,
}

impl Fragment {
    /// Evaluate `query` with the re-rooted element as context node
    pub fn xpath_eval(&self, query: &str) -> Result<Vec<XPathItem>, QueryError> {
        let xpath = compile_xpath(query)?;
        let document = self.package.as_document();

        let located = self
            .locator
            .evaluate(&Context::new(), document.root())
            .map_err(|e| QueryError::xpath(query, e))?;
        let scope = match located {
            XmlValue::Nodeset(nodes) => nodes.document_order().into_iter().next(),
            _ => None,
        };

        match scope {
            Some(scope) => evaluate(&xpath, query, scope),
            None => {
                tracing::debug!(
                    element = %self.element,
                    "context element lost on re-parse; xpath sees no nodes"
                );
                Ok(vec![])
            }
        }
    }
}

fn compile_css(query: &str) -> Result<Selector, QueryError> {
    Selector::parse(query).map_err(|e| QueryError::css(query, e))
}

fn compile_xpath(query: &str) -> Result<XPath, QueryError> {
    Factory::new()
        .build(query)
        .map_err(|e| QueryError::xpath(query, e))?
        .ok_or_else(|| QueryError::xpath(query, "empty expression"))
}

fn evaluate<'d>(
    xpath: &XPath,
    query: &str,
    node: impl Into<XmlNode<'d>>,
) -> Result<Vec<XPathItem>, QueryError> {
    let context = Context::new();
    let value = xpath
        .evaluate(&context, node)
        .map_err(|e| QueryError::xpath(query, e))?;

    let items = match value {
        XmlValue::Nodeset(nodes) => nodes
            .document_order()
            .into_iter()
            .map(XPathItem::from_node)
            .collect(),
        XmlValue::String(s) => vec![XPathItem::Text(s)],
        XmlValue::Number(n) => vec![XPathItem::Text(format_number(n))],
        XmlValue::Boolean(b) => vec![XPathItem::Text(b.to_string())],
    };

    Ok(items)
}

/// Serialize a node so that html5ever keeps it when parsing a whole document,
/// along with the path to it in the re-parsed tree. Table parts outside a
/// `<table>` would otherwise be dropped.
fn wrap_fragment(node: Node<'_>) -> (String, &'static str) {
    let html = node.html();
    match node.name() {
        "html" => (html, "/html"),
        "head" => (html, "/html/head"),
        "body" => (html, "/html/body"),
        "tr" => (
            format!("<table><tbody>{}</tbody></table>", html),
            "/html/body/table/tbody/*[1]",
        ),
        "td" | "th" => (
            format!("<table><tbody><tr>{}</tr></tbody></table>", html),
            "/html/body/table/tbody/tr/*[1]",
        ),
        "thead" | "tbody" | "tfoot" | "caption" | "colgroup" => {
            (format!("<table>{}</table>", html), "/html/body/table/*[1]")
        }
        "col" => (
            format!("<table><colgroup>{}</colgroup></table>", html),
            "/html/body/table/colgroup/*[1]",
        ),
        _ => (html, "(/html/head/* | /html/body/*)[1]"),
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// Handle to an element in the CSS tree
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    /// Concatenated descendant text, trimmed
    pub fn text(&self) -> String {
        self.0.text().collect::<String>().trim().to_string()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// Outer HTML
    pub fn html(&self) -> String {
        self.0.html()
    }

    /// Local tag name
    pub fn name(&self) -> &'a str {
        self.0.value().name()
    }
}

/// One XPath result, copied out of the XPath tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathItem {
    /// An element (or the document root)
    Element(XPathElement),
    /// A raw string: text node, attribute node or scalar result
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathElement {
    /// String value of the element (all descendant text)
    pub text: String,
    pub attributes: Vec<(String, String)>,
}

impl XPathElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl XPathItem {
    fn from_node(node: XmlNode<'_>) -> Self {
        match node {
            XmlNode::Element(element) => XPathItem::Element(XPathElement {
                text: node.string_value(),
                attributes: element
                    .attributes()
                    .iter()
                    .map(|attr| (attr.name().local_part().to_string(), attr.value().to_string()))
                    .collect(),
            }),
            XmlNode::Root(_) => XPathItem::Element(XPathElement {
                text: node.string_value(),
                attributes: vec![],
            }),
            _ => XPathItem::Text(node.string_value()),
        }
    }
}
