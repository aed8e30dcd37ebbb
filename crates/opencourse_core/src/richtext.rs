//! crates/opencourse_core/src/richtext.rs
//!
//! Renders the rich-text lesson body (a JSON node tree as produced by the
//! authoring editor) into escaped HTML for the lesson view endpoint.
//!
//! The tree is `{type, attrs?, content?: [node], text?, marks?: [mark]}`.
//! Unknown node types render their children; unknown marks are ignored, so
//! documents from newer editor versions degrade gracefully instead of
//! failing.

use serde_json::Value;

/// Renders a whole document node to HTML. Anything that is not an object
/// renders as the empty string.
pub fn render_document(doc: &Value) -> String {
    let mut out = String::new();
    render_node(doc, &mut out);
    out
}

fn render_node(node: &Value, out: &mut String) {
    let Some(node_type) = node.get("type").and_then(Value::as_str) else {
        return;
    };

    match node_type {
        "doc" => render_children(node, out),
        "paragraph" => wrap(node, out, "<p>", "</p>"),
        "heading" => {
            let level = node
                .get("attrs")
                .and_then(|a| a.get("level"))
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6);
            out.push_str(&format!("<h{level}>"));
            render_children(node, out);
            out.push_str(&format!("</h{level}>"));
        }
        "bulletList" => wrap(node, out, "<ul>", "</ul>"),
        "orderedList" => wrap(node, out, "<ol>", "</ol>"),
        "listItem" => wrap(node, out, "<li>", "</li>"),
        "blockquote" => wrap(node, out, "<blockquote>", "</blockquote>"),
        "codeBlock" => wrap(node, out, "<pre><code>", "</code></pre>"),
        "image" => {
            let attrs = node.get("attrs");
            let src = attrs
                .and_then(|a| a.get("src"))
                .and_then(Value::as_str)
                .unwrap_or("");
            let alt = attrs
                .and_then(|a| a.get("alt"))
                .and_then(Value::as_str)
                .unwrap_or("");
            out.push_str("<img src=\"");
            escape_into(src, out);
            out.push_str("\" alt=\"");
            escape_into(alt, out);
            out.push_str("\">");
        }
        "hardBreak" => out.push_str("<br>"),
        "horizontalRule" => out.push_str("<hr>"),
        "text" => render_text(node, out),
        // Unknown block type: keep the content, drop the wrapper.
        _ => render_children(node, out),
    }
}

fn wrap(node: &Value, out: &mut String, open: &str, close: &str) {
    out.push_str(open);
    render_children(node, out);
    out.push_str(close);
}

fn render_children(node: &Value, out: &mut String) {
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            render_node(child, out);
        }
    }
}

/// A text leaf: escape the text and wrap it in its marks, outermost first.
fn render_text(node: &Value, out: &mut String) {
    let text = node.get("text").and_then(Value::as_str).unwrap_or("");

    let marks: Vec<&Value> = node
        .get("marks")
        .and_then(Value::as_array)
        .map(|m| m.iter().collect())
        .unwrap_or_default();

    let mut closers = Vec::new();
    for mark in &marks {
        match mark.get("type").and_then(Value::as_str) {
            Some("bold") => {
                out.push_str("<strong>");
                closers.push("</strong>");
            }
            Some("italic") => {
                out.push_str("<em>");
                closers.push("</em>");
            }
            Some("code") => {
                out.push_str("<code>");
                closers.push("</code>");
            }
            Some("link") => {
                let href = mark
                    .get("attrs")
                    .and_then(|a| a.get("href"))
                    .and_then(Value::as_str)
                    .unwrap_or("");
                out.push_str("<a href=\"");
                escape_into(href, out);
                out.push_str("\">");
                closers.push("</a>");
            }
            _ => {}
        }
    }

    escape_into(text, out);

    for closer in closers.into_iter().rev() {
        out.push_str(closer);
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_paragraph_with_marks() {
        let doc = json!({
            "type": "doc",
            "content": [{
                "type": "paragraph",
                "content": [
                    {"type": "text", "text": "Hola "},
                    {"type": "text", "text": "mundo", "marks": [{"type": "bold"}]},
                ]
            }]
        });
        assert_eq!(render_document(&doc), "<p>Hola <strong>mundo</strong></p>");
    }

    #[test]
    fn nested_marks_close_in_reverse_order() {
        let doc = json!({
            "type": "doc",
            "content": [{
                "type": "paragraph",
                "content": [{
                    "type": "text",
                    "text": "x",
                    "marks": [{"type": "bold"}, {"type": "italic"}]
                }]
            }]
        });
        assert_eq!(
            render_document(&doc),
            "<p><strong><em>x</em></strong></p>"
        );
    }

    #[test]
    fn heading_level_is_clamped() {
        let doc = json!({
            "type": "heading",
            "attrs": {"level": 9},
            "content": [{"type": "text", "text": "t"}]
        });
        assert_eq!(render_document(&doc), "<h6>t</h6>");
    }

    #[test]
    fn text_is_html_escaped() {
        let doc = json!({
            "type": "paragraph",
            "content": [{"type": "text", "text": "<script>&\"'"}]
        });
        assert_eq!(
            render_document(&doc),
            "<p>&lt;script&gt;&amp;&quot;&#39;</p>"
        );
    }

    #[test]
    fn link_href_is_escaped() {
        let doc = json!({
            "type": "paragraph",
            "content": [{
                "type": "text",
                "text": "here",
                "marks": [{"type": "link", "attrs": {"href": "https://x.test/?a=1&b=\"2\""}}]
            }]
        });
        assert_eq!(
            render_document(&doc),
            "<p><a href=\"https://x.test/?a=1&amp;b=&quot;2&quot;\">here</a></p>"
        );
    }

    #[test]
    fn lists_and_code_blocks_render() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "one"}]}
                    ]}
                ]},
                {"type": "codeBlock", "content": [{"type": "text", "text": "let x = 1;"}]}
            ]
        });
        assert_eq!(
            render_document(&doc),
            "<ul><li><p>one</p></li></ul><pre><code>let x = 1;</code></pre>"
        );
    }

    #[test]
    fn unknown_nodes_render_their_children() {
        let doc = json!({
            "type": "futureWidget",
            "content": [{"type": "paragraph", "content": [{"type": "text", "text": "kept"}]}]
        });
        assert_eq!(render_document(&doc), "<p>kept</p>");
    }

    #[test]
    fn image_renders_escaped_attributes() {
        let doc = json!({
            "type": "image",
            "attrs": {"src": "/up/a.png", "alt": "a \"poster\""}
        });
        assert_eq!(
            render_document(&doc),
            "<img src=\"/up/a.png\" alt=\"a &quot;poster&quot;\">"
        );
    }

    #[test]
    fn non_object_input_renders_nothing() {
        assert_eq!(render_document(&json!(null)), "");
        assert_eq!(render_document(&json!([1, 2])), "");
    }
}
