//! Styled-run document model backing rich-text notes.
//!
//! Mirrors the insert-operation shape used by the embedded rich-text widget
//! so stored content round-trips losslessly for supported attributes.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Style attributes carried by a single insert operation.
///
/// Attributes the widget understands but this system does not style (lists,
/// for example) are preserved in `extra` so a round-trip never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleAttributes {
    /// Font family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Font size, stored with or without a `px` suffix
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "size_as_string")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike: Option<bool>,
    /// Paragraph alignment marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// The widget may store a size as `"14px"`, `"14"`, or a bare number.
fn size_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        Value::String(s) => s,
        other => other.to_string(),
    }))
}

/// A single insert operation: a literal text run or an embedded marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertValue {
    /// Literal text, possibly containing newlines
    Text(String),
    /// Non-text embed; preserved through round-trips but never rendered
    Embed(Value),
}

/// One entry in a styled document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichOp {
    pub insert: InsertValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<StyleAttributes>,
}

impl RichOp {
    /// A plain text run without attributes.
    pub fn text(text: impl Into<String>) -> Self {
        RichOp {
            insert: InsertValue::Text(text.into()),
            attributes: None,
        }
    }

    /// A text run carrying the given attributes.
    pub fn styled(text: impl Into<String>, attributes: StyleAttributes) -> Self {
        RichOp {
            insert: InsertValue::Text(text.into()),
            attributes: Some(attributes),
        }
    }
}

/// Ordered sequence of insert operations making up a rich note's content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichDocument {
    #[serde(default)]
    pub ops: Vec<RichOp>,
}

impl RichDocument {
    /// Parses the canonical serialized form; empty content is an empty document.
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        if content.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(content)
    }

    /// Serializes to the canonical form used for persistence.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Concatenates every literal text run, skipping non-text embeds.
    pub fn plain_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match &op.insert {
                InsertValue::Text(text) => Some(text.as_str()),
                InsertValue::Embed(_) => None,
            })
            .collect()
    }

    /// Renders the document as an inline-styled HTML fragment.
    ///
    /// Text is escaped before any style wrapping; a lone `\n` insert becomes
    /// a line break and never carries styling of its own.
    pub fn to_html(&self) -> String {
        let mut html = String::new();

        for op in &self.ops {
            let InsertValue::Text(text) = &op.insert else {
                continue;
            };

            if text == "\n" {
                html.push_str("<br>");
                continue;
            }

            let escaped = escape_html(text).replace('\n', "<br>");
            let styles = op
                .attributes
                .as_ref()
                .map(style_declarations)
                .unwrap_or_default();

            if styles.is_empty() {
                html.push_str(&escaped);
            } else {
                html.push_str(&format!(
                    r#"<span style="{}">{}</span>"#,
                    styles.join("; "),
                    escaped
                ));
            }
        }

        html
    }
}

/// Maps an attribute set to inline CSS declarations.
fn style_declarations(attrs: &StyleAttributes) -> Vec<String> {
    let mut styles = Vec::new();

    if let Some(font) = &attrs.font {
        styles.push(format!("font-family: '{}'", font));
    }
    if let Some(size) = &attrs.size {
        let numeric = size.trim_end_matches("px");
        styles.push(format!("font-size: {}px", numeric));
    }
    if attrs.bold.unwrap_or(false) {
        styles.push("font-weight: bold".to_string());
    }
    if attrs.italic.unwrap_or(false) {
        styles.push("font-style: italic".to_string());
    }
    if attrs.underline.unwrap_or(false) {
        styles.push("text-decoration: underline".to_string());
    }
    if attrs.strike.unwrap_or(false) {
        styles.push("text-decoration: line-through".to_string());
    }

    styles
}

/// Escapes the characters that would break markup when inlined.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> StyleAttributes {
        StyleAttributes {
            bold: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn empty_content_parses_to_empty_document() {
        let doc = RichDocument::parse("").unwrap();
        assert!(doc.ops.is_empty());
    }

    #[test]
    fn round_trip_preserves_supported_and_unknown_attributes() {
        let raw = r#"{"ops":[{"insert":"Hi","attributes":{"bold":true,"list":"bullet"}},{"insert":"\n"}]}"#;
        let doc = RichDocument::parse(raw).unwrap();
        let back = RichDocument::parse(&doc.to_json().unwrap()).unwrap();
        assert_eq!(doc, back);
        assert_eq!(
            back.ops[0].attributes.as_ref().unwrap().extra["list"],
            Value::String("bullet".to_string())
        );
    }

    #[test]
    fn plain_text_skips_embeds() {
        let raw = r#"{"ops":[{"insert":"a"},{"insert":{"image":"x.png"}},{"insert":"b"}]}"#;
        let doc = RichDocument::parse(raw).unwrap();
        assert_eq!(doc.plain_text(), "ab");
    }

    #[test]
    fn html_escapes_before_styling() {
        let doc = RichDocument {
            ops: vec![RichOp::styled("a < b & c", bold())],
        };
        assert_eq!(
            doc.to_html(),
            r#"<span style="font-weight: bold">a &lt; b &amp; c</span>"#
        );
    }

    #[test]
    fn newline_insert_renders_as_line_break() {
        let doc = RichDocument {
            ops: vec![RichOp::text("a"), RichOp::text("\n"), RichOp::text("b")],
        };
        assert_eq!(doc.to_html(), "a<br>b");
    }

    #[test]
    fn size_normalizes_with_and_without_px() {
        for raw in [
            r#"{"ops":[{"insert":"x","attributes":{"size":"18px"}}]}"#,
            r#"{"ops":[{"insert":"x","attributes":{"size":18}}]}"#,
        ] {
            let doc = RichDocument::parse(raw).unwrap();
            assert!(doc.to_html().contains("font-size: 18px"));
        }
    }

    #[test]
    fn font_and_decorations_render_as_declarations() {
        let attrs = StyleAttributes {
            font: Some("Georgia".to_string()),
            italic: Some(true),
            strike: Some(true),
            ..Default::default()
        };
        let doc = RichDocument {
            ops: vec![RichOp::styled("x", attrs)],
        };
        let html = doc.to_html();
        assert!(html.contains("font-family: 'Georgia'"));
        assert!(html.contains("font-style: italic"));
        assert!(html.contains("text-decoration: line-through"));
    }
}
