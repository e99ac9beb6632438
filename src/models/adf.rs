//! Minimal Atlassian Document Format (ADF) support.
//!
//! Jira Cloud's v3 API only accepts ADF for long-text fields such as
//! `description`. We only ever produce paragraphs of text and hard breaks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "doc")]
    Doc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub version: u8,
    pub content: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph {
        // An empty paragraph carries no `content` key at all
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Inline>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text { text: String },
    HardBreak,
}

impl Document {
    pub fn new(content: Vec<Block>) -> Self {
        Self {
            kind: DocumentKind::Doc,
            version: 1,
            content,
        }
    }
}

/// Convert plain text into ADF.
///
/// Blank-line separated blocks become paragraphs; single newlines inside a
/// block become `hardBreak` nodes. Empty lines emit no text node.
pub fn text_to_document(text: &str) -> Document {
    let paragraphs = text
        .split("\n\n")
        .map(|block| {
            let lines: Vec<&str> = block.split('\n').collect();
            let mut content = Vec::with_capacity(lines.len() * 2);

            for (index, line) in lines.iter().enumerate() {
                if !line.is_empty() {
                    content.push(Inline::Text {
                        text: (*line).to_string(),
                    });
                }
                if index < lines.len() - 1 {
                    content.push(Inline::HardBreak);
                }
            }

            Block::Paragraph { content }
        })
        .collect();

    Document::new(paragraphs)
}

/// Make sure a description value is ADF.
///
/// Strings are converted, `null` becomes an empty document, and anything else
/// is assumed to already be a document and is returned untouched.
pub fn ensure_document(description: Value) -> Value {
    match description {
        Value::String(text) => document_value(&text),
        Value::Null => document_value(""),
        other => other,
    }
}

fn document_value(text: &str) -> Value {
    serde_json::to_value(text_to_document(text)).unwrap_or(Value::Null)
}

/// Flatten an ADF value back into plain text for display.
///
/// Works on arbitrary documents, not just ones we built: unknown nodes are
/// walked for their `content`, top-level blocks are separated by a blank line.
pub fn document_to_text(document: &Value) -> String {
    match document {
        Value::String(text) => text.clone(),
        Value::Object(_) => document
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .map(|block| {
                        let mut out = String::new();
                        push_inline_text(block, &mut out);
                        out
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn push_inline_text(node: &Value, out: &mut String) {
    match node.get("type").and_then(Value::as_str) {
        Some("text") => out.push_str(node.get("text").and_then(Value::as_str).unwrap_or_default()),
        Some("hardBreak") => out.push('\n'),
        _ => {
            if let Some(children) = node.get("content").and_then(Value::as_array) {
                for child in children {
                    push_inline_text(child, out);
                }
            }
        }
    }
}
