//! HTML rendering of the document tree and the page skeleton around it.
use itertools::Itertools;
use crate::backend::bridge::ExecutionResult;
use crate::frontend::ast::{CodeBlock, Element, Node};

///////////////////////////////////////////////////////////////////////////////
// BODY
///////////////////////////////////////////////////////////////////////////////

fn render_code_block(block: &CodeBlock) -> String {
    format!(
        "<pre class=\"webthon-code\" data-language=\"{}\"><code>{}</code></pre>",
        block.language.as_str(),
        html_escape::encode_text(&block.source),
    )
}

fn render_element(element: &Element, out: &mut String) {
    if !element.is_root() {
        out.push_str(&element.open_tag);
    }
    for child in element.children.iter() {
        render_node(child, out);
    }
    if !element.is_root() {
        out.push_str("</");
        out.push_str(&element.name);
        out.push('>');
    }
}

fn render_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => render_element(element, out),
        Node::CodeBlock(block) => out.push_str(&render_code_block(block)),
    }
}

/// Renders the tree. Code blocks become inert escaped placeholders; nothing
/// is executed here.
pub fn render_body(node: &Node) -> String {
    let mut out = String::new();
    render_node(node, &mut out);
    out
}

///////////////////////////////////////////////////////////////////////////////
// DOCUMENT
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub body: String,
    /// Captured outputs appended after the body; empty unless requested.
    pub outputs: Vec<ExecutionResult>,
}

impl Document {
    pub fn new(title: &str, body: String) -> Self {
        Document {
            title: title.to_owned(),
            body,
            outputs: Vec::new(),
        }
    }
    pub fn with_outputs(mut self, outputs: Vec<ExecutionResult>) -> Self {
        self.outputs = outputs;
        self
    }
    fn render_outputs(&self) -> Option<String> {
        if self.outputs.is_empty() {
            return None;
        }
        let entries = self.outputs
            .iter()
            .map(|result| {
                let status = if result.success { "ok" } else { "failed" };
                format!(
                    "<pre class=\"webthon-output\" data-language=\"{}\" data-status=\"{}\">{}</pre>",
                    result.language.as_str(),
                    status,
                    html_escape::encode_text(&result.captured_stdout),
                )
            })
            .join("\n");
        Some(format!("<section class=\"webthon-output\">\n{}\n</section>", entries))
    }
    pub fn render_to_string(&self) -> String {
        let body = match self.render_outputs() {
            Some(outputs) => format!("{}\n{}", self.body, outputs),
            None => self.body.clone(),
        };
        format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <meta charset=\"UTF-8\">\n\
             <title>{}</title>\n\
             </head>\n\
             <body>\n\
             {}\n\
             </body>\n\
             </html>\n",
            html_escape::encode_text(&self.title),
            body,
        )
    }
}
