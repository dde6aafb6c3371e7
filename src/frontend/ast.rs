//! Document tree.
use crate::frontend::data::{Language, ROOT_TAG};

///////////////////////////////////////////////////////////////////////////////
// AST - ELEMENT
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element name used for the closing tag.
    pub name: String,
    /// Opening spelling as emitted, i.e. the vocabulary replacement or the
    /// passthrough tag itself.
    pub open_tag: String,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str, open_tag: &str) -> Self {
        Element {
            name: name.to_owned(),
            open_tag: open_tag.to_owned(),
            children: Vec::new(),
        }
    }
    pub fn root() -> Self {
        Element::new(ROOT_TAG, "")
    }
    pub fn is_root(&self) -> bool {
        self.name == ROOT_TAG
    }
}

///////////////////////////////////////////////////////////////////////////////
// AST - CODE BLOCK
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: Language,
    /// Whitespace-normalized body, never re-tokenized.
    pub source: String,
}

///////////////////////////////////////////////////////////////////////////////
// ROOT AST
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
    CodeBlock(CodeBlock),
}

impl Node {
    pub fn new_text(value: &str) -> Self {
        Node::Text(value.to_owned())
    }
    pub fn unpack_element(&self) -> Option<&Element> {
        match self {
            Node::Element(x) => Some(x),
            _ => None,
        }
    }
    pub fn unpack_code_block(&self) -> Option<&CodeBlock> {
        match self {
            Node::CodeBlock(x) => Some(x),
            _ => None,
        }
    }
    pub fn into_element(self) -> Option<Element> {
        match self {
            Node::Element(x) => Some(x),
            _ => None,
        }
    }
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(x) => &x.children,
            Node::Text(_) | Node::CodeBlock(_) => &[],
        }
    }
    /// Every code block, depth-first left-to-right.
    pub fn code_blocks(&self) -> Vec<&CodeBlock> {
        let mut results = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Node::CodeBlock(block) => results.push(block),
                Node::Element(element) => {
                    pending.extend(element.children.iter().rev());
                }
                Node::Text(_) => (),
            }
        }
        results
    }
}
