//! The parser herein is supposed to meet the following criteria:
//! * fault tolerant parsing: every token sequence yields a tree. Unmatched
//!   closers are ignored, unmatched openers are closed at end of input.
//! * iterative: nesting lives on an explicit stack, never the call stack.
//! * foreign-code spans are opaque; they are cut from the source text up to
//!   their closer and never tokenized.
use crate::frontend::ast::{CodeBlock, Element, Node};
use crate::frontend::data::{closing_spelling, is_raw_text_element, tag_name, TagKind, TagVocabulary};
use crate::frontend::tokenizer::{tokenize, Token, Tokenizer};
use crate::parser_utils::normalize_code_source;

///////////////////////////////////////////////////////////////////////////////
// STACK
///////////////////////////////////////////////////////////////////////////////

/// Open elements, innermost last. The root frame is never popped.
#[derive(Debug, Clone)]
struct Stack(Vec<Element>);

impl Stack {
    fn new() -> Self {
        Stack(vec![Element::root()])
    }
    fn add_to_parent(&mut self, node: Node) {
        if let Some(parent) = self.0.last_mut() {
            parent.children.push(node);
        }
    }
    fn push(&mut self, element: Element) {
        self.0.push(element);
    }
    /// Closes the innermost element, if any besides the root is open.
    fn pop(&mut self) -> bool {
        if self.0.len() <= 1 {
            return false;
        }
        match self.0.pop() {
            Some(element) => {
                self.add_to_parent(Node::Element(element));
                true
            }
            None => false,
        }
    }
    fn finish(mut self) -> Element {
        let open = self.0.len() - 1;
        if open > 0 {
            tracing::debug!(open, "closing unterminated elements at end of input");
        }
        while self.pop() {}
        self.0.pop().unwrap_or_else(Element::root)
    }
}

///////////////////////////////////////////////////////////////////////////////
// RAW TEXT
///////////////////////////////////////////////////////////////////////////////

/// Vocabulary substitution over a raw-text body; everything else is kept
/// byte for byte.
fn substitute_tags(body: &str, vocabulary: &TagVocabulary) -> String {
    let mut out = String::with_capacity(body.len());
    for token in tokenize(body) {
        match token.unpack_tag().and_then(|x| vocabulary.substitute(x)) {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(token.raw()),
        }
    }
    out
}

fn raw_text_element(name: &str, open_tag: &str, body: String) -> Node {
    let mut element = Element::new(name, open_tag);
    if !body.is_empty() {
        element.children.push(Node::Text(body));
    }
    Node::Element(element)
}

///////////////////////////////////////////////////////////////////////////////
// PARSER ENTRYPOINT
///////////////////////////////////////////////////////////////////////////////

/// Builds the document tree; the result is always the root element.
///
/// Opaque spans (code blocks and raw-text bodies) end at the first literal
/// occurrence of their closer in the source text, so a `<` inside them never
/// starts a tag.
pub fn parse(mut tokens: Tokenizer, vocabulary: &TagVocabulary) -> Node {
    let mut stack = Stack::new();
    while let Some(token) = tokens.next() {
        let tag = match token {
            Token::Text(text) => {
                stack.add_to_parent(Node::new_text(text));
                continue;
            }
            Token::Tag(tag) => tag,
        };
        match vocabulary.classify(tag) {
            TagKind::CodeOpen(code) => {
                let (body, terminated) = tokens.take_until(&[code.close.as_str()]);
                if !terminated {
                    tracing::warn!(
                        tag = code.open.as_str(),
                        "code block has no closing {}; capturing to end of input",
                        code.close,
                    );
                }
                stack.add_to_parent(Node::CodeBlock(CodeBlock {
                    language: code.language,
                    source: normalize_code_source(body),
                }));
            }
            TagKind::Open(entry) if entry.raw_text => {
                let closers = entry.closers();
                let (body, _) = tokens.take_until(&[closers[0].as_str(), closers[1].as_str()]);
                let body = substitute_tags(body, vocabulary);
                stack.add_to_parent(raw_text_element(entry.name(), &entry.replacement, body));
            }
            TagKind::Open(entry) => {
                stack.push(Element::new(entry.name(), &entry.replacement));
            }
            TagKind::PassthroughOpen if is_raw_text_element(tag) => {
                let (body, _) = tokens.take_until(&[closing_spelling(tag).as_str()]);
                stack.add_to_parent(raw_text_element(tag_name(tag), tag, body.to_owned()));
            }
            TagKind::PassthroughOpen => {
                stack.push(Element::new(tag_name(tag), tag));
            }
            TagKind::Close | TagKind::PassthroughClose => {
                if !stack.pop() {
                    tracing::debug!(tag, "ignoring closing tag with no open element");
                }
            }
            TagKind::Void => {
                stack.add_to_parent(Node::new_text(tag));
            }
            TagKind::Elided => (),
        }
    }
    Node::Element(stack.finish())
}

pub fn parse_source(source: &str, vocabulary: &TagVocabulary) -> Node {
    parse(Tokenizer::new(source), vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::data::Language;

    fn parse(source: &str) -> Vec<Node> {
        parse_source(source, &TagVocabulary::webthon())
            .into_element()
            .unwrap()
            .children
    }

    fn element(name: &str, open_tag: &str, children: Vec<Node>) -> Node {
        let mut element = Element::new(name, open_tag);
        element.children = children;
        Node::Element(element)
    }

    #[test]
    fn root_is_reserved_element() {
        let root = parse_source("", &TagVocabulary::webthon());
        assert!(root.unpack_element().unwrap().is_root());
        assert!(root.children().is_empty());
    }

    #[test]
    fn substitutes_vocabulary_tags() {
        assert_eq!(parse("<print>Hi</print>"), vec![
            element("h1", "<h1>", vec![Node::new_text("Hi")]),
        ]);
    }

    #[test]
    fn style_and_code_block() {
        let nodes = parse("<css>body{color:red}</css><python>print(1)</python>");
        assert_eq!(nodes, vec![
            element("style", "<style>", vec![Node::new_text("body{color:red}")]),
            Node::CodeBlock(CodeBlock {
                language: Language::Interpreted,
                source: "print(1)".to_owned(),
            }),
        ]);
    }

    #[test]
    fn code_block_interior_is_opaque() {
        let nodes = parse("<c>\n    if (a<b && c>d) { puts(\"<css>\"); }\n</c>");
        let block = nodes[0].unpack_code_block().unwrap();
        assert_eq!(block.language, Language::NativeCompiled);
        assert_eq!(block.source, "if (a<b && c>d) { puts(\"<css>\"); }");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn unterminated_code_block_captures_rest() {
        let nodes = parse("<p>x</p><python>\nprint('<p>')\n<print>");
        assert_eq!(nodes.len(), 2);
        let block = nodes[1].unpack_code_block().unwrap();
        assert_eq!(block.source, "print('<p>')\n<print>");
    }

    #[test]
    fn unmatched_opener_closes_at_end() {
        let nodes = parse("<js>a()</js><unmatched>");
        assert_eq!(nodes, vec![
            element("script", "<script>", vec![Node::new_text("a()")]),
            element("unmatched", "<unmatched>", vec![]),
        ]);
    }

    #[test]
    fn unmatched_opener_owns_the_rest() {
        let nodes = parse("<div>a<print>b");
        assert_eq!(nodes, vec![
            element("div", "<div>", vec![
                Node::new_text("a"),
                element("h1", "<h1>", vec![Node::new_text("b")]),
            ]),
        ]);
    }

    #[test]
    fn unmatched_closer_is_ignored() {
        let nodes = parse("a</print><p>b</p></css>c");
        assert_eq!(nodes, vec![
            Node::new_text("a"),
            element("p", "<p>", vec![Node::new_text("b")]),
            Node::new_text("c"),
        ]);
    }

    #[test]
    fn raw_text_bodies_keep_comparisons() {
        let nodes = parse("<js>for (i=0;i<n;i++) {}</js>after");
        assert_eq!(nodes, vec![
            element("script", "<script>", vec![Node::new_text("for (i=0;i<n;i++) {}")]),
            Node::new_text("after"),
        ]);
    }

    #[test]
    fn raw_text_bodies_still_substitute_vocabulary() {
        let nodes = parse("<js>x = '<print>'</js>");
        assert_eq!(nodes, vec![
            element("script", "<script>", vec![Node::new_text("x = '<h1>'")]),
        ]);
    }

    #[test]
    fn replacement_spellings_are_already_converted() {
        let nodes = parse("<style>a{}</style><script>b()</js>");
        assert_eq!(nodes, vec![
            element("style", "<style>", vec![Node::new_text("a{}")]),
            element("script", "<script>", vec![Node::new_text("b()")]),
        ]);
    }

    #[test]
    fn void_markup_has_no_children() {
        let nodes = parse("a<br>b<img src=\"x.png\"/><!-- c -->");
        assert_eq!(nodes, vec![
            Node::new_text("a"),
            Node::new_text("<br>"),
            Node::new_text("b"),
            Node::new_text("<img src=\"x.png\"/>"),
            Node::new_text("<!-- c -->"),
        ]);
    }

    #[test]
    fn webthon_wrapper_is_elided() {
        let nodes = parse("<webthon><p>x</p></webthon>");
        assert_eq!(nodes, vec![
            element("p", "<p>", vec![Node::new_text("x")]),
        ]);
    }

    #[test]
    fn stray_code_closer_is_dropped() {
        let nodes = parse("<div>a</python>b</div>");
        assert_eq!(nodes, vec![
            element("div", "<div>", vec![Node::new_text("a"), Node::new_text("b")]),
        ]);
    }

    #[test]
    fn passthrough_keeps_attributes() {
        let nodes = parse("<div class=\"x\">y</div>");
        assert_eq!(nodes, vec![
            element("div", "<div class=\"x\">", vec![Node::new_text("y")]),
        ]);
    }

    #[test]
    fn deep_nesting_is_iterative() {
        let depth = 1_000;
        let source = "<div>".repeat(depth) + "leaf";
        let nodes = parse(&source);
        let mut node = &nodes[0];
        for _ in 1..depth {
            node = &node.children()[0];
        }
        assert_eq!(node.children(), &[Node::new_text("leaf")]);
    }

    #[test]
    fn comparison_in_python_without_later_close() {
        let nodes = parse("<python>print(1 < 2)</python><print>after</print>");
        assert_eq!(nodes, vec![
            Node::CodeBlock(CodeBlock {
                language: Language::Interpreted,
                source: "print(1 < 2)".to_owned(),
            }),
            element("h1", "<h1>", vec![Node::new_text("after")]),
        ]);
    }

    #[test]
    fn comparison_in_c_without_later_close() {
        let nodes = parse("<c>\n    for (int i = 0; i<3; i++) {}\n</c><p>x</p>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].unpack_code_block().unwrap().source, "for (int i = 0; i<3; i++) {}");
        assert_eq!(nodes[1], element("p", "<p>", vec![Node::new_text("x")]));
    }

    #[test]
    fn comparison_in_js_without_later_close() {
        let nodes = parse("<js>if (a < b) go()</js><p>x</p>");
        assert_eq!(nodes, vec![
            element("script", "<script>", vec![Node::new_text("if (a < b) go()")]),
            element("p", "<p>", vec![Node::new_text("x")]),
        ]);
    }

    #[test]
    fn passthrough_script_body_is_raw() {
        let nodes = parse("<script src=\"a.js\">if (a < b) go()</script>tail");
        assert_eq!(nodes, vec![
            element("script", "<script src=\"a.js\">", vec![Node::new_text("if (a < b) go()")]),
            Node::new_text("tail"),
        ]);
    }

    #[test]
    fn unterminated_raw_text_runs_to_end() {
        let nodes = parse("<css>a { } <p>");
        assert_eq!(nodes, vec![element("style", "<style>", vec![Node::new_text("a { } <p>")])]);
    }
}
