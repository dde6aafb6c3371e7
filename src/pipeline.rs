//! One document, source text to HTML.
use crate::backend::bridge::{run_code_blocks, ExecutionResult, Toolchains, Workspace};
use crate::codegen::html::{render_body, Document};
use crate::frontend::data::TagVocabulary;
use crate::frontend::parser::parse_source;

#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub html: String,
    pub results: Vec<ExecutionResult>,
}

impl Compilation {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|x| x.success)
    }
}

pub struct Pipeline<'a> {
    pub vocabulary: &'a TagVocabulary,
    /// `None` skips code execution altogether.
    pub toolchains: Option<&'a Toolchains>,
    /// Append captured outputs after the rendered body.
    pub embed_output: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(vocabulary: &'a TagVocabulary, toolchains: Option<&'a Toolchains>) -> Self {
        Pipeline {
            vocabulary,
            toolchains,
            embed_output: false,
        }
    }
    pub fn compile(&self, source: &str, title: &str, workspace: &Workspace) -> Compilation {
        let root = parse_source(source, self.vocabulary);
        let results = match self.toolchains {
            Some(toolchains) => run_code_blocks(&root, workspace, toolchains),
            None => Vec::new(),
        };
        let body = render_body(&root);
        let mut document = Document::new(title, body);
        if self.embed_output {
            document = document.with_outputs(results.clone());
        }
        Compilation {
            html: document.render_to_string(),
            results,
        }
    }
}

/// Renders `source` with the stock vocabulary, without running any code.
pub fn compile_to_html(source: &str, title: &str) -> String {
    let root = parse_source(source, &TagVocabulary::default());
    Document::new(title, render_body(&root)).render_to_string()
}
