//! Code extraction & execution.
//!
//! Walks the document tree and hands every code block to the toolchain for
//! its language, one at a time in document order. A failing block is recorded
//! and the walk carries on.
use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::backend::toolchain::{InterpreterToolchain, NativeToolchain, Toolchain};
use crate::frontend::ast::Node;
use crate::frontend::data::Language;

///////////////////////////////////////////////////////////////////////////////
// WORKSPACE
///////////////////////////////////////////////////////////////////////////////

/// Where extracted sources go. Blocks are written to
/// `{dir}/{stem}_{c|py}_{n}.{c|py}`, `n` counting from 1 per language.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub native_dir: PathBuf,
    pub interpreted_dir: PathBuf,
    pub stem: String,
}

impl Workspace {
    pub fn new(native_dir: impl Into<PathBuf>, interpreted_dir: impl Into<PathBuf>, stem: &str) -> Self {
        Workspace {
            native_dir: native_dir.into(),
            interpreted_dir: interpreted_dir.into(),
            stem: stem.to_owned(),
        }
    }
    /// The `c_code/` and `python_code/` subdirectories of `folder`.
    pub fn in_folder(folder: &Path, stem: &str) -> Self {
        Workspace::new(folder.join("c_code"), folder.join("python_code"), stem)
    }
    pub fn dir(&self, language: Language) -> &Path {
        match language {
            Language::NativeCompiled => &self.native_dir,
            Language::Interpreted => &self.interpreted_dir,
        }
    }
    pub fn source_path(&self, language: Language, ordinal: usize) -> PathBuf {
        let ext = language.extension();
        let file_name = format!("{}_{}_{}.{}", self.stem, ext, ordinal, ext);
        self.dir(language).join(file_name)
    }
}

///////////////////////////////////////////////////////////////////////////////
// TOOLCHAINS
///////////////////////////////////////////////////////////////////////////////

pub struct Toolchains {
    pub native: Box<dyn Toolchain>,
    pub interpreter: Box<dyn Toolchain>,
}

impl Default for Toolchains {
    fn default() -> Self {
        Toolchains {
            native: Box::new(NativeToolchain::default()),
            interpreter: Box::new(InterpreterToolchain::default()),
        }
    }
}

impl Toolchains {
    pub fn for_language(&self, language: Language) -> &dyn Toolchain {
        match language {
            Language::NativeCompiled => self.native.as_ref(),
            Language::Interpreted => self.interpreter.as_ref(),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
// EXECUTION
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// Position among all code blocks of the document, from 0.
    pub index: usize,
    pub language: Language,
    pub source_path: PathBuf,
    pub success: bool,
    pub captured_stdout: String,
    pub diagnostic: Option<String>,
}

pub fn run_code_blocks(
    root: &Node,
    workspace: &Workspace,
    toolchains: &Toolchains,
) -> Vec<ExecutionResult> {
    let mut native_count = 0;
    let mut interpreted_count = 0;
    let mut results = Vec::new();
    for (index, block) in root.code_blocks().into_iter().enumerate() {
        let ordinal = match block.language {
            Language::NativeCompiled => {
                native_count = native_count + 1;
                native_count
            }
            Language::Interpreted => {
                interpreted_count = interpreted_count + 1;
                interpreted_count
            }
        };
        let source_path = workspace.source_path(block.language, ordinal);
        tracing::info!(
            "extracted {} code to {}",
            block.language.as_str(),
            source_path.display(),
        );
        let outcome = toolchains
            .for_language(block.language)
            .run(&block.source, &source_path);
        let result = match outcome {
            Ok(output) => {
                if !output.stdout.is_empty() {
                    tracing::info!(path = %source_path.display(), "output:\n{}", output.stdout);
                }
                ExecutionResult {
                    index,
                    language: block.language,
                    source_path,
                    success: true,
                    captured_stdout: output.stdout,
                    diagnostic: None,
                }
            }
            Err(error) => {
                tracing::warn!(path = %source_path.display(), "code block failed: {}", error);
                ExecutionResult {
                    index,
                    language: block.language,
                    captured_stdout: error.captured_stdout().to_owned(),
                    diagnostic: Some(error.to_string()),
                    source_path,
                    success: false,
                }
            }
        };
        results.push(result);
    }
    results
}
