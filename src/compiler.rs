//! External Compiler API: files and folders of `.wth` documents.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::Serialize;
use thiserror::Error;
use crate::backend::bridge::{ExecutionResult, Workspace};
use crate::frontend::data::TagVocabulary;
use crate::pipeline::{Compilation, Pipeline};

pub static SOURCE_EXTENSION: &'static str = "wth";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("source file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),
    #[error("folder '{}' does not exist", .0.display())]
    NotADirectory(PathBuf),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid vocabulary {}: {source}", path.display())]
    Vocabulary {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CompileError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> CompileError {
        let path = path.to_owned();
        move |source| CompileError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub results: Vec<ExecutionResult>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub compiled: Vec<DocumentReport>,
    pub failed: Vec<(PathBuf, CompileError)>,
}

impl BatchReport {
    /// No document failed and every code block ran cleanly.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.compiled
            .iter()
            .all(|doc| doc.results.iter().all(|x| x.success))
    }
}

pub fn load_vocabulary(path: &Path) -> Result<TagVocabulary> {
    let source = fs::read_to_string(path).map_err(CompileError::io(path))?;
    TagVocabulary::from_json(&source).map_err(|source| CompileError::Vocabulary {
        path: path.to_owned(),
        source,
    })
}

/// `page.wth` compiles to `page.html` in the same folder.
pub fn output_path_for(source_path: &Path) -> PathBuf {
    source_path.with_extension("html")
}

pub fn ensure_workspace(workspace: &Workspace) -> Result<()> {
    for dir in [&workspace.native_dir, &workspace.interpreted_dir].iter() {
        fs::create_dir_all(dir).map_err(CompileError::io(dir))?;
    }
    Ok(())
}

/// Non-recursive, sorted by file name.
pub fn discover_sources(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(CompileError::NotADirectory(folder.to_owned()));
    }
    let mut sources = Vec::new();
    for entry in fs::read_dir(folder).map_err(CompileError::io(folder))? {
        let path = entry.map_err(CompileError::io(folder))?.path();
        let is_source = path.is_file() && path
            .extension()
            .map(|x| x == SOURCE_EXTENSION)
            .unwrap_or(false);
        if is_source {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

pub fn compile_webthon_file(
    source_path: &Path,
    html_output: &Path,
    workspace: &Workspace,
    pipeline: &Pipeline,
) -> Result<Compilation> {
    if !source_path.is_file() {
        return Err(CompileError::InputNotFound(source_path.to_owned()));
    }
    let source = fs::read_to_string(source_path).map_err(CompileError::io(source_path))?;
    let title = source_path
        .file_name()
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_default();
    let compilation = pipeline.compile(&source, &title, workspace);
    if let Some(parent) = html_output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(CompileError::io(parent))?;
        }
    }
    fs::write(html_output, &compilation.html).map_err(CompileError::io(html_output))?;
    tracing::info!(
        "compiled {} to HTML: {}",
        source_path.display(),
        html_output.display(),
    );
    Ok(compilation)
}

/// Workspace of a document: `c_code/` and `python_code/` beside it.
pub fn workspace_for(source_path: &Path) -> Workspace {
    let folder = source_path.parent().unwrap_or_else(|| Path::new(""));
    let stem = source_path
        .file_stem()
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_default();
    Workspace::in_folder(folder, &stem)
}

/// Compiles every `.wth` file of `folder`, one at a time. A failing document
/// is recorded and the batch moves on.
pub fn compile_all_webthon(folder: &Path, pipeline: &Pipeline) -> Result<BatchReport> {
    let sources = discover_sources(folder)?;
    let mut report = BatchReport::default();
    if sources.is_empty() {
        tracing::warn!("no .{} files found in {}", SOURCE_EXTENSION, folder.display());
        return Ok(report);
    }
    ensure_workspace(&Workspace::in_folder(folder, ""))?;
    for source in sources {
        let output = output_path_for(&source);
        let workspace = workspace_for(&source);
        match compile_webthon_file(&source, &output, &workspace, pipeline) {
            Ok(compilation) => report.compiled.push(DocumentReport {
                source,
                output,
                results: compilation.results,
            }),
            Err(error) => {
                tracing::error!("{}", error);
                report.failed.push((source, error));
            }
        }
    }
    Ok(report)
}

pub fn write_report(path: &Path, documents: &[DocumentReport]) -> Result<()> {
    let json = serde_json::to_string_pretty(documents).map_err(|source| CompileError::Io {
        path: path.to_owned(),
        source: source.into(),
    })?;
    fs::write(path, json).map_err(CompileError::io(path))
}
