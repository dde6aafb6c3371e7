use std::path::{Path, PathBuf};
use std::process::Command as Process;
use std::time::Duration;
use structopt::StructOpt;
use crate::backend::bridge::Toolchains;
use crate::backend::toolchain::{InterpreterToolchain, NativeToolchain};
use crate::compiler::{self, BatchReport, CompileError, DocumentReport};
use crate::frontend::data::TagVocabulary;
use crate::pipeline::Pipeline;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "webthon",
    about = "compile WebThon markup into HTML, running embedded C and Python",
)]
pub struct Cli {
    /// More logging; repeat for debug and trace output.
    #[structopt(short, long, parse(from_occurrences), global = true)]
    pub verbose: u8,
    #[structopt(subcommand)]
    pub command: Cmd,
}

#[derive(StructOpt, Debug)]
pub enum Cmd {
    /// Compile every .wth file of a folder.
    Build {
        #[structopt(parse(from_os_str))]
        folder: PathBuf,
        #[structopt(flatten)]
        options: CompileOptions,
    },
    /// Compile a single .wth file.
    Compile {
        #[structopt(short, long, parse(from_os_str))]
        source: PathBuf,
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,
        #[structopt(flatten)]
        options: CompileOptions,
    },
}

#[derive(StructOpt, Debug, Clone)]
pub struct CompileOptions {
    /// C compiler used for <c> blocks.
    #[structopt(long, default_value = "gcc")]
    pub native_compiler: String,
    /// Interpreter used for <python> blocks.
    #[structopt(long, default_value = "python3")]
    pub interpreter: String,
    /// Seconds each compile or run step may take.
    #[structopt(long)]
    pub timeout: Option<f64>,
    /// JSON file replacing the stock tag vocabulary.
    #[structopt(long, parse(from_os_str))]
    pub vocabulary: Option<PathBuf>,
    /// Render only; do not extract or run code blocks.
    #[structopt(long)]
    pub no_exec: bool,
    /// Append captured program output to each page.
    #[structopt(long)]
    pub embed_output: bool,
    /// Write every execution result to this JSON file.
    #[structopt(long, parse(from_os_str))]
    pub report: Option<PathBuf>,
    /// Open each produced page in the system viewer.
    #[structopt(long)]
    pub open: bool,
}

impl CompileOptions {
    pub fn timeout(&self) -> Option<Duration> {
        let secs = self.timeout.filter(|x| *x > 0.0)?;
        match Duration::try_from_secs_f64(secs) {
            Ok(timeout) => Some(timeout),
            Err(error) => {
                tracing::warn!("ignoring --timeout {}: {}", secs, error);
                None
            }
        }
    }
    pub fn toolchains(&self) -> Toolchains {
        Toolchains {
            native: Box::new(NativeToolchain {
                compiler: self.native_compiler.clone(),
                timeout: self.timeout(),
            }),
            interpreter: Box::new(InterpreterToolchain {
                interpreter: self.interpreter.clone(),
                timeout: self.timeout(),
            }),
        }
    }
    pub fn vocabulary(&self) -> compiler::Result<TagVocabulary> {
        match self.vocabulary.as_ref() {
            Some(path) => compiler::load_vocabulary(path),
            None => Ok(TagVocabulary::default()),
        }
    }
}

pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Hands `path` to the platform viewer.
pub fn open_in_viewer(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        Process::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Process::new("cmd");
        command.args(&["/C", "start", ""]);
        command
    } else {
        Process::new("xdg-open")
    };
    tracing::info!("opening {} in viewer", path.display());
    match command.arg(path).status() {
        Ok(status) if status.success() => (),
        Ok(status) => tracing::warn!("viewer exited with {}", status),
        Err(error) => tracing::warn!("could not open viewer: {}", error),
    }
}

fn finish(options: &CompileOptions, report: &BatchReport) -> i32 {
    if let Some(path) = options.report.as_ref() {
        if let Err(error) = compiler::write_report(path, &report.compiled) {
            tracing::error!("{}", error);
            return 1;
        }
    }
    if options.open {
        for doc in report.compiled.iter() {
            open_in_viewer(&doc.output);
        }
    }
    if report.is_success() {
        0
    } else {
        1
    }
}

fn run_build(folder: &Path, options: &CompileOptions) -> Result<BatchReport, CompileError> {
    let vocabulary = options.vocabulary()?;
    let toolchains = options.toolchains();
    let mut pipeline = Pipeline::new(&vocabulary, Some(&toolchains).filter(|_| !options.no_exec));
    pipeline.embed_output = options.embed_output;
    compiler::compile_all_webthon(folder, &pipeline)
}

fn run_compile(
    source: &Path,
    output: Option<PathBuf>,
    options: &CompileOptions,
) -> Result<BatchReport, CompileError> {
    let vocabulary = options.vocabulary()?;
    let toolchains = options.toolchains();
    let mut pipeline = Pipeline::new(&vocabulary, Some(&toolchains).filter(|_| !options.no_exec));
    pipeline.embed_output = options.embed_output;
    let output = output.unwrap_or_else(|| compiler::output_path_for(source));
    if !source.is_file() {
        return Err(CompileError::InputNotFound(source.to_owned()));
    }
    let workspace = compiler::workspace_for(source);
    if !options.no_exec {
        compiler::ensure_workspace(&workspace)?;
    }
    let compilation = compiler::compile_webthon_file(source, &output, &workspace, &pipeline)?;
    let mut report = BatchReport::default();
    report.compiled.push(DocumentReport {
        source: source.to_owned(),
        output,
        results: compilation.results,
    });
    Ok(report)
}

/// Parses the command line and runs it; returns the process exit code.
pub fn run_cli() -> i32 {
    let cli = Cli::from_args();
    init_logging(cli.verbose);
    let (outcome, options) = match &cli.command {
        Cmd::Build{folder, options} => (run_build(folder, options), options),
        Cmd::Compile{source, output, options} => {
            (run_compile(source, output.clone(), options), options)
        }
    };
    match outcome {
        Ok(report) => finish(options, &report),
        Err(error) => {
            tracing::error!("{}", error);
            eprintln!("error: {}", error);
            1
        }
    }
}
