pub mod bridge;
pub mod toolchain;

pub use bridge::{run_code_blocks, ExecutionResult, Toolchains, Workspace};
