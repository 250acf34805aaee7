mod clean;
mod compdb;
mod core;
mod discovery;
mod feedback;
mod link;
mod scheduler;
mod utils;

#[cfg(all(test, unix))]
mod test_support;

pub use clean::{clean, clean_output_dir};
pub use compdb::write_compile_commands;
pub use self::core::{BuildOptions, BuildReport, BuildStage, build_project, link_gate};
pub use discovery::{SourceFile, discover, matches_extension, object_file_name};
pub use feedback::FeedbackAnalyzer;
pub use link::{LinkResult, link, link_args, link_command};
pub use scheduler::{
    CompileBatch, CompileFailure, CompileJobResult, CompileOutcome, compile_all, compile_args,
    compile_command,
};
pub use utils::{Project, load_config, parse_config};
