use super::clean::clean_output_dir;
use super::compdb;
use super::discovery;
use super::link::{LinkResult, link};
use super::scheduler::{
    CompileBatch, CompileFailure, CompileJobResult, collect_failures, compile_all,
};
use super::utils::Project;
use crate::config::{BuildConfig, BuildMode, BuildOverrides, FailurePolicy, resolve_flags};
use crate::error::BuildError;
use crate::toolchain::{self, ToolchainInfo, install};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Pipeline stages, in order. `Aborted` is reachable from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Init,
    ToolchainResolved,
    SourcesDiscovered,
    Compiled,
    Linked,
    Done,
    Aborted,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub overrides: BuildOverrides,
    pub progress: bool,
}

/// Outcome of a build that reached `Done`.
#[derive(Debug)]
pub struct BuildReport {
    pub stage: BuildStage,
    pub mode: BuildMode,
    pub toolchain: ToolchainInfo,
    pub results: Vec<CompileJobResult>,
    /// `None` when there was nothing to build
    pub executable: Option<PathBuf>,
}

impl BuildReport {
    pub fn partial_failures(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    pub fn failures(&self) -> Vec<CompileFailure> {
        collect_failures(&self.results)
    }

    pub fn nothing_to_build(&self) -> bool {
        self.results.is_empty()
    }
}

fn enter(stage: BuildStage) {
    tracing::debug!(stage = ?stage, "entering stage");
}

/// Guard on `Compiled -> Linked`.
///
/// Zero objects always aborts. With [`FailurePolicy::Strict`] any failed job
/// aborts too; [`FailurePolicy::KeepGoing`] links whatever compiled.
pub fn link_gate(policy: FailurePolicy, batch: &CompileBatch) -> Result<(), BuildError> {
    let failures = batch.failures();

    if batch.objects.is_empty() {
        return Err(BuildError::NoObjectsProduced { failures });
    }

    if failures.is_empty() {
        return Ok(());
    }

    match policy {
        FailurePolicy::Strict => Err(BuildError::CompileFailed { failures }),
        FailurePolicy::KeepGoing => {
            tracing::warn!(
                "{} source file(s) failed to compile; linking the remaining {} object(s)",
                failures.len(),
                batch.objects.len()
            );
            Ok(())
        }
    }
}

// --- CORE: Build Project ---
pub fn build_project(
    project: &Project,
    mode: BuildMode,
    options: &BuildOptions,
) -> Result<BuildReport, BuildError> {
    let result = run_pipeline(project, mode, options);
    if let Err(e) = &result {
        enter(BuildStage::Aborted);
        tracing::error!("Build aborted after {:?}: {}", e.stage(), e);
    }
    result
}

fn run_pipeline(
    project: &Project,
    mode: BuildMode,
    options: &BuildOptions,
) -> Result<BuildReport, BuildError> {
    let start_time = Instant::now();
    enter(BuildStage::Init);

    // 1. Toolchain
    let toolchain = toolchain::locate(&project.config.build.compiler, &project.dir)?;
    enter(BuildStage::ToolchainResolved);

    let config = BuildConfig::resolve(&project.config, &project.dir, &toolchain, &options.overrides);
    let flags = resolve_flags(&config, mode);
    tracing::info!("Building in {} mode", mode);
    tracing::info!("Using compiler flags {:?}", flags.compile);
    tracing::info!("Using linker flags {:?}", flags.link);

    // 2. External tools
    for tool in project.config.tools.iter().filter(|t| t.required) {
        install::ensure_tool(tool, &project.dir).map_err(|e| BuildError::Tool {
            name: tool.name.clone(),
            message: format!("{:#}", e),
        })?;
    }

    // 3. Sources
    let object_dir = config.object_dir();
    let sources = discovery::discover(
        &config.source_roots,
        &config.extensions,
        &config.project_dir,
        &object_dir,
        config.sort_sources,
    );
    enter(BuildStage::SourcesDiscovered);

    if sources.is_empty() {
        tracing::info!("No source files found. Exiting.");
        enter(BuildStage::Done);
        return Ok(BuildReport {
            stage: BuildStage::Done,
            mode,
            toolchain,
            results: Vec::new(),
            executable: None,
        });
    }

    // 4. Output directory
    if config.clean_output_dir {
        tracing::info!("Cleaning {}", config.output_dir.display());
        clean_output_dir(&config.output_dir).map_err(|source| BuildError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;
    }
    fs::create_dir_all(&object_dir).map_err(|source| BuildError::OutputDir {
        path: object_dir.clone(),
        source,
    })?;

    // 5. Compile
    let batch = compile_all(&config, &flags.compile, &sources, options.progress)?;
    enter(BuildStage::Compiled);

    if config.compile_commands {
        let entries = compdb::entries(&config.project_dir, &config.compiler, &flags.compile, &sources);
        match compdb::write_compile_commands(&config.output_dir, &entries) {
            Ok(path) => tracing::info!("Wrote {}", path.display()),
            Err(e) => tracing::warn!("Could not write compile_commands.json: {:#}", e),
        }
    }

    // 6. Link
    link_gate(config.policy, &batch)?;

    let exe = match link(&config, &flags.link, &batch.objects)? {
        LinkResult::Success(exe) => exe,
        LinkResult::Failure(diagnostic) => {
            return Err(BuildError::LinkFailed {
                executable: config.executable_path(),
                diagnostic,
            });
        }
    };
    enter(BuildStage::Linked);

    tracing::info!("Built {} in {:.2?}", exe.display(), start_time.elapsed());
    enter(BuildStage::Done);

    Ok(BuildReport {
        stage: BuildStage::Done,
        mode,
        toolchain,
        results: batch.results,
        executable: Some(exe),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::CompileOutcome;

    fn batch(ok: usize, failed: usize) -> CompileBatch {
        let mut results = Vec::new();
        let mut objects = Vec::new();
        for i in 0..ok {
            let obj = PathBuf::from(format!("{}.o", i));
            objects.push(obj.clone());
            results.push(CompileJobResult {
                source: PathBuf::from(format!("ok{}.cpp", i)),
                outcome: CompileOutcome::Success(obj),
            });
        }
        for i in 0..failed {
            results.push(CompileJobResult {
                source: PathBuf::from(format!("bad{}.cpp", i)),
                outcome: CompileOutcome::Failure("error".into()),
            });
        }
        CompileBatch { results, objects }
    }

    #[test]
    fn test_gate_clean_build_links() {
        assert!(link_gate(FailurePolicy::Strict, &batch(3, 0)).is_ok());
        assert!(link_gate(FailurePolicy::KeepGoing, &batch(3, 0)).is_ok());
    }

    #[test]
    fn test_gate_zero_objects_aborts_under_both_policies() {
        for policy in [FailurePolicy::Strict, FailurePolicy::KeepGoing] {
            let err = link_gate(policy, &batch(0, 2)).unwrap_err();
            match err {
                BuildError::NoObjectsProduced { failures } => assert_eq!(failures.len(), 2),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_gate_partial_failure_depends_on_policy() {
        let err = link_gate(FailurePolicy::Strict, &batch(2, 1)).unwrap_err();
        assert!(matches!(err, BuildError::CompileFailed { ref failures } if failures.len() == 1));
        assert!(link_gate(FailurePolicy::KeepGoing, &batch(2, 1)).is_ok());
    }
}
