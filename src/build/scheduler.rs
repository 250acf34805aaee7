use crate::config::BuildConfig;
use crate::error::BuildError;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, PoisonError, mpsc};

use super::discovery::SourceFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Success(PathBuf),
    /// Captured stderr of the failed compiler run
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJobResult {
    pub source: PathBuf,
    pub outcome: CompileOutcome,
}

impl CompileJobResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CompileOutcome::Success(_))
    }
}

/// A source that failed, with the compiler's diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub source: PathBuf,
    pub diagnostic: String,
}

/// Everything the compile phase produced.
#[derive(Debug, Default)]
pub struct CompileBatch {
    /// One entry per source, in completion order
    pub results: Vec<CompileJobResult>,
    /// Successfully written objects, in completion order
    pub objects: Vec<PathBuf>,
}

impl CompileBatch {
    pub fn failures(&self) -> Vec<CompileFailure> {
        collect_failures(&self.results)
    }
}

pub fn collect_failures(results: &[CompileJobResult]) -> Vec<CompileFailure> {
    results
        .iter()
        .filter_map(|r| match &r.outcome {
            CompileOutcome::Failure(diagnostic) => Some(CompileFailure {
                source: r.source.clone(),
                diagnostic: diagnostic.clone(),
            }),
            CompileOutcome::Success(_) => None,
        })
        .collect()
}

/// Full compiler command line for one source: `-c -o <obj> <flags> <src>`.
pub fn compile_args(compiler: &Path, flags: &[String], source: &SourceFile) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(flags.len() + 5);
    args.push(compiler.into());
    args.push("-c".into());
    args.push("-o".into());
    args.push(source.object_path.clone().into());
    args.extend(flags.iter().map(OsString::from));
    args.push(source.path.clone().into());
    args
}

/// [`compile_args`] as text, for logs and `compile_commands.json`.
pub fn compile_command(compiler: &Path, flags: &[String], source: &SourceFile) -> Vec<String> {
    compile_args(compiler, flags, source)
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Compile every source on a pool of `config.workers` threads.
///
/// Returns once all jobs have finished. A failing job is recorded and its
/// siblings keep running.
pub fn compile_all(
    config: &BuildConfig,
    flags: &[String],
    sources: &[SourceFile],
    show_progress: bool,
) -> Result<CompileBatch, BuildError> {
    tracing::debug!("Using {} threads to compile.", config.workers);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("kiln-cc-{}", i))
        .build()?;

    let pb = progress_bar(sources.len(), show_progress);
    let objects = Mutex::new(Vec::with_capacity(sources.len()));
    let (tx, rx) = mpsc::channel();

    pool.scope(|s| {
        for source in sources {
            let tx = tx.clone();
            let objects = &objects;
            let pb = &pb;
            s.spawn(move |_| {
                let result = compile_one(&config.compiler, flags, source);
                if let CompileOutcome::Success(obj) = &result.outcome {
                    objects
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(obj.clone());
                }
                pb.inc(1);
                // Receiver outlives the scope
                let _ = tx.send(result);
            });
        }
    });
    drop(tx);

    let results: Vec<CompileJobResult> = rx.into_iter().collect();
    pb.finish_and_clear();

    let objects = objects.into_inner().unwrap_or_else(PoisonError::into_inner);
    Ok(CompileBatch { results, objects })
}

fn compile_one(compiler: &Path, flags: &[String], source: &SourceFile) -> CompileJobResult {
    let args = compile_args(compiler, flags, source);
    tracing::info!("Compiling {}", source.path.display());
    tracing::debug!("Compiling {} with command {:?}", source.path.display(), args);

    let outcome = match Command::new(&args[0]).args(&args[1..]).output() {
        Ok(output) if output.status.success() => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                tracing::warn!("Warnings in {}:\n{}", source.path.display(), stderr);
            }
            CompileOutcome::Success(source.object_path.clone())
        }
        Ok(output) => {
            tracing::error!("Could not compile {}", source.path.display());
            CompileOutcome::Failure(String::from_utf8_lossy(&output.stderr).into_owned())
        }
        Err(e) => {
            tracing::error!("Could not run {}: {}", compiler.display(), e);
            CompileOutcome::Failure(format!(
                "failed to execute {}: {}",
                compiler.display(),
                e
            ))
        }
    };

    CompileJobResult {
        source: source.path.clone(),
        outcome,
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let pb = ProgressBar::new(len as u64);
    pb.set_style(style);
    pb.set_message("Compiling...");
    pb
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::build::test_support::{FakeProject, compile_calls};
    use std::fs;

    #[test]
    fn test_compile_command_order() {
        let src = SourceFile {
            path: PathBuf::from("src/main.cpp"),
            object_path: PathBuf::from("build/obj/src%2Fmain.cpp.o"),
        };
        let flags = vec!["-Wall".to_string(), "-g".to_string()];
        assert_eq!(
            compile_command(Path::new("/usr/bin/clang++"), &flags, &src),
            vec![
                "/usr/bin/clang++",
                "-c",
                "-o",
                "build/obj/src%2Fmain.cpp.o",
                "-Wall",
                "-g",
                "src/main.cpp"
            ]
        );
    }

    #[test]
    fn test_non_utf8_source_reaches_compiler_intact() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let project = FakeProject::new();
        let src = project.src_dir().join(OsStr::from_bytes(b"caf\xe9.cpp"));
        fs::write(&src, "int cafe;").unwrap();
        let config = project.config(1);
        let sources = project.discover(&config);

        let args = compile_args(&config.compiler, &[], &sources[0]);
        assert_eq!(args[5].as_os_str(), src.as_os_str());
        let batch = compile_all(&config, &[], &sources, false).unwrap();

        assert!(batch.results[0].is_success(), "{:?}", batch.results[0]);
        assert_eq!(fs::read_to_string(&batch.objects[0]).unwrap(), "int cafe;");
    }

    #[test]
    fn test_partial_failure_does_not_stop_siblings() {
        let project = FakeProject::new();
        project.source("a.cpp", "int a;");
        project.source("b.cpp", "BROKEN");
        project.source("c.cpp", "int c;");
        let config = project.config(2);
        let sources = project.discover(&config);

        let batch = compile_all(&config, &["-g".to_string()], &sources, false).unwrap();

        assert_eq!(batch.results.len(), 3);
        assert_eq!(batch.objects.len(), 2);
        let failures = batch.failures();
        assert_eq!(failures.len(), 1);
        let broken = project.src_dir().join("b.cpp");
        assert_eq!(failures[0].source, broken);
        assert_eq!(
            failures[0].diagnostic,
            format!("{}:1:1: error: expected ';'\n", broken.display())
        );

        for obj in &batch.objects {
            assert!(obj.exists(), "missing object {}", obj.display());
        }
        assert_eq!(compile_calls(project.root()).len(), 3);
    }

    #[test]
    fn test_object_count_matches_successes() {
        let project = FakeProject::new();
        for i in 0..12 {
            let body = if i % 4 == 0 { "BROKEN" } else { "int x;" };
            project.source(&format!("f{}.cpp", i), body);
        }
        let config = project.config(4);
        let sources = project.discover(&config);

        let batch = compile_all(&config, &[], &sources, false).unwrap();

        let ok = batch.results.iter().filter(|r| r.is_success()).count();
        assert_eq!(ok, 9);
        assert_eq!(batch.objects.len(), 9);
        assert_eq!(batch.failures().len(), 3);
    }

    #[test]
    fn test_missing_compiler_is_a_job_failure() {
        let project = FakeProject::new();
        project.source("main.cpp", "int main;");
        let mut config = project.config(1);
        config.compiler = project.root().join("no-such-cc");
        let sources = project.discover(&config);

        let batch = compile_all(&config, &[], &sources, false).unwrap();

        assert!(batch.objects.is_empty());
        match &batch.results[0].outcome {
            CompileOutcome::Failure(msg) => assert!(msg.contains("failed to execute")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_no_sources_is_empty_batch() {
        let project = FakeProject::new();
        let config = project.config(2);
        fs::create_dir_all(config.object_dir()).unwrap();

        let batch = compile_all(&config, &[], &[], false).unwrap();
        assert!(batch.results.is_empty());
        assert!(batch.objects.is_empty());
    }
}
