use crate::config::BuildConfig;
use crate::error::BuildError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkResult {
    Success(PathBuf),
    Failure(String),
}

/// `<linker> -o <exe> <flags> <objects...>`
pub fn link_args(linker: &Path, exe: &Path, flags: &[String], objects: &[PathBuf]) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(flags.len() + objects.len() + 3);
    args.push(linker.into());
    args.push("-o".into());
    args.push(exe.into());
    args.extend(flags.iter().map(OsString::from));
    args.extend(objects.iter().map(OsString::from));
    args
}

/// [`link_args`] as text, for logs.
pub fn link_command(linker: &Path, exe: &Path, flags: &[String], objects: &[PathBuf]) -> Vec<String> {
    link_args(linker, exe, flags, objects)
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Link `objects`, in the order given, into the configured executable.
pub fn link(
    config: &BuildConfig,
    flags: &[String],
    objects: &[PathBuf],
) -> Result<LinkResult, BuildError> {
    if objects.is_empty() {
        tracing::error!("No object files specified.");
        return Err(BuildError::NoObjectsProduced {
            failures: Vec::new(),
        });
    }

    let exe = config.executable_path();
    let args = link_args(&config.linker, &exe, flags, objects);
    tracing::info!("Linking {}", exe.display());
    tracing::debug!("Linking object files with command {:?}", args);

    let output = match Command::new(&args[0]).args(&args[1..]).output() {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("Could not run linker {}: {}", config.linker.display(), e);
            return Ok(LinkResult::Failure(format!(
                "failed to execute {}: {}",
                config.linker.display(),
                e
            )));
        }
    };

    if output.status.success() {
        return Ok(LinkResult::Success(exe));
    }

    tracing::error!("Could not link object files.");
    let mut diagnostic = String::from_utf8_lossy(&output.stderr).into_owned();
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        if !diagnostic.is_empty() && !diagnostic.ends_with('\n') {
            diagnostic.push('\n');
        }
        diagnostic.push_str(&stdout);
    }
    Ok(LinkResult::Failure(diagnostic))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::build::test_support::{FakeProject, link_calls};
    use std::fs;

    #[test]
    fn test_link_command_order() {
        let args = link_command(
            Path::new("clang++"),
            Path::new("build/app"),
            &["-g".to_string()],
            &[PathBuf::from("b.o"), PathBuf::from("a.o")],
        );
        assert_eq!(args, vec!["clang++", "-o", "build/app", "-g", "b.o", "a.o"]);
    }

    #[test]
    fn test_zero_objects_never_invokes_linker() {
        let project = FakeProject::new();
        let config = project.config(1);

        let err = link(&config, &[], &[]).unwrap_err();
        assert!(matches!(err, BuildError::NoObjectsProduced { .. }));
        assert!(link_calls(project.root()).is_empty());
    }

    #[test]
    fn test_link_concatenates_objects_in_order() {
        let project = FakeProject::new();
        let config = project.config(1);
        fs::create_dir_all(&config.output_dir).unwrap();
        let a = project.root().join("a.o");
        let b = project.root().join("b.o");
        fs::write(&a, "A\n").unwrap();
        fs::write(&b, "B\n").unwrap();

        let result = link(&config, &[], &[b, a]).unwrap();

        let exe = config.executable_path();
        assert_eq!(result, LinkResult::Success(exe.clone()));
        assert_eq!(fs::read_to_string(exe).unwrap(), "B\nA\n");
        assert_eq!(link_calls(project.root()).len(), 1);
    }

    #[test]
    fn test_link_failure_carries_diagnostic() {
        let project = FakeProject::new();
        let config = project.config(1);
        fs::create_dir_all(&config.output_dir).unwrap();
        let bad = project.root().join("bad.o");
        fs::write(&bad, "LINKFAIL").unwrap();

        match link(&config, &[], &[bad]).unwrap() {
            LinkResult::Failure(diag) => assert_eq!(diag, "undefined reference to `main'\n"),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
