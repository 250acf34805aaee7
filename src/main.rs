//! # kiln CLI Entry Point
//!
//! Parses CLI arguments with clap and routes commands to the library.
//!
//! - `kiln build [--release]` - probe, compile everything, link
//! - `kiln clean` - remove the build directory
//! - `kiln info` - show the located toolchain and composed flags
//! - `kiln fetch-tools` - download the external tools listed in `kiln.toml`
//! - `kiln completion <shell>` - print shell completions

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::{Path, PathBuf};

use kiln::build::{self, BuildOptions, BuildReport, CompileFailure, FeedbackAnalyzer};
use kiln::config::{BuildConfig, BuildMode, BuildOverrides, resolve_flags};
use kiln::error::BuildError;
use kiln::logging::{self, Verbosity};
use kiln::toolchain::{self, install};

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Parallel build orchestrator for C/C++ sources", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the project file
    #[arg(long, global = true, default_value = "kiln.toml")]
    manifest: PathBuf,
    /// Show full command lines and stage transitions
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every source and link the executable
    Build {
        /// Build artifacts in release mode, with optimizations
        #[arg(long)]
        release: bool,
        /// Number of parallel compile jobs [default: host parallelism]
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Link the sources that compiled even if others failed
        #[arg(long)]
        keep_going: bool,
        /// Write compile_commands.json into the build directory
        #[arg(long)]
        compile_commands: bool,
        /// Show a progress bar while compiling
        #[arg(long)]
        progress: bool,
    },
    /// Remove the build directory
    Clean,
    /// Show the located toolchain and the flags each mode would use
    Info,
    /// Download the external tools listed under [[tools]]
    FetchTools,
    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    match cli.command {
        Commands::Build {
            release,
            jobs,
            keep_going,
            compile_commands,
            progress,
        } => {
            let mode = if release {
                BuildMode::Release
            } else {
                BuildMode::Debug
            };
            let options = BuildOptions {
                overrides: BuildOverrides {
                    jobs,
                    keep_going,
                    compile_commands,
                },
                progress,
            };
            if !run_build(&cli.manifest, mode, &options)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Clean => {
            let project = build::load_config(&cli.manifest)?;
            build::clean(&project.dir.join(&project.config.build.build_dir))?;
            Ok(())
        }
        Commands::Info => print_info(&cli.manifest),
        Commands::FetchTools => fetch_tools(&cli.manifest),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn run_build(manifest: &Path, mode: BuildMode, options: &BuildOptions) -> Result<bool> {
    let project = build::load_config(manifest)?;

    println!(
        "{} Project: {} ({})",
        "🚀".blue(),
        project.config.package.name.bold(),
        mode
    );

    match build::build_project(&project, mode, options) {
        Ok(report) => {
            print_report(&report);
            Ok(true)
        }
        Err(e) => {
            print_abort(&e);
            Ok(false)
        }
    }
}

fn print_failures(failures: &[CompileFailure]) {
    for failure in failures {
        println!(
            "{} Error compiling {}:\n{}",
            "x".red(),
            failure.source.display(),
            failure.diagnostic.trim_end()
        );
        if let Some(hint) = FeedbackAnalyzer::analyze(&failure.diagnostic) {
            println!("{} {}", "💡".yellow(), hint);
        }
    }
}

fn print_report(report: &BuildReport) {
    let Some(exe) = &report.executable else {
        println!("{} No source files found, nothing to build.", "!".yellow());
        return;
    };

    print_failures(&report.failures());

    let failed = report.partial_failures();
    if failed == 0 {
        println!("{} Build finished: {}", "✓".green(), exe.display());
    } else {
        println!(
            "{} Build finished with {} failed source(s): {}",
            "!".yellow(),
            failed,
            exe.display()
        );
    }
}

fn print_abort(err: &BuildError) {
    print_failures(err.compile_failures());

    if let BuildError::LinkFailed { diagnostic, .. } = err {
        println!("{}", diagnostic.trim_end());
        if let Some(hint) = FeedbackAnalyzer::analyze(diagnostic) {
            println!("{} {}", "💡".yellow(), hint);
        }
    }

    if let BuildError::CompileFailed { .. } = err {
        println!(
            "   Pass {} to link the sources that compiled.",
            "--keep-going".bold()
        );
    }

    println!(
        "{} Build aborted after {:?}: {}",
        "x".red(),
        err.stage(),
        err
    );
}

fn print_info(manifest: &Path) -> Result<()> {
    println!("{} v{}", "kiln".bold().cyan(), env!("CARGO_PKG_VERSION"));
    println!("------------------------------------");
    println!(
        "{}: {} {} ({})",
        "System".bold(),
        std::env::consts::OS,
        std::env::consts::ARCH,
        install::platform_dir()
    );

    let project = build::load_config(manifest)?;
    let toolchain = toolchain::locate(&project.config.build.compiler, &project.dir)?;
    println!(
        "{}: {} ({})",
        "Compiler".bold(),
        toolchain.executable_path.display(),
        toolchain.version_or_unknown()
    );

    let config = BuildConfig::resolve(
        &project.config,
        &project.dir,
        &toolchain,
        &BuildOverrides::default(),
    );
    println!("{}: {}", "Linker".bold(), config.linker.display());
    println!("{}: {}", "Workers".bold(), config.workers);
    println!("{}: {}", "Output".bold(), config.executable_path().display());

    for mode in [BuildMode::Debug, BuildMode::Release] {
        let flags = resolve_flags(&config, mode);
        println!("\n{}", format!("{} flags", mode).bold());
        println!("  compile: {}", flags.compile.join(" "));
        println!("  link:    {}", flags.link.join(" "));
    }

    Ok(())
}

fn fetch_tools(manifest: &Path) -> Result<()> {
    let project = build::load_config(manifest)?;
    if project.config.tools.is_empty() {
        println!("{} No [[tools]] configured.", "!".yellow());
        return Ok(());
    }

    for tool in &project.config.tools {
        let status = install::ensure_tool(tool, &project.dir)?;
        let verb = match status {
            install::ToolStatus::AlreadyPresent(_) => "Found",
            install::ToolStatus::Installed(_) => "Installed",
        };
        println!(
            "{} {} {} at {}",
            "✓".green(),
            verb,
            tool.name,
            status.path().display()
        );
    }
    Ok(())
}
