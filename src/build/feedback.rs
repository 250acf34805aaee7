use colored::*;

pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // 1. Main function missing (Specific Linker Error)
        if output.contains("undefined reference to `main'")
            || output.contains("entry point must be defined")
        {
            return Some(format!(
                "No source defines {}.\nCheck that the file holding it sits under one of the {} roots.",
                "main()".bold().yellow(),
                "sources".bold().green()
            ));
        }

        // 2. Generic Missing Symbol (Linker Error)
        if output.contains("LNK2019") || output.contains("undefined reference to") {
            return Some(format!(
                "It looks like a {} error.\nA source that defines this symbol may have failed to compile, \
                 or a library is missing from {} in kiln.toml.",
                "Linker".bold().red(),
                "[build.link_flags]".bold().yellow()
            ));
        }

        // 3. Missing Header (Compiler Error)
        if output.contains("fatal error: ") && output.contains("No such file or directory")
            || output.contains("file not found")
            || output.contains("cannot open include file")
        {
            return Some(format!(
                "It looks like a {} error.\nAdd the include directory with {} under {} in kiln.toml.",
                "Missing Header".bold().red(),
                "-I<dir>".bold().yellow(),
                "[build.flags]".bold().yellow()
            ));
        }

        None
    }
}
