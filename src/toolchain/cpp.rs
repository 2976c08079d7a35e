use super::{path_arg, BuildPlan, Toolchain};
use crate::language::Language;
use crate::workspace::Workspace;

const SOURCE: &str = "main.cpp";
const BINARY: &str = "main";

/// Compiles with the configured C++ compiler, then runs the binary directly.
#[derive(Debug, Clone)]
pub struct CppToolchain {
    compiler: String,
    flags: Vec<String>,
}

impl CppToolchain {
    pub fn new(compiler: &str, flags: &[String]) -> Self {
        Self {
            compiler: compiler.to_string(),
            flags: flags.to_vec(),
        }
    }
}

impl Toolchain for CppToolchain {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn source_file(&self) -> &'static str {
        SOURCE
    }

    fn build_plan(&self, workspace: &Workspace) -> Option<BuildPlan> {
        let artifact = workspace.file(BINARY);
        let mut argv = Vec::with_capacity(self.flags.len() + 4);
        argv.push(self.compiler.clone());
        argv.extend(self.flags.iter().cloned());
        argv.push("-o".into());
        argv.push(path_arg(&artifact));
        argv.push(path_arg(&workspace.file(SOURCE)));
        Some(BuildPlan { argv, artifact })
    }

    fn run_argv(&self, workspace: &Workspace) -> Vec<String> {
        vec![path_arg(&workspace.file(BINARY))]
    }
}
