use super::{path_arg, BuildPlan, Toolchain};
use crate::language::Language;
use crate::workspace::Workspace;

const SOURCE: &str = "main.py";

/// Runs the source file with the configured interpreter.
#[derive(Debug, Clone)]
pub struct PythonToolchain {
    interpreter: String,
}

impl PythonToolchain {
    pub fn new(interpreter: &str) -> Self {
        Self {
            interpreter: interpreter.to_string(),
        }
    }
}

impl Toolchain for PythonToolchain {
    fn language(&self) -> Language {
        Language::Python
    }

    fn source_file(&self) -> &'static str {
        SOURCE
    }

    fn build_plan(&self, _workspace: &Workspace) -> Option<BuildPlan> {
        None
    }

    fn run_argv(&self, workspace: &Workspace) -> Vec<String> {
        vec![self.interpreter.clone(), path_arg(&workspace.file(SOURCE))]
    }
}
