use super::{path_arg, BuildPlan, Toolchain};
use crate::language::Language;
use crate::workspace::Workspace;

const SOURCE: &str = "main.js";

/// Runs the source file with the configured JavaScript runtime.
#[derive(Debug, Clone)]
pub struct JavaScriptToolchain {
    runtime: String,
}

impl JavaScriptToolchain {
    pub fn new(runtime: &str) -> Self {
        Self {
            runtime: runtime.to_string(),
        }
    }
}

impl Toolchain for JavaScriptToolchain {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn source_file(&self) -> &'static str {
        SOURCE
    }

    fn build_plan(&self, _workspace: &Workspace) -> Option<BuildPlan> {
        None
    }

    fn run_argv(&self, workspace: &Workspace) -> Vec<String> {
        vec![self.runtime.clone(), path_arg(&workspace.file(SOURCE))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn runs_source_with_runtime() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::acquire(root.path(), Uuid::new_v4()).unwrap();
        let toolchain = JavaScriptToolchain::new("/usr/local/bin/node");

        assert!(toolchain.build_plan(&ws).is_none());
        assert_eq!(
            toolchain.run_argv(&ws),
            vec![
                "/usr/local/bin/node".to_string(),
                path_arg(&ws.file("main.js"))
            ]
        );
    }
}
