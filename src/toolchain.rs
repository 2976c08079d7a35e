//! Per-language build and run strategies.
//!
//! Each [`Toolchain`] knows the file name its source is stored under,
//! whether a build phase exists, and the argument vectors for both phases.
//! Adding a language means adding a variant to [`Language`] and one
//! implementation here; the pipeline never branches on the language itself.

mod cpp;
mod javascript;
mod python;

pub use cpp::CppToolchain;
pub use javascript::JavaScriptToolchain;
pub use python::PythonToolchain;

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::config::ToolchainConfig;
use crate::language::Language;
use crate::workspace::Workspace;

/// How to turn workspace source into a runnable artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Compiler invocation.
    pub argv: Vec<String>,
    /// File the compiler is expected to produce.
    pub artifact: PathBuf,
}

/// Build/run capabilities of one language.
pub trait Toolchain: Debug + Send + Sync {
    fn language(&self) -> Language;

    /// File name (relative to the workspace root) the source is written to.
    fn source_file(&self) -> &'static str;

    /// Compiler invocation, or `None` for languages run straight from source.
    fn build_plan(&self, workspace: &Workspace) -> Option<BuildPlan>;

    /// Program invocation for the run phase.
    fn run_argv(&self, workspace: &Workspace) -> Vec<String>;
}

/// Select the toolchain for `language`.
pub fn for_language(language: Language, config: &ToolchainConfig) -> Box<dyn Toolchain> {
    match language {
        Language::Cpp => Box::new(CppToolchain::new(&config.cxx, &config.cxx_flags)),
        Language::Python => Box::new(PythonToolchain::new(&config.python)),
        Language::JavaScript => Box::new(JavaScriptToolchain::new(&config.node)),
    }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn dispatch_matches_language() {
        let config = ToolchainConfig::default();
        for lang in Language::ALL {
            assert_eq!(for_language(lang, &config).language(), lang);
        }
    }

    #[test]
    fn only_cpp_has_a_build_phase() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::acquire(root.path(), Uuid::new_v4()).unwrap();
        let config = ToolchainConfig::default();

        assert!(for_language(Language::Cpp, &config).build_plan(&ws).is_some());
        assert!(for_language(Language::Python, &config).build_plan(&ws).is_none());
        assert!(for_language(Language::JavaScript, &config).build_plan(&ws).is_none());
    }

    #[test]
    fn every_path_stays_inside_the_workspace() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::acquire(root.path(), Uuid::new_v4()).unwrap();
        let config = ToolchainConfig::default();
        let inside = |arg: &String| !arg.starts_with('/') || Path::new(arg).starts_with(ws.path());

        for lang in Language::ALL {
            let toolchain = for_language(lang, &config);
            assert!(toolchain.run_argv(&ws).iter().all(inside), "{lang}");
            if let Some(plan) = toolchain.build_plan(&ws) {
                assert!(plan.artifact.starts_with(ws.path()));
                assert!(plan.argv.iter().all(inside), "{lang}");
            }
        }
    }
}
