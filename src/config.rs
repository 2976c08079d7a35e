//! Daemon configuration.
//!
//! Loaded once at startup and shared read-only. Sources, highest priority
//! first: an explicit `--config` file, the `ARENA_EXEC_CONFIG` environment
//! variable (inline JSON), built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Environment variable holding inline JSON configuration.
pub const CONFIG_ENV: &str = "ARENA_EXEC_CONFIG";

/// Top-level configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory under which per-request workspaces are created.
    #[serde(default = "default_temp_root")]
    pub temp_root: PathBuf,

    /// Wall-clock limit for the build phase, in seconds.
    #[serde(default = "default_build_timeout")]
    pub build_timeout_seconds: u64,

    /// Wall-clock limit for the run phase, in seconds.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_seconds: u64,

    /// Maximum captured output returned to the caller, in bytes.
    #[serde(default = "default_output_limit")]
    pub output_limit_bytes: usize,

    /// Host programs used by each language.
    #[serde(default)]
    pub toolchains: ToolchainConfig,
}

/// Host programs invoked by the toolchains.
///
/// Bare names are looked up on `PATH`; anything containing a `/` is used as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainConfig {
    /// C++ compiler.
    #[serde(default = "default_cxx")]
    pub cxx: String,

    /// Extra flags passed to the C++ compiler before the source file.
    #[serde(default = "default_cxx_flags")]
    pub cxx_flags: Vec<String>,

    /// Python interpreter.
    #[serde(default = "default_python")]
    pub python: String,

    /// JavaScript runtime.
    #[serde(default = "default_node")]
    pub node: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            cxx: default_cxx(),
            cxx_flags: default_cxx_flags(),
            python: default_python(),
            node: default_node(),
        }
    }
}

impl ToolchainConfig {
    /// Configured programs that cannot be resolved on this host.
    pub fn missing_programs(&self) -> Vec<&str> {
        [&self.cxx, &self.python, &self.node]
            .into_iter()
            .map(String::as_str)
            .filter(|program| find_program(program).is_none())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
            build_timeout_seconds: default_build_timeout(),
            run_timeout_seconds: default_run_timeout(),
            output_limit_bytes: default_output_limit(),
            toolchains: ToolchainConfig::default(),
        }
    }
}

impl Config {
    /// Resolve configuration from a file, the environment, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(config) = Self::from_env()? {
            config
        } else {
            debug!("No configuration supplied, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load configuration from the `ARENA_EXEC_CONFIG` environment variable.
    ///
    /// Returns `None` when the variable is unset.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(CONFIG_ENV) {
            Ok(json) => Self::from_json(&json)
                .with_context(|| format!("Failed to parse {CONFIG_ENV}"))
                .map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse JSON")?;
        Ok(config)
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.build_timeout_seconds > 0,
            "build_timeout_seconds must be positive"
        );
        anyhow::ensure!(
            self.run_timeout_seconds > 0,
            "run_timeout_seconds must be positive"
        );
        anyhow::ensure!(
            self.output_limit_bytes > 0,
            "output_limit_bytes must be positive"
        );
        Ok(())
    }

    pub const fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_seconds)
    }

    pub const fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }
}

/// Resolve a program name the way `execvp` would.
pub fn find_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    if program.contains('/') {
        let path = PathBuf::from(program);
        return path.is_file().then_some(path);
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn default_temp_root() -> PathBuf {
    std::env::temp_dir()
}

const fn default_build_timeout() -> u64 {
    10
}

const fn default_run_timeout() -> u64 {
    10
}

const fn default_output_limit() -> usize {
    64 * 1024
}

fn default_cxx() -> String {
    "g++".into()
}

fn default_cxx_flags() -> Vec<String> {
    vec!["-O2".into(), "-std=c++17".into()]
}

fn default_python() -> String {
    "python3".into()
}

fn default_node() -> String {
    "node".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = Config::from_json("{}").unwrap();

        assert_eq!(config.build_timeout_seconds, 10);
        assert_eq!(config.run_timeout_seconds, 10);
        assert_eq!(config.output_limit_bytes, 65536);
        assert_eq!(config.temp_root, std::env::temp_dir());
        assert_eq!(config.toolchains.cxx, "g++");
        assert_eq!(config.toolchains.cxx_flags, vec!["-O2", "-std=c++17"]);
        assert_eq!(config.toolchains.python, "python3");
        assert_eq!(config.toolchains.node, "node");
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "temp_root": "/var/tmp/arena",
            "build_timeout_seconds": 5,
            "run_timeout_seconds": 2,
            "output_limit_bytes": 1024,
            "toolchains": {
                "cxx": "/usr/bin/clang++",
                "cxx_flags": [],
                "python": "/opt/python/bin/python3"
            }
        }"#;

        let config = Config::from_json(json).unwrap();

        assert_eq!(config.temp_root, PathBuf::from("/var/tmp/arena"));
        assert_eq!(config.build_timeout(), Duration::from_secs(5));
        assert_eq!(config.run_timeout(), Duration::from_secs(2));
        assert_eq!(config.output_limit_bytes, 1024);
        assert_eq!(config.toolchains.cxx, "/usr/bin/clang++");
        assert!(config.toolchains.cxx_flags.is_empty());
        assert_eq!(config.toolchains.python, "/opt/python/bin/python3");
        // Unspecified toolchain entries keep their defaults
        assert_eq!(config.toolchains.node, "node");
    }

    #[test]
    fn validate_rejects_zero_limits() {
        for json in [
            r#"{"build_timeout_seconds": 0}"#,
            r#"{"run_timeout_seconds": 0}"#,
            r#"{"output_limit_bytes": 0}"#,
        ] {
            let config = Config::from_json(json).unwrap();
            assert!(config.validate().is_err(), "{json} should be rejected");
        }
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.json");
        std::fs::write(&path, r#"{"run_timeout_seconds": 3}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.run_timeout_seconds, 3);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.json");
        std::fs::write(&path, r#"{"run_timeout_seconds": 0}"#).unwrap();
        assert!(Config::load(Some(&path)).is_err());

        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());

        assert!(Config::load(Some(Path::new("/nonexistent/arena.json"))).is_err());
    }

    #[test]
    fn find_program_resolves_paths() {
        assert_eq!(find_program("/bin/sh"), Some(PathBuf::from("/bin/sh")));
        assert!(find_program("sh").is_some());
        assert!(find_program("/nonexistent/bin/cc").is_none());
        assert!(find_program("definitely-not-a-real-program-4242").is_none());
        assert!(find_program("").is_none());
    }

    #[test]
    fn missing_programs_lists_unresolvable_entries() {
        let toolchains = ToolchainConfig {
            cxx: "/nonexistent/g++".into(),
            cxx_flags: Vec::new(),
            python: "/bin/sh".into(),
            node: "definitely-not-a-real-program-4242".into(),
        };
        assert_eq!(
            toolchains.missing_programs(),
            vec!["/nonexistent/g++", "definitely-not-a-real-program-4242"]
        );
    }
}
