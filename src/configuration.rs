//! The single project configuration file described in the external
//! interfaces (§6): project name, data folder, default solver, and an
//! optional extras module name for domain plugins. Everything else about a
//! model run (which component folders exist, which scenarios to apply) is
//! discovered from the data folder itself at load time.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The conventional file name for a project configuration file, expected at
/// the root of a model directory.
pub const CONFIGURATION_FILE_NAME: &str = "project.toml";

/// The single configuration file for a model run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Configuration {
    /// A human-readable name for the project, used in run metadata.
    pub project_name: String,
    /// Path (relative to the configuration file) to the folder containing
    /// the tabular input tree described in §6.
    #[serde(default = "default_data_folder")]
    pub data_folder: PathBuf,
    /// The name of the solver to use when none is given on the command
    /// line; must match a name the `solver` module's registry recognises.
    #[serde(default = "default_solver")]
    pub default_solver: String,
    /// The name of an external domain-plugin module providing
    /// project-specific custom constraints or objective terms, if any.
    /// Deliberately out of scope to load dynamically here: this field is
    /// only parsed and surfaced for an external collaborator to act on.
    #[serde(default)]
    pub extras_module: Option<String>,
}

fn default_data_folder() -> PathBuf {
    PathBuf::from(".")
}

fn default_solver() -> String {
    "highs".to_string()
}

impl Configuration {
    /// Load a configuration file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the data folder to an absolute path given the directory the
    /// configuration file lives in.
    pub fn resolved_data_folder(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.data_folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn loads_minimal_configuration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIGURATION_FILE_NAME);
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "project_name = \"toy\"").unwrap();

        let config = Configuration::load(&path).unwrap();
        assert_eq!(config.project_name, "toy");
        assert_eq!(config.default_solver, "highs");
        assert_eq!(config.data_folder, PathBuf::from("."));
        assert!(config.extras_module.is_none());
    }

    #[test]
    fn resolves_relative_data_folder() {
        let config = Configuration {
            project_name: "toy".into(),
            data_folder: PathBuf::from("data"),
            default_solver: "highs".into(),
            extras_module: None,
        };
        let resolved = config.resolved_data_folder(Path::new("/models/toy"));
        assert_eq!(resolved, PathBuf::from("/models/toy/data"));
    }
}
