//! CLI subcommands

pub mod completions;
pub mod config;
pub mod preview;
pub mod send;

use std::path::{Path, PathBuf};

use abrthook_core::config::Config;
use abrthook_core::domain::CapturedError;
use anyhow::{Context, Result};

/// Error description shared by `send` and `preview`
#[derive(Debug, clap::Args)]
pub struct ErrorArgs {
    /// Error message
    #[arg(long, short)]
    pub message: String,

    /// Error kind (class name)
    #[arg(long, short, default_value = "RuntimeError")]
    pub kind: String,

    /// Backtrace frame such as "/srv/app.rb:3:in 'run'", most recent first
    #[arg(long = "frame", short = 'f', value_name = "FRAME")]
    pub frames: Vec<String>,

    /// Program name used as the executable when no frame is given
    #[arg(long)]
    pub program_name: Option<String>,
}

impl ErrorArgs {
    /// The error to report; without `--frame` it carries no backtrace.
    pub fn captured(&self) -> CapturedError {
        let error = CapturedError::new(&self.message, &self.kind);
        if self.frames.is_empty() {
            error
        } else {
            error.with_frames(self.frames.iter().map(String::as_str))
        }
    }

    /// Apply `--program-name` to the report settings.
    pub fn apply(&self, config: &mut Config) {
        if let Some(name) = &self.program_name {
            config.report.program_name = Some(name.clone());
        }
    }
}

/// Path of the configuration file in use
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(Config::default_path)
}

/// Load the configuration, honouring `--config` and the environment.
///
/// An explicit `--config` file must exist and parse; the default file
/// falls back to built-in defaults.
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => Config::load_or_default(&Config::default_path()),
    };
    config.apply_env_overrides();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use abrthook_core::domain::ErrorSource;

    use super::*;

    fn args(frames: &[&str]) -> ErrorArgs {
        ErrorArgs {
            message: "boom".to_string(),
            kind: "RuntimeError".to_string(),
            frames: frames.iter().map(|f| f.to_string()).collect(),
            program_name: Some("/usr/bin/ruby".to_string()),
        }
    }

    #[test]
    fn captured_without_frames_has_no_backtrace() {
        let error = args(&[]).captured();
        assert_eq!(error.message(), "boom");
        assert!(error.backtrace().is_none());
    }

    #[test]
    fn captured_keeps_frame_order() {
        let error = args(&["/a.rb:1:in 'x'", "/b.rb:2:in 'y'"]).captured();
        let frames = error.backtrace().unwrap();
        assert_eq!(frames[0].location(), "/a.rb:1:in 'x'");
        assert_eq!(frames[1].file(), "/b.rb");
    }

    #[test]
    fn apply_sets_program_name() {
        let mut config = Config::default();
        args(&[]).apply(&mut config);
        assert_eq!(config.report.program_name.as_deref(), Some("/usr/bin/ruby"));
    }

    #[test]
    fn load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "report:\n  basename: pyhook\n").unwrap();

        let config = load_config(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.report.basename, "pyhook");
    }

    #[test]
    fn load_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let err = load_config(Some(path.to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }

    #[test]
    fn config_path_prefers_explicit() {
        assert_eq!(config_path(Some("/tmp/x.yaml")), PathBuf::from("/tmp/x.yaml"));
        assert_eq!(config_path(None), Config::default_path());
    }
}
