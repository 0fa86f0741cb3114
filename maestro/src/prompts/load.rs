//! Loads `maestro.yaml` from a prompts directory and applies env overrides.

use std::path::{Path, PathBuf};

use super::{Prompts, PromptsFile};

const EMBEDDED: &str = include_str!("../../prompts/maestro.yaml");

const PROMPTS_FILE: &str = "maestro.yaml";

/// Default directory name when `PROMPTS_DIR` is not set.
const DEFAULT_PROMPTS_DIR: &str = "prompts";

/// Error when loading prompts from a directory (missing dir, unreadable file, invalid YAML).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("prompts directory not found or not readable: {0}")]
    DirNotFound(String),
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
}

/// `dir` if given, else `PROMPTS_DIR`, else `./prompts`.
fn prompts_dir(dir: Option<&Path>) -> PathBuf {
    dir.map(PathBuf::from).unwrap_or_else(|| {
        std::env::var("PROMPTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROMPTS_DIR))
    })
}

fn read_prompts_file(dir: &Path) -> Result<Option<PromptsFile>, LoadError> {
    let path = dir.join(PROMPTS_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LoadError::ReadFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|e| LoadError::ParseYaml {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

fn apply_env(mut prompts: Prompts) -> Prompts {
    if let Ok(p) = std::env::var("MAESTRO_PLANNER_PROMPT") {
        prompts.planner = p;
    }
    if let Ok(c) = std::env::var("MAESTRO_CHAT_PROMPT") {
        prompts.chat = c;
    }
    prompts
}

fn embedded() -> Prompts {
    let file: PromptsFile = serde_yaml::from_str(EMBEDDED).unwrap_or_default();
    Prompts::new(String::new(), String::new()).merged(file)
}

/// Embedded defaults with env overrides applied.
pub fn default_from_embedded() -> Prompts {
    apply_env(embedded())
}

/// Loads `maestro.yaml` from `dir` (or `PROMPTS_DIR`, or `./prompts`) over the embedded
/// defaults, then applies env overrides.
///
/// A missing file keeps the defaults; a missing directory or a file that fails to parse is
/// an error.
pub fn load(dir: Option<&Path>) -> Result<Prompts, LoadError> {
    let base = prompts_dir(dir);
    if !base.is_dir() {
        return Err(LoadError::DirNotFound(base.display().to_string()));
    }
    let prompts = match read_prompts_file(&base)? {
        Some(file) => embedded().merged(file),
        None => embedded(),
    };
    Ok(apply_env(prompts))
}

/// [`load`], falling back to [`default_from_embedded`] on any error (logged at `debug`).
pub fn load_or_default(dir: Option<&Path>) -> Prompts {
    load(dir).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "using embedded prompts");
        default_from_embedded()
    })
}
