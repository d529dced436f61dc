//! pm-project: mechanism files, in YAML or the one-joint-per-line text form.

pub mod schema;
pub mod text;
pub mod validate;

pub use schema::*;
pub use text::{from_url_argument, parse_text, to_text, to_url_argument};
pub use validate::{ValidationError, validate_project};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Line {line}: {what}")]
    Parse { line: usize, what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Mechanism error: {0}")]
    Graph(#[from] pm_graph::GraphError),
}

pub fn load_yaml(path: &Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let project: Project = serde_yaml::from_str(&content)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_yaml(path: &Path, project: &Project) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_yaml::to_string(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a text-encoded mechanism; settings take their defaults.
pub fn load_text(path: &Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let project = Project {
        joints: parse_text(&content)?,
        ..Project::default()
    };
    validate_project(&project)?;
    Ok(project)
}

/// Load by extension: `.yaml`/`.yml` as a project, anything else as text.
pub fn load(path: &Path) -> ProjectResult<Project> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            load_yaml(path)
        }
        _ => load_text(path),
    }
}
