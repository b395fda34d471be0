use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::{
    model::ProjectFile,
    project::{LoadError, Project},
};

pub const PROJECT_FILE_EXTENSION: &str = "vibe.json";

#[instrument(skip(project), fields(project = %project.meta().name))]
pub fn to_json_string(project: &Project) -> Result<String> {
    serde_json::to_string_pretty(&project.to_file()).context("failed to serialize project")
}

pub fn from_json_str(json: &str) -> Result<Project, LoadError> {
    let file: ProjectFile = serde_json::from_str(json)?;
    Project::from_file(file)
}

pub fn from_json_slice(bytes: &[u8]) -> Result<Project, LoadError> {
    let file: ProjectFile = serde_json::from_slice(bytes)?;
    Project::from_file(file)
}

/// Writes the whole document through a temp file in the target directory.
///
/// Concurrent writers are not coordinated; the last persist wins.
#[instrument(skip(project), fields(project = %project.meta().name, path = %path.display()))]
pub fn save_project(path: &Path, project: &Project) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let json = serde_json::to_vec_pretty(&project.to_file())
        .context("failed to serialize project")?;
    let mut temp_file = tempfile::NamedTempFile::new_in(&parent)
        .context("failed to create temp project file")?;
    temp_file
        .write_all(&json)
        .context("failed to write temp project file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist project: {}", path.display()))?;

    info!(bytes = json.len(), "project saved");
    Ok(())
}

#[instrument(fields(path = %path.display()))]
pub fn load_project(path: &Path) -> Result<Project> {
    let content =
        fs::read(path).with_context(|| format!("failed to read project: {}", path.display()))?;
    let project = from_json_slice(&content)
        .with_context(|| format!("failed to load project: {}", path.display()))?;
    info!(
        project = %project.meta().name,
        sources = project.get_sources().len(),
        tracks = project.get_tracks().len(),
        clips = project.get_clips().len(),
        "project loaded"
    );
    Ok(project)
}

/// `<dir>/<slug>.vibe.json` for a project name.
#[must_use]
pub fn default_project_path(dir: &Path, name: &str) -> PathBuf {
    let slug: String = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() {
        "project".to_string()
    } else {
        slug
    };
    let path = dir.join(format!("{slug}.{PROJECT_FILE_EXTENSION}"));
    debug!(path = %path.display(), "resolved default project path");
    path
}
