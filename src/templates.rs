//! Slash-command templates.
//!
//! Commands are markdown files named `<command>.md`, looked up in order:
//!
//! ```text
//! <configured dirs>/
//! ~/.claude/commands/
//! ./.claude/commands/
//! ```
//!
//! A leading YAML front matter block (between `---` lines) is metadata for the
//! agent UI and is removed before the body is used as a prompt.

use std::path::{Path, PathBuf};

use crate::errors::TemplateError;

/// Default command used to implement one phase.
pub const IMPLEMENT_COMMAND: &str = "implement_plan";

/// Default command used to write a new plan.
pub const CREATE_COMMAND: &str = "create_plan";

/// Resolves command names to prompt text.
#[derive(Debug, Clone)]
pub struct CommandTemplates {
    search_dirs: Vec<PathBuf>,
}

impl CommandTemplates {
    /// Search only `dirs`, in order.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs: dirs }
    }

    /// Search `extra` first, then the user and project command directories.
    pub fn with_default_dirs(extra: Vec<PathBuf>) -> Self {
        let mut dirs = extra;
        if let Some(home) = dirs::home_dir() {
            dirs.push(home.join(".claude").join("commands"));
        }
        dirs.push(PathBuf::from(".claude").join("commands"));
        Self::new(dirs)
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// First existing file for `name`, if any.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.candidates(name).into_iter().find(|p| p.is_file())
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(format!("{name}.md")))
            .collect()
    }

    /// Load a command's prompt body with front matter stripped.
    pub fn load(&self, name: &str) -> Result<String, TemplateError> {
        let Some(path) = self.locate(name) else {
            return Err(TemplateError::NotFound {
                name: name.to_string(),
                searched: self.candidates(name),
            });
        };
        let content = read(&path)?;
        tracing::debug!(command = name, path = %path.display(), "loaded command template");
        Ok(strip_front_matter(&content))
    }
}

fn read(path: &Path) -> Result<String, TemplateError> {
    std::fs::read_to_string(path).map_err(|source| TemplateError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove a leading `---` delimited block and trim the remainder.
///
/// Text without a closing delimiter is returned untouched.
pub fn strip_front_matter(content: &str) -> String {
    if content.starts_with("---") {
        let parts: Vec<&str> = content.splitn(3, "---").collect();
        if parts.len() == 3 {
            return parts[2].trim().to_string();
        }
    }
    content.to_string()
}
