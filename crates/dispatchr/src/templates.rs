// File: src/templates.rs
// Purpose: Minimal template engine backing `Render` bodies

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders a named template with a data map.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, data: &Map<String, Value>) -> Result<String>;
}

/// Templates read from `<views_dir>/<name>.<extension>` with `{var}` and
/// `{a.b}` interpolation. Unknown placeholders are left as they are.
#[derive(Debug, Clone)]
pub struct Templates {
    views_dir: PathBuf,
    extension: String,
    inline: HashMap<String, String>,
}

impl Templates {
    pub fn new(views_dir: impl Into<PathBuf>) -> Self {
        Self {
            views_dir: views_dir.into(),
            extension: "html".to_string(),
            inline: HashMap::new(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Register a template in memory. Takes precedence over files.
    pub fn with_template(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.inline.insert(name.into(), content.into());
        self
    }

    pub fn views_dir(&self) -> &Path {
        &self.views_dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.views_dir.join(format!("{}.{}", name, self.extension))
    }

    fn source(&self, name: &str) -> Result<String> {
        if let Some(content) = self.inline.get(name) {
            return Ok(content.clone());
        }
        let path = self.path_for(name);
        fs::read_to_string(&path).with_context(|| format!("Failed to read template: {:?}", path))
    }
}

impl TemplateEngine for Templates {
    fn render(&self, template: &str, data: &Map<String, Value>) -> Result<String> {
        let content = self.source(template)?;
        Ok(interpolate(&content, data))
    }
}

/// Replace `{name}` and `{a.b.c}` placeholders with values from `data`.
pub fn interpolate(content: &str, data: &Map<String, Value>) -> String {
    static VAR_REGEX: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_\.]*)\}").expect("placeholder pattern is valid")
    });

    VAR_REGEX
        .replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            lookup(data, name)
                .map(display)
                .unwrap_or_else(|| format!("{{{}}}", name))
        })
        .to_string()
}

fn lookup<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = data.get(parts.next()?)?;
    for part in parts {
        match current {
            Value::Object(map) => current = map.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
