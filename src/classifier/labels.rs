use std::fs;
use std::path::Path;

use crate::error::ClassifyError;

/// Class names indexed by model output position, one per line of the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    pub fn load(path: &Path) -> Result<Self, ClassifyError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ClassifyError::ModelLoad(format!("reading labels {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut names: Vec<String> = content
            .lines()
            .map(|line| line.trim().to_string())
            .collect();
        while names.last().is_some_and(|name| name.is_empty()) {
            names.pop();
        }
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for output `index` of a model with `classes` outputs. A model with
    /// exactly one more output than there are labels reserves index 0 for
    /// background.
    pub fn name(&self, index: usize, classes: usize) -> String {
        let offset = usize::from(classes == self.names.len() + 1);
        if index < offset {
            return "background".to_string();
        }
        match self.names.get(index - offset) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("class {}", index),
        }
    }
}
