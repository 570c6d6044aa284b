use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    /// Side length of the square model input.
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    /// Convert raw model scores to probabilities before ranking.
    pub softmax: bool,
    pub top_k: usize,
    pub max_upload_bytes: usize,
    pub max_in_flight: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            model_path: PathBuf::from("model.onnx"),
            labels_path: PathBuf::from("labels.txt"),
            input_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            softmax: true,
            top_k: 3,
            max_upload_bytes: 10 * 1024 * 1024,
            max_in_flight: 1,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.input_size > 0, "input_size must be greater than zero");
        ensure!(self.top_k > 0, "top_k must be greater than zero");
        ensure!(self.max_in_flight > 0, "max_in_flight must be greater than zero");
        ensure!(
            self.max_upload_bytes > 0,
            "max_upload_bytes must be greater than zero"
        );
        ensure!(
            self.std.iter().all(|s| *s != 0.0),
            "std components must be non-zero"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = \"0.0.0.0:9000\"").unwrap();
        writeln!(file, "top_k = 5").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(
            config,
            Config {
                bind: "0.0.0.0:9000".to_string(),
                top_k: 5,
                ..Config::default()
            }
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();

        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn example_config_parses_and_validates() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.toml");

        let config = Config::load(&path).unwrap();

        config.validate().unwrap();
        assert_eq!(config.model_path, PathBuf::from("mobilenetv2-7.onnx"));
        assert_eq!(config.top_k, 3);
    }

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_std_and_zero_top_k() {
        let config = Config {
            std: [0.229, 0.0, 0.225],
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            top_k: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
