use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::symbol::SymbolKind;

/// Output format for replay results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScopegraphConfig {
    pub format: Option<OutputFormat>,
    /// Kinds that must be unique within a scope; defaults to everything but callables
    pub biasless_kinds: Option<Vec<SymbolKind>>,
}

impl ScopegraphConfig {
    pub fn biasless_kinds(&self) -> Vec<SymbolKind> {
        self.biasless_kinds
            .clone()
            .unwrap_or_else(SymbolKind::default_biasless)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("scopegraph.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ScopegraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ScopegraphConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ScopegraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("scopegraph.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scopegraph.toml");
        let config = ScopegraphConfig {
            format: Some(OutputFormat::Json),
            biasless_kinds: Some(vec![SymbolKind::Container]),
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.format, Some(OutputFormat::Json));
        assert_eq!(loaded.biasless_kinds(), vec![SymbolKind::Container]);
    }

    #[test]
    fn test_kind_aliases_in_config() {
        let config: ScopegraphConfig = toml::from_str(r#"biasless_kinds = ["class", "var"]"#).unwrap();
        assert_eq!(
            config.biasless_kinds(),
            vec![SymbolKind::Container, SymbolKind::Value]
        );
        assert_eq!(
            ScopegraphConfig::default().biasless_kinds(),
            SymbolKind::default_biasless()
        );
    }
}
