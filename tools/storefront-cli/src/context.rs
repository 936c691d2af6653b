//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use storefront_cache::Versioned;
use storefront_commerce::cart::CartSnapshot;
use storefront_sdk::StorefrontConfig;

use crate::output::Output;

/// Config file names searched for, in order, in each directory.
pub const CONFIG_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Storefront configuration.
    pub config: StorefrontConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            let path = PathBuf::from(path);
            (StorefrontConfig::load(&path)?, Some(path))
        } else {
            // Try to find config in current directory or parent directories
            match find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (StorefrontConfig::default(), None),
            }
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Read a cart snapshot file.
    pub fn read_snapshot(&self, path: &str) -> Result<CartSnapshot> {
        let path = self.resolve_path(path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cart file: {}", path.display()))?;
        parse_snapshot(&content)
            .with_context(|| format!("Failed to parse cart file: {}", path.display()))
    }

    /// Write a cart snapshot file as pretty JSON.
    pub fn write_snapshot(&self, path: &str, snapshot: &CartSnapshot) -> Result<()> {
        let path = self.resolve_path(path);
        std::fs::write(&path, snapshot.to_json()?)
            .with_context(|| format!("Failed to write cart file: {}", path.display()))
    }
}

/// Parse a cart file: either a bare snapshot or a record saved by the file
/// store. A record whose `data` does not parse is an error, never an empty
/// cart.
pub fn parse_snapshot(content: &str) -> Result<CartSnapshot> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let is_record = value
        .as_object()
        .is_some_and(|fields| fields.contains_key("version") && fields.contains_key("data"));
    if is_record {
        let record: Versioned<CartSnapshot> =
            serde_json::from_value(value).context("Invalid versioned cart record")?;
        Ok(record.data)
    } else {
        Ok(serde_json::from_value(value).context("Invalid cart snapshot")?)
    }
}

/// Find config file in directory tree.
fn find_config(start: &Path) -> Option<(StorefrontConfig, PathBuf)> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                if let Ok(config) = StorefrontConfig::load(&config_path) {
                    return Some((config, config_path));
                }
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}
