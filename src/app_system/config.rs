use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::domain::TransitionPolicy;

/// Environment variable holding the path of a TOML config file.
pub const CONFIG_ENV_VAR: &str = "ORDER_REPOSITORY_CONFIG";

/// Settings for the order repository and its stores.
///
/// Every key is optional in the TOML file; omitted keys keep their defaults.
///
/// ```toml
/// default_limit = 50
/// max_limit = 200
/// transition_policy = "forward-only"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Request queue size of each store actor.
    pub channel_buffer: usize,
    /// Page size used by `list` when the caller gives none.
    pub default_limit: usize,
    /// Upper bound applied to every `list` page.
    pub max_limit: Option<usize>,
    /// Reject creates and edits that reference unknown products.
    pub enforce_product_references: bool,
    pub transition_policy: TransitionPolicy,
    pub order_id_prefix: String,
    pub product_id_prefix: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 32,
            default_limit: 25,
            max_limit: None,
            enforce_product_references: true,
            transition_policy: TransitionPolicy::Permissive,
            order_id_prefix: "order".to_string(),
            product_id_prefix: "product".to_string(),
        }
    }
}

impl RepositoryConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.channel_buffer == 0 {
            bail!("channel_buffer must be positive");
        }
        if self.default_limit == 0 {
            bail!("default_limit must be positive");
        }
        if let Some(max) = self.max_limit {
            if max == 0 {
                bail!("max_limit must be positive");
            }
        }
        if self.order_id_prefix.is_empty() || self.product_id_prefix.is_empty() {
            bail!("id prefixes must not be empty");
        }
        Ok(())
    }

    /// Page size for a `list` call. Zero or absent means the default.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        let limit = match requested {
            Some(0) | None => self.default_limit,
            Some(n) => n,
        };
        self.max_limit.map_or(limit, |max| limit.min(max))
    }
}
