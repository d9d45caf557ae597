//! Router configuration

use std::env;

use serde::{Deserialize, Serialize};

use crate::types::BackendKind;

/// Backend order environment variable, comma separated kinds
pub const ENV_BACKEND_ORDER: &str = "ZAP_BACKEND_ORDER";

/// Payment router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Backend kinds in the order they are tried
    #[serde(default = "default_backend_order")]
    pub backend_order: Vec<BackendKind>,
}

fn default_backend_order() -> Vec<BackendKind> {
    BackendKind::DEFAULT_ORDER.to_vec()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            backend_order: default_backend_order(),
        }
    }
}

impl RouterConfig {
    /// Override settings from the environment
    pub fn from_env(mut self) -> Self {
        if let Ok(order_str) = env::var(ENV_BACKEND_ORDER) {
            match parse_backend_order(&order_str) {
                Ok(order) => self.backend_order = order,
                Err(err) => {
                    tracing::warn!("Ignoring {}: {}", ENV_BACKEND_ORDER, err);
                }
            }
        }

        self
    }
}

/// Parse a comma separated list of backend kinds, dropping duplicates
pub fn parse_backend_order(value: &str) -> Result<Vec<BackendKind>, crate::Error> {
    let mut order = Vec::new();
    for kind in value.split(',').filter(|s| !s.trim().is_empty()) {
        let kind: BackendKind = kind.parse()?;
        if !order.contains(&kind) {
            order.push(kind);
        }
    }
    Ok(order)
}
