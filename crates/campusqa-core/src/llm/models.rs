//! Known completion models and their prompt ceilings

use serde::{Deserialize, Serialize};

/// A completion model and the ceiling applied to its prompts.
///
/// The ceiling is enforced on prompt characters before the request is sent;
/// the backend is never relied on to truncate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    pub id: String,
    pub token_ceiling: usize,
}

/// Static model table with a default fallback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelRegistry {
    /// Used when a requested model is absent or unknown
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Ceiling for models without an explicit entry
    #[serde(default = "default_ceiling")]
    pub default_ceiling: usize,

    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            default_ceiling: default_ceiling(),
            models: default_models(),
        }
    }
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_ceiling() -> usize {
    5000
}

fn default_models() -> Vec<ModelConfig> {
    [
        ("llama-3.1-8b-instant", 18000),
        ("llama-3.3-70b-versatile", 5400),
        ("mixtral-8x7b-32768", 4600),
        ("gemma2-9b-it", 13500),
    ]
    .into_iter()
    .map(|(id, token_ceiling)| ModelConfig {
        id: id.to_string(),
        token_ceiling,
    })
    .collect()
}

impl ModelRegistry {
    /// Whether `id` is an available model
    pub fn contains(&self, id: &str) -> bool {
        self.models.iter().any(|m| m.id == id)
    }

    /// Available model identifiers, in table order
    pub fn available(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }

    /// Resolve a requested model, falling back to the default for empty or
    /// unknown identifiers.
    pub fn resolve(&self, requested: &str) -> ModelConfig {
        let requested = requested.trim();
        if let Some(model) = self.models.iter().find(|m| m.id == requested) {
            return model.clone();
        }

        if !requested.is_empty() {
            tracing::warn!("Model {} not available, using {}", requested, self.default_model);
        }

        let token_ceiling = self
            .models
            .iter()
            .find(|m| m.id == self.default_model)
            .map(|m| m.token_ceiling)
            .unwrap_or(self.default_ceiling);

        ModelConfig {
            id: self.default_model.clone(),
            token_ceiling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_model() {
        let registry = ModelRegistry::default();
        let model = registry.resolve("mixtral-8x7b-32768");
        assert_eq!(model.id, "mixtral-8x7b-32768");
        assert_eq!(model.token_ceiling, 4600);
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let registry = ModelRegistry::default();
        let model = registry.resolve("gpt-unknown");
        assert_eq!(model.id, "llama-3.1-8b-instant");
        assert_eq!(model.token_ceiling, 18000);

        let model = registry.resolve("");
        assert_eq!(model.id, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_default_model_without_entry_uses_default_ceiling() {
        let registry = ModelRegistry {
            default_model: "local-model".to_string(),
            default_ceiling: 5000,
            models: vec![],
        };
        let model = registry.resolve("whatever");
        assert_eq!(model.id, "local-model");
        assert_eq!(model.token_ceiling, 5000);
    }

    #[test]
    fn test_available_lists_table() {
        let registry = ModelRegistry::default();
        let available = registry.available();
        assert_eq!(available.len(), 4);
        assert!(registry.contains("gemma2-9b-it"));
        assert!(!registry.contains("gpt-4"));
    }
}
