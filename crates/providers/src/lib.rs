//! Reasoning capability implementations for Weaver.
//!
//! All adapters implement `weaver_core::ReasoningCapability`.

pub mod openai_compat;
pub mod scripted;

use std::sync::Arc;
use weaver_config::AppConfig;
use weaver_core::capability::ReasoningCapability;

pub use openai_compat::OpenAiCompatCapability;
pub use scripted::ScriptedCapability;

/// Build the configured capability, or `None` when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Option<Arc<dyn ReasoningCapability>> {
    if !config.has_api_key() {
        return None;
    }
    let api_key = config.api_key.clone().unwrap_or_default();
    let mut capability = OpenAiCompatCapability::new("openai", &config.api_base, api_key, &config.model)
        .with_temperature(config.temperature);
    if let Some(max_tokens) = config.max_tokens {
        capability = capability.with_max_tokens(max_tokens);
    }
    Some(Arc::new(capability))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_key_means_no_capability() {
        assert!(build_from_config(&AppConfig::default()).is_none());
    }

    #[test]
    fn key_builds_openai_capability() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        let capability = build_from_config(&config).unwrap();
        assert_eq!(capability.name(), "openai");
    }
}
