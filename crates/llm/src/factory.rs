//! Generator factory.
//!
//! Builds the grounded generator from application configuration: resolves
//! the API key from the environment and applies the optional deadline.

use crate::client::GroundedGenerator;
use crate::providers::GeminiClient;
use fsc_core::{AppConfig, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create the grounded generator described by `config`.
///
/// # Arguments
/// * `config` - Supplies the endpoint, the name of the API key variable and
///   the optional request timeout
///
/// # Returns
/// A shareable generator; the key it holds is never logged.
///
/// # Errors
/// Returns a configuration error if the API key variable is unset or the
/// HTTP client cannot be built.
pub fn create_generator(config: &AppConfig) -> AppResult<Arc<dyn GroundedGenerator>> {
    let api_key = config.resolve_api_key()?;
    let timeout = config.request_timeout_secs.map(Duration::from_secs);

    tracing::debug!(
        endpoint = %config.endpoint,
        timeout_secs = ?config.request_timeout_secs,
        "Creating Gemini client"
    );

    let client = GeminiClient::new(&config.endpoint, api_key, timeout)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsc_core::AppError;

    #[test]
    fn test_missing_key_is_config_error() {
        let mut config = AppConfig::default();
        config.api_key_env = "FSC_FACTORY_TEST_UNSET_KEY".to_string();

        match create_generator(&config) {
            Err(AppError::Config(msg)) => assert!(msg.contains("FSC_FACTORY_TEST_UNSET_KEY")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected missing key error"),
        }
    }

    #[test]
    fn test_create_with_key() {
        // Variable name is unique to this test, so parallel tests never see it
        const KEY_VAR: &str = "FSC_FACTORY_TEST_PRESENT_KEY";
        std::env::set_var(KEY_VAR, "  test-key  ");

        let mut config = AppConfig::default();
        config.api_key_env = KEY_VAR.to_string();
        config.request_timeout_secs = Some(30);

        let result = create_generator(&config);
        std::env::remove_var(KEY_VAR);

        let generator = result.unwrap();
        assert_eq!(generator.provider_name(), "gemini");
    }
}
