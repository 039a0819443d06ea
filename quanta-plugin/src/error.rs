use thiserror::Error;

/// Failure of a registered provider
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("Provider '{provider}' failed to load: {message}")]
    LoadFailed { provider: String, message: String },

    #[error("No provider available for {0}")]
    Unavailable(&'static str),
}

impl ProviderError {
    pub fn load_failed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::LoadFailed {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
