use serde::Deserialize;
use vendra_shared::Masked;

/// API credentials for one provider.
///
/// Supplied via configuration; a provider without credentials is simply not
/// registered, never a startup failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub app_secret: Masked<String>,
    #[serde(default)]
    pub access_token: Option<Masked<String>>,
    /// Overrides the adapter's default endpoint (staging, sandbox).
    #[serde(default)]
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_masked_in_debug() {
        let creds = ProviderCredentials {
            api_key: "key-123".to_string(),
            app_secret: Masked("s3cret".to_string()),
            access_token: None,
            base_url: None,
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("key-123"));
        assert!(!rendered.contains("s3cret"));
    }
}
