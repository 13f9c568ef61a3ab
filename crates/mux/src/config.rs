use serde::{Deserialize, Serialize};

/// Switches for the optional dispatch behaviors of a [`Router`](crate::Router).
///
/// Both are off by default since they cost extra trie scans on unmatched requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Answer with the method-not-allowed handler when the path matches under another method.
    pub handle_method_not_allowed: bool,
    /// Answer unmatched OPTIONS requests with the options handler when other methods match.
    pub handle_options: bool,
}

#[cfg(test)]
mod tests {
    use super::RouterConfig;

    #[test]
    fn test_default_is_off() {
        let config = RouterConfig::default();
        assert!(!config.handle_method_not_allowed);
        assert!(!config.handle_options);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RouterConfig = serde_json::from_str(r#"{"handle_options": true}"#).unwrap();
        assert_eq!(config, RouterConfig { handle_method_not_allowed: false, handle_options: true });
    }
}
