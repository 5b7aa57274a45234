/// Server-level configuration for the dispatch pipeline.
///
/// Controls how many launches may be in flight before load shedding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of concurrent dispatches before load shedding.
    pub max_concurrent_dispatches: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_dispatches: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.max_concurrent_dispatches, 1000);
    }
}
