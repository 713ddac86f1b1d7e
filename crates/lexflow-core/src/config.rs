/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize` (field names map to upper-cased
/// env vars) and call `Config::from_env()` once at startup.
///
/// # Panics
///
/// Panics if a required env var is missing or fails to deserialize — a
/// misconfigured service must not come up half-working.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Self {
        envy::from_env().expect("failed to load config from environment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize)]
    struct TestConfig {
        #[serde(default = "default_port")]
        lexflow_test_port: u16,
    }

    fn default_port() -> u16 {
        3115
    }

    impl Config for TestConfig {}

    #[test]
    fn should_fall_back_to_defaults_when_env_unset() {
        let config = TestConfig::from_env();
        assert_eq!(config.lexflow_test_port, 3115);
    }
}
