use std::env;

// ============================================================================
// Runtime Configuration - loaded from the environment
// ============================================================================
//
// Every knob has a development default so the service starts against a
// local stack with no configuration at all. Overrides come from the
// process environment or a .env file.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct Config {
    pub http_port: u16,
    pub metrics_port: u16,
    pub product_service_url: String,
    pub gateway_timeout_ms: u64,
    pub kafka_brokers: String,
    pub kafka_timeout_ms: u64,
    pub order_events_topic: String,
    pub scylla_node: String,
    pub scylla_keyspace: String,
    pub store_backend: StoreBackend,
    pub order_number_max_attempts: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Scylla,
}

impl StoreBackend {
    fn from_env(key: &str, default: StoreBackend) -> StoreBackend {
        match env::var(key).unwrap_or_default().to_ascii_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "scylla" => StoreBackend::Scylla,
            _ => default,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            http_port: parse_env("HTTP_PORT", 8084),
            metrics_port: parse_env("METRICS_PORT", 9090),
            product_service_url: string_env("PRODUCT_SERVICE_URL", "http://localhost:8083"),
            gateway_timeout_ms: parse_env("GATEWAY_TIMEOUT_MS", 3000),
            kafka_brokers: string_env("KAFKA_BROKERS", "127.0.0.1:9092"),
            kafka_timeout_ms: parse_env("KAFKA_TIMEOUT_MS", 5000),
            order_events_topic: string_env("ORDER_EVENTS_TOPIC", "order-events"),
            scylla_node: string_env("SCYLLA_NODE", "127.0.0.1:9042"),
            scylla_keyspace: string_env("SCYLLA_KEYSPACE", "orders_ks"),
            store_backend: StoreBackend::from_env("STORE_BACKEND", StoreBackend::Scylla),
            order_number_max_attempts: parse_env("ORDER_NUMBER_MAX_ATTEMPTS", 10),
        }
    }
}

fn string_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_env_falls_back_to_default() {
        let value = string_env("ORDER_SERVICE_TEST_MISSING_STRING", "fallback");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_parse_env_falls_back_on_missing_or_garbage() {
        let missing: u16 = parse_env("ORDER_SERVICE_TEST_MISSING_NUM", 8084);
        assert_eq!(missing, 8084);

        env::set_var("ORDER_SERVICE_TEST_GARBAGE_NUM", "not-a-number");
        let garbage: u16 = parse_env("ORDER_SERVICE_TEST_GARBAGE_NUM", 8084);
        assert_eq!(garbage, 8084);
    }

    #[test]
    fn test_parse_env_reads_set_value() {
        env::set_var("ORDER_SERVICE_TEST_SET_NUM", "9191");
        let value: u16 = parse_env("ORDER_SERVICE_TEST_SET_NUM", 8084);
        assert_eq!(value, 9191);
    }

    #[test]
    fn test_store_backend_from_env() {
        env::set_var("ORDER_SERVICE_TEST_BACKEND", "memory");
        assert_eq!(
            StoreBackend::from_env("ORDER_SERVICE_TEST_BACKEND", StoreBackend::Scylla),
            StoreBackend::Memory
        );

        env::set_var("ORDER_SERVICE_TEST_BACKEND", "SCYLLA");
        assert_eq!(
            StoreBackend::from_env("ORDER_SERVICE_TEST_BACKEND", StoreBackend::Memory),
            StoreBackend::Scylla
        );

        assert_eq!(
            StoreBackend::from_env("ORDER_SERVICE_TEST_BACKEND_UNSET", StoreBackend::Scylla),
            StoreBackend::Scylla
        );
    }
}
