//! Simulation configuration loaded from environment variables.

/// Sale-simulation parameters with sensible defaults.
///
/// Reads from environment variables:
/// - `PARTITIONS` — intent topic partitions (default: `4`)
/// - `BUYERS` — concurrent buyers in the burst (default: `50`)
/// - `STOCK` — units of the sale item (default: `10`)
///
/// The tracing filter is read separately from `RUST_LOG` at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub partitions: usize,
    pub buyers: i64,
    pub stock: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            partitions: std::env::var("PARTITIONS")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|&p| p > 0)
                .unwrap_or(4),
            buyers: std::env::var("BUYERS")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(50),
            stock: std::env::var("STOCK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partitions: 4,
            buyers: 50,
            stock: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.partitions, 4);
        assert_eq!(config.buyers, 50);
        assert_eq!(config.stock, 10);
    }
}
