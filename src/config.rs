use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub payment: PaymentConfig,
    pub identity: IdentityConfig,
    /// Delay applied to admin demo store writes, in milliseconds.
    pub admin_demo_latency_ms: u64,
}

#[derive(Clone, Debug, Default)]
pub struct PaymentConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_url: String,
}

impl PaymentConfig {
    /// Without a key id the gateway runs offline and mints local order ids.
    pub fn is_offline(&self) -> bool {
        self.key_id.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct IdentityConfig {
    pub api_url: String,
    pub secret_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:fdgym.db?mode=rwc".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            payment: PaymentConfig {
                key_id: env::var("PAYMENT_KEY_ID").unwrap_or_default(),
                key_secret: env::var("PAYMENT_KEY_SECRET").unwrap_or_default(),
                api_url: env::var("PAYMENT_API_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
            },
            identity: IdentityConfig {
                api_url: env::var("IDENTITY_API_URL")
                    .unwrap_or_else(|_| "https://api.clerk.com/v1".to_string()),
                secret_key: env::var("IDENTITY_SECRET_KEY")
                    .ok()
                    .filter(|key| !key.is_empty()),
            },
            admin_demo_latency_ms: env::var("ADMIN_DEMO_LATENCY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let config = Config {
            database_url: ":memory:".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            payment: PaymentConfig::default(),
            identity: IdentityConfig::default(),
            admin_demo_latency_ms: 0,
        };
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_payment_offline_without_key_id() {
        assert!(PaymentConfig::default().is_offline());
        let configured = PaymentConfig {
            key_id: "rzp_test_key".to_string(),
            ..Default::default()
        };
        assert!(!configured.is_offline());
    }
}
