//! Bot configuration
//!
//! Loads configuration from environment variables

use std::str::FromStr;
use std::time::Duration;

use invevent_core::ConfigError;
use invevent_core::config::CoreConfig;
use invevent_core::wizard::Flow;
use url::Url;

pub const DEFAULT_BOT_USERNAME: &str = "InvEventBot";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration (token, database)
    pub core: CoreConfig,

    /// Username used to build `t.me` deep links
    pub bot_username: String,

    /// Geocoding endpoint, `None` when disabled
    pub geocoder_url: Option<Url>,

    pub geocoder_timeout: Duration,

    /// Abandoned wizards are dropped after this long
    pub wizard_idle_ttl: Duration,

    /// Ask for a picture and a description after visibility
    pub wizard_extended: bool,

    pub nearby_radius_km: f64,

    pub event_sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let core = CoreConfig::from_env()?;

        let geocoder_url = if parse_var("GEOCODING_ENABLED", true)? {
            let raw = std::env::var("GEOCODER_URL").unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string());
            let url = Url::parse(&raw).map_err(|_| ConfigError::InvalidValue {
                name: "GEOCODER_URL".to_string(),
                value: raw,
            })?;
            Some(url)
        } else {
            None
        };

        let nearby_radius_km: f64 = parse_var("NEARBY_RADIUS_KM", 5.0)?;
        if !(nearby_radius_km.is_finite() && nearby_radius_km > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "NEARBY_RADIUS_KM".to_string(),
                value: nearby_radius_km.to_string(),
            });
        }

        Ok(Self {
            core,
            bot_username: std::env::var("BOT_USERNAME")
                .unwrap_or_else(|_| DEFAULT_BOT_USERNAME.to_string()),
            geocoder_url,
            geocoder_timeout: parse_secs("GEOCODER_TIMEOUT_SECS", 5)?,
            wizard_idle_ttl: parse_secs("WIZARD_IDLE_TTL_SECS", 1800)?,
            wizard_extended: parse_var("WIZARD_EXTENDED", false)?,
            nearby_radius_km,
            event_sweep_interval: parse_secs("EVENT_SWEEP_INTERVAL_SECS", 300)?,
        })
    }

    pub fn wizard_flow(&self) -> Flow {
        if self.wizard_extended {
            Flow::EXTENDED
        } else {
            Flow::STANDARD
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Durations in whole seconds; zero is rejected
fn parse_secs(name: &str, default: u64) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_var(name, default)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "BOT_USERNAME",
        "GEOCODING_ENABLED",
        "GEOCODER_URL",
        "GEOCODER_TIMEOUT_SECS",
        "WIZARD_IDLE_TTL_SECS",
        "WIZARD_EXTENDED",
        "NEARBY_RADIUS_KM",
        "EVENT_SWEEP_INTERVAL_SECS",
    ];

    fn clear() {
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
            env::set_var("TELEGRAM_BOT_TOKEN", "test_token");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = Config::from_env().unwrap();
        assert_eq!(config.bot_username, "InvEventBot");
        assert_eq!(
            config.geocoder_url.as_ref().map(Url::as_str),
            Some(DEFAULT_GEOCODER_URL)
        );
        assert_eq!(config.geocoder_timeout, Duration::from_secs(5));
        assert_eq!(config.wizard_idle_ttl, Duration::from_secs(1800));
        assert_eq!(config.wizard_flow(), Flow::STANDARD);
        assert!((config.nearby_radius_km - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.event_sweep_interval, Duration::from_secs(300));
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        unsafe {
            env::set_var("BOT_USERNAME", "TestEventsBot");
            env::set_var("GEOCODING_ENABLED", "false");
            env::set_var("WIZARD_EXTENDED", "true");
            env::set_var("NEARBY_RADIUS_KM", "12.5");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.bot_username, "TestEventsBot");
        assert!(config.geocoder_url.is_none());
        assert_eq!(config.wizard_flow(), Flow::EXTENDED);
        assert!((config.nearby_radius_km - 12.5).abs() < f64::EPSILON);
        clear();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_errors() {
        clear();
        unsafe { env::set_var("WIZARD_IDLE_TTL_SECS", "half an hour") };
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidValue { .. })
        ));

        clear();
        unsafe { env::set_var("NEARBY_RADIUS_KM", "-1") };
        assert!(Config::from_env().is_err());
        clear();
    }

    #[test]
    #[serial]
    fn test_zero_durations_are_rejected() {
        for var in [
            "EVENT_SWEEP_INTERVAL_SECS",
            "GEOCODER_TIMEOUT_SECS",
            "WIZARD_IDLE_TTL_SECS",
        ] {
            clear();
            unsafe { env::set_var(var, "0") };
            match Config::from_env() {
                Err(ConfigError::InvalidValue { name, value }) => {
                    assert_eq!(name, var);
                    assert_eq!(value, "0");
                }
                other => panic!("{var}=0 accepted: {other:?}"),
            }
        }

        clear();
        unsafe { env::set_var("EVENT_SWEEP_INTERVAL_SECS", "1") };
        assert_eq!(
            Config::from_env().unwrap().event_sweep_interval,
            Duration::from_secs(1)
        );
        clear();
    }
}
