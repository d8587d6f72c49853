use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Local,
    Dev,
    Test,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_env(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "local" => Self::Local,
            "dev" | "development" => Self::Dev,
            "test" | "testing" => Self::Test,
            "staging" => Self::Staging,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Staging => "staging",
            Self::Prod => "prod",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub environment: Environment,
    pub metrics_addr: Option<String>,
    pub log_level: String,
    pub data_dir: String,
}

impl ServiceConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        Self::from_lookup(default_service_name, |key| env::var(key).ok())
    }

    fn from_lookup(default_service_name: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: lookup("WAVE_SERVICE_NAME")
                .unwrap_or_else(|| default_service_name.to_string()),
            environment: Environment::from_env(
                &lookup("WAVE_ENV").unwrap_or_else(|| "local".to_string()),
            ),
            metrics_addr: lookup("WAVE_METRICS_ADDR"),
            log_level: lookup("WAVE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            data_dir: lookup("WAVE_DATA_DIR").unwrap_or_else(|| "./data".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub tick_interval: Duration,
    pub position_debounce: Duration,
    pub priority_window: Duration,
    pub position_epsilon_deg: f64,
    pub hit_lead: Duration,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1_000),
            position_debounce: Duration::from_millis(100),
            priority_window: Duration::from_millis(100),
            position_epsilon_deg: 0.0001,
            hit_lead: Duration::from_millis(10_000),
            breaker_threshold: 5,
            breaker_cooldown: Duration::from_millis(30_000),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            tick_interval: millis(&lookup, "WAVE_TICK_INTERVAL_MS", defaults.tick_interval)
                .max(Duration::from_millis(1)),
            position_debounce: millis(&lookup, "WAVE_POSITION_DEBOUNCE_MS", defaults.position_debounce),
            priority_window: millis(&lookup, "WAVE_PRIORITY_WINDOW_MS", defaults.priority_window),
            position_epsilon_deg: lookup("WAVE_POSITION_EPSILON_DEG")
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite() && *value > 0.0)
                .unwrap_or(defaults.position_epsilon_deg),
            hit_lead: millis(&lookup, "WAVE_HIT_LEAD_MS", defaults.hit_lead),
            breaker_threshold: lookup("WAVE_BREAKER_THRESHOLD")
                .and_then(|value| value.parse::<u32>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.breaker_threshold),
            breaker_cooldown: millis(&lookup, "WAVE_BREAKER_COOLDOWN_MS", defaults.breaker_cooldown),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub speed: f64,
    pub looping: bool,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            looping: false,
            user_lat: None,
            user_lng: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let float = |key: &str| {
            lookup(key)
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite())
        };
        Self {
            speed: float("WAVE_SIM_SPEED")
                .filter(|value| *value > 0.0)
                .unwrap_or(1.0),
            looping: lookup("WAVE_SIM_LOOP")
                .map(|value| parse_bool(&value, false))
                .unwrap_or(false),
            user_lat: float("WAVE_SIM_LAT"),
            user_lng: float("WAVE_SIM_LNG"),
        }
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Duration {
    lookup(key)
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
