//! Process configuration, loaded from the environment (§6).
//!
//! One env var per documented option, each with the default `spec.md`
//! names. Unlike the teacher's multi-stream `ingest_config.rs` (a TOML file
//! describing N configurable data streams), this core has exactly one feed
//! and one boundary polygon, so configuration is env-var only.

use crate::error::CoreError;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub write_interval: Duration,
    pub boundary_enabled: bool,
    pub boundary_path: Option<String>,
    pub landing_radius_nm: f64,
    pub landing_alt_ft: f64,
    pub landing_speed_kt: f64,
    pub t_stale: Duration,
    pub t_complete: Duration,
    pub match_max_dist_nm: f64,
    pub match_time_tol: Duration,
    pub match_min_duration: Duration,
    pub freq_tol_hz: i64,
    pub retention: Duration,
    pub db_pool_size: u32,
    pub db_max_overflow: u32,
    pub feed_base_url: String,
    pub database_url: String,
    pub airports_path: String,
    pub metrics_bind_addr: String,
}

impl Config {
    /// Load configuration from the process environment, applying the
    /// documented defaults from §6. Fails with `CoreError::Configuration`
    /// when a required option is missing or a present option fails to
    /// parse as its declared type.
    pub fn from_env() -> Result<Self, CoreError> {
        let boundary_enabled = env_bool("BOUNDARY_ENABLED", true)?;
        let boundary_path = std::env::var("BOUNDARY_PATH").ok();
        if boundary_enabled && boundary_path.is_none() {
            return Err(CoreError::Configuration(anyhow::anyhow!(
                "BOUNDARY_PATH is required when BOUNDARY_ENABLED=true"
            )));
        }

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            CoreError::Configuration(anyhow::anyhow!("DATABASE_URL must be set"))
        })?;

        Ok(Self {
            poll_interval: Duration::from_secs(env_u64("POLL_INTERVAL_S", 60)?),
            write_interval: Duration::from_secs(env_u64("WRITE_INTERVAL_S", 30)?),
            boundary_enabled,
            boundary_path,
            landing_radius_nm: env_f64("LANDING_RADIUS_NM", 15.0)?,
            landing_alt_ft: env_f64("LANDING_ALT_FT", 1000.0)?,
            landing_speed_kt: env_f64("LANDING_SPEED_KT", 20.0)?,
            t_stale: Duration::from_secs(env_u64("T_STALE_MIN", 5)? * 60),
            t_complete: Duration::from_secs(env_u64("T_COMPLETE_H", 1)? * 3600),
            match_max_dist_nm: env_f64("MATCH_MAX_DIST_NM", 100.0)?,
            match_time_tol: Duration::from_secs(env_u64("MATCH_TIME_TOL_S", 180)?),
            match_min_duration: Duration::from_secs(env_u64("MATCH_MIN_DURATION_S", 30)?),
            freq_tol_hz: env_u64("FREQ_TOL_HZ", 100)? as i64,
            retention: Duration::from_secs(env_u64("RETENTION_H", 24)? * 3600),
            db_pool_size: env_u64("DB_POOL_SIZE", 20)? as u32,
            db_max_overflow: env_u64("DB_MAX_OVERFLOW", 40)? as u32,
            feed_base_url: std::env::var("FEED_BASE_URL")
                .unwrap_or_else(|_| "https://data.vatsim.net/v3".to_string()),
            database_url,
            airports_path: std::env::var("AIRPORTS_PATH")
                .unwrap_or_else(|_| "data/airports.json".to_string()),
            metrics_bind_addr: std::env::var("METRICS_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:9090".to_string()),
        })
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64, CoreError> {
    match std::env::var(key) {
        Ok(v) => v.parse().map_err(|_| {
            CoreError::Configuration(anyhow::anyhow!("{key} must be an integer, got {v:?}"))
        }),
        Err(_) => Ok(default),
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64, CoreError> {
    match std::env::var(key) {
        Ok(v) => v.parse().map_err(|_| {
            CoreError::Configuration(anyhow::anyhow!("{key} must be a number, got {v:?}"))
        }),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool, CoreError> {
    match std::env::var(key) {
        Ok(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(CoreError::Configuration(anyhow::anyhow!(
                "{key} must be a boolean, got {v:?}"
            ))),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "POLL_INTERVAL_S",
            "WRITE_INTERVAL_S",
            "BOUNDARY_ENABLED",
            "BOUNDARY_PATH",
            "LANDING_RADIUS_NM",
            "LANDING_ALT_FT",
            "LANDING_SPEED_KT",
            "T_STALE_MIN",
            "T_COMPLETE_H",
            "MATCH_MAX_DIST_NM",
            "MATCH_TIME_TOL_S",
            "MATCH_MIN_DURATION_S",
            "FREQ_TOL_HZ",
            "RETENTION_H",
            "DB_POOL_SIZE",
            "DB_MAX_OVERFLOW",
            "FEED_BASE_URL",
            "DATABASE_URL",
            "AIRPORTS_PATH",
            "METRICS_BIND_ADDR",
        ] {
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        clear_env();
        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://localhost/test");
            std::env::set_var("BOUNDARY_ENABLED", "false");
        }
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.write_interval, Duration::from_secs(30));
        assert_eq!(cfg.landing_radius_nm, 15.0);
        assert_eq!(cfg.t_complete, Duration::from_secs(3600));
        assert_eq!(cfg.db_pool_size, 20);
        assert_eq!(cfg.db_max_overflow, 40);
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_boundary_path_is_configuration_error() {
        clear_env();
        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://localhost/test");
            std::env::set_var("BOUNDARY_ENABLED", "true");
        }
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_database_url_is_configuration_error() {
        clear_env();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    #[serial]
    fn malformed_numeric_option_is_configuration_error() {
        clear_env();
        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://localhost/test");
            std::env::set_var("BOUNDARY_ENABLED", "false");
            std::env::set_var("POLL_INTERVAL_S", "not-a-number");
        }
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
        clear_env();
    }
}
