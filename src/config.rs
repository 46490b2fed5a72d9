use std::env;
use std::fmt::{Debug, Display};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use tracing::{info, warn};

use crate::layout::{LayoutConfig, LayoutStrategy};
use crate::model::Pallet;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub layout: LayoutSettings,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            layout: LayoutSettings::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 5006;

    fn from_env() -> Self {
        let host_value =
            env_string("CUBE_STORE_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "⚠️ Could not parse CUBE_STORE_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (Self::DEFAULT_BIND_IP, Self::DEFAULT_HOST.to_string())
            }
        };

        let port = match env_string("CUBE_STORE_API_PORT") {
            Some(raw) => parse_port(&raw).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_ip: Self::DEFAULT_BIND_IP,
            display_host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}

/// Layout defaults applied when a request does not override them.
#[derive(Clone, Debug, Default)]
pub struct LayoutSettings {
    layout: LayoutConfig,
    pallet: Pallet,
}

impl LayoutSettings {
    const GAP_VAR: &'static str = "CUBE_STORE_LAYOUT_GAP";
    const STRATEGY_VAR: &'static str = "CUBE_STORE_LAYOUT_STRATEGY";
    const PALLET_VAR: &'static str = "CUBE_STORE_PALLET";

    fn from_env() -> Self {
        let gap = load_f64_with_warning(
            Self::GAP_VAR,
            LayoutConfig::DEFAULT_GAP,
            |value| value >= 0.0 && value.is_finite(),
            "must be a finite number not below 0",
            "Warning: Adjusted gap changes column counts for every cube",
        );

        let strategy = load_parsed(Self::STRATEGY_VAR, LayoutStrategy::default());
        if strategy == LayoutStrategy::Shelf {
            info!("📐 Using shelf layout strategy");
        }

        let pallet = load_parsed(Self::PALLET_VAR, Pallet::default());

        Self::new(
            LayoutConfig::builder().gap(gap).strategy(strategy).build(),
            pallet,
        )
    }

    pub fn new(layout: LayoutConfig, pallet: Pallet) -> Self {
        Self { layout, pallet }
    }

    /// Returns the configured LayoutConfig.
    pub fn layout_config(&self) -> LayoutConfig {
        self.layout
    }

    /// Pallet used when a request names none.
    pub fn default_pallet(&self) -> Pallet {
        self.pallet
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            warn!("⚠️ CUBE_STORE_API_PORT must not be 0. Using default port.");
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "⚠️ Could not parse CUBE_STORE_API_PORT ('{}'): {}. Using default port.",
                raw, err
            );
            None
        }
    }
}

fn load_parsed<T>(var_name: &str, default: T) -> T
where
    T: FromStr + Debug,
    T::Err: Display,
{
    match env_string(var_name) {
        Some(raw) => parse_or_default(var_name, &raw, default),
        None => default,
    }
}

fn parse_or_default<T>(var_name: &str, raw: &str, default: T) -> T
where
    T: FromStr + Debug,
    T::Err: Display,
{
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "⚠️ Could not interpret {} ('{}'): {}. Using {:?}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_with_warning(var_name, &raw, default, validator, invalid_hint, warning),
        None => default,
    }
}

fn parse_f64_with_warning(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) => {
            if !validator(value) {
                warn!(
                    "⚠️ {} contains invalid value '{}': {}. Using {}.",
                    var_name, raw, invalid_hint, default
                );
                default
            } else {
                let tolerance = (default.abs().max(1.0)) * 1e-9;
                if (value - default).abs() > tolerance {
                    info!("⚠️ {} ({} = {}).", warning, var_name, value);
                }
                value
            }
        }
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_negative(value: f64) -> bool {
        value >= 0.0 && value.is_finite()
    }

    #[test]
    fn test_parse_port_values() {
        assert_eq!(parse_port("8080"), Some(8080));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port("http"), None);
    }

    #[test]
    fn test_parse_f64_accepts_valid_values() {
        assert_eq!(
            parse_f64_with_warning("TEST_VAR", "0.25", 0.1, non_negative, "", ""),
            0.25
        );
        assert_eq!(
            parse_f64_with_warning("TEST_VAR", "0", 0.1, non_negative, "", ""),
            0.0
        );
    }

    #[test]
    fn test_parse_f64_falls_back_on_invalid_values() {
        assert_eq!(
            parse_f64_with_warning("TEST_VAR", "-1", 0.1, non_negative, "", ""),
            0.1
        );
        assert_eq!(
            parse_f64_with_warning("TEST_VAR", "inf", 0.1, non_negative, "", ""),
            0.1
        );
        assert_eq!(
            parse_f64_with_warning("TEST_VAR", "wide", 0.1, non_negative, "", ""),
            0.1
        );
    }

    #[test]
    fn test_parse_strategy_and_pallet() {
        assert_eq!(
            parse_or_default("TEST_VAR", "shelf", LayoutStrategy::Grid),
            LayoutStrategy::Shelf
        );
        assert_eq!(
            parse_or_default("TEST_VAR", "diagonal", LayoutStrategy::Grid),
            LayoutStrategy::Grid
        );
        assert_eq!(
            parse_or_default("TEST_VAR", "12x8", Pallet::default()),
            Pallet::new(12.0, 8.0).unwrap()
        );
        assert_eq!(
            parse_or_default("TEST_VAR", "-3x8", Pallet::default()),
            Pallet::default()
        );
    }

    #[test]
    fn test_defaults() {
        let settings = LayoutSettings::default();
        assert_eq!(settings.layout_config(), LayoutConfig::default());
        assert_eq!(settings.default_pallet(), Pallet::new(10.0, 10.0).unwrap());

        let api = ApiConfig::default();
        assert_eq!(api.port(), 5006);
        assert!(api.binds_to_all_interfaces());
        assert!(api.uses_default_host());
    }
}
