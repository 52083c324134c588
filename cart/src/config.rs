//! Storefront configuration.
//!
//! Every setting has a default matching the production storefront. Hosts
//! override them with `STOREFRONT_*` environment variables:
//!
//! | Variable | Default |
//! |---|---|
//! | `STOREFRONT_CART_STORAGE_KEY` | `chill6_cart` |
//! | `STOREFRONT_CART_URL_PARAM` | `cart` |
//! | `STOREFRONT_DEFAULT_TENANT` | `main` |
//! | `STOREFRONT_WHATSAPP_NUMBER` | `6283104904353` |
//! | `STOREFRONT_BUSINESS_NAME` | `Chill6 Space` |
//! | `STOREFRONT_SHARE_RESET_SECS` | `3` |
//! | `STOREFRONT_BASE_URL` | `http://localhost:3000/` |
//!
//! # Example
//!
//! ```no_run
//! use storefront_cart::config::StorefrontConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorefrontConfig::from_env()?;
//! println!("Orders go to {}", config.whatsapp.phone_number);
//! # Ok(())
//! # }
//! ```

use crate::error::ConfigError;
use crate::persistence::CartKeys;
use crate::sharing::ShareStatus;
use crate::types::{MAIN_TENANT, Tenant};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Prefix shared by all configuration variables
pub const ENV_PREFIX: &str = "STOREFRONT_";

/// Cart storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Durable storage key base
    pub storage_key: String,
    /// URL query parameter base
    pub url_param: String,
    /// Tenant opened at startup
    pub default_tenant: String,
}

impl CartConfig {
    /// Key names derived from this configuration
    #[must_use]
    pub fn keys(&self) -> CartKeys {
        CartKeys::new(&self.storage_key, &self.url_param)
    }

    /// Tenant opened at startup
    #[must_use]
    pub fn tenant(&self) -> Tenant {
        Tenant::new(self.default_tenant.as_str())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cart storage key must not be empty".to_string(),
            ));
        }
        let param_ok = !self.url_param.is_empty()
            && self
                .url_param
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !param_ok {
            return Err(ConfigError::Validation(format!(
                "cart URL parameter must be non-empty ASCII letters, digits, '_' or '-': {:?}",
                self.url_param
            )));
        }
        Ok(())
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: CartKeys::DEFAULT_STORAGE_BASE.to_string(),
            url_param: CartKeys::DEFAULT_URL_PARAM_BASE.to_string(),
            default_tenant: MAIN_TENANT.to_string(),
        }
    }
}

/// WhatsApp checkout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Business number orders are sent to (format: 628xxxxxxxxxx)
    pub phone_number: String,
    /// Business name
    pub business_name: String,
    /// First line of every order message
    pub greeting: String,
}

impl WhatsAppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let digits = self
            .phone_number
            .chars()
            .filter(char::is_ascii_digit)
            .count();
        if digits < 8 {
            return Err(ConfigError::Validation(format!(
                "WhatsApp number needs at least 8 digits: {:?}",
                self.phone_number
            )));
        }
        Ok(())
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            phone_number: "6283104904353".to_string(),
            business_name: "Chill6 Space".to_string(),
            greeting: "Halo, saya ingin memesan layanan berikut:".to_string(),
        }
    }
}

/// Share link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Seconds before the share success flag clears
    pub reset_after_secs: u64,
}

impl ShareConfig {
    /// Delay before the share success flag clears
    #[must_use]
    pub const fn reset_after(&self) -> Duration {
        Duration::from_secs(self.reset_after_secs)
    }

    /// Share status using the configured delay
    #[must_use]
    pub fn status(&self) -> ShareStatus {
        ShareStatus::new(self.reset_after())
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            reset_after_secs: ShareStatus::DEFAULT_RESET.as_secs(),
        }
    }
}

/// Complete storefront configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// Public address of the storefront
    pub base_url: String,
    /// Cart storage
    pub cart: CartConfig,
    /// WhatsApp checkout
    pub whatsapp: WhatsAppConfig,
    /// Share links
    pub share: ShareConfig,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/".to_string(),
            cart: CartConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            share: ShareConfig::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// `lookup` receives full variable names, prefix included.
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::default();

        if let Some(value) = var("CART_STORAGE_KEY") {
            config.cart.storage_key = value;
        }
        if let Some(value) = var("CART_URL_PARAM") {
            config.cart.url_param = value;
        }
        if let Some(value) = var("DEFAULT_TENANT") {
            config.cart.default_tenant = value;
        }
        if let Some(value) = var("WHATSAPP_NUMBER") {
            config.whatsapp.phone_number = value;
        }
        if let Some(value) = var("BUSINESS_NAME") {
            config.whatsapp.business_name = value;
        }
        if let Some(value) = var("SHARE_RESET_SECS") {
            config.share.reset_after_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: format!("{ENV_PREFIX}SHARE_RESET_SECS"),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = var("BASE_URL") {
            config.base_url = value;
        }

        config.validate()?;
        tracing::debug!(
            base_url = %config.base_url,
            tenant = %config.cart.default_tenant,
            "Loaded storefront configuration"
        );
        Ok(config)
    }

    /// Validate entire configuration
    ///
    /// # Errors
    ///
    /// Returns error if any section is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        self.cart.validate()?;
        self.whatsapp.validate()
    }

    /// Parsed base URL
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `base_url` is not an absolute URL
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Validation(format!("base URL {:?}: {e}", self.base_url)))
    }
}
