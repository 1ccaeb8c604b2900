//! Server configuration from environment variables.
//!
//! - `GCALC_PORT`: listen port (default 3000)
//! - `GCALC_COMPILER_URL`: base URL of the expression compiler
//!   (default `http://127.0.0.1:7878`)
//! - `GCALC_FRAME_RATE`: render loop frames per second (default 60)
//! - `GCALC_TEXTURE_WIDTH`: program texture width in texels (default 256)
//! - `GCALC_CASCADE`: `always` or `hint` (default `always`)

use std::fmt::Display;
use std::str::FromStr;

use gcalc_render::{EncoderConfig, SchedulerConfig};
use gcalc_session::{CascadePolicy, SessionConfig, DEFAULT_COMPILER_URL};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub compiler_url: String,
    pub frame_rate: u32,
    pub texture_width: usize,
    pub cascade: CascadePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 3000,
            compiler_url: DEFAULT_COMPILER_URL.to_string(),
            frame_rate: gcalc_render::scheduler::DEFAULT_FRAME_RATE,
            texture_width: gcalc_render::texture::DEFAULT_TEXTURE_WIDTH,
            cascade: CascadePolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        ServerConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        let config = ServerConfig {
            port: parse(&lookup, "GCALC_PORT", defaults.port)?,
            compiler_url: lookup("GCALC_COMPILER_URL").unwrap_or(defaults.compiler_url),
            frame_rate: parse(&lookup, "GCALC_FRAME_RATE", defaults.frame_rate)?,
            texture_width: parse(&lookup, "GCALC_TEXTURE_WIDTH", defaults.texture_width)?,
            cascade: parse(&lookup, "GCALC_CASCADE", defaults.cascade)?,
        };

        if config.frame_rate == 0 {
            return Err(ConfigError::InvalidVar {
                key: "GCALC_FRAME_RATE",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if let Err(err) = config.scheduler().encoder.validate() {
            return Err(ConfigError::InvalidVar {
                key: "GCALC_TEXTURE_WIDTH",
                value: config.texture_width.to_string(),
                reason: err.to_string(),
            });
        }
        Ok(config)
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            cascade: self.cascade,
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            frame_rate: self.frame_rate,
            encoder: EncoderConfig {
                texture_width: self.texture_width,
            },
        }
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError::InvalidVar {
            key,
            reason: err.to_string(),
            value,
        }),
    }
}
