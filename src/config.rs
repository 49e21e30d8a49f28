//! Environment configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file by `dotenvy` in `main`.
//!
//! # Environment Variables
//!
//! - `PORT` - Server port number (default: 8080)
//! - `DATABASE_URL` - Path to database file (default: "data.db")
//! - `URL` - Public base URL used to build short links (default: `http://localhost:<PORT>`)
//! - `CODE_LENGTH` - Length of generated codes (default: 6)
//! - `CODE_ALPHABET` - Characters generated codes are drawn from (default: URL-safe set)

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::error::GeneratorError;
use crate::generator::{CodeGenerator, DEFAULT_LENGTH, URL_SAFE_ALPHABET};
use crate::validation::check_generator;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "data.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub code_length: usize,
    pub code_alphabet: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);
        let database_path = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let base_url = lookup("URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));
        let code_length = parse_or(&lookup, "CODE_LENGTH", DEFAULT_LENGTH);
        let code_alphabet =
            lookup("CODE_ALPHABET").unwrap_or_else(|| URL_SAFE_ALPHABET.to_string());

        Self {
            port,
            database_path,
            base_url,
            code_length,
            code_alphabet,
        }
    }

    /// Builds the code generator, rejecting an alphabet or length that
    /// cannot produce valid short codes.
    pub fn generator(&self) -> Result<CodeGenerator, GeneratorError> {
        let generator = CodeGenerator::new(&self.code_alphabet, self.code_length)?;
        check_generator(&generator)?;
        Ok(generator)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "invalid value, using default");
            default
        }),
        None => default,
    }
}
