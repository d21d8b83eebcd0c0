use crate::error::DispatcherError;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

pub struct Environment;

impl Environment {
    pub fn string(
        env_name: &str,
        default: &str,
    ) -> String {
        Self::optional_string(env_name).unwrap_or(default.to_string())
    }

    /// Blank values are treated as unset.
    pub fn optional_string(env_name: &str) -> Option<String> {
        env::var(env_name).ok().filter(|value| !value.trim().is_empty())
    }

    pub fn parse<T>(
        env_name: &str,
        default: T,
    ) -> Result<T, DispatcherError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match Self::optional_string(env_name) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|error| DispatcherError::new(&error.to_string(), &format!("Failed to parse environment variable {env_name}={value}"))),
        }
    }
}
