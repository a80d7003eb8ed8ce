//! Deployment environment tags.

use std::fmt;
use std::str::FromStr;

use super::ConfigError;

/// The deployment environment a configuration variant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Production,
    Development,
    Testing,
}

impl Environment {
    /// Every known environment, in lookup order.
    pub const ALL: [Environment; 3] = [
        Environment::Production,
        Environment::Development,
        Environment::Testing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Testing => "testing",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| ConfigError::UndefinedEnvironment(s.to_string()))
    }
}
