use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ModelError;

/// How a task is placed onto compute capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchMode {
    /// Runs on a container instance that can be described and resolved to a host.
    Hosted,
    /// Runs on platform-managed capacity with no addressable host.
    Serverless,
}

impl LaunchMode {
    /// Wire value as reported by the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchMode::Hosted => "EC2",
            LaunchMode::Serverless => "FARGATE",
        }
    }

    pub fn is_serverless(&self) -> bool {
        matches!(self, LaunchMode::Serverless)
    }
}

impl FromStr for LaunchMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            // EXTERNAL capacity is registered as a container instance too.
            "EC2" | "EXTERNAL" | "HOSTED" => Ok(LaunchMode::Hosted),
            "FARGATE" | "SERVERLESS" => Ok(LaunchMode::Serverless),
            _ => Err(ModelError::InvalidLaunchMode(s.to_string())),
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LaunchMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LaunchMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
