//! Directory types.

use crate::error::DirectoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A remote party's advertised proxy service.
///
/// Created and destroyed by the directory service; this crate only ever
/// holds read-only copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyOffering {
    /// Directory peer identifier, when the directory reports one.
    #[serde(rename = "peerID", default, skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<String>,
    /// Display name. Not guaranteed unique.
    pub name: String,
    /// Endpoint host to configure as the system proxy.
    #[serde(rename = "ipAddress", alias = "ip", alias = "address")]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    /// Free-text, informational only.
    #[serde(default)]
    pub location: String,
    /// One-time fee in currency units.
    #[serde(default, deserialize_with = "fee::deserialize")]
    pub initial_fee: f64,
    /// Price per megabyte.
    #[serde(rename = "price", alias = "rate", deserialize_with = "fee::deserialize")]
    pub rate: f64,
}

impl ProxyOffering {
    /// `host:port` form of the endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Parameters this node registers under when serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfOffering {
    pub name: String,
    #[serde(default)]
    pub initial_fee: f64,
    pub rate: f64,
}

impl SelfOffering {
    pub fn new(name: impl Into<String>, initial_fee: f64, rate: f64) -> Self {
        Self {
            name: name.into(),
            initial_fee,
            rate,
        }
    }

    /// Check the offering can be advertised.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if !self.initial_fee.is_finite() || self.initial_fee < 0.0 {
            return Err(format!("invalid initial fee: {}", self.initial_fee));
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(format!("invalid rate: {}", self.rate));
        }
        Ok(())
    }
}

/// Body of `POST /registerProxy`.
///
/// The directory decodes fees into string fields, so they are sent as
/// decimal strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub action: RegistrationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

impl RegistrationRequest {
    pub fn register(offering: &SelfOffering) -> Self {
        Self {
            action: RegistrationAction::Register,
            name: Some(offering.name.clone()),
            initial_fee: Some(offering.initial_fee.to_string()),
            price: Some(offering.rate.to_string()),
        }
    }

    pub fn deregister() -> Self {
        Self {
            action: RegistrationAction::Deregister,
            name: None,
            initial_fee: None,
            price: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationAction {
    Register,
    Deregister,
}

/// Response of `GET /isProxy`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationStatus {
    #[serde(rename = "isProxy")]
    pub is_proxy: bool,
}

/// Last known directory contents.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub offerings: Arc<Vec<ProxyOffering>>,
    /// When the directory last answered successfully. `None` until the first
    /// successful refresh.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.offerings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offerings.is_empty()
    }
}

/// Result of a listing: always a snapshot, plus the refresh error when the
/// snapshot is the previous one.
#[derive(Debug, Clone)]
pub struct Listing {
    pub snapshot: Snapshot,
    pub stale: Option<DirectoryError>,
}

impl Listing {
    pub fn is_stale(&self) -> bool {
        self.stale.is_some()
    }
}

mod fee {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFee {
        Number(f64),
        Text(String),
    }

    /// Accept fees as JSON numbers or numeric strings. Blank strings are 0.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = match RawFee::deserialize(deserializer)? {
            RawFee::Number(n) => n,
            RawFee::Text(s) if s.trim().is_empty() => 0.0,
            RawFee::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("invalid fee: {:?}", s)))?,
        };

        if !value.is_finite() || value < 0.0 {
            return Err(D::Error::custom(format!("fee out of range: {}", value)));
        }
        Ok(value)
    }
}
