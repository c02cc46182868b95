/// Fleet-management API client
///
/// Out-of-band producer provisioning: telling the fleet backend which
/// vehicles should stream telemetry to this relay and which fields they
/// should report. Never used on the message hot path; the relay identifies
/// producers from their frames, not from this API.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::FleetConfig;
use crate::logger::{self, LogTag};

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("fleet api request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fleet api returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vehicle {
    pub vin: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Per-field reporting settings pushed to a vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct FieldConfig {
    pub interval_seconds: u32,
}

/// Telemetry configuration pushed to a set of vehicles: where to stream and
/// which fields to report.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryConfig {
    pub hostname: String,
    pub port: u16,
    pub fields: BTreeMap<String, FieldConfig>,
}

pub struct FleetClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl FleetClient {
    pub fn new(base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
            token,
        }
    }

    /// Build a client from configuration; None when no API base is set.
    pub fn from_config(config: &FleetConfig) -> Option<Self> {
        config
            .api_base
            .as_ref()
            .map(|base| Self::new(base.clone(), config.api_token.clone()))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// List the vehicles visible to this account.
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, FleetError> {
        let response = self
            .authorize(self.http.get(self.endpoint("api/1/vehicles")))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Push a telemetry configuration to the given VINs.
    pub async fn configure_telemetry(
        &self,
        vins: &[String],
        config: &TelemetryConfig,
    ) -> Result<(), FleetError> {
        #[derive(Serialize)]
        struct Request<'a> {
            vins: &'a [String],
            config: &'a TelemetryConfig,
        }

        let response = self
            .authorize(
                self.http
                    .post(self.endpoint("api/1/vehicles/fleet_telemetry_config")),
            )
            .json(&Request { vins, config })
            .send()
            .await?;
        check_status(response).await?;

        logger::info(
            LogTag::Fleet,
            &format!("pushed telemetry config to {} vehicle(s)", vins.len()),
        );
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FleetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FleetError::Api {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let client = FleetClient::new("https://fleet.example.com/", None);
        assert_eq!(
            client.endpoint("/api/1/vehicles"),
            "https://fleet.example.com/api/1/vehicles"
        );
        let client = FleetClient::new("https://fleet.example.com", None);
        assert_eq!(
            client.endpoint("api/1/vehicles"),
            "https://fleet.example.com/api/1/vehicles"
        );
    }

    #[test]
    fn test_from_config_requires_api_base() {
        assert!(FleetClient::from_config(&FleetConfig::default()).is_none());

        let config = FleetConfig {
            api_base: Some("https://fleet.example.com".to_string()),
            api_token: Some("token".to_string()),
        };
        assert!(FleetClient::from_config(&config).is_some());
    }

    #[test]
    fn test_telemetry_config_serialization() {
        let mut fields = BTreeMap::new();
        fields.insert("soc".to_string(), FieldConfig { interval_seconds: 60 });

        let config = TelemetryConfig {
            hostname: "relay.example.com".to_string(),
            port: 8080,
            fields,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["hostname"], "relay.example.com");
        assert_eq!(value["fields"]["soc"]["interval_seconds"], 60);
    }
}
