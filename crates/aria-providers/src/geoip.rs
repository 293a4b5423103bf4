//! IP-based geolocation over free public services.
//!
//! Two services are tried in order; the first parseable success wins.
//! Neither needs an API key, so this provider is always "configured".

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ProviderError, Result};
use crate::traits::{GeoFix, GeoIpProvider};

const SERVICES: &[&str] = &["http://ip-api.com/json/", "https://ipapi.co/json/"];

/// Geolocation client backed by ip-api.com with ipapi.co as fallback.
pub struct HttpGeoIpProvider {
    client: reqwest::Client,
}

impl HttpGeoIpProvider {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpGeoIpProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoIpProvider for HttpGeoIpProvider {
    async fn locate(&self) -> Result<GeoFix> {
        for url in SERVICES {
            debug!(service = url, "trying geolocation service");
            let data: Value = match self.client.get(*url).send().await {
                Ok(resp) => match resp.json().await {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(service = url, error = %e, "geolocation response unparseable");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(service = url, error = %e, "geolocation service unreachable");
                    continue;
                }
            };

            if let Some(fix) = parse_fix(url, &data) {
                debug!(city = %fix.city, country = %fix.country, "location detected");
                return Ok(fix);
            }
        }
        Err(ProviderError::Failed(
            "all geolocation services failed".into(),
        ))
    }
}

/// Field names differ between the two services.
fn parse_fix(url: &str, data: &Value) -> Option<GeoFix> {
    let s = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let f = |key: &str| data.get(key).and_then(Value::as_f64);

    if url.contains("ip-api.com") {
        if data.get("status").and_then(Value::as_str) != Some("success") {
            return None;
        }
        Some(GeoFix {
            city: s("city"),
            region: s("regionName"),
            country: s("country"),
            latitude: f("lat"),
            longitude: f("lon"),
            timezone: s("timezone"),
            zip: s("zip"),
        })
    } else {
        if data.get("error").is_some() {
            return None;
        }
        Some(GeoFix {
            city: s("city"),
            region: s("region"),
            country: s("country_name"),
            latitude: f("latitude"),
            longitude: f("longitude"),
            timezone: s("timezone"),
            zip: s("postal"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_ip_api_payload() {
        let data = json!({
            "status": "success",
            "city": "Jaipur",
            "regionName": "Rajasthan",
            "country": "India",
            "lat": 26.9,
            "lon": 75.8,
            "zip": "302001",
            "timezone": "Asia/Kolkata"
        });
        let fix = parse_fix("http://ip-api.com/json/", &data).unwrap();
        assert_eq!(fix.city, "Jaipur");
        assert_eq!(fix.region, "Rajasthan");
        assert_eq!(fix.latitude, Some(26.9));
    }

    #[test]
    fn ip_api_failure_status_is_rejected() {
        let data = json!({"status": "fail", "message": "private range"});
        assert!(parse_fix("http://ip-api.com/json/", &data).is_none());
    }

    #[test]
    fn parses_ipapi_co_payload() {
        let data = json!({
            "city": "Delhi",
            "region": "Delhi",
            "country_name": "India",
            "latitude": 28.6,
            "longitude": 77.2,
            "postal": "110001",
            "timezone": "Asia/Kolkata"
        });
        let fix = parse_fix("https://ipapi.co/json/", &data).unwrap();
        assert_eq!(fix.country, "India");
        assert_eq!(fix.zip, "110001");
    }

    #[test]
    fn ipapi_co_error_body_is_rejected() {
        let data = json!({"error": true, "reason": "RateLimited"});
        assert!(parse_fix("https://ipapi.co/json/", &data).is_none());
    }
}
