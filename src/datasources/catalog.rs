use crate::config::ApiConfig;
use crate::datasources::{endpoint, CropCatalog};
use crate::error::{CropSyncError, Result};
use crate::models::Crop;
use std::time::Duration;

const CROPS_PATH: &str = "/crops/all";

pub struct CatalogClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl CatalogClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch every crop definition, in catalog order.
    pub async fn fetch_crops(&self) -> Result<Vec<Crop>> {
        let url = endpoint(&self.config.base_url, CROPS_PATH);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CropSyncError::CatalogUnavailable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CropSyncError::CatalogUnavailable(format!(
                "catalog returned {}: {}",
                status, body
            )));
        }

        let crops: Vec<Crop> = response.json().await.map_err(|e| {
            CropSyncError::CatalogUnavailable(format!("Failed to parse crop catalog: {}", e))
        })?;

        tracing::debug!(count = crops.len(), "Fetched crop catalog");
        Ok(crops)
    }

    pub async fn test_connection(&self) -> Result<bool> {
        let url = endpoint(&self.config.base_url, CROPS_PATH);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CropSyncError::CatalogUnavailable(format!("{}: {}", url, e)))?;

        Ok(response.status().is_success())
    }
}

impl CropCatalog for CatalogClient {
    async fn fetch_all(&self) -> Result<Vec<Crop>> {
        self.fetch_crops().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::test_server::serve_once;

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn fetches_catalog_in_order() {
        let body = r#"[
            {"id":3,"name":"Lettuce","minTemperature":7,"maxTemperature":24,
             "minSoilMoisture":50,"maxSoilMoisture":80,"minHumidity":40,"maxHumidity":70},
            {"id":7,"name":"Tomato","minTemperature":15,"maxTemperature":30,
             "minSoilMoisture":40,"maxSoilMoisture":70,"minHumidity":50,"maxHumidity":80}
        ]"#;
        let (base_url, server) = serve_once("200 OK", body).await;

        let client = CatalogClient::new(config(&base_url)).unwrap();
        let crops = client.fetch_all().await.unwrap();

        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].name, "Lettuce");
        assert_eq!(crops[1].max_humidity, 80.0);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /crops/all "));
    }

    #[tokio::test]
    async fn null_fields_do_not_reject_the_catalog() {
        let body = r#"[
            {"id":3,"name":"Lettuce","minTemperature":null,"maxTemperature":24,
             "minSoilMoisture":50,"maxSoilMoisture":80,"minHumidity":40,"maxHumidity":70},
            {"id":7,"name":null,"maxHumidity":80}
        ]"#;
        let (base_url, server) = serve_once("200 OK", body).await;

        let client = CatalogClient::new(config(&base_url)).unwrap();
        let crops = client.fetch_all().await.unwrap();

        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].min_temperature, 0.0);
        assert_eq!(crops[0].max_temperature, 24.0);
        assert_eq!(crops[1].name, "");
        assert_eq!(crops[1].max_humidity, 80.0);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_catalog_unavailable() {
        let (base_url, server) = serve_once("500 Internal Server Error", "{}").await;

        let client = CatalogClient::new(config(&base_url)).unwrap();
        let err = client.fetch_all().await.unwrap_err();

        assert!(matches!(err, CropSyncError::CatalogUnavailable(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn undecodable_body_is_catalog_unavailable() {
        let (base_url, server) = serve_once("200 OK", r#"{"crops":[]}"#).await;

        let client = CatalogClient::new(config(&base_url)).unwrap();
        let err = client.fetch_all().await.unwrap_err();

        assert!(matches!(err, CropSyncError::CatalogUnavailable(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_host_is_catalog_unavailable() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = CatalogClient::new(config(&format!("http://{}", addr))).unwrap();
        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(err, CropSyncError::CatalogUnavailable(_)));
    }
}
