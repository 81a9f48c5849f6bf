//! 📡 ApiExtractor: the remote sales provider, or its understudy.
//!
//! 🎬 With a `url` configured this is a plain HTTP GET returning a JSON array
//! of camelCase sale objects. Without one, a fixed three-record payload shows
//! up after a short nap, so a run cannot tell the difference except by the clock.
//!
//! Every record leaves tagged `"API"`, stamped with the extraction time. Those
//! are the rows the analytical rebuild leaves alone.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::app_config::ApiExtractorConfig;
use crate::common::{API_SOURCE, SaleRecord};
use crate::extractors::Extractor;

/// 📦 One sale as the provider spells it. Anything missing is zero or blank.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RemoteSale {
    id: i64,
    customer_id: i32,
    order_id: i32,
    product_id: i32,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    product_name: Option<String>,
    category: Option<String>,
    price: Decimal,
    quantity: i32,
    total_price: Decimal,
    order_date: Option<DateTime<Utc>>,
}

impl RemoteSale {
    fn into_record(self, extracted_at: DateTime<Utc>) -> SaleRecord {
        SaleRecord {
            id: self.id,
            customer_id: self.customer_id,
            order_id: self.order_id,
            product_id: self.product_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            product_name: self.product_name,
            category: self.category,
            price: self.price,
            quantity: self.quantity,
            total_price: self.total_price,
            order_date: self.order_date,
            created_date: extracted_at,
            source: API_SOURCE.to_string(),
        }
    }
}

/// 🎭 What the provider "returns" when there is no provider.
fn rehearsed_payload() -> Vec<RemoteSale> {
    let sale = |id, customer_id, product_id, quantity, total_cents| RemoteSale {
        id,
        customer_id,
        product_id,
        quantity,
        total_price: Decimal::new(total_cents, 2),
        ..RemoteSale::default()
    };
    vec![
        sale(1001, 1, 1, 2, 175_078),
        sale(1002, 2, 3, 1, 9_081),
        sale(1003, 3, 5, 3, 212_034),
    ]
}

/// 📡 Talks to the remote sales provider.
#[derive(Debug, Clone)]
pub(crate) struct ApiExtractor {
    client: reqwest::Client,
    config: ApiExtractorConfig,
}

impl ApiExtractor {
    /// 🔧 Builds the HTTP client up front; the only way this fails is a broken TLS stack.
    pub(crate) fn new(config: ApiExtractorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. Probably the TLS stack, possibly fate.")?;
        Ok(Self { client, config })
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<RemoteSale>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("💀 The request to '{url}' never came back"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("💀 '{url}' answered {status}: {body}");
        }
        response
            .json::<Vec<RemoteSale>>()
            .await
            .with_context(|| format!("💀 '{url}' sent something that is not a JSON array of sales"))
    }

    async fn fetch(&self) -> Result<Vec<SaleRecord>> {
        let mut payload = match self.config.url.as_deref() {
            Some(url) => self.fetch_remote(url).await?,
            None => {
                debug!(latency_ms = self.config.simulated_latency_ms, "🎭 no provider url, using the built-in payload");
                tokio::time::sleep(Duration::from_millis(self.config.simulated_latency_ms)).await;
                rehearsed_payload()
            }
        };

        if payload.len() > self.config.max_records {
            warn!(
                received = payload.len(),
                kept = self.config.max_records,
                "🧱 provider sent more than max_records, truncating"
            );
            payload.truncate(self.config.max_records);
        }

        let extracted_at = Utc::now();
        Ok(payload
            .into_iter()
            .map(|sale| sale.into_record(extracted_at))
            .collect())
    }
}

#[async_trait]
impl Extractor for ApiExtractor {
    fn source_type(&self) -> &'static str {
        API_SOURCE
    }

    async fn extract(&self) -> Vec<SaleRecord> {
        match self.fetch().await {
            Ok(records) => {
                info!(extractor = self.source_type(), count = records.len(), "📦 extracted");
                records
            }
            Err(err) => {
                error!(extractor = self.source_type(), "💀 extraction failed: {:#}", err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: Option<String>) -> ApiExtractorConfig {
        ApiExtractorConfig {
            url,
            simulated_latency_ms: 0,
            ..ApiExtractorConfig::default()
        }
    }

    #[tokio::test]
    async fn the_one_where_nobody_configured_a_provider() -> Result<()> {
        let records = ApiExtractor::new(config(None))?.extract().await;

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1001, 1002, 1003]);
        assert!(records.iter().all(|r| r.source == API_SOURCE));
        assert_eq!(records[0].total_price, Decimal::new(175_078, 2));
        assert_eq!(records[2].product_id, 5);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_provider_answers() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sales"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 7,
                    "customerId": 2,
                    "productId": 4,
                    "firstName": "Grace",
                    "price": 12.5,
                    "quantity": 2,
                    "totalPrice": "25.00",
                    "orderDate": "2024-03-01T10:00:00Z",
                    "somethingNew": true
                },
                { "id": 8 }
            ])))
            .mount(&server)
            .await;

        let records = ApiExtractor::new(config(Some(format!("{}/sales", server.uri()))))?
            .extract()
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first_name.as_deref(), Some("Grace"));
        assert_eq!(records[0].total_price, Decimal::new(2500, 2));
        assert!(records[0].order_date.is_some());
        assert_eq!(records[1].customer_id, 0, "missing keys default to unresolved");
        assert!(records.iter().all(|r| r.source == API_SOURCE));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_provider_has_a_bad_day() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream on fire"))
            .mount(&server)
            .await;

        let records = ApiExtractor::new(config(Some(server.uri())))?.extract().await;
        assert!(records.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_payload_is_too_generous() -> Result<()> {
        let server = MockServer::start().await;
        let many: Vec<_> = (1..=5).map(|id| json!({ "id": id })).collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(many))
            .mount(&server)
            .await;

        let mut cfg = config(Some(server.uri()));
        cfg.max_records = 3;
        let records = ApiExtractor::new(cfg)?.extract().await;
        assert_eq!(records.len(), 3);
        Ok(())
    }
}
