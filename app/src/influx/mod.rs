use crate::config::InfluxConfig;
use crate::error::InfluxError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::{header, Client, Response};
use sprout_core::error::StoreError;
use sprout_core::store::{EntityStore, Point};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;
use tracing::debug;

mod flux;
mod line;


/// `EntityStore` backed by the InfluxDB v2 HTTP API
pub struct InfluxStore {
    client: Client,
    config: InfluxConfig,
}

impl Debug for InfluxStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxStore")
            .field("url", &self.config.url)
            .field("bucket", &self.config.bucket)
            .finish()
    }
}

impl InfluxStore {
    pub fn new(config: InfluxConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(InfluxError::from)?;
        Ok(InfluxStore { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn auth(&self) -> String {
        format!("Token {}", self.config.token)
    }

    async fn query(&self, flux: String) -> Result<Vec<Point>, InfluxError> {
        debug!(query = %flux, "Querying influx");
        let body = serde_json::json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "header": true,
                "annotations": ["datatype"],
                "dateTimeFormat": "RFC3339Nano",
            },
        });
        let resp = self
            .client
            .post(self.endpoint("query"))
            .query(&[("org", self.config.org.as_str())])
            .header(header::AUTHORIZATION, self.auth())
            .header(header::ACCEPT, "application/csv")
            .json(&body)
            .send()
            .await?;
        let bytes = check(resp).await?.bytes().await?;
        flux::parse_csv(&bytes)
    }
}

#[async_trait]
impl EntityStore for InfluxStore {
    #[tracing::instrument(skip(self, point), fields(measurement = %point.measurement))]
    async fn write(&self, point: Point) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(self.endpoint("write"))
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(header::AUTHORIZATION, self.auth())
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line::encode(&point))
            .send()
            .await
            .map_err(InfluxError::from)?;
        check(resp).await?;
        Ok(())
    }

    async fn latest(
        &self,
        measurement: &str,
        key_tag: &str,
        key: Option<&str>,
    ) -> Result<Vec<Point>, StoreError> {
        let flux = flux::latest_query(&self.config.bucket, measurement, key_tag, key);
        let points = self.query(flux).await?;

        // `last()` answers per field, keep the newest point per key
        let mut latest: BTreeMap<String, Point> = BTreeMap::new();
        for point in points {
            let id = match point.tag_value(key_tag) {
                Some(id) => id.to_owned(),
                None => continue,
            };
            match latest.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(point);
                }
                Entry::Occupied(mut slot) => {
                    let current = slot.get_mut();
                    if point.time > current.time {
                        *current = point;
                    } else if point.time == current.time {
                        current.fields.extend(point.fields);
                    }
                }
            }
        }
        Ok(latest.into_values().collect())
    }

    async fn range(
        &self,
        measurement: &str,
        key_tag: &str,
        key: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Point>, StoreError> {
        let flux = flux::range_query(&self.config.bucket, measurement, key_tag, key, from, until);
        let mut points = self.query(flux).await?;
        points.sort_by_key(|p| p.time);
        Ok(points)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, measurement: &str, key_tag: &str, key: &str) -> Result<(), StoreError> {
        let body = serde_json::json!({
            "start": Utc.timestamp_nanos(0).to_rfc3339_opts(SecondsFormat::Secs, true),
            "stop": Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
            "predicate": flux::delete_predicate(measurement, key_tag, key),
        });
        let resp = self
            .client
            .post(self.endpoint("delete"))
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
            ])
            .header(header::AUTHORIZATION, self.auth())
            .json(&body)
            .send()
            .await
            .map_err(InfluxError::from)?;
        check(resp).await?;
        Ok(())
    }
}

/*
 * Helpers
 */

async fn check(resp: Response) -> Result<Response, InfluxError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(InfluxError::Status {
        status: status.as_u16(),
        body,
    })
}
