use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{error::AppResult, models::MovieRecord, store::RecordSource};

const CMS_KEYS: &[&str] = &["id", "documentId", "createdAt", "updatedAt", "publishedAt", "locale"];
const MONEY_KEYS: &[&str] =
    &["TotalCollection", "budzet", "advanceBookings", "total_collection", "budget", "advance_bookings"];

/// Read-only record source backed by a Strapi content API.
pub struct StrapiClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct StrapiList {
    #[serde(default)]
    data: Vec<Value>,
}

impl StrapiClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn fetch(&self, key: &str) -> AppResult<Option<MovieRecord>> {
        let url = format!(
            "{}/movies?filters[m_id][$eq]={}&populate=*",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(key)
        );
        debug!(url = %url, "strapi request");

        let list: StrapiList =
            self.client.get(url).send().await?.error_for_status()?.json().await?;
        list.data.into_iter().next().map(record_from_entry).transpose()
    }
}

#[async_trait]
impl RecordSource for StrapiClient {
    async fn find_by_key(&self, key: &str) -> AppResult<Option<MovieRecord>> {
        match self.fetch(key).await {
            Ok(found) => Ok(found),
            Err(err) => {
                warn!(key = %key, error = %err, "strapi lookup failed; treating as no record");
                Ok(None)
            },
        }
    }
}

/// Accepts both the nested `{id, attributes}` shape and the flat one newer
/// Strapi releases return.
fn record_from_entry(entry: Value) -> AppResult<MovieRecord> {
    let mut fields = match entry {
        Value::Object(mut map) => match map.remove("attributes") {
            Some(Value::Object(attrs)) => attrs,
            _ => map,
        },
        _ => serde_json::Map::new(),
    };

    fields.retain(|k, _| !CMS_KEYS.contains(&k.as_str()));
    for key in MONEY_KEYS {
        // CMS decimal columns come back as JSON numbers.
        if let Some(Value::Number(n)) = fields.get(*key) {
            let text = n.to_string();
            fields.insert(key.to_string(), Value::String(text));
        }
    }

    let mut record: MovieRecord = serde_json::from_value(Value::Object(fields))?;
    record.strip_reserved();
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flat_entries() {
        let entry = serde_json::json!({
            "id": 3,
            "documentId": "abc",
            "m_id": "550",
            "Title": "Fight Club",
            "TotalCollection": "100.5",
            "budzet": 63000000,
            "createdAt": "2025-01-01T00:00:00.000Z"
        });
        let record = record_from_entry(entry).unwrap();
        assert_eq!(record.movie_id, "550");
        assert_eq!(record.title.as_deref(), Some("Fight Club"));
        assert_eq!(record.total_collection.unwrap().as_str(), "100.5");
        assert_eq!(record.budget.unwrap().as_str(), "63000000");
        assert!(record.extra.is_empty());
    }

    #[test]
    fn reads_nested_entries() {
        let entry = serde_json::json!({
            "id": 3,
            "attributes": { "m_id": "tt0137523", "isHOTYear": true }
        });
        let record = record_from_entry(entry).unwrap();
        assert_eq!(record.movie_id, "tt0137523");
        assert!(record.is_hot_year);
    }

    #[tokio::test]
    async fn unreachable_cms_means_no_record() {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let client = StrapiClient::new(http, "http://127.0.0.1:9/api".into());
        assert!(client.find_by_key("550").await.unwrap().is_none());
    }
}
