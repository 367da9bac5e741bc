//! Remote store backed by a Weaviate instance (REST for objects, GraphQL
//! for similarity and aggregate queries).
//!
//! All records share one class; the `type` property carries the modality and
//! is the filter for cross-modal queries. The class is created with
//! `vectorizer: none` and cosine distance, so scores are `1 - distance`.

use crate::domain::entities::record::{Record, ScoredRecord};
use crate::domain::ports::vector_store::{StoreError, VectorStore};
use crate::domain::values::embedding::EmbeddingVector;
use crate::domain::values::metadata::Metadata;
use crate::domain::values::modality::Modality;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_URL: &str = "http://localhost:8080";
pub const DEFAULT_COLLECTION: &str = "MultimodalData";

/// Prefix of the class description that pins the vector dimension.
const DIMENSION_MARKER: &str = "crossmodal dimension=";

pub struct WeaviateStore {
    client: Client,
    base_url: String,
    class: String,
}

#[derive(Serialize, Deserialize, Default)]
struct Properties {
    #[serde(default)]
    payload: String,
    #[serde(rename = "type", default)]
    type_tag: String,
    /// JSON-encoded [`Metadata`]; Weaviate properties need a fixed schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    objects: Vec<BatchObject<'a>>,
}

#[derive(Serialize)]
struct BatchObject<'a> {
    class: &'a str,
    id: &'a str,
    vector: &'a [f32],
    properties: Properties,
}

#[derive(Deserialize)]
struct StoredObject {
    id: String,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    vector: Vec<f32>,
}

#[derive(Deserialize)]
struct ObjectList {
    #[serde(default)]
    objects: Vec<StoredObject>,
}

#[derive(Deserialize)]
struct BatchResult {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    result: Option<BatchResultStatus>,
}

#[derive(Deserialize)]
struct BatchResultStatus {
    #[serde(default)]
    errors: Option<BatchErrors>,
}

#[derive(Deserialize)]
struct BatchErrors {
    #[serde(default)]
    error: Vec<ErrorMessage>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<ErrorMessage>>,
}

#[derive(Deserialize)]
struct NearHit {
    #[serde(flatten)]
    properties: Properties,
    #[serde(rename = "_additional")]
    additional: Additional,
}

#[derive(Deserialize)]
struct Additional {
    id: String,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    vector: Vec<f32>,
}

impl WeaviateStore {
    pub fn new(base_url: Option<String>, class: Option<String>) -> Result<Self, String> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_URL.to_string());
        reqwest::Url::parse(&base_url).map_err(|e| format!("Invalid Weaviate URL '{base_url}': {e}"))?;
        let class = class.unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        if !class.starts_with(|c: char| c.is_ascii_uppercase())
            || !class.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(format!("Invalid Weaviate class name: {class}"));
        }
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            class,
        })
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Object endpoint for `id`. Weaviate ids are UUIDs; anything else has no
    /// object and never reaches a URL path.
    fn object_url(&self, id: &str) -> Option<String> {
        let id = Uuid::parse_str(id).ok()?;
        Some(self.url(&format!("/v1/objects/{}/{}", self.class, id)))
    }

    async fn graphql(&self, query: String) -> Result<Value, StoreError> {
        let resp = self
            .client
            .post(self.url("/v1/graphql"))
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(transport_error)?;
        let body: GraphQlResponse = check_status(resp).await?.json().await.map_err(transport_error)?;
        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let msg: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(StoreError::permanent(format!("graphql: {}", msg.join("; "))));
        }
        body.data
            .ok_or_else(|| StoreError::permanent("graphql response without data"))
    }

    fn where_type(modality: Modality) -> String {
        format!(
            "where: {{path: [\"type\"], operator: Equal, valueText: \"{}\"}}",
            modality.as_type_tag()
        )
    }

    fn to_properties(record: &Record) -> Result<Properties, StoreError> {
        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|e| StoreError::permanent(format!("metadata encoding: {e}")))?;
        Ok(Properties {
            payload: record.payload.clone(),
            type_tag: record.modality.as_type_tag().to_string(),
            metadata: Some(metadata),
            created_at: Some(record.created_at.to_rfc3339()),
        })
    }

    fn to_record(id: String, properties: Properties, vector: Vec<f32>) -> Result<Record, StoreError> {
        let modality = properties
            .type_tag
            .parse::<Modality>()
            .map_err(|e| StoreError::permanent(format!("object {id}: {e}")))?;
        let metadata = match properties.metadata.as_deref() {
            Some(s) if !s.is_empty() => serde_json::from_str(s)
                .map_err(|e| StoreError::permanent(format!("object {id} metadata: {e}")))?,
            _ => Metadata::default(),
        };
        let created_at = properties
            .created_at
            .as_deref()
            .ok_or_else(|| StoreError::permanent(format!("object {id} has no createdAt")))
            .and_then(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map_err(|e| StoreError::permanent(format!("object {id} createdAt '{s}': {e}")))
            })?
            .with_timezone(&Utc);
        Ok(Record {
            id,
            modality,
            payload: properties.payload,
            vector: EmbeddingVector::from_stored(vector),
            metadata,
            created_at,
        })
    }
}

fn recorded_dimension(schema: &Value) -> Option<usize> {
    schema
        .get("description")?
        .as_str()?
        .strip_prefix(DIMENSION_MARKER)?
        .trim()
        .parse()
        .ok()
}

fn transport_error(e: reqwest::Error) -> StoreError {
    if e.is_builder() {
        StoreError::session(format!("request build: {e}"))
    } else if e.is_decode() {
        StoreError::permanent(format!("response decode: {e}"))
    } else {
        // connect, timeout, closed connection, body read
        StoreError::transient(format!("transport: {e}"))
    }
}

fn classify_status(status: StatusCode, body: &str) -> StoreError {
    let msg = format!("HTTP {status}: {body}");
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        StoreError::transient(msg)
    } else {
        StoreError::permanent(msg)
    }
}

async fn check_status(resp: Response) -> Result<Response, StoreError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(classify_status(status, &body))
}

#[async_trait::async_trait]
impl VectorStore for WeaviateStore {
    fn name(&self) -> &str {
        "weaviate"
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/schema/{}", self.class)))
            .send()
            .await
            .map_err(transport_error)?;
        if resp.status().is_success() {
            let schema: Value = resp.json().await.map_err(transport_error)?;
            let existing = match recorded_dimension(&schema) {
                Some(d) => Some(d),
                // class created elsewhere: go by a stored vector, if any
                None => self.fetch_all(1).await?.first().map(|r| r.vector.dimension()),
            };
            if let Some(existing) = existing.filter(|d| *d != dimension) {
                return Err(StoreError::permanent(format!(
                    "collection {} has dimension {existing}, requested {dimension}",
                    self.class
                )));
            }
            debug!(class = %self.class, "collection exists");
            return Ok(());
        }
        if resp.status() != StatusCode::NOT_FOUND {
            check_status(resp).await?;
            return Ok(());
        }

        let schema = json!({
            "class": self.class,
            "description": format!("{DIMENSION_MARKER}{dimension}"),
            "vectorizer": "none",
            "vectorIndexConfig": { "distance": "cosine" },
            "properties": [
                { "name": "payload", "dataType": ["text"] },
                { "name": "type", "dataType": ["text"] },
                { "name": "metadata", "dataType": ["text"] },
                { "name": "createdAt", "dataType": ["date"] }
            ]
        });
        let resp = self
            .client
            .post(self.url("/v1/schema"))
            .json(&schema)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await?;
        info!(class = %self.class, dimension, "created collection");
        Ok(())
    }

    async fn upsert(&self, records: &[Record]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let objects = records
            .iter()
            .map(|r| -> Result<BatchObject, StoreError> {
                Ok(BatchObject {
                    class: &self.class,
                    id: &r.id,
                    vector: r.vector.as_slice(),
                    properties: Self::to_properties(r)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let resp = self
            .client
            .post(self.url("/v1/batch/objects"))
            .json(&BatchRequest { objects })
            .send()
            .await
            .map_err(transport_error)?;
        let results: Vec<BatchResult> = check_status(resp).await?.json().await.map_err(transport_error)?;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|r| {
                let errors = r.result?.errors?.error;
                if errors.is_empty() {
                    return None;
                }
                let msgs: Vec<String> = errors.into_iter().map(|e| e.message).collect();
                Some(format!("{}: {}", r.id.unwrap_or_default(), msgs.join("; ")))
            })
            .collect();
        if !failures.is_empty() {
            return Err(StoreError::permanent(format!(
                "{} object(s) rejected: {}",
                failures.len(),
                failures.join(" | ")
            )));
        }
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let Some(url) = self.object_url(id) else {
            debug!(id, "not a uuid, no such object");
            return Ok(None);
        };
        let resp = self
            .client
            .get(format!("{url}?include=vector"))
            .send()
            .await
            .map_err(transport_error)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let obj: StoredObject = check_status(resp).await?.json().await.map_err(transport_error)?;
        Self::to_record(obj.id, obj.properties, obj.vector).map(Some)
    }

    async fn fetch_all(&self, limit: usize) -> Result<Vec<Record>, StoreError> {
        let resp = self
            .client
            .get(self.url(&format!(
                "/v1/objects?class={}&limit={limit}&include=vector",
                self.class
            )))
            .send()
            .await
            .map_err(transport_error)?;
        let list: ObjectList = check_status(resp).await?.json().await.map_err(transport_error)?;
        list.objects
            .into_iter()
            .map(|o| Self::to_record(o.id, o.properties, o.vector))
            .collect()
    }

    async fn near_vector(
        &self,
        modality: Modality,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let components: Vec<String> = vector.iter().map(|x| x.to_string()).collect();
        let query = format!(
            "{{ Get {{ {class}(nearVector: {{vector: [{vec}]}}, {filter}, limit: {limit}) \
             {{ payload type metadata createdAt _additional {{ id distance vector }} }} }} }}",
            class = self.class,
            vec = components.join(","),
            filter = Self::where_type(modality),
        );
        let data = self.graphql(query).await?;
        let hits = data
            .get("Get")
            .and_then(|g| g.get(&self.class))
            .cloned()
            .unwrap_or(Value::Array(vec![]));
        let hits: Vec<NearHit> = serde_json::from_value(hits)
            .map_err(|e| StoreError::permanent(format!("nearVector result: {e}")))?;

        hits.into_iter()
            .map(|h| {
                let score = 1.0 - h.additional.distance.unwrap_or(1.0);
                let record = Self::to_record(h.additional.id, h.properties, h.additional.vector)?;
                Ok(ScoredRecord { record, score })
            })
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Some(url) = self.object_url(id) else {
            debug!(id, "not a uuid, nothing to delete");
            return Ok(false);
        };
        let resp = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(transport_error)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(resp).await?;
        Ok(true)
    }

    async fn count(&self, modality: Option<Modality>) -> Result<usize, StoreError> {
        let filter = modality
            .map(|m| format!("({})", Self::where_type(m)))
            .unwrap_or_default();
        let query = format!(
            "{{ Aggregate {{ {class}{filter} {{ meta {{ count }} }} }} }}",
            class = self.class
        );
        let data = self.graphql(query).await?;
        data.get("Aggregate")
            .and_then(|a| a.get(&self.class))
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("meta"))
            .and_then(|m| m.get("count"))
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .ok_or_else(|| StoreError::permanent("aggregate result without count"))
    }
}
