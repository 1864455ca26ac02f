use anyhow::{Context, Result};
use reqwest::blocking::RequestBuilder;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::config::SyncConfig;
use crate::field_map::SchemaField;
use crate::http_client::{http_client, send_text};

const PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreItem {
    pub id: String,
    pub name: String,
}

/// The remote collection the standings are written into.
pub trait CollectionStore {
    fn schema_fields(&self) -> Result<Vec<SchemaField>>;
    fn list_items(&self) -> Result<Vec<StoreItem>>;
    fn update_item(&self, id: &str, field_data: Map<String, Value>) -> Result<()>;
    /// Returns the id of the new item.
    fn create_item(&self, field_data: Map<String, Value>) -> Result<String>;
    fn publish_items(&self, ids: &[String]) -> Result<()>;
}

/// REST client for a CMS collection (bearer auth, JSON bodies).
#[derive(Debug, Clone)]
pub struct CmsClient {
    api_base: String,
    token: String,
    collection_id: String,
}

impl CmsClient {
    pub fn new(cfg: &SyncConfig) -> Self {
        Self {
            api_base: cfg.api_base.clone(),
            token: cfg.api_token.clone(),
            collection_id: cfg.collection_id.clone(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.api_base, self.collection_id)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/json")
    }
}

impl CollectionStore for CmsClient {
    fn schema_fields(&self) -> Result<Vec<SchemaField>> {
        let client = http_client()?;
        let body = send_text(self.authed(client.get(self.collection_url())))
            .context("collection schema request failed")?;
        parse_schema_json(&body)
    }

    fn list_items(&self) -> Result<Vec<StoreItem>> {
        let client = http_client()?;
        collect_items(|offset| {
            let url = format!(
                "{}/items?offset={offset}&limit={PAGE_LIMIT}",
                self.collection_url()
            );
            let body =
                send_text(self.authed(client.get(&url))).context("item listing request failed")?;
            parse_items_page_json(&body)
        })
    }

    fn update_item(&self, id: &str, field_data: Map<String, Value>) -> Result<()> {
        let client = http_client()?;
        let url = format!("{}/items/{id}", self.collection_url());
        let req = client
            .patch(&url)
            .json(&json!({ "fieldData": field_data }));
        send_text(self.authed(req)).with_context(|| format!("update of item {id} failed"))?;
        Ok(())
    }

    fn create_item(&self, field_data: Map<String, Value>) -> Result<String> {
        let client = http_client()?;
        let url = format!("{}/items", self.collection_url());
        let req = client.post(&url).json(&json!({ "fieldData": field_data }));
        let body = send_text(self.authed(req)).context("item create failed")?;
        let created: CreatedItem = serde_json::from_str(&body).context("invalid create json")?;
        Ok(created.id)
    }

    fn publish_items(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let client = http_client()?;
        let url = format!("{}/items/publish", self.collection_url());
        let req = client.post(&url).json(&json!({ "itemIds": ids }));
        send_text(self.authed(req)).context("publish request failed")?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    fields: Vec<SchemaField>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<RawItem>,
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    #[serde(rename = "fieldData", default)]
    field_data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CreatedItem {
    id: String,
}

#[derive(Debug)]
pub struct ItemsPage {
    pub items: Vec<StoreItem>,
    pub total: Option<usize>,
}

/// Pages through a listing starting at offset 0.
///
/// Stops once `total` items have arrived, on an empty page, or, when the response
/// carries no total, on the first page shorter than `PAGE_LIMIT`.
pub fn collect_items<F>(mut fetch_page: F) -> Result<Vec<StoreItem>>
where
    F: FnMut(usize) -> Result<ItemsPage>,
{
    let mut out = Vec::new();
    let mut offset = 0usize;
    loop {
        let page = fetch_page(offset)?;
        let count = page.items.len();
        out.extend(page.items);
        offset += count;
        let done = match page.total {
            Some(total) => offset >= total,
            None => count < PAGE_LIMIT,
        };
        if count == 0 || done {
            break;
        }
    }
    Ok(out)
}

pub fn parse_schema_json(raw: &str) -> Result<Vec<SchemaField>> {
    let resp: CollectionResponse = serde_json::from_str(raw).context("invalid collection json")?;
    Ok(resp.fields)
}

/// Items without a text `name` are kept with an empty name so they still count
/// toward pagination but never match a team.
pub fn parse_items_page_json(raw: &str) -> Result<ItemsPage> {
    let resp: ItemsResponse = serde_json::from_str(raw).context("invalid items json")?;
    let items = resp
        .items
        .into_iter()
        .map(|item| StoreItem {
            name: item
                .field_data
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            id: item.id,
        })
        .collect();
    Ok(ItemsPage {
        items,
        total: resp.pagination.and_then(|p| p.total),
    })
}
