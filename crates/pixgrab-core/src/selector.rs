//! Response body selectors for the site's JSON endpoints.

use crate::error::FetchError;
use crate::model::Identifier;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// `{"error": bool, "message": str, "body": ..}` wrapper around every ajax response.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    message: String,
    body: Option<serde_json::Value>,
}

impl Envelope {
    fn into_body<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        if self.error {
            return Err(FetchError::Parse(format!("site error: {}", self.message)));
        }
        let body = self
            .body
            .ok_or_else(|| FetchError::Parse("missing body".to_string()))?;
        Ok(serde_json::from_value(body)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody {
    illust_manga: SearchSection,
}

#[derive(Debug, Deserialize)]
struct SearchSection {
    #[serde(default)]
    data: Vec<SearchEntry>,
}

/// Ad containers come without an id.
#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: Option<IdValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(u64),
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    urls: PageUrls,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    original: Option<String>,
}

/// Identifiers listed on one search result page (`/ajax/search/artworks/..`).
pub fn select_keyword(body: &[u8]) -> Result<Vec<Identifier>, FetchError> {
    let env: Envelope = serde_json::from_slice(body)?;
    let ids = env
        .into_body::<SearchBody>()?
        .illust_manga
        .data
        .into_iter()
        .filter_map(|entry| match entry.id? {
            IdValue::Text(s) if !s.is_empty() => Some(Identifier::new(s)),
            IdValue::Text(_) => None,
            IdValue::Number(n) => Some(Identifier::new(n.to_string())),
        })
        .collect();
    Ok(ids)
}

/// Original-size file URLs of one artwork (`/ajax/illust/{id}/pages`).
pub fn select_pages(body: &[u8]) -> Result<Vec<String>, FetchError> {
    let env: Envelope = serde_json::from_slice(body)?;
    Ok(env
        .into_body::<Vec<PageEntry>>()?
        .into_iter()
        .filter_map(|p| p.urls.original)
        .collect())
}
