use crate::models::{Experience, InvolvementStyle, Lead, Mode};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with Airtable
#[derive(Debug, Error)]
pub enum AirtableError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Airtable returned {status}: {detail}")]
    ApiError { status: u16, detail: String },

    #[error("Unauthorized: invalid Airtable token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Airtable is not configured: missing {0}")]
    NotConfigured(&'static str),
}

/// Table names in the Airtable base
#[derive(Debug, Clone)]
pub struct AirtableTables {
    pub experiences: String,
    pub experiences_view: Option<String>,
    pub leads: String,
}

/// A raw Airtable record
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ListRecordsResponse {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    offset: Option<String>,
}

/// Airtable API client
///
/// Handles all communication with the catalog base:
/// - Listing and normalizing experiences
/// - Looking up experiences by record id
/// - Storing leads
pub struct AirtableClient {
    base_url: String,
    token: String,
    base_id: String,
    tables: AirtableTables,
    page_size: u32,
    client: Client,
}

impl AirtableClient {
    /// Create a new Airtable client
    pub fn new(
        base_url: String,
        token: String,
        base_id: String,
        tables: AirtableTables,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self, AirtableError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            token,
            base_id,
            tables,
            page_size: page_size.clamp(1, 100),
            client,
        })
    }

    pub fn has_url(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    pub fn has_base(&self) -> bool {
        !self.base_id.trim().is_empty()
    }

    pub fn token_len(&self) -> usize {
        self.token.len()
    }

    fn ensure_configured(&self) -> Result<(), AirtableError> {
        if !self.has_url() {
            return Err(AirtableError::NotConfigured("api_url"));
        }
        if !self.has_base() {
            return Err(AirtableError::NotConfigured("base_id"));
        }
        if self.token.is_empty() {
            return Err(AirtableError::NotConfigured("token"));
        }
        Ok(())
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.base_id,
            urlencoding::encode(table)
        )
    }

    fn experiences_url(&self, page_size: u32) -> String {
        let mut url = format!(
            "{}?pageSize={}",
            self.table_url(&self.tables.experiences),
            page_size
        );
        if let Some(view) = &self.tables.experiences_view {
            url.push_str(&format!("&view={}", urlencoding::encode(view)));
        }
        url
    }

    async fn list_page(&self, url: &str) -> Result<ListRecordsResponse, AirtableError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = check_status(response).await?;

        response
            .json::<ListRecordsResponse>()
            .await
            .map_err(|e| AirtableError::InvalidResponse(format!("Failed to parse records: {}", e)))
    }

    /// Collect the records of every page starting at `first_url`
    async fn list_all(&self, first_url: &str) -> Result<Vec<AirtableRecord>, AirtableError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let url = match &offset {
                Some(token) => format!("{}&offset={}", first_url, urlencoding::encode(token)),
                None => first_url.to_string(),
            };

            tracing::debug!("Fetching records page from: {}", url);

            let page = self.list_page(&url).await?;
            records.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    /// Fetch every experience in the catalog table, following pagination
    pub async fn fetch_experiences(&self) -> Result<Vec<Experience>, AirtableError> {
        self.ensure_configured()?;

        let records = self.list_all(&self.experiences_url(self.page_size)).await?;

        let experiences = normalize_records(&records);
        tracing::debug!(
            "Fetched {} records, {} normalized experiences",
            records.len(),
            experiences.len()
        );

        Ok(experiences)
    }

    /// Fetch the experiences with the given record ids
    pub async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<Experience>, AirtableError> {
        self.ensure_configured()?;

        // Record ids are alphanumeric; anything else could escape the formula
        let ids: Vec<&str> = ids
            .iter()
            .map(|id| id.as_str())
            .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()))
            .collect();

        if ids.is_empty() {
            return Ok(vec![]);
        }

        let formula = format!(
            "OR({})",
            ids.iter()
                .map(|id| format!("RECORD_ID()='{}'", id))
                .collect::<Vec<_>>()
                .join(",")
        );
        let url = format!(
            "{}&filterByFormula={}",
            self.experiences_url((ids.len() as u32).clamp(10, 100)),
            urlencoding::encode(&formula)
        );

        let records = self.list_all(&url).await?;
        Ok(normalize_records(&records))
    }

    /// Store a lead, returning the created record id
    pub async fn create_lead(&self, lead: &Lead) -> Result<String, AirtableError> {
        self.ensure_configured()?;

        let fields = json!({
            "Name": lead.name,
            "QuizJSON": lead.quiz.to_string(),
            "SelectedExperienceIds": lead.selected_ids.join(","),
            "BudgetPP": lead.budget_pp,
            "Group": lead.group,
            "CreatedAt": lead.created_at.to_rfc3339(),
        });
        let payload = json!({ "records": [{ "fields": fields }] });

        let response = self
            .client
            .post(self.table_url(&self.tables.leads))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let response = check_status(response).await?;
        let json: Value = response.json().await?;

        let record_id = json
            .get("records")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first())
            .and_then(|r| r.get("id"))
            .and_then(|id| id.as_str())
            .ok_or_else(|| AirtableError::InvalidResponse("Missing created record id".into()))?;

        tracing::debug!("Stored lead {} with {} selections", record_id, lead.selected_ids.len());

        Ok(record_id.to_string())
    }

    /// Fetch a single record and report the raw upstream status and body
    pub async fn probe(&self) -> Result<(u16, String), AirtableError> {
        self.ensure_configured()?;

        let response = self
            .client
            .get(self.experiences_url(1))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AirtableError::InvalidResponse(format!("Failed to read probe body: {}", e)))?;
        Ok((status, body))
    }
}

async fn check_status(response: Response) -> Result<Response, AirtableError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AirtableError::Unauthorized);
    }

    let detail = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read body".to_string());
    tracing::error!("Airtable request failed: {} - {}", status, detail);

    Err(AirtableError::ApiError {
        status: status.as_u16(),
        detail,
    })
}

// Provider field names, first match wins
const TITLE: &[&str] = &["Title", "Name"];
const DESCRIPTION: &[&str] = &["Description"];
const FORMAT: &[&str] = &["Format", "Formats"];
const CUISINE: &[&str] = &["Cuisine_Focus", "Cuisine"];
const MODE: &[&str] = &["Mode"];
const MIN_PARTY: &[&str] = &["Min party", "Min Party"];
const MAX_PARTY: &[&str] = &["Max party", "Max Party"];
const MIN_PRICE: &[&str] = &["Min budget pp", "Price Per Person (Min)"];
const MAX_PRICE: &[&str] = &["Max budget pp", "Price Per Person (Max)"];
const GROUPS: &[&str] = &["Group suitability", "Group Suitability", "Groups"];
const VIBES: &[&str] = &["Vibe tags", "Vibe Tags"];
const TONES: &[&str] = &["Tone tags", "Tone Tags", "Experience tags"];
const FLAVOURS: &[&str] = &["Flavour tags", "Flavour Tags"];
const MIN_ADVENTURE: &[&str] = &["Min adventure", "Min Adventure"];
const MAX_ADVENTURE: &[&str] = &["Max adventure", "Max Adventure"];
const INVOLVEMENT: &[&str] = &["Involvement", "Involvement style"];
const HARD_NOS: &[&str] = &["Hard nos", "Hard Nos", "Hard exclusions"];

fn field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| !v.is_null())
}

fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match field(fields, keys)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(|v| v.as_str()).map(|s| s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    let value = field(fields, keys)?;
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_start_matches('$').parse::<f64>().ok()?,
        _ => return None,
    };
    if number.is_finite() && number >= 0.0 {
        Some(number.round().min(u32::MAX as f64) as u32)
    } else {
        None
    }
}

fn tag_field(fields: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let raw: Vec<String> = match field(fields, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => vec![],
    };

    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Map a raw Airtable record into the canonical experience schema
///
/// Missing numeric bounds are left open, missing tags become empty sets,
/// a missing or unknown mode defaults to `Out`, an unknown involvement
/// style to `Anything`.
pub fn normalize_record(record: &AirtableRecord) -> Result<Experience, String> {
    let fields = &record.fields;

    let mode = text_field(fields, MODE)
        .and_then(|m| Mode::from_label(&m))
        .unwrap_or(Mode::Out);
    let involvement_style = text_field(fields, INVOLVEMENT)
        .and_then(|i| InvolvementStyle::from_label(&i))
        .unwrap_or_default();

    let experience = Experience {
        id: record.id.clone(),
        title: text_field(fields, TITLE).unwrap_or_default(),
        description: text_field(fields, DESCRIPTION).unwrap_or_default(),
        mode,
        formats: tag_field(fields, FORMAT),
        cuisine: text_field(fields, CUISINE).unwrap_or_default(),
        min_party: number_field(fields, MIN_PARTY).unwrap_or(0),
        max_party: number_field(fields, MAX_PARTY),
        min_price_pp: number_field(fields, MIN_PRICE).unwrap_or(0),
        max_price_pp: number_field(fields, MAX_PRICE),
        group_suitability: tag_field(fields, GROUPS),
        vibe_tags: tag_field(fields, VIBES),
        tone_tags: tag_field(fields, TONES),
        flavour_tags: tag_field(fields, FLAVOURS),
        min_adventure: number_field(fields, MIN_ADVENTURE)
            .map(|v| v.min(u8::MAX as u32) as u8)
            .unwrap_or(0),
        max_adventure: number_field(fields, MAX_ADVENTURE).map(|v| v.min(u8::MAX as u32) as u8),
        involvement_style,
        hard_exclusions: tag_field(fields, HARD_NOS),
    };

    if record.id.trim().is_empty() {
        return Err("record has no id".to_string());
    }
    if !experience.party_range().is_well_formed() {
        return Err("min party exceeds max party".to_string());
    }
    if !experience.price_range().is_well_formed() {
        return Err("min price exceeds max price".to_string());
    }
    if !experience.adventure_range().is_well_formed() {
        return Err("min adventure exceeds max adventure".to_string());
    }

    Ok(experience)
}

/// Normalize a batch of records, skipping the ones that cannot be represented
pub fn normalize_records(records: &[AirtableRecord]) -> Vec<Experience> {
    records
        .iter()
        .filter_map(|record| match normalize_record(record) {
            Ok(exp) => Some(exp),
            Err(reason) => {
                tracing::warn!("Skipping catalog record {}: {}", record.id, reason);
                None
            }
        })
        .collect()
}
