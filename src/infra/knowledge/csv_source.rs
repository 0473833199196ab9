// CSV feed for the knowledge base, fetched over HTTP.
//
// Expected header: topic,content,category,keywords
// Keywords are a comma-separated list inside one quoted cell.

use crate::core::knowledge::{KnowledgeError, KnowledgeSource, NewKnowledgeEntry};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    keywords: String,
}

impl CsvRow {
    /// Rows without a topic or content are skipped.
    fn into_entry(self) -> Option<NewKnowledgeEntry> {
        let topic = self.topic.trim();
        let content = self.content.trim();
        if topic.is_empty() || content.is_empty() {
            return None;
        }

        Some(NewKnowledgeEntry::from_fields(
            topic,
            content,
            &self.category,
            &self.keywords,
        ))
    }
}

/// Parse a CSV body into entries.
pub fn parse_csv(body: &str) -> Result<Vec<NewKnowledgeEntry>, KnowledgeError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut entries = Vec::new();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        match row {
            Ok(row) => entries.extend(row.into_entry()),
            Err(e) => tracing::warn!(line = line + 2, "skipping malformed CSV row: {}", e),
        }
    }
    Ok(entries)
}

pub struct HttpCsvSource {
    client: Client,
    url: String,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>) -> Result<Self, KnowledgeError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent("EvaNamibiaBot/0.2")
            .build()
            .map_err(|e| KnowledgeError::SourceError(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl KnowledgeSource for HttpCsvSource {
    async fn fetch(&self) -> Result<Vec<NewKnowledgeEntry>, KnowledgeError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| KnowledgeError::SourceError(e.to_string()))?
            .text()
            .await
            .map_err(|e| KnowledgeError::SourceError(e.to_string()))?;

        parse_csv(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
