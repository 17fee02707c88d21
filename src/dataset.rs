use anyhow::{Context, Result};
use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use crate::model::QaRecord;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

fn parse_records(content: &str) -> Result<Vec<QaRecord>> {
    serde_json::from_str(content).context("Dataset is not a JSON array of {question, answer, location}")
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<QaRecord>> {
    let path = path.as_ref();
    let content =
        read_to_string(path).with_context(|| format!("Failed to read dataset {:?}", path))?;
    parse_records(&content)
}

pub async fn fetch(url: &str) -> Result<Vec<QaRecord>> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch dataset from {}", url))?
        .error_for_status()?;
    let content = response.text().await?;
    parse_records(&content)
}

/// URL first, then the local file, then an empty corpus. Never fails: the
/// service must come up even without data.
pub async fn load(url: Option<&str>, path: &str) -> Vec<QaRecord> {
    if let Some(url) = url {
        match fetch(url).await {
            Ok(records) => {
                log::info!("Loaded {} QA records from {}", records.len(), url);
                return records;
            }
            Err(e) => log::warn!("{:#}; trying local file '{}'", e, path),
        }
    }

    match load_from_file(path) {
        Ok(records) => {
            log::info!("Loaded {} QA records from '{}'", records.len(), path);
            records
        }
        Err(e) => {
            log::warn!("{:#}; starting with an empty corpus", e);
            Vec::new()
        }
    }
}
