//! Homework Tool
//!
//! Today's homework from a Google Sheet. Convention: first sheet, columns
//! Date | Subject | Task, dates in ISO format, first row is a header.

use async_trait::async_trait;
use chrono::Local;
use serde::Deserialize;
use serde_json::{Map, Value};

use agent_core::{
    AgentError, Result,
    tool::{Tool, ToolSchema},
};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const RANGE: &str = "Sheet1!A:C";

/// Homework tool configuration
#[derive(Clone, Debug, Default)]
pub struct SheetsConfig {
    /// Google API key; empty means unconfigured
    pub api_key: String,

    /// Spreadsheet to read; empty means unconfigured
    pub spreadsheet_id: String,
}

impl SheetsConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
            spreadsheet_id: std::env::var("GOOGLE_SHEETS_ID").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Filter rows to today's date and render the homework list
fn homework_for(today: &str, values: &[Vec<String>]) -> String {
    if values.is_empty() {
        return "No homework data found.".into();
    }

    let rows: Vec<String> = values
        .iter()
        .skip(1) // header row
        .filter(|row| row.first().is_some_and(|date| date == today))
        .map(|row| {
            let subject = row.get(1).map(String::as_str).unwrap_or("");
            let task = row.get(2).map(String::as_str).unwrap_or("");
            format!("- {subject}: {task}")
        })
        .collect();

    if rows.is_empty() {
        return "No homework for today.".into();
    }
    format!("Homework for today:\n{}", rows.join("\n"))
}

/// Tool for reading today's homework
pub struct HomeworkTool {
    http: reqwest::Client,
    config: SheetsConfig,
}

impl HomeworkTool {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Tool for HomeworkTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_homework_for_today".into(),
            description: "Read today's homework from Google Sheets".into(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _arguments: &Map<String, Value>) -> Result<String> {
        if self.config.spreadsheet_id.is_empty() {
            return Ok("Google Sheets ID is not configured.".into());
        }
        if self.config.api_key.is_empty() {
            return Ok("Google API key is not configured.".into());
        }

        let url = format!("{API_BASE}/{}/values/{RANGE}", self.config.spreadsheet_id);
        let response: ValuesResponse = self
            .http
            .get(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AgentError::ToolExecution(e.to_string()))?
            .error_for_status()
            .map_err(|e| AgentError::ToolExecution(e.to_string()))?
            .json()
            .await
            .map_err(|e| AgentError::ToolExecution(e.to_string()))?;

        let today = Local::now().date_naive().to_string();
        Ok(homework_for(&today, &response.values))
    }
}
