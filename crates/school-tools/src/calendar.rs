//! Calendar Tool
//!
//! Upcoming events from Google Calendar v3. Transport failures here are
//! genuine execution errors: the dispatcher converts them to a
//! `Tool error:` result string.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use agent_core::{
    AgentError, Result,
    tool::{Tool, ToolSchema},
};

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Calendar tool configuration
#[derive(Clone, Debug)]
pub struct CalendarConfig {
    /// Google API key; empty means unconfigured
    pub api_key: String,

    /// Calendar to read; empty means unconfigured
    pub calendar_id: String,

    /// How far ahead to look
    pub days_ahead: i64,

    /// Maximum events returned
    pub max_results: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            calendar_id: String::new(),
            days_ahead: 7,
            max_results: 10,
        }
    }
}

impl CalendarConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
            calendar_id: std::env::var("GOOGLE_CALENDAR_ID").unwrap_or_default(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Default, Deserialize)]
struct Event {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    start: EventStart,
}

#[derive(Debug, Default, Deserialize)]
struct EventStart {
    #[serde(rename = "dateTime", default)]
    date_time: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

/// Render a start value: timed events as `YYYY-MM-DD HH:MM`, all-day
/// events (and unparseable values) verbatim
fn format_start(start: &str) -> String {
    if start.contains('T') {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(start) {
            return parsed.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    start.to_string()
}

fn format_events(events: &[Event]) -> String {
    if events.is_empty() {
        return "No upcoming events found.".into();
    }

    let lines: Vec<String> = events
        .iter()
        .map(|ev| {
            let start = ev
                .start
                .date_time
                .as_deref()
                .or(ev.start.date.as_deref())
                .unwrap_or("");
            let start_fmt = format_start(start);
            let summary = ev.summary.as_deref().unwrap_or("(no title)");
            match ev.location.as_deref() {
                Some(location) => format!("- {start_fmt}: {summary} @ {location}"),
                None => format!("- {start_fmt}: {summary}"),
            }
        })
        .collect();

    format!("Upcoming events:\n{}", lines.join("\n"))
}

/// Tool for reading upcoming calendar events
pub struct CalendarTool {
    http: reqwest::Client,
    config: CalendarConfig,
}

impl CalendarTool {
    pub fn new(config: CalendarConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Tool for CalendarTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_upcoming_events".into(),
            description: "Read upcoming events from Google Calendar".into(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _arguments: &Map<String, Value>) -> Result<String> {
        if self.config.calendar_id.is_empty() {
            return Ok("Google Calendar ID is not configured.".into());
        }
        if self.config.api_key.is_empty() {
            return Ok("Google API key is not configured.".into());
        }

        let now = Utc::now();
        let time_min = now.to_rfc3339();
        let time_max = (now + Duration::days(self.config.days_ahead)).to_rfc3339();

        let url = format!("{API_BASE}/{}/events", self.config.calendar_id);
        let response: EventsResponse = self
            .http
            .get(&url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("timeMin", &time_min),
                ("timeMax", &time_max),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", &self.config.max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AgentError::ToolExecution(e.to_string()))?
            .error_for_status()
            .map_err(|e| AgentError::ToolExecution(e.to_string()))?
            .json()
            .await
            .map_err(|e| AgentError::ToolExecution(e.to_string()))?;

        Ok(format_events(&response.items))
    }
}
