//! Process Configuration
//!
//! One explicit `Settings` value constructed at startup and passed into
//! every component constructor; no global lookup anywhere else.

use agent_runtime::OllamaConfig;
use school_tools::{CalendarConfig, SheetsConfig, WeatherConfig};

/// All process settings, read from the environment once
#[derive(Clone, Debug)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: String,

    /// Path of the JSON memory store file
    pub memory_path: String,

    /// Path of the KB index file
    pub kb_index_path: String,

    pub ollama: OllamaConfig,
    pub weather: WeatherConfig,
    pub calendar: CalendarConfig,
    pub sheets: SheetsConfig,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            memory_path: std::env::var("MEMORY_PATH")
                .unwrap_or_else(|_| "./data/memory.json".into()),
            kb_index_path: std::env::var("KB_INDEX_PATH")
                .unwrap_or_else(|_| "./data/kb/index.json".into()),
            ollama: OllamaConfig::from_env(),
            weather: WeatherConfig::from_env(),
            calendar: CalendarConfig::from_env(),
            sheets: SheetsConfig::from_env(),
        }
    }
}
