//! # school-tools
//!
//! The assistant's tool catalog: three thin I/O wrappers exposed through the
//! agent-core `Tool` trait.
//!
//! - `get_weather` — current weather via OpenWeatherMap
//! - `get_upcoming_events` — Google Calendar events for the next week
//! - `get_homework_for_today` — today's rows from a Google Sheet
//!
//! Missing configuration (API key, calendar/sheet id) is reported as the
//! tool's output text, not an error; only transport problems against the
//! Google APIs surface as execution errors.

pub mod calendar;
pub mod sheets;
pub mod weather;

pub use calendar::{CalendarConfig, CalendarTool};
pub use sheets::{HomeworkTool, SheetsConfig};
pub use weather::{WeatherConfig, WeatherTool};
