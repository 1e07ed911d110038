mod page_loader;
mod ratelimit;
mod requests;
mod scraping_context;

mod active_days_scraper;
mod config;
mod text_manipulators;
mod usage_scraper;
mod usage_service;

pub use active_days_scraper::{ActiveDayCell, ActiveDaysData, extract_active_cells_from_json, extract_active_days, to_date_key};
pub use config::{AppConfig, AppConfigStore, LoadFromEnv, ScrapingConfig};
pub use page_loader::{HttpPageLoader, PageSnapshot, PageSource};
pub use scraping_context::ScrapingContext;
pub use usage_scraper::{UsageData, UsageItem, UsageKind, extract_usage, extract_usage_from_json, parse_usage_from_text};
pub use usage_service::UsageService;
