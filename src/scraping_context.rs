use crate::config::{AppConfigStore, ScrapingConfig};
use crate::page_loader::HttpPageLoader;
use crate::usage_service::UsageService;

pub struct ScrapingContext {
    pub scraping_config: ScrapingConfig,
    pub service: UsageService<HttpPageLoader>,
}

impl ScrapingContext {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_config = ScrapingConfig::new()?;
        let page_loader = HttpPageLoader::new(
            scraping_config.base_url(),
            scraping_config.cookie().map(String::from),
        )?;
        let config_store = AppConfigStore::new()?;
        let service = UsageService::new(page_loader, config_store);
        Ok(ScrapingContext {
            scraping_config,
            service,
        })
    }
}
