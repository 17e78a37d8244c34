//! Cache-backed view of a driver session's expensive properties.

use serde_json::{Map, Value};

use crate::cache::{self, MetadataCache};
use crate::driver::WebDriver;
use crate::Result;

pub struct DriverMetadata<'a> {
    driver: &'a dyn WebDriver,
    cache: &'a MetadataCache,
}

impl<'a> DriverMetadata<'a> {
    pub fn new(driver: &'a dyn WebDriver, cache: &'a MetadataCache) -> Self {
        Self { driver, cache }
    }

    pub fn session_id(&self) -> String {
        self.driver.session_id()
    }

    pub async fn command_executor_url(&self) -> Result<String> {
        let session_id = self.session_id();
        if let Some(url) = self
            .cache
            .get(&session_id, cache::COMMAND_EXECUTOR_URL)
            .and_then(|value| value.as_str().map(str::to_owned))
        {
            return Ok(url);
        }

        let url = self.driver.command_executor_url().await?;
        self.cache.set(
            &session_id,
            cache::COMMAND_EXECUTOR_URL,
            Value::String(url.clone()),
        );
        Ok(url)
    }

    pub async fn capabilities(&self) -> Result<Map<String, Value>> {
        let session_id = self.session_id();
        if let Some(caps) = self.cached_map(&session_id, cache::CAPABILITIES) {
            return Ok(caps);
        }

        let caps = self.driver.capabilities().await?;
        self.cache
            .set(&session_id, cache::CAPABILITIES, Value::Object(caps.clone()));
        Ok(caps)
    }

    pub async fn session_capabilities(&self) -> Result<Map<String, Value>> {
        let session_id = self.session_id();
        if let Some(caps) = self.cached_map(&session_id, cache::SESSION_CAPABILITIES) {
            return Ok(caps);
        }

        let caps = self.driver.session_capabilities().await?;
        self.cache.set(
            &session_id,
            cache::SESSION_CAPABILITIES,
            Value::Object(caps.clone()),
        );
        Ok(caps)
    }

    fn cached_map(&self, session_id: &str, property: &str) -> Option<Map<String, Value>> {
        match self.cache.get(session_id, property)? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}
