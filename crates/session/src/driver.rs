//! Hooks into the application under test

use async_trait::async_trait;
use vizcheck_common::{Region, RectangleSize, Result};

/// A captured screenshot and the area of the viewport it covers
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Encoded image bytes (PNG)
    pub image: Vec<u8>,
    /// Bounds of the image in viewport coordinates
    pub bounds: Region,
}

/// Access to the application under test, supplied by the embedding SDK
#[async_trait]
pub trait AppDriver: Send + Sync {
    /// Capture the viewport, or only `region` of it when given
    async fn screenshot(&self, region: Option<Region>) -> Result<Screenshot>;

    async fn title(&self) -> Result<String>;

    async fn viewport_size(&self) -> Result<RectangleSize>;

    async fn set_viewport_size(&self, size: RectangleSize) -> Result<()>;

    /// Environment string guessed by the SDK, e.g. a browser user agent
    fn inferred_environment(&self) -> Option<String>;

    /// Identifier of the embedding SDK
    fn base_agent_id(&self) -> String;
}
