use crate::records::RawScanResult;
use async_trait::async_trait;
use std::borrow::Cow;

/// Radio scanning capability. Implementations own the hardware (or the
/// host tool talking to it); the engine only sees raw results.
#[async_trait]
pub trait RadioScanner: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Performs one full scan and returns every access point heard.
    async fn scan(&self) -> crate::Result<Vec<RawScanResult>>;
}

/// 前端资源提供者接口。
#[async_trait]
pub trait UiAssetProvider: Send + Sync {
    /// Retrieves a single UI asset.
    ///
    /// # Arguments
    /// * `path` - The path to the asset (e.g., "index.html", "style.css").
    ///
    /// # Returns
    /// A `Result` containing a tuple of (`Cow<'static, [u8]>`, `String`)
    /// representing the asset's content and its MIME type, or an `Error` if not found.
    async fn get_asset(&self, path: &str) -> crate::Result<(Cow<'static, [u8]>, String)>;
}
