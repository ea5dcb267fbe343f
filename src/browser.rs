//! Browser launcher
//!
//! Hands an offer URL to the desktop's default handler through the `open`
//! crate. The launch is detached, so nothing is left to reap.

use thiserror::Error;

/// Errors from opening a URL
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Refusing to open non-http URL: {0}")]
    UnsupportedUrl(String),
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(#[from] std::io::Error),
}

/// Open `url` in the default browser
pub fn open_url(url: &str) -> Result<(), BrowserError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(BrowserError::UnsupportedUrl(url.to_string()));
    }

    tracing::debug!(url, "opening in browser");
    open::that_detached(url)?;
    Ok(())
}
