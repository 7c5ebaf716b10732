use thiserror::Error;

/// Failures reported by the page-automation layer.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser session is closed")]
    SessionClosed,

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{action} failed: {reason}")]
    Interaction { action: &'static str, reason: String },

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("element is no longer attached to the page")]
    StaleElement,
}

impl BrowserError {
    /// Fatal errors mean the session itself is gone; nothing further can be
    /// done with it.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Launch(_) | Self::SessionClosed)
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no result list found at {url} (tried {selectors})")]
    ListNotFound { url: String, selectors: String },
}

impl ScraperError {
    /// `true` when the run cannot continue with the current session.
    ///
    /// Everything else is a location-level failure: the caller logs it and
    /// moves on to the next location.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Browser(err) => err.is_fatal(),
            Self::Http(_) | Self::ListNotFound { .. } => false,
        }
    }
}
