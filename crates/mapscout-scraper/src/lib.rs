//! Browser-driven extraction of business listings from a map search page.
//!
//! [`SearchOrchestrator`] runs one `(query, location)` search against any
//! [`MapPage`]; [`ChromiumSession`] is the production page.

pub mod detector;
pub mod error;
pub mod extractor;
pub mod harvest;
pub mod navigator;
pub mod orchestrator;
pub mod pacing;
pub mod page;
pub mod parse;
pub mod selectors;
pub mod session;
pub mod user_agent;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{BrowserError, ScraperError};
pub use extractor::{Extraction, FieldExtractor};
pub use harvest::EmailHarvester;
pub use navigator::{ListNavigator, ListWindow, Restore};
pub use orchestrator::{search_url, SearchOrchestrator, SearchSettings};
pub use pacing::{HumanPacing, NoDelay, Pacing};
pub use page::MapPage;
pub use session::{ChromiumSession, SessionOptions};
