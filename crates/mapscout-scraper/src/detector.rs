//! Decides whether a click actually left the list for a business detail view.

use crate::page::{lookup, MapPage};
use crate::selectors;

/// Which check confirmed the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSignal {
    BackControl,
    NamedHeading,
    ActionControl,
}

/// Checks in priority order; the first hit wins.
const CHECKS: [DetailSignal; 3] = [
    DetailSignal::BackControl,
    DetailSignal::NamedHeading,
    DetailSignal::ActionControl,
];

/// Runs the detail-view checks against the current page. Read-only.
pub async fn detect<P: MapPage>(page: &P) -> Option<DetailSignal> {
    for signal in CHECKS {
        let hit = match signal {
            DetailSignal::BackControl => any_exists(page, &selectors::BACK_CONTROLS).await,
            DetailSignal::NamedHeading => lookup::texts(page, selectors::HEADING)
                .await
                .iter()
                .any(|text| !selectors::is_placeholder_heading(text)),
            DetailSignal::ActionControl => any_exists(page, &selectors::DETAIL_ACTIONS).await,
        };
        if hit {
            tracing::debug!(?signal, "detail view confirmed");
            return Some(signal);
        }
    }
    None
}

pub async fn is_detail_open<P: MapPage>(page: &P) -> bool {
    detect(page).await.is_some()
}

async fn any_exists<P: MapPage>(page: &P, candidates: &[&str]) -> bool {
    for selector in candidates {
        if lookup::exists(page, selector).await {
            return true;
        }
    }
    false
}
