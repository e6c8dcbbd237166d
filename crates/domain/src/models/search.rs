//! Search index rebuild progress.

use serde::{Deserialize, Serialize};

/// Counters reported while pages are added to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProgress {
    pub total: u64,
    pub current: u64,
    pub skip: u64,
}

/// Event pushed to connected admin clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEvent {
    AddPageProgress(SearchProgress),
    FinishAddPage(SearchProgress),
}

impl SearchEvent {
    /// Event name on the admin push channel.
    pub fn event_name(&self) -> &'static str {
        match self {
            SearchEvent::AddPageProgress(_) => "admin:addPageProgress",
            SearchEvent::FinishAddPage(_) => "admin:finishAddPage",
        }
    }

    pub fn progress(&self) -> SearchProgress {
        match self {
            SearchEvent::AddPageProgress(p) | SearchEvent::FinishAddPage(p) => *p,
        }
    }
}
