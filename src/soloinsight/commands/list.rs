use crate::commands::CmdResult;
use crate::error::Result;
use crate::model::{Entry, Outcome};
use crate::store::DataStore;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub tag: Option<String>,
    pub outcome: Option<Outcome>,
    /// Keep only the most recent `n` matches.
    pub limit: Option<usize>,
}

impl ListFilter {
    fn matches(&self, entry: &Entry) -> bool {
        let tag_ok = self
            .tag
            .as_deref()
            .map_or(true, |tag| entry.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)));
        let outcome_ok = self.outcome.map_or(true, |o| entry.outcome == o);
        tag_ok && outcome_ok
    }
}

/// Entries in insertion order, optionally filtered.
pub fn run<S: DataStore>(ws: &Workspace<S>, filter: &ListFilter) -> Result<CmdResult> {
    let mut entries: Vec<Entry> = ws
        .entries()
        .iter()
        .filter(|e| filter.matches(e))
        .cloned()
        .collect();
    if let Some(limit) = filter.limit {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }
    Ok(CmdResult::default().with_listed_entries(entries))
}
