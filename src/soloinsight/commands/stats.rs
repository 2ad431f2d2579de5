use crate::commands::CmdResult;
use crate::error::Result;
use crate::stats;
use crate::store::DataStore;
use crate::workspace::Workspace;
use chrono::{DateTime, TimeZone};

pub fn dashboard<S: DataStore, Tz: TimeZone>(ws: &Workspace<S>, now: &DateTime<Tz>) -> Result<CmdResult> {
    Ok(CmdResult::default().with_dashboard(stats::dashboard(ws.entries(), now)))
}

/// Aggregates for the calendar month containing `reference`.
pub fn month<S: DataStore, Tz: TimeZone>(ws: &Workspace<S>, reference: &DateTime<Tz>) -> Result<CmdResult> {
    Ok(CmdResult::default().with_month(stats::month_stats(ws.entries(), reference)))
}

pub fn insights<S: DataStore, Tz: TimeZone>(ws: &Workspace<S>, tz: &Tz) -> Result<CmdResult> {
    Ok(CmdResult::default().with_insights(stats::deep_insights(ws.entries(), tz)))
}
