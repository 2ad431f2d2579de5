use crate::achievements::AchievementStatus;
use crate::config::InsightConfig;
use crate::gate::GateOutcome;
use crate::model::{ContentItem, Entry, Language};
use crate::stats::{DashboardStats, DeepInsights, MonthStats};

pub mod achievements;
pub mod backup;
pub mod config;
pub mod create;
pub mod delete;
pub mod gate;
pub mod helpers;
pub mod language;
pub mod library;
pub mod list;
pub mod stats;
pub mod tags;
pub mod update;
pub mod wipe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_entries: Vec<Entry>,
    pub listed_entries: Vec<Entry>,
    pub tags: Vec<String>,
    pub library_items: Vec<ContentItem>,
    pub dashboard: Option<DashboardStats>,
    pub month: Option<MonthStats>,
    pub insights: Option<DeepInsights>,
    pub achievements: Vec<AchievementStatus>,
    /// Ids of achievements unlocked by this command.
    pub unlocked: Vec<&'static str>,
    pub backup: Option<String>,
    pub gate: Option<GateOutcome>,
    pub language: Option<Language>,
    pub config: Option<InsightConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| matches!(m.level, MessageLevel::Warning | MessageLevel::Error))
    }

    pub fn with_affected_entries(mut self, entries: Vec<Entry>) -> Self {
        self.affected_entries = entries;
        self
    }

    pub fn with_listed_entries(mut self, entries: Vec<Entry>) -> Self {
        self.listed_entries = entries;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_library_items(mut self, items: Vec<ContentItem>) -> Self {
        self.library_items = items;
        self
    }

    pub fn with_dashboard(mut self, dashboard: DashboardStats) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    pub fn with_month(mut self, month: MonthStats) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_insights(mut self, insights: DeepInsights) -> Self {
        self.insights = Some(insights);
        self
    }

    pub fn with_achievements(mut self, achievements: Vec<AchievementStatus>) -> Self {
        self.achievements = achievements;
        self
    }

    pub fn with_backup(mut self, json: String) -> Self {
        self.backup = Some(json);
        self
    }

    pub fn with_gate(mut self, outcome: GateOutcome) -> Self {
        self.gate = Some(outcome);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_config(mut self, config: InsightConfig) -> Self {
        self.config = Some(config);
        self
    }
}
