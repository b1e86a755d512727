use chrono::{DateTime, Utc};

/// A composable predicate set applied to the normalized `LogEntry` stream.
/// Construct with the builder methods; `Filter::default()` matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub db_whitelist: Vec<String>,
    pub user_whitelist: Vec<String>,
    pub app_whitelist: Vec<String>,
    pub user_blacklist: Vec<String>,
    pub grep_all: Vec<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_window(mut self, begin: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.begin = begin;
        self.end = end;
        self
    }

    pub fn with_db_whitelist(mut self, dbs: impl IntoIterator<Item = String>) -> Self {
        self.db_whitelist = dbs.into_iter().collect();
        self
    }

    pub fn with_user_whitelist(mut self, users: impl IntoIterator<Item = String>) -> Self {
        self.user_whitelist = users.into_iter().collect();
        self
    }

    pub fn with_app_whitelist(mut self, apps: impl IntoIterator<Item = String>) -> Self {
        self.app_whitelist = apps.into_iter().collect();
        self
    }

    pub fn with_user_blacklist(mut self, users: impl IntoIterator<Item = String>) -> Self {
        self.user_blacklist = users.into_iter().collect();
        self
    }

    pub fn with_grep_all(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.grep_all = patterns.into_iter().collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.begin.is_none()
            && self.end.is_none()
            && self.db_whitelist.is_empty()
            && self.user_whitelist.is_empty()
            && self.app_whitelist.is_empty()
            && self.user_blacklist.is_empty()
            && self.grep_all.is_empty()
    }
}
