//! Small fixed dictionaries used as a tie-breaker by the classifier when
//! positional/statistical evidence alone doesn't settle a token's class.
//! Exposed as a small in-process registry with sensible built-in
//! defaults, extensible via a builder for callers whose fleet uses
//! applications, users, or databases this crate doesn't ship a default
//! for.

const KNOWN_APPLICATIONS: &[&str] = &[
    "psql",
    "pgbench",
    "pgadmin",
    "pg_dump",
    "pg_restore",
    "pg_basebackup",
    "pg_rewind",
    "pg_upgrade",
    "psycopg2",
    "jdbc",
    "odbc",
    "rails",
    "django",
    "spring",
    "node",
    "nodejs",
    "python",
    "java",
    "php",
    "pgadmin4",
    "pgbouncer",
    "pgpool",
    "DataGrip",
    "dbeaver",
    "navicat",
    "replication",
    "walreceiver",
    "client",
];

/// The known-value dictionaries consulted by the prefix classifier.
/// Construct with `Dictionaries::default()` for the built-in set, or
/// `Dictionaries::builder()` to extend it.
#[derive(Debug, Clone)]
pub struct Dictionaries {
    applications: Vec<String>,
    known_users: Vec<String>,
    known_databases: Vec<String>,
}

impl Default for Dictionaries {
    fn default() -> Self {
        Self {
            applications: KNOWN_APPLICATIONS.iter().map(|s| s.to_string()).collect(),
            known_users: Vec::new(),
            known_databases: Vec::new(),
        }
    }
}

impl Dictionaries {
    pub fn builder() -> DictionariesBuilder {
        DictionariesBuilder::default()
    }

    /// True for an exact (case-insensitive) hit in the known-application
    /// list, or for a word that starts with `pg_`/`pg-` or contains `psql`
    /// anywhere — PostgreSQL's own family of client tools and forks of them
    /// (`pg_repack`, `pgbouncer-admin`, `my_psql_wrapper`, …) is too open-
    /// ended to enumerate exhaustively.
    pub fn looks_like_known_application(&self, value: &str) -> bool {
        let lower = value.to_ascii_lowercase();
        self.applications.iter().any(|known| known.eq_ignore_ascii_case(value))
            || lower.starts_with("pg_")
            || lower.starts_with("pg-")
            || lower.contains("psql")
    }

    pub fn looks_like_known_user(&self, value: &str) -> bool {
        self.known_users.iter().any(|known| known.eq_ignore_ascii_case(value))
    }

    pub fn looks_like_known_database(&self, value: &str) -> bool {
        self.known_databases.iter().any(|known| known.eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Default)]
pub struct DictionariesBuilder {
    extra_applications: Vec<String>,
    known_users: Vec<String>,
    known_databases: Vec<String>,
}

impl DictionariesBuilder {
    pub fn with_application(mut self, name: impl Into<String>) -> Self {
        self.extra_applications.push(name.into());
        self
    }

    pub fn with_known_user(mut self, name: impl Into<String>) -> Self {
        self.known_users.push(name.into());
        self
    }

    pub fn with_known_database(mut self, name: impl Into<String>) -> Self {
        self.known_databases.push(name.into());
        self
    }

    pub fn build(self) -> Dictionaries {
        let mut applications: Vec<String> =
            KNOWN_APPLICATIONS.iter().map(|s| s.to_string()).collect();
        applications.extend(self.extra_applications);
        Dictionaries {
            applications,
            known_users: self.known_users,
            known_databases: self.known_databases,
        }
    }
}

/// Convenience wrapper over `Dictionaries::default()` for call sites that
/// don't need a custom dictionary.
pub fn looks_like_known_application(value: &str) -> bool {
    Dictionaries::default().looks_like_known_application(value)
}
