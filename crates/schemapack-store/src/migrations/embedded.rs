//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All embedded migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_library",
            sql: include_str!("../../migrations/001_library.sql"),
        },
        Migration {
            id: "002_documents",
            sql: include_str!("../../migrations/002_documents.sql"),
        },
    ]
}
