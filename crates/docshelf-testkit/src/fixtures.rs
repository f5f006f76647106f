//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::ops::Deref;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use docshelf::{Database, DatabaseConfiguration, Document};
use docshelf_core::Attributes;

/// An on-disk database inside a temporary directory.
///
/// The directory (and the database) is removed when the fixture drops.
pub struct TestDatabase {
    database: Database,
    dir: TempDir,
}

impl TestDatabase {
    /// Open `name` under a fresh temporary directory.
    pub fn new(name: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let configuration = DatabaseConfiguration::new(name).with_directory(dir.path());
        let database = Database::open(configuration).expect("open test database");
        Self { database, dir }
    }

    /// The temporary base directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Reopen the same database file with a new handle.
    pub fn reopen(&self) -> Database {
        Database::open(self.database.configuration().clone()).expect("reopen test database")
    }
}

impl Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.database
    }
}

/// The typed shape of the sample user records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub last_name: String,
}

/// A user document with `name` and `last_name` attributes.
pub fn user(id: &str, name: &str, last_name: &str) -> Document {
    let user = User {
        name: name.to_string(),
        last_name: last_name.to_string(),
    };
    Document::from_serialize(id, &user).expect("serialize user")
}

/// A user document missing its `last_name`.
pub fn partial_user(id: &str, name: &str) -> Document {
    let mut attributes = Attributes::new();
    attributes.insert("name".to_string(), name.into());
    Document::with_attributes(id, attributes)
}

/// Brad Depp (`"1"`) and Charles Xavier (`"2"`).
pub fn sample_users() -> Vec<Document> {
    vec![user("1", "Brad", "Depp"), user("2", "Charles", "Xavier")]
}

/// The sample users plus Brian May (`"3"`), for pattern and ordering tests.
pub fn sample_users_with_brian() -> Vec<Document> {
    let mut users = sample_users();
    users.push(user("3", "Brian", "May"));
    users
}
