//! # docshelf testkit
//!
//! Testing utilities for docshelf.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Temporary on-disk databases and the sample user records
//! - **Generators**: Proptest strategies for documents, filters and queries
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docshelf_testkit::generators::{documents, query};
//!
//! proptest! {
//!     #[test]
//!     fn engines_agree(docs in documents(12), q in query()) {
//!         // save `docs` into two engines and compare `q`'s results
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use docshelf::Documents;
//! use docshelf_testkit::fixtures::{sample_users, TestDatabase};
//!
//! let db = TestDatabase::new("people");
//! db.save_all(sample_users()).unwrap();
//! assert_eq!(db.count().unwrap(), 2);
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{partial_user, sample_users, sample_users_with_brian, user, TestDatabase, User};
