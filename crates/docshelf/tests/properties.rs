//! End-to-end behavior of database handles over SQLite on disk, with the
//! sample user records.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use serde_json::json;

use docshelf::{attr, Batch, Database, DecodeExt, Document, Documents, Expression, Query};
use docshelf_testkit::fixtures::{
    partial_user, sample_users, sample_users_with_brian, user, TestDatabase, User,
};
use docshelf_testkit::generators::{documents, expression};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn open() -> TestDatabase {
    init_tracing();
    TestDatabase::new("people")
}

fn ids(documents: &[Document]) -> Vec<&str> {
    documents.iter().map(|d| d.id.as_str()).collect()
}

#[test]
fn round_trip_by_id() {
    let db = open();

    db.save(user("1", "Brad", "Depp")).unwrap();

    let fetched = db.fetch("1").unwrap().unwrap();
    assert_eq!(fetched.id, "1");
    assert_eq!(fetched.get_str("name"), Some("Brad"));
    assert_eq!(fetched.get_str("last_name"), Some("Depp"));
}

#[test]
fn round_trip_survives_reopen() {
    let db = open();
    db.save(user("1", "Brad", "Depp")).unwrap();

    let reopened = db.reopen();
    assert_eq!(reopened.fetch("1").unwrap(), Some(user("1", "Brad", "Depp")));
}

#[test]
fn batch_is_visible_as_a_whole() {
    let db = open();

    let report = db.save_all(sample_users()).unwrap();
    assert_eq!(report.saved, 2);
    assert_eq!(db.fetch_all(Query::all()).unwrap().len(), 2);
}

#[test]
fn concurrent_reader_never_sees_half_a_batch() {
    let db = open();
    let reader = db.reopen();
    let done = Arc::new(AtomicBool::new(false));

    let observer = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut reads = 0;
            loop {
                let finished = done.load(AtomicOrdering::Acquire);
                let seen = reader.fetch_all(Query::all()).unwrap().len();
                assert_eq!(seen % 2, 0, "reader saw {} documents", seen);
                reads += 1;
                if finished {
                    return reads;
                }
            }
        })
    };

    for i in 0..300 {
        db.save_all([
            user(&format!("{:03}a", i), "Brad", "Depp"),
            user(&format!("{:03}b", i), "Brian", "May"),
        ])
        .unwrap();
    }
    done.store(true, AtomicOrdering::Release);

    let reads = observer.join().unwrap();
    assert!(reads > 0);
    assert_eq!(db.count().unwrap(), 600);
}

#[test]
fn failed_batch_applies_nothing() {
    let db = open();

    let batch = Batch::new()
        .save(user("1", "Brad", "Depp"))
        .save(Document::new(""));
    assert!(db.write_batch(&batch).is_err());
    assert_eq!(db.count().unwrap(), 0);
}

#[test]
fn mixed_batch() {
    let db = open();
    db.save_all(sample_users()).unwrap();

    let batch = Batch::new().delete("1").save(user("3", "Brian", "May"));
    let report = db.write_batch(&batch).unwrap();
    assert_eq!((report.saved, report.deleted), (1, 1));
    assert_eq!(ids(&db.fetch_all(Query::all()).unwrap()), vec!["2", "3"]);
}

#[test]
fn filter_selects_matching_records() {
    let db = open();
    db.save_all(sample_users()).unwrap();

    let found = db.fetch_all(attr("name").eq("Brad")).unwrap();
    assert_eq!(ids(&found), vec!["1"]);
}

#[test]
fn delete_by_filter() {
    let db = open();
    db.save_all(sample_users()).unwrap();

    let filter = attr("name").eq("Brad");
    assert_eq!(db.delete_all(Some(&filter)).unwrap(), 1);
    assert!(db.fetch_all(filter).unwrap().is_empty());
    assert_eq!(db.count().unwrap(), 1);
}

#[test]
fn delete_everything() {
    let db = open();
    db.save_all(sample_users()).unwrap();

    assert_eq!(db.delete_all(None).unwrap(), 2);
    assert_eq!(db.count().unwrap(), 0);
    assert!(db.fetch_all(Query::all()).unwrap().is_empty());
}

#[test]
fn delete_single_document() {
    let db = open();
    db.save(user("1", "Brad", "Depp")).unwrap();

    assert!(db.delete("1").unwrap());
    assert!(!db.delete("1").unwrap());
    assert_eq!(db.fetch("1").unwrap(), None);
}

#[test]
fn glob_with_ordering() {
    let db = open();
    db.save_all(sample_users_with_brian()).unwrap();

    let query = Query::matching(attr("name").glob("Br*")).order_by(attr("name").asc());
    let found = db.fetch_all(query).unwrap();
    assert_eq!(ids(&found), vec!["1", "3"]);
}

#[test]
fn ordering_applies_without_filter() {
    let db = open();
    db.save_all(sample_users_with_brian()).unwrap();

    let ascending = db.fetch_all(Query::all().order_by(attr("name").asc())).unwrap();
    assert_eq!(ids(&ascending), vec!["1", "3", "2"]);

    let descending = db.fetch_all(Query::all().order_by(attr("name").desc())).unwrap();
    assert_eq!(ids(&descending), vec!["2", "3", "1"]);
}

#[test]
fn ties_break_by_id() {
    let db = open();
    db.save_all([
        user("b", "Brad", "Depp"),
        user("a", "Brad", "Pitt"),
        user("c", "Brad", "Paisley"),
    ])
    .unwrap();

    let found = db.fetch_all(Query::all().order_by(attr("name").desc())).unwrap();
    assert_eq!(ids(&found), vec!["a", "b", "c"]);
}

#[test]
fn paging() {
    let db = open();
    db.save_all((1..=5).map(|i| user(&i.to_string(), "Brad", "Depp")))
        .unwrap();

    let page = db.fetch_all(Query::all().offset(1).limit(2)).unwrap();
    assert_eq!(ids(&page), vec!["2", "3"]);
}

#[test]
fn decode_mismatch_single_and_batch() {
    let db = open();
    db.save_all([
        user("1", "Brad", "Depp"),
        partial_user("2", "Brian"),
        user("3", "Charles", "Xavier"),
    ])
    .unwrap();

    assert_eq!(db.fetch_as::<User>("2").unwrap(), None);
    assert_eq!(
        db.fetch_as::<User>("1").unwrap(),
        Some(User {
            name: "Brad".into(),
            last_name: "Depp".into()
        })
    );

    let decoded = db.fetch_all_as::<User, _>(Query::all()).unwrap();
    let names: Vec<&str> = decoded.items.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Brad", "Charles"]);
    assert_eq!(decoded.skipped.len(), 1);
    assert_eq!(decoded.skipped[0].id, "2");
}

#[test]
fn comparison_operators() {
    let db = open();
    db.save_all([
        Document::from_serialize("1", &json!({"age": 30, "tags": ["a"]})).unwrap(),
        Document::from_serialize("2", &json!({"age": 41.5})).unwrap(),
        Document::from_serialize("3", &json!({"age": "old"})).unwrap(),
        Document::from_serialize("4", &json!({"age": null})).unwrap(),
        Document::new("5"),
    ])
    .unwrap();

    let fetch = |filter: Expression| ids(&db.fetch_all(filter).unwrap()).join(",");
    assert_eq!(fetch(attr("age").gt(30)), "2");
    assert_eq!(fetch(attr("age").gte(30)), "1,2");
    assert_eq!(fetch(attr("age").lt("z")), "3");
    assert_eq!(fetch(attr("age").ne(30)), "2,3");
    assert_eq!(fetch(attr("age").exists()), "1,2,3");
    assert_eq!(fetch(attr("age").not_exists()), "4,5");
    assert_eq!(fetch(attr("age").is_in([json!(30), json!("old")])), "1,3");
    assert_eq!(fetch(attr("tags").eq(json!(["a"]))), "1");
    assert_eq!(fetch(attr("age").eq(serde_json::Value::Null)), "4");
    assert_eq!(fetch(!attr("age").gt(30)), "1,3,4,5");
    assert_eq!(fetch(attr("age").lt(100).and(attr("age").gt(35))), "2");
}

#[test]
fn like_is_case_insensitive_glob_is_not() {
    let db = open();
    db.save_all([user("1", "Brad", "Depp"), user("2", "brian", "May")])
        .unwrap();

    assert_eq!(ids(&db.fetch_all(attr("name").like("br%")).unwrap()), vec!["1", "2"]);
    assert_eq!(ids(&db.fetch_all(attr("name").glob("b*")).unwrap()), vec!["2"]);
}

#[test]
fn dotted_keys_address_nested_maps() {
    let db = open();
    db.save_all([
        Document::from_serialize("nested", &json!({"a": {"b": 1}})).unwrap(),
        Document::from_serialize("flat", &json!({"a.b": 1})).unwrap(),
    ])
    .unwrap();

    // A key containing `.` is stored verbatim but cannot be addressed by a path.
    let found = db.fetch_all(attr("a.b").eq(1)).unwrap();
    assert_eq!(ids(&found), vec!["nested"]);
    assert_eq!(db.fetch("flat").unwrap().unwrap().get("a.b"), Some(&json!(1)));
}

#[test]
fn invalid_path_is_rejected() {
    let db = open();
    assert!(db.fetch_all(attr("na'me").eq("Brad")).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn saved_documents_round_trip_and_filtered_deletes_clear(
        docs in documents(8),
        filter in expression(),
    ) {
        let db: Database = Database::open_in_memory("generated").unwrap();
        db.save_all(docs.clone()).unwrap();

        for doc in &docs {
            let found = db.fetch(&doc.id).unwrap();
            prop_assert_eq!(found.as_ref(), Some(doc));
        }

        let removed = db.delete_all(Some(&filter)).unwrap();
        prop_assert!(db.fetch_all(filter).unwrap().is_empty());
        prop_assert_eq!(db.count().unwrap(), docs.len() - removed);
    }
}
