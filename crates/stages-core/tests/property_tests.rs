//! Property tests for the Stage store invariants.
//!
//! Both backends are driven with the same operation sequences and must agree
//! with a simple model of the table.

use proptest::collection::vec;
use proptest::prelude::*;
use stages_core::{Database, NewStage, Stage, StageId};
use std::collections::BTreeSet;

/// Small alphabets so that collisions are frequent.
fn small_value() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string))
}

fn new_stage() -> impl Strategy<Value = NewStage> {
    (small_value(), small_value(), small_value())
        .prop_map(|(n_factura, detalle, file_url)| NewStage::new(n_factura, detalle, file_url))
}

/// One step of a generated workload.
#[derive(Debug, Clone)]
enum Op {
    Create(NewStage),
    /// Delete the accepted Stage at this position (modulo the live count).
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => new_stage().prop_map(Op::Create),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

fn check_against_model(db: &Database, ops: &[Op]) -> Result<(), TestCaseError> {
    let session = db.session();
    let mut seen_detalle = BTreeSet::new();
    let mut seen_file_url = BTreeSet::new();
    let mut live: Vec<Stage> = Vec::new();

    for step in ops {
        match step {
            Op::Create(input) => {
                let collides = input.detalle.as_ref().is_some_and(|d| seen_detalle.contains(d))
                    || input.file_url.as_ref().is_some_and(|f| seen_file_url.contains(f));

                match session.create(input) {
                    Ok(stage) => {
                        prop_assert!(!collides, "create accepted a duplicate: {:?}", input);
                        prop_assert_eq!(&stage.n_factura, &input.n_factura);
                        prop_assert_eq!(&stage.detalle, &input.detalle);
                        prop_assert_eq!(&stage.file_url, &input.file_url);
                        if let Some(d) = &input.detalle {
                            seen_detalle.insert(d.clone());
                        }
                        if let Some(f) = &input.file_url {
                            seen_file_url.insert(f.clone());
                        }
                        live.push(stage);
                    }
                    Err(e) => {
                        prop_assert!(collides, "create rejected a fresh record: {}", e);
                        prop_assert!(e.is_constraint_violation());
                    }
                }
            }
            Op::Delete(pick) => {
                if live.is_empty() {
                    continue;
                }
                let stage = live.remove(pick % live.len());
                prop_assert!(session.delete(stage.id).expect("delete"));
                if let Some(d) = &stage.detalle {
                    seen_detalle.remove(d);
                }
                if let Some(f) = &stage.file_url {
                    seen_file_url.remove(f);
                }
                prop_assert!(session.get_by_id(stage.id).expect("get").is_none());
            }
        }
    }

    let listed = session.list_all().expect("list");
    prop_assert_eq!(&listed, &live);

    for stage in &live {
        let fetched = session.get_by_id(stage.id).expect("get");
        prop_assert_eq!(fetched.as_ref(), Some(stage));
    }
    Ok(())
}

proptest! {
    /// Accepted creates are exactly those that do not collide with a live record.
    #[test]
    fn memory_store_matches_model(ops in vec(op(), 0..40)) {
        let db = Database::in_memory();
        check_against_model(&db, &ops)?;
    }

    /// Ids ascend strictly and deleted ids are never handed out again.
    #[test]
    fn ids_never_reused(deletes in vec(any::<bool>(), 1..30)) {
        let db = Database::in_memory();
        let session = db.session();
        let mut issued = BTreeSet::new();
        let mut last = StageId(0);

        for delete_after in deletes {
            let stage = session.create(&NewStage::default()).expect("create");
            prop_assert!(stage.id > last);
            prop_assert!(issued.insert(stage.id));
            last = stage.id;
            if delete_after {
                prop_assert!(session.delete(stage.id).expect("delete"));
            }
        }
    }

    /// Absent ids are reported as absent by both lookup and delete.
    #[test]
    fn absent_ids_not_found(id in any::<i64>()) {
        let db = Database::in_memory();
        let session = db.session();
        prop_assert!(session.get_by_id(StageId(id)).expect("get").is_none());
        prop_assert!(!session.delete(StageId(id)).expect("delete"));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The redb backend obeys the same model.
    #[test]
    fn redb_store_matches_model(ops in vec(op(), 0..20)) {
        let temp = tempfile::tempdir().expect("temp dir");
        let db = Database::open(temp.path().join("prop.redb")).expect("open db");
        check_against_model(&db, &ops)?;
    }
}
