//! Whole-schema populate runs: resolution, overrides, uniqueness, and
//! reproducibility working together.

use std::cell::Cell;
use std::rc::Rc;

use seedfill_core::{EntityKind, FieldDescriptor, FieldKind, Value};
use seedfill_populate::{
    value_strategy, FakeSource, Locale, MemoryStorage, PopulateError, PopulateOptions, Populator,
    Resolved,
};

fn game() -> EntityKind {
    EntityKind::new("Game")
        .field(FieldDescriptor::new("title", FieldKind::Char { max_length: 200 }))
        .field(FieldDescriptor::new("slug", FieldKind::Slug { max_length: 50 }))
        .field(FieldDescriptor::new("description", FieldKind::Text))
        .field(FieldDescriptor::new("created_at", FieldKind::DateTime))
        .field(FieldDescriptor::new("is_public", FieldKind::Boolean))
}

fn player() -> EntityKind {
    EntityKind::new("Player")
        .field(
            FieldDescriptor::new("nickname", FieldKind::Char { max_length: 100 }).unique(),
        )
        .field(FieldDescriptor::new("email", FieldKind::Email))
        .field(FieldDescriptor::new("score", FieldKind::BigInt))
        .field(FieldDescriptor::new("last_login_at", FieldKind::DateTime))
        .field(FieldDescriptor::new(
            "game",
            FieldKind::ToOne {
                target: "Game".to_string(),
            },
        ))
}

fn action() -> EntityKind {
    EntityKind::new("Action")
        .field(
            FieldDescriptor::new("name", FieldKind::Char { max_length: 4 }).with_choices(vec![
                Value::Text("fire".into()),
                Value::Text("move".into()),
                Value::Text("stop".into()),
            ]),
        )
        .field(FieldDescriptor::new("executed_at", FieldKind::DateTime))
        .field(
            FieldDescriptor::new(
                "actor",
                FieldKind::ToOne {
                    target: "Player".to_string(),
                },
            )
            .nullable(),
        )
        .field(
            FieldDescriptor::new(
                "target",
                FieldKind::ToOne {
                    target: "Player".to_string(),
                },
            )
            .nullable(),
        )
}

fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn populates_a_full_schema_in_order() {
    init_logs();
    let mut populator = Populator::new(FakeSource::seeded(Locale::En, 100));
    populator.add_entity(&game(), 10).unwrap();
    populator.add_entity(&player(), 10).unwrap();
    populator.add_entity(&action(), 30).unwrap();

    let mut storage = MemoryStorage::new();
    let inserted = populator.execute(&mut storage).unwrap();
    assert_eq!(inserted.count("Game"), 10);
    assert_eq!(inserted.count("Player"), 10);
    assert_eq!(inserted.count("Action"), 30);
    assert_eq!(inserted.total(), 50);

    let games: Vec<_> = inserted.ids("Game").to_vec();
    for (_, row) in storage.rows("Player") {
        let game = row.get("game").and_then(Value::as_id).unwrap();
        assert!(games.contains(&game));
    }
    for (_, row) in storage.rows("Action") {
        match row.get("name") {
            Some(Value::Text(name)) => {
                assert!(["fire", "move", "stop"].contains(&name.as_str()))
            }
            other => panic!("expected choice value, got {other:?}"),
        }
    }
}

#[test]
fn name_patterns_produce_plausible_formats() {
    let profile = EntityKind::new("Profile")
        .field(FieldDescriptor::new("first_name", FieldKind::Char { max_length: 60 }))
        .field(FieldDescriptor::new("email", FieldKind::Char { max_length: 120 }))
        .field(FieldDescriptor::new("phone_number", FieldKind::Char { max_length: 40 }))
        .field(FieldDescriptor::new("city", FieldKind::Char { max_length: 60 }))
        .field(FieldDescriptor::new("is_verified", FieldKind::Char { max_length: 10 }));

    let mut populator = Populator::new(FakeSource::seeded(Locale::En, 101));
    populator.add_entity(&profile, 5).unwrap();

    let mut storage = MemoryStorage::new();
    populator.execute(&mut storage).unwrap();
    for (_, row) in storage.rows("Profile") {
        match row.get("email") {
            Some(Value::Text(email)) => assert!(email.contains('@')),
            other => panic!("expected email text, got {other:?}"),
        }
        match row.get("first_name") {
            Some(Value::Text(name)) => assert!(!name.is_empty()),
            other => panic!("expected name text, got {other:?}"),
        }
        assert!(matches!(row.get("is_verified"), Some(Value::Bool(_))));
    }
}

#[test]
fn overrides_bound_values_and_run_once_per_record() {
    let invocations = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&invocations);

    let overrides = seedfill_populate::Overrides::new()
        .set(
            "score",
            value_strategy(move |ctx| {
                counter.set(counter.get() + 1);
                Ok(Resolved::Value(Value::Int(ctx.source.random_int(0, 1000))))
            }),
        )
        .set(
            "nickname",
            value_strategy(|ctx| Ok(Resolved::Value(Value::Text(ctx.source.email())))),
        );

    let mut populator = Populator::new(FakeSource::seeded(Locale::En, 102));
    populator.add_entity(&game(), 2).unwrap();
    populator
        .add_entity_with(&player(), 10, overrides)
        .unwrap();

    let mut storage = MemoryStorage::new();
    populator.execute(&mut storage).unwrap();

    assert_eq!(invocations.get(), 10);
    for (_, row) in storage.rows("Player") {
        match row.get("score") {
            Some(Value::Int(score)) => assert!((0..=1000).contains(score)),
            other => panic!("expected bounded score, got {other:?}"),
        }
        match row.get("nickname") {
            Some(Value::Text(nickname)) => assert!(nickname.contains('@')),
            other => panic!("expected email nickname, got {other:?}"),
        }
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = |seed: u64| {
        let mut populator = Populator::new(FakeSource::seeded(Locale::En, seed));
        populator.add_entity(&game(), 5).unwrap();
        populator.add_entity(&player(), 5).unwrap();
        let mut storage = MemoryStorage::new();
        populator.execute(&mut storage).unwrap();
        let games: Vec<_> = storage.rows("Game").map(|(_, row)| row.clone()).collect();
        let players: Vec<_> = storage.rows("Player").map(|(_, row)| row.clone()).collect();
        (games, players)
    };

    assert_eq!(run(7), run(7));
    assert_ne!(run(7), run(8));
}

#[test]
fn unique_together_is_satisfied_across_a_batch() {
    let answer = EntityKind::new("Answer")
        .field(FieldDescriptor::new(
            "question",
            FieldKind::ToOne {
                target: "Question".to_string(),
            },
        ))
        .field(
            FieldDescriptor::new("rank", FieldKind::PositiveSmallInt).with_choices(
                (0..5_i64).map(Value::Int).collect(),
            ),
        )
        .field(FieldDescriptor::new("body", FieldKind::Text))
        .unique_together(&["question", "rank"]);
    let question = EntityKind::new("Question")
        .field(FieldDescriptor::new("title", FieldKind::Char { max_length: 200 }));

    let mut populator = Populator::new(FakeSource::seeded(Locale::En, 103));
    populator.add_entity(&question, 2).unwrap();
    populator.add_entity(&answer, 10).unwrap();

    let mut storage = MemoryStorage::new();
    populator.execute(&mut storage).unwrap();

    let mut pairs = std::collections::BTreeSet::new();
    for (_, row) in storage.rows("Answer") {
        let question = row.get("question").and_then(Value::as_id).unwrap();
        let rank = row.get("rank").and_then(Value::as_i64).unwrap();
        assert!(pairs.insert((question, rank)));
    }
    assert_eq!(pairs.len(), 10);
}

#[test]
fn attempt_budget_is_configurable_and_fatal_when_spent() {
    let stuck = EntityKind::new("Stuck").field(
        FieldDescriptor::new("token", FieldKind::Char { max_length: 20 })
            .unique()
            .with_choices(vec![Value::Text("only".into())]),
    );

    let mut populator = Populator::with_options(
        FakeSource::seeded(Locale::En, 104),
        PopulateOptions { max_attempts: 10 },
    );
    populator.add_entity(&stuck, 2).unwrap();

    let mut storage = MemoryStorage::new();
    match populator.execute(&mut storage) {
        Err(PopulateError::ConstraintExceeded {
            kind,
            attempts,
            violation,
        }) => {
            assert_eq!(kind, "Stuck");
            assert_eq!(attempts, 10);
            assert_eq!(violation.fields, vec!["token".to_string()]);
        }
        other => panic!("expected exhausted attempts, got {other:?}"),
    }
    assert_eq!(storage.count("Stuck"), 1);
}

#[test]
fn locale_choice_reaches_generated_values() {
    let mut populator = Populator::new(FakeSource::seeded(Locale::PtBr, 105));
    populator.add_entity(&game(), 3).unwrap();

    let mut storage = MemoryStorage::new();
    let inserted = populator.execute(&mut storage).unwrap();
    assert_eq!(inserted.count("Game"), 3);
}
