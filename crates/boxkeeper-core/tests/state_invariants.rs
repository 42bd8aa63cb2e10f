//! Property tests: arbitrary interleavings of local actions and replayed
//! remote changes keep box ownership exclusive and references intact.

use std::collections::HashMap;

use boxkeeper_core::sync::ChangeDoc;
use boxkeeper_core::{
    apply_changes, Actions, AppState, ChangeOrigin, ChangeRecord, InitializeStore, RecordingChannel, Store,
};
use chrono::Utc;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddItem { target: usize, name: String },
    DeleteItem { pick: usize },
    RenameItem { pick: usize, name: String },
    ToggleTakeout { pick: usize },
    AddBox { name: String },
    RenameBox { target: usize, name: String },
    DeleteBox { target: usize },
    RemoteCreate { id: u8, box_id: String },
    RemoteUpdate { pick: usize, box_id: String },
    RemoteDelete { pick: usize },
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just(" ".to_string()), "[a-d]{1,3}"]
}

fn box_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just("B1".to_string()), Just("B2".to_string()), "R[0-3]"]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), name_strategy()).prop_map(|(target, name)| Op::AddItem { target, name }),
        any::<usize>().prop_map(|pick| Op::DeleteItem { pick }),
        (any::<usize>(), name_strategy()).prop_map(|(pick, name)| Op::RenameItem { pick, name }),
        any::<usize>().prop_map(|pick| Op::ToggleTakeout { pick }),
        name_strategy().prop_map(|name| Op::AddBox { name }),
        (any::<usize>(), name_strategy()).prop_map(|(target, name)| Op::RenameBox { target, name }),
        any::<usize>().prop_map(|target| Op::DeleteBox { target }),
        (0u8..6, box_id_strategy()).prop_map(|(id, box_id)| Op::RemoteCreate { id, box_id }),
        (any::<usize>(), box_id_strategy()).prop_map(|(pick, box_id)| Op::RemoteUpdate { pick, box_id }),
        any::<usize>().prop_map(|pick| Op::RemoteDelete { pick }),
    ]
}

fn nth_key<V>(map: &std::collections::BTreeMap<String, V>, n: usize) -> Option<String> {
    if map.is_empty() {
        None
    } else {
        map.keys().nth(n % map.len()).cloned()
    }
}

fn doc(name: &str, box_id: &str) -> ChangeDoc {
    ChangeDoc {
        name: name.into(),
        takeout: false,
        created_at: None,
        modified_at: None,
        box_id: box_id.into(),
    }
}

fn seeded() -> Store {
    let mut payload = InitializeStore::default();
    payload.boxes.insert("B1".into(), Vec::new());
    payload.boxes.insert("B2".into(), Vec::new());
    let mut store = Store::new();
    let channel = RecordingChannel::new();
    Actions::new(&mut store, &channel).initialize(payload);
    store
}

/// Apply `op`; returns how many commands a successful local op must emit.
fn run(store: &mut Store, channel: &RecordingChannel, op: &Op) -> usize {
    let state = store.state();
    let mut actions = Actions::new(store, channel);
    let local = ChangeOrigin::Local;
    let ok = |accepted: bool| usize::from(accepted);

    match op {
        Op::AddItem { target, name } => match nth_key(&state.boxes, *target) {
            Some(box_id) => ok(actions.add_item(&box_id, name, local).is_ok()),
            None => 0,
        },
        Op::DeleteItem { pick } => match nth_key(&state.items, *pick) {
            Some(id) => ok(actions.delete_item(&id, local).is_ok()),
            None => 0,
        },
        Op::RenameItem { pick, name } => match nth_key(&state.items, *pick) {
            Some(id) => ok(actions.rename_item(&id, name, local).is_ok()),
            None => 0,
        },
        Op::ToggleTakeout { pick } => match nth_key(&state.items, *pick) {
            Some(id) => ok(actions.toggle_takeout(&id, local).is_ok()),
            None => 0,
        },
        Op::AddBox { name } => ok(actions.add_box(name, local).is_ok()),
        Op::RenameBox { target, name } => match nth_key(&state.boxes, *target) {
            Some(id) => ok(actions.rename_box(&id, name, local).is_ok()),
            None => 0,
        },
        Op::DeleteBox { target } => match nth_key(&state.boxes, *target) {
            Some(id) => ok(actions.delete_box(&id, local).is_ok()),
            None => 0,
        },
        Op::RemoteCreate { id, box_id } => {
            let record = ChangeRecord::create(format!("remote-{id}"), doc("Cup", box_id));
            apply_changes(&mut actions, &[record], Utc::now());
            0
        }
        Op::RemoteUpdate { pick, box_id } => {
            if let Some(id) = nth_key(&state.items, *pick) {
                apply_changes(&mut actions, &[ChangeRecord::update(id, doc("Moved", box_id))], Utc::now());
            }
            0
        }
        Op::RemoteDelete { pick } => {
            if let Some(id) = nth_key(&state.items, *pick) {
                apply_changes(&mut actions, &[ChangeRecord::delete(id)], Utc::now());
            }
            0
        }
    }
}

fn check_invariants(state: &AppState) -> Result<(), TestCaseError> {
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for b in state.boxes.values() {
        for id in &b.items {
            prop_assert!(state.items.contains_key(id), "box {} lists missing item {}", b.id, id);
            *owners.entry(id.as_str()).or_default() += 1;
        }
    }
    for id in state.items.keys() {
        prop_assert_eq!(owners.get(id.as_str()).copied(), Some(1), "item {} ownership", id);
    }
    prop_assert!(!state.boxes.is_empty());
    if let Some(current) = &state.work.current_box_id {
        prop_assert!(state.boxes.contains_key(current), "current box {} missing", current);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn interleaved_actions_keep_ownership_exclusive(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut store = seeded();
        let channel = RecordingChannel::new();

        for op in &ops {
            let expected = run(&mut store, &channel, op);
            prop_assert_eq!(channel.take().len(), expected, "commands after {:?}", op);
            check_invariants(&store.state())?;
        }
    }
}
