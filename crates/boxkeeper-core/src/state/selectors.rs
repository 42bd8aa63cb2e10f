//! Derived reads over [`AppState`].

use super::AppState;
use crate::model::{Item, ItemBox};

/// Boxes sorted by name, ties broken by id.
pub fn boxes_by_name(state: &AppState) -> Vec<&ItemBox> {
    let mut boxes: Vec<&ItemBox> = state.boxes.values().map(|b| b.as_ref()).collect();
    boxes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    boxes
}

pub fn current_box(state: &AppState) -> Option<&ItemBox> {
    let id = state.work.current_box_id.as_ref()?;
    state.boxes.get(id).map(|b| b.as_ref())
}

/// The box whose `items` contains `item_id`, found by scanning every box.
pub fn box_of_item<'a>(state: &'a AppState, item_id: &str) -> Option<&'a ItemBox> {
    state
        .boxes
        .values()
        .map(|b| b.as_ref())
        .find(|b| b.contains(item_id))
}

pub fn find_box_by_name<'a>(state: &'a AppState, name: &str) -> Option<&'a ItemBox> {
    state.boxes.values().map(|b| b.as_ref()).find(|b| b.name == name)
}

/// Member items of a box in box order. Dangling ids are skipped.
pub fn items_in_box<'a>(state: &'a AppState, box_id: &str) -> Vec<&'a Item> {
    state
        .boxes
        .get(box_id)
        .map(|b| {
            b.items
                .iter()
                .filter_map(|id| state.items.get(id).map(|i| i.as_ref()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{reduce, StateAction};
    use chrono::Utc;

    fn sample() -> AppState {
        let now = Utc::now();
        let mut state = AppState::default();
        for action in [
            StateAction::BoxAdd { id: "b2".into(), name: "Attic".into(), at: now },
            StateAction::BoxAdd { id: "b1".into(), name: "Kitchen".into(), at: now },
            StateAction::ItemAdd { item: Item::new("i1", "Cup", now) },
            StateAction::ItemAdd { item: Item::new("i2", "Plate", now) },
            StateAction::BoxItemAdd { box_id: "b1".into(), item_id: "i2".into(), at: now },
            StateAction::BoxItemAdd { box_id: "b1".into(), item_id: "i1".into(), at: now },
            StateAction::CurrentBoxUpdate { id: Some("b1".into()) },
        ] {
            reduce(&mut state, &action);
        }
        state
    }

    #[test]
    fn boxes_sort_by_name() {
        let state = sample();
        let names: Vec<&str> = boxes_by_name(&state).iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Attic", "Kitchen"]);
    }

    #[test]
    fn items_keep_box_order() {
        let state = sample();
        let names: Vec<&str> = items_in_box(&state, "b1").iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Plate", "Cup"]);
        assert!(items_in_box(&state, "missing").is_empty());
    }

    #[test]
    fn lookups() {
        let state = sample();
        assert_eq!(current_box(&state).map(|b| b.id.as_str()), Some("b1"));
        assert_eq!(box_of_item(&state, "i1").map(|b| b.id.as_str()), Some("b1"));
        assert_eq!(find_box_by_name(&state, "Attic").map(|b| b.id.as_str()), Some("b2"));
    }
}
