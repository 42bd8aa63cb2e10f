//! The local state container.
//!
//! A [`Store`] is constructed by the process root and borrowed by whoever
//! needs to dispatch. It is single-threaded: subscribers are plain `FnMut`
//! closures and the state is swapped by value, never locked.
//!
//! Snapshots returned by [`Store::state`] are shared `Arc`s. A dispatch
//! while a snapshot is held clones the state first, so a snapshot never
//! changes underneath its holder.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::reducer::{reduce, Outcome, StateAction};
use super::AppState;

pub type SubscriberId = usize;

type Subscriber = Box<dyn FnMut(&AppState)>;

pub struct Store {
    state: Arc<AppState>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: SubscriberId,
}

impl Store {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AppState::default()),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Current immutable snapshot.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Apply one transition and notify subscribers if it changed anything.
    pub fn dispatch(&mut self, action: StateAction) -> Outcome {
        let outcome = self.apply(&action);
        if outcome.is_applied() {
            self.notify();
        }
        outcome
    }

    /// Apply a sequence of transitions as one step.
    ///
    /// Subscribers are notified once, after the last transition, so they
    /// never observe a partially applied action.
    pub fn dispatch_all<I>(&mut self, actions: I) -> Vec<Outcome>
    where
        I: IntoIterator<Item = StateAction>,
    {
        let outcomes: Vec<Outcome> = actions.into_iter().map(|a| self.apply(&a)).collect();
        if outcomes.iter().any(|o| o.is_applied()) {
            self.notify();
        }
        outcomes
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&AppState) + 'static) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Clear the sync summary once its display interval has elapsed.
    ///
    /// The host calls this periodically; there is no internal timer.
    /// Returns `true` when the summary was cleared by this call.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self
            .state
            .work
            .sync_notice
            .is_some_and(|notice| notice.is_expired(now));
        expired && self.dispatch(StateAction::SyncNoticeClear).is_applied()
    }

    fn apply(&mut self, action: &StateAction) -> Outcome {
        let outcome = reduce(Arc::make_mut(&mut self.state), action);
        debug!(action = action.kind(), ?outcome, "dispatch");
        outcome
    }

    fn notify(&mut self) {
        let state: &AppState = &self.state;
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(state);
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use crate::state::work::{SyncInfo, SyncNotice};
    use chrono::Duration;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn snapshot_is_stable_across_dispatch() {
        let mut store = Store::new();
        let before = store.state();
        store.dispatch(StateAction::ItemAdd {
            item: Item::new("i1", "Pen", Utc::now()),
        });
        assert!(before.items.is_empty());
        assert_eq!(store.state().items.len(), 1);
    }

    #[test]
    fn dispatch_all_notifies_once() {
        let mut store = Store::new();
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(move |_| *seen.borrow_mut() += 1);

        let now = Utc::now();
        store.dispatch_all(vec![
            StateAction::BoxAdd { id: "b1".into(), name: "b1".into(), at: now },
            StateAction::ItemAdd { item: Item::new("i1", "Pen", now) },
            StateAction::BoxItemAdd { box_id: "b1".into(), item_id: "i1".into(), at: now },
        ]);

        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn subscribers_see_the_final_state() {
        let mut store = Store::new();
        let observed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&observed);
        store.subscribe(move |state| {
            sink.borrow_mut().push(state.boxes.get("b1").map(|b| b.items.len()));
        });

        let now = Utc::now();
        store.dispatch_all(vec![
            StateAction::BoxAdd { id: "b1".into(), name: "b1".into(), at: now },
            StateAction::ItemAdd { item: Item::new("i1", "Pen", now) },
            StateAction::BoxItemAdd { box_id: "b1".into(), item_id: "i1".into(), at: now },
        ]);

        assert_eq!(*observed.borrow(), vec![Some(1)]);
    }

    #[test]
    fn unchanged_dispatch_does_not_notify() {
        let mut store = Store::new();
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(move |_| *seen.borrow_mut() += 1);

        store.dispatch(StateAction::ItemDelete { id: "ghost".into() });
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = Store::new();
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        let id = store.subscribe(move |_| *seen.borrow_mut() += 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(StateAction::SyncingUpdate { syncing: true });
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn tick_clears_expired_notice_only() {
        let mut store = Store::new();
        let now = Utc::now();
        store.dispatch(StateAction::SyncNoticeUpdate {
            notice: SyncNotice::new(SyncInfo { created: 1, updated: 0, deleted: 0 }, now),
        });

        assert!(!store.tick(now + Duration::seconds(1)));
        assert!(store.state().work.sync_notice.is_some());

        assert!(store.tick(now + Duration::seconds(3)));
        assert!(store.state().work.sync_notice.is_none());
        assert!(!store.tick(now + Duration::seconds(4)));
    }
}
