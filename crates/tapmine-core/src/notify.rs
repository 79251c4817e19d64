//! Balance-change broadcast between otherwise unrelated views.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::user::UserBalances;

/// Name of the DOM event the browser bridge re-emits for JS listeners.
pub const MINING_COLLECTED_EVENT: &str = "mining:collected";

/// Handle returned by [`BalanceNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Rc<dyn Fn(&UserBalances)>;

/// Single-threaded observer list for new balance totals.
///
/// Payloads carry complete totals and subscribers are expected to replace
/// their copy, so delivery order between subscribers does not matter.
#[derive(Default)]
pub struct BalanceNotifier {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<(SubscriptionId, Callback)>>,
    last: RefCell<Option<UserBalances>>,
}

impl BalanceNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every future publish.
    pub fn subscribe(&self, callback: impl Fn(&UserBalances) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Deliver `balances` to every current subscriber.
    ///
    /// Callbacks may subscribe or unsubscribe while this runs; changes take
    /// effect from the next publish.
    pub fn publish(&self, balances: &UserBalances) {
        *self.last.borrow_mut() = Some(balances.clone());

        let snapshot: Vec<Callback> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();

        for callback in snapshot {
            callback(balances);
        }
    }

    /// Most recently published totals.
    pub fn last(&self) -> Option<UserBalances> {
        self.last.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl core::fmt::Debug for BalanceNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BalanceNotifier")
            .field("subscribers", &self.subscriber_count())
            .field("last", &self.last.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::HeaderView;

    fn totals(coins: u64) -> UserBalances {
        UserBalances { total_coins: coins, ..Default::default() }
    }

    #[test]
    fn test_all_subscribers_receive() {
        let notifier = BalanceNotifier::new();
        let header = Rc::new(RefCell::new(HeaderView::default()));
        let seen = Rc::new(Cell::new(0));

        let h = Rc::clone(&header);
        notifier.subscribe(move |b| h.borrow_mut().apply(b));
        let s = Rc::clone(&seen);
        notifier.subscribe(move |b| s.set(b.total_coins));

        notifier.publish(&totals(42));
        assert_eq!(header.borrow().coins, 42);
        assert_eq!(seen.get(), 42);
        assert_eq!(notifier.last(), Some(totals(42)));
    }

    #[test]
    fn test_last_write_wins() {
        let notifier = BalanceNotifier::new();
        let header = Rc::new(RefCell::new(HeaderView::default()));
        let h = Rc::clone(&header);
        notifier.subscribe(move |b| h.borrow_mut().apply(b));

        notifier.publish(&totals(100));
        notifier.publish(&totals(7));
        assert_eq!(header.borrow().coins, 7);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = BalanceNotifier::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = notifier.subscribe(move |_| h.set(h.get() + 1));

        notifier.publish(&totals(1));
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.publish(&totals(2));
        assert_eq!(hits.get(), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_publish() {
        let notifier = Rc::new(BalanceNotifier::new());
        let hits = Rc::new(Cell::new(0));
        let id_slot: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));

        let n = Rc::clone(&notifier);
        let slot = Rc::clone(&id_slot);
        let h = Rc::clone(&hits);
        let id = notifier.subscribe(move |_| {
            h.set(h.get() + 1);
            if let Some(id) = slot.get() {
                n.unsubscribe(id);
            }
        });
        id_slot.set(Some(id));

        notifier.publish(&totals(1));
        notifier.publish(&totals(2));
        assert_eq!(hits.get(), 1);
    }
}
