//! # Change Signals
//!
//! A [`ChangeToken`] is a one-shot notification: it fires at most once, and
//! once fired it stays fired. Whoever owns the paired [`ChangeTrigger`]
//! decides when that happens. To keep observing after a token fires, fetch a
//! fresh token from the producer and register again; [`on_change`] automates
//! that loop.
//!
//! # Rotation Discipline
//!
//! Producers must install the next token *before* firing the current one.
//! Callbacks commonly re-subscribe to "the current token" while handling a
//! notification; if that were still the token being fired, the new callback
//! would run immediately, re-subscribe again, and recurse without bound.
//!
//! # Example
//!
//! ```rust,ignore
//! let (trigger, token) = change::channel();
//! token.register(|| println!("changed"));
//! assert!(trigger.fire());
//! assert!(!trigger.fire()); // already spent
//! ```

use parking_lot::Mutex;
use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

type Callback = Box<dyn FnOnce() + Send + 'static>;

struct Signal {
    fired: AtomicBool,
    state: Mutex<SignalState>,
}

#[derive(Default)]
struct SignalState {
    callbacks: Vec<(u64, Callback)>,
    next_id: u64,
}

impl Signal {
    fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
            state: Mutex::new(SignalState::default()),
        }
    }
}

/// Create a linked trigger and token.
pub fn channel() -> (ChangeTrigger, ChangeToken) {
    let signal = Arc::new(Signal::new());
    (
        ChangeTrigger {
            signal: Arc::clone(&signal),
        },
        ChangeToken {
            signal: Some(signal),
        },
    )
}

/// The observable side of a one-shot change signal.
#[derive(Clone)]
pub struct ChangeToken {
    // `None` is a token that can never fire.
    signal: Option<Arc<Signal>>,
}

impl ChangeToken {
    /// A token that never fires, for sources that never change.
    pub const fn never() -> Self {
        Self { signal: None }
    }

    /// Returns true once the token has fired.
    pub fn has_changed(&self) -> bool {
        self.signal
            .as_ref()
            .is_some_and(|s| s.fired.load(Ordering::Acquire))
    }

    /// Returns false for tokens that can never fire.
    pub fn can_fire(&self) -> bool {
        self.signal.is_some()
    }

    /// Returns true if both tokens observe the same signal.
    pub fn same_signal(a: &ChangeToken, b: &ChangeToken) -> bool {
        match (&a.signal, &b.signal) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Register a callback to run when the token fires.
    ///
    /// If the token has already fired the callback runs immediately, on the
    /// calling thread, before this method returns. On a token that can never
    /// fire the callback is dropped without running.
    pub fn register<F>(&self, callback: F) -> ChangeRegistration
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(signal) = &self.signal else {
            return ChangeRegistration::inert();
        };

        let mut state = signal.state.lock();
        if signal.fired.load(Ordering::Acquire) {
            drop(state);
            callback();
            return ChangeRegistration::inert();
        }

        let id = state.next_id;
        state.next_id += 1;
        state.callbacks.push((id, Box::new(callback)));

        ChangeRegistration {
            signal: Arc::downgrade(signal),
            id,
        }
    }

    /// Wait until the token fires.
    ///
    /// Never completes for [`ChangeToken::never`].
    pub async fn changed(&self) {
        if self.signal.is_none() {
            return futures::future::pending::<()>().await;
        }

        let (tx, rx) = futures::channel::oneshot::channel::<()>();
        let registration = UnregisterOnDrop(Some(self.register(move || {
            let _ = tx.send(());
        })));
        // The sender lives in the registered callback, which only drops
        // without sending if the future itself is dropped first.
        let _ = rx.await;
        drop(registration);
    }
}

impl fmt::Debug for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeToken")
            .field("can_fire", &self.can_fire())
            .field("has_changed", &self.has_changed())
            .finish()
    }
}

/// The firing side of a one-shot change signal.
#[derive(Clone)]
pub struct ChangeTrigger {
    signal: Arc<Signal>,
}

impl ChangeTrigger {
    /// Fire the signal, running every registered callback once.
    ///
    /// Callbacks run on the calling thread, in registration order, after the
    /// internal lock is released. Returns `false` if the signal had already
    /// fired, in which case nothing runs.
    pub fn fire(&self) -> bool {
        let callbacks = {
            let mut state = self.signal.state.lock();
            if self.signal.fired.swap(true, Ordering::AcqRel) {
                return false;
            }
            std::mem::take(&mut state.callbacks)
        };

        for (_, callback) in callbacks {
            callback();
        }
        true
    }

    /// Returns true once the signal has fired.
    pub fn has_fired(&self) -> bool {
        self.signal.fired.load(Ordering::Acquire)
    }

    /// A token observing this trigger.
    pub fn token(&self) -> ChangeToken {
        ChangeToken {
            signal: Some(Arc::clone(&self.signal)),
        }
    }
}

impl fmt::Debug for ChangeTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTrigger")
            .field("has_fired", &self.has_fired())
            .finish()
    }
}

/// Handle to a registered callback.
///
/// Dropping the handle leaves the callback registered; call
/// [`unregister`](Self::unregister) to remove it.
pub struct ChangeRegistration {
    signal: Weak<Signal>,
    id: u64,
}

impl ChangeRegistration {
    fn inert() -> Self {
        Self {
            signal: Weak::new(),
            id: 0,
        }
    }

    /// Remove the callback if it has not run yet.
    ///
    /// Returns true if a pending callback was removed.
    pub fn unregister(&self) -> bool {
        let Some(signal) = self.signal.upgrade() else {
            return false;
        };
        let mut state = signal.state.lock();
        let before = state.callbacks.len();
        state.callbacks.retain(|(id, _)| *id != self.id);
        state.callbacks.len() != before
    }
}

impl fmt::Debug for ChangeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRegistration")
            .field("id", &self.id)
            .finish()
    }
}

struct UnregisterOnDrop(Option<ChangeRegistration>);

impl Drop for UnregisterOnDrop {
    fn drop(&mut self) {
        if let Some(registration) = self.0.take() {
            registration.unregister();
        }
    }
}

// ============================================================================
// on_change
// ============================================================================

trait Disarm: Send + Sync {
    fn disarm(&self);
    fn is_disarmed(&self) -> bool;
}

struct Watch<P, C> {
    producer: Mutex<P>,
    consumer: Mutex<C>,
    cancelled: AtomicBool,
    registration: Mutex<Option<ChangeRegistration>>,
}

impl<P: Send, C: Send> Disarm for Watch<P, C> {
    fn disarm(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(registration) = self.registration.lock().take() {
            registration.unregister();
        }
    }

    fn is_disarmed(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Handle returned by [`on_change`].
pub struct ChangeSubscription {
    watch: Arc<dyn Disarm>,
}

impl ChangeSubscription {
    /// Stop observing. The consumer will not run again.
    pub fn cancel(&self) {
        self.watch.disarm();
    }

    /// Returns true once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.watch.is_disarmed()
    }
}

impl fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSubscription")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Run `consumer` every time the token returned by `producer` fires.
///
/// On each notification the next token is taken from `producer` first, then
/// the consumer runs, then the callback is registered on that token. A change
/// that lands while the consumer runs fires the token already taken, so
/// registering on it runs the consumer again. Returning `None` from the
/// producer ends the loop after the current consumer call. The producer must
/// hand out a token that has not fired yet, otherwise the loop spins on the
/// calling thread.
pub fn on_change<P, C>(mut producer: P, consumer: C) -> ChangeSubscription
where
    P: FnMut() -> Option<ChangeToken> + Send + 'static,
    C: FnMut() + Send + 'static,
{
    let first = producer();
    let watch = Arc::new(Watch {
        producer: Mutex::new(producer),
        consumer: Mutex::new(consumer),
        cancelled: AtomicBool::new(false),
        registration: Mutex::new(None),
    });
    if let Some(token) = first {
        arm(&watch, token);
    }
    ChangeSubscription { watch }
}

fn arm<P, C>(watch: &Arc<Watch<P, C>>, token: ChangeToken)
where
    P: FnMut() -> Option<ChangeToken> + Send + 'static,
    C: FnMut() + Send + 'static,
{
    if watch.is_disarmed() {
        return;
    }

    let next = Arc::clone(watch);
    let registration = token.register(move || {
        if next.is_disarmed() {
            return;
        }
        let following = {
            let mut producer = next.producer.lock();
            (*producer)()
        };
        {
            let mut consumer = next.consumer.lock();
            (*consumer)();
        }
        if let Some(following) = following {
            arm(&next, following);
        }
    });
    // An already-fired token ran the callback inline and re-armed; keep the
    // registration that re-arming stored.
    if registration.signal.strong_count() > 0 {
        *watch.registration.lock() = Some(registration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_fire_runs_callbacks_once() {
        let (trigger, token) = channel();
        let (count, callback) = counter();
        token.register(callback);

        assert!(!token.has_changed());
        assert!(trigger.fire());
        assert!(token.has_changed());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(!trigger.fire());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_after_fire_runs_immediately() {
        let (trigger, token) = channel();
        trigger.fire();

        let (count, callback) = counter();
        let registration = token.register(callback);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!registration.unregister());
    }

    #[test]
    fn test_unregister_prevents_callback() {
        let (trigger, token) = channel();
        let (count, callback) = counter();
        let registration = token.register(callback);

        assert!(registration.unregister());
        trigger.fire();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let (trigger, token) = channel();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            token.register(move || order.lock().push(i));
        }
        trigger.fire();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_never_token() {
        let token = ChangeToken::never();
        let (count, callback) = counter();
        token.register(callback);

        assert!(!token.can_fire());
        assert!(!token.has_changed());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_same_signal() {
        let (trigger, token) = channel();
        let (_, other) = channel();
        assert!(ChangeToken::same_signal(&token, &trigger.token()));
        assert!(!ChangeToken::same_signal(&token, &other));
        assert!(!ChangeToken::same_signal(
            &ChangeToken::never(),
            &ChangeToken::never()
        ));
    }

    #[test]
    fn test_on_change_rearms_on_fresh_tokens() {
        let current = Arc::new(Mutex::new(channel()));
        let (count, _) = counter();

        let producer_state = Arc::clone(&current);
        let consumed = Arc::clone(&count);
        let subscription = on_change(
            move || Some(producer_state.lock().1.clone()),
            move || {
                consumed.fetch_add(1, Ordering::SeqCst);
            },
        );

        for expected in 1..=3 {
            // Rotate first, then fire the old trigger.
            let old = std::mem::replace(&mut *current.lock(), channel());
            old.0.fire();
            assert_eq!(count.load(Ordering::SeqCst), expected);
        }

        subscription.cancel();
        assert!(subscription.is_cancelled());
        let old = std::mem::replace(&mut *current.lock(), channel());
        old.0.fire();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_on_change_stops_when_producer_returns_none() {
        let (trigger, token) = channel();
        let mut first = Some(token);
        let (count, _) = counter();
        let consumed = Arc::clone(&count);
        let _subscription = on_change(
            move || first.take(),
            move || {
                consumed.fetch_add(1, Ordering::SeqCst);
            },
        );

        trigger.fire();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    // Rotate to a fresh channel, then fire the old one.
    fn rotate(current: &Mutex<(ChangeTrigger, ChangeToken)>) {
        let old = std::mem::replace(&mut *current.lock(), channel());
        old.0.fire();
    }

    #[test]
    fn test_on_change_sees_change_made_by_consumer() {
        let current = Arc::new(Mutex::new(channel()));
        let (count, _) = counter();

        let producer_state = Arc::clone(&current);
        let consumer_state = Arc::clone(&current);
        let consumed = Arc::clone(&count);
        let _subscription = on_change(
            move || Some(producer_state.lock().1.clone()),
            move || {
                // The first notification causes another change.
                if consumed.fetch_add(1, Ordering::SeqCst) == 0 {
                    rotate(&consumer_state);
                }
            },
        );

        rotate(&current);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        rotate(&current);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_on_change_observes_last_of_concurrent_changes() {
        let current = Arc::new(Mutex::new(channel()));
        let version = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));

        let producer_state = Arc::clone(&current);
        let observed = Arc::clone(&version);
        let latest = Arc::clone(&seen);
        let _subscription = on_change(
            move || Some(producer_state.lock().1.clone()),
            move || {
                std::thread::yield_now();
                latest.fetch_max(observed.load(Ordering::SeqCst), Ordering::SeqCst);
            },
        );

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let old = {
                            let mut pair = current.lock();
                            version.fetch_add(1, Ordering::SeqCst);
                            std::mem::replace(&mut *pair, channel())
                        };
                        old.0.fire();
                    }
                });
            }
        });

        assert_eq!(version.load(Ordering::SeqCst), 200);
        assert_eq!(seen.load(Ordering::SeqCst), 200);
    }

    #[tokio::test]
    async fn test_changed_completes_after_fire() {
        let (trigger, token) = channel();
        let waiter = tokio::spawn(async move { token.changed().await });
        tokio::task::yield_now().await;
        trigger.fire();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_changed_on_fired_token_is_ready() {
        let (trigger, token) = channel();
        trigger.fire();
        token.changed().await;
    }

    #[tokio::test]
    async fn test_never_token_stays_pending() {
        let token = ChangeToken::never();
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(10), token.changed()).await;
        assert!(waited.is_err());
    }
}
