//! State shared between stack callback contexts and the idle loop
//!
//! Bindings keep one `RemoteApp` behind `Arc<Mutex<_>>`. Some stack callbacks
//! run while the stack holds its own per-characteristic lock; the app methods
//! that notify take that same lock. Those callbacks must not take the app lock
//! and instead queue their event for the idle loop to deliver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

use log::*;

use crate::callbacks::RemoteServiceObserver;

static POISON_REPORTED: AtomicBool = AtomicBool::new(false);

/// Lock shared state, recovering it if a previous holder panicked.
///
/// The first recovery is logged; events keep flowing afterwards.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        if !POISON_REPORTED.swap(true, Ordering::Relaxed) {
            error!("Application state lock poisoned, recovering");
        }
        poisoned.into_inner()
    })
}

/// Create the handoff for Button characteristic subscription changes
pub fn subscription_channel() -> (SubscriptionSender, SubscriptionQueue) {
    let (tx, rx) = mpsc::channel();
    (SubscriptionSender(tx), SubscriptionQueue(rx))
}

/// Sending half, owned by the stack's subscribe callback
#[derive(Clone)]
pub struct SubscriptionSender(Sender<bool>);

impl SubscriptionSender {
    /// Queue a subscription change; never blocks
    pub fn send(&self, enabled: bool) {
        if self.0.send(enabled).is_err() {
            warn!("Subscription change dropped, idle loop is gone");
        }
    }
}

/// Receiving half, drained by the idle loop
pub struct SubscriptionQueue(Receiver<bool>);

impl SubscriptionQueue {
    /// Deliver every queued change to `observer` in arrival order
    pub fn deliver<O: RemoteServiceObserver + ?Sized>(&self, observer: &mut O) -> usize {
        let mut delivered = 0;
        while let Ok(enabled) = self.0.try_recv() {
            observer.notifications_changed(enabled);
            delivered += 1;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::Connection;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        changes: Vec<bool>,
    }

    impl RemoteServiceObserver for Recorder {
        fn notifications_changed(&mut self, enabled: bool) {
            self.changes.push(enabled);
        }

        fn data_received(&mut self, _conn: &Connection, _data: &[u8]) {}
    }

    #[test]
    fn subscription_changes_arrive_in_order() {
        let (tx, queue) = subscription_channel();
        let mut observer = Recorder::default();
        assert_eq!(queue.deliver(&mut observer), 0);

        tx.send(true);
        tx.send(false);
        tx.send(true);
        assert_eq!(queue.deliver(&mut observer), 3);
        assert_eq!(observer.changes, vec![true, false, true]);
        assert_eq!(queue.deliver(&mut observer), 0);
    }

    #[test]
    fn sending_while_app_is_locked_does_not_wait() {
        let app = Arc::new(Mutex::new(Recorder::default()));
        let (tx, queue) = subscription_channel();

        let guard = lock(&app);
        let sender = tx.clone();
        std::thread::spawn(move || sender.send(true)).join().unwrap();
        drop(guard);

        queue.deliver(&mut *lock(&app));
        assert_eq!(lock(&app).changes, vec![true]);
    }

    #[test]
    fn send_after_queue_dropped_is_ignored() {
        let (tx, queue) = subscription_channel();
        drop(queue);
        tx.send(true);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let shared = Arc::new(Mutex::new(1u32));
        let holder = shared.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.lock().unwrap();
            panic!("callback panicked");
        })
        .join();
        assert!(shared.is_poisoned());

        *lock(&shared) += 1;
        assert_eq!(*lock(&shared), 2);
    }
}
