use crate::{bridge_info, bridge_warn};
use core_types::NavigationIntent;
use futures_channel::mpsc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// The UI's three navigation entry points.
///
/// Implementations are not expected to be reentrant. The dispatcher guarantees that at
/// most one of these methods runs at a time.
pub trait NavigationTarget: Send {
    fn move_up(&mut self);
    fn move_down(&mut self);
    fn enter(&mut self);
}

/// Serializes intent delivery from every link onto one [`NavigationTarget`].
///
/// Cloning is cheap; all clones deliver to the same target under the same lock, so
/// calls made from a reader thread and from the host's poll timer never interleave.
#[derive(Clone)]
pub struct IntentDispatcher {
    target: Arc<Mutex<Box<dyn NavigationTarget>>>,
    delivered: Arc<AtomicU64>,
}

impl IntentDispatcher {
    pub fn new<T>(target: T) -> Self
    where
        T: NavigationTarget + 'static,
    {
        Self {
            target: Arc::new(Mutex::new(Box::new(target))),
            delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Deliver one intent synchronously.
    ///
    /// Returns once the corresponding entry point has returned. A target that panicked
    /// during an earlier call does not block later deliveries.
    pub fn dispatch(&self, intent: NavigationIntent) {
        bridge_info!("{}", intent.action_label());

        let mut target = match self.target.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                bridge_warn!("UI target panicked during a previous call; continuing");
                poisoned.into_inner()
            }
        };

        match intent {
            NavigationIntent::MoveUp => target.move_up(),
            NavigationIntent::MoveDown => target.move_down(),
            NavigationIntent::Enter => target.enter(),
        }

        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Total intents delivered through this dispatcher and its clones.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for IntentDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentDispatcher")
            .field("delivered", &self.delivered())
            .finish()
    }
}

/// A [`NavigationTarget`] that posts intents to a UI event loop instead of calling
/// into the UI directly.
///
/// For hosts whose UI object must stay on its own thread: the host drains the receiver
/// from its loop. Intents are dropped with a warning if the queue is full or the UI side
/// has gone away.
pub struct IntentForwarder {
    tx: mpsc::Sender<NavigationIntent>,
}

impl IntentForwarder {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NavigationIntent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    fn forward(&mut self, intent: NavigationIntent) {
        if let Err(e) = self.tx.try_send(intent) {
            if e.is_disconnected() {
                bridge_warn!("UI event loop gone, dropping {:?}", intent);
            } else {
                bridge_warn!("UI event queue full, dropping {:?}", intent);
            }
        }
    }
}

impl NavigationTarget for IntentForwarder {
    fn move_up(&mut self) {
        self.forward(NavigationIntent::MoveUp);
    }

    fn move_down(&mut self) {
        self.forward(NavigationIntent::MoveDown);
    }

    fn enter(&mut self) {
        self.forward(NavigationIntent::Enter);
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use futures::stream::StreamExt;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<&'static str>>>,
        busy: Arc<AtomicBool>,
        overlapped: Arc<AtomicBool>,
    }

    impl Recorder {
        fn record(&mut self, name: &'static str) {
            if self.busy.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_micros(200));
            self.calls.lock().unwrap().push(name);
            self.busy.store(false, Ordering::SeqCst);
        }
    }

    impl NavigationTarget for Recorder {
        fn move_up(&mut self) {
            self.record("move_up");
        }
        fn move_down(&mut self) {
            self.record("move_down");
        }
        fn enter(&mut self) {
            self.record("enter");
        }
    }

    #[test]
    fn test_dispatch_maps_intents_in_order() {
        let recorder = Recorder::default();
        let dispatcher = IntentDispatcher::new(recorder.clone());

        dispatcher.dispatch(NavigationIntent::MoveUp);
        dispatcher.dispatch(NavigationIntent::MoveDown);
        dispatcher.dispatch(NavigationIntent::Enter);

        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec!["move_up", "move_down", "enter"]
        );
        assert_eq!(dispatcher.delivered(), 3);
    }

    #[test]
    fn test_concurrent_dispatch_never_interleaves() {
        let recorder = Recorder::default();
        let dispatcher = IntentDispatcher::new(recorder.clone());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let d = dispatcher.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        d.dispatch(NavigationIntent::MoveUp);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(!recorder.overlapped.load(Ordering::SeqCst));
        assert_eq!(recorder.calls.lock().unwrap().len(), 100);
        assert_eq!(dispatcher.delivered(), 100);
    }

    #[test]
    fn test_poisoned_target_keeps_delivering() {
        struct Flaky {
            calls: Arc<Mutex<u32>>,
        }
        impl NavigationTarget for Flaky {
            fn move_up(&mut self) {
                panic!("boom");
            }
            fn move_down(&mut self) {
                *self.calls.lock().unwrap() += 1;
            }
            fn enter(&mut self) {}
        }

        let calls = Arc::new(Mutex::new(0));
        let dispatcher = IntentDispatcher::new(Flaky {
            calls: calls.clone(),
        });

        let d = dispatcher.clone();
        let _ = thread::spawn(move || d.dispatch(NavigationIntent::MoveUp)).join();

        dispatcher.dispatch(NavigationIntent::MoveDown);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_forwarder_posts_to_channel() {
        let (forwarder, rx) = IntentForwarder::channel(8);
        let dispatcher = IntentDispatcher::new(forwarder);

        dispatcher.dispatch(NavigationIntent::Enter);
        dispatcher.dispatch(NavigationIntent::MoveDown);
        drop(dispatcher);

        let received: Vec<_> = futures::executor::block_on(rx.collect());
        assert_eq!(
            received,
            vec![NavigationIntent::Enter, NavigationIntent::MoveDown]
        );
    }

    #[test]
    fn test_forwarder_drops_when_receiver_gone() {
        let (forwarder, rx) = IntentForwarder::channel(1);
        drop(rx);
        let dispatcher = IntentDispatcher::new(forwarder);
        dispatcher.dispatch(NavigationIntent::MoveUp);
        assert_eq!(dispatcher.delivered(), 1);
    }
}
