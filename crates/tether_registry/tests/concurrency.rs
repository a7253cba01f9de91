//! Concurrent access tests for `tether_registry`.
//!
//! These tests verify that the injector stays consistent when several
//! threads drive it at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Weak, mpsc};
use std::thread;
use std::time::Duration;
use tether_registry::prelude::*;

trait Clock: Send + Sync {
    fn tick(&self) -> u64;
}

struct Metronome(u64);

impl Clock for Metronome {
    fn tick(&self) -> u64 {
        self.0
    }
}

impl Component for Metronome {
    fn roles(self: Arc<Self>, roles: Roles) -> Roles {
        roles.with::<dyn Clock>(self)
    }
}

struct Spark;
impl Component for Spark {}

#[derive(Default, Consumer)]
struct Watcher {
    #[inject]
    clock: Inject<dyn Clock>,
    #[inject]
    sparks: Collect<Spark>,
}

impl Component for Watcher {}

/// Consumers injected from many threads all see the singleton registered
/// afterwards, and all share one collection.
#[test]
fn concurrent_inject_then_register() {
    let injector = Arc::new(Injector::new());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let injector = Arc::clone(&injector);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let watcher = Arc::new(Watcher::default());
                barrier.wait();
                injector.inject(&watcher).unwrap();
                watcher
            })
        })
        .collect();

    let watchers: Vec<Arc<Watcher>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let metronome = Arc::new(Metronome(60));
    injector.register(&Roles::declared(&metronome));
    injector.add(&Arc::new(Spark));

    for watcher in &watchers {
        assert_eq!(watcher.clock.get().map(|c| c.tick()), Some(60));
        assert_eq!(watcher.sparks.len(), 1);
    }
    assert_eq!(injector.stats().collections, 1);
}

/// Concurrent adds of distinct items all land in the shared list exactly
/// once.
#[test]
fn concurrent_adds_are_all_kept() {
    let injector = Arc::new(Injector::new());
    let sparks = injector.collection::<Spark>();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let injector = Arc::clone(&injector);
            thread::spawn(move || {
                let items: Vec<Arc<Spark>> = (0..25).map(|_| Arc::new(Spark)).collect();
                for item in &items {
                    injector.add(item);
                    injector.add(item);
                }
                items
            })
        })
        .collect();

    let kept: Vec<Arc<Spark>> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(sparks.len(), 100);
    assert!(kept.iter().all(|item| sparks.contains(item)));
}

/// A component whose `Drop` calls back into the injector that held it.
struct Echo {
    injector: Weak<Injector>,
    drops: Arc<AtomicUsize>,
}

impl Echo {
    fn new(injector: &Arc<Injector>, drops: &Arc<AtomicUsize>) -> Arc<Self> {
        Arc::new(Self {
            injector: Arc::downgrade(injector),
            drops: Arc::clone(drops),
        })
    }
}

impl Drop for Echo {
    fn drop(&mut self) {
        if let Some(injector) = self.injector.upgrade() {
            let _ = injector.stats();
        }
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl Component for Echo {}

#[derive(Default, Consumer)]
struct Listener {
    #[inject]
    echo: Inject<Echo>,
}

impl Component for Listener {}

/// Runs `op` on another thread and reports whether it finished in time.
fn finishes(op: impl FnOnce() + Send + 'static) -> bool {
    let (done, finished) = mpsc::channel();
    thread::spawn(move || {
        op();
        let _ = done.send(());
    });
    finished.recv_timeout(Duration::from_secs(5)).is_ok()
}

/// Releasing the last reference during `clear` may re-enter the injector.
#[test]
fn drop_during_clear_can_reenter() {
    let injector = Arc::new(Injector::new());
    let drops = Arc::new(AtomicUsize::new(0));
    let listener = Arc::new(Listener::default());
    injector.inject(&listener).unwrap();

    injector.register(&Roles::declared(&Echo::new(&injector, &drops)));
    injector.add(&Echo::new(&injector, &drops));
    assert!(listener.echo.is_set());

    let worker = Arc::clone(&injector);
    assert!(finishes(move || worker.clear()));
    assert_eq!(drops.load(Ordering::SeqCst), 2);
    assert!(!listener.echo.is_set());
}

struct Vacant;

impl Scene for Vacant {
    fn live(&self) -> Vec<Roles> {
        Vec::new()
    }
}

/// Members dropped by a collection rebuild may re-enter the injector.
#[test]
fn drop_during_rebuild_can_reenter() {
    let injector = Arc::new(Injector::new());
    injector.set_mode(Mode::Inspecting);
    let scene: Arc<dyn Scene> = Arc::new(Vacant);
    injector.set_scene(Arc::downgrade(&scene));

    let drops = Arc::new(AtomicUsize::new(0));
    injector.add(&Echo::new(&injector, &drops));
    assert_eq!(injector.stats().collection_items, 1);

    let worker = Arc::clone(&injector);
    assert!(finishes(move || {
        worker.world_changed();
    }));
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(injector.stats().collection_items, 0);
}
