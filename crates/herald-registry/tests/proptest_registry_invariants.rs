//! Property-based invariant tests for `ObserverRegistry`.
//!
//! Each test drives the registry with random operation sequences and checks
//! it against a plain ordered `Vec` model:
//!
//! 1. Membership, length, and delivery order match the model.
//! 2. Add is idempotent; removing an absent observer changes nothing.
//! 3. Mutations made by callbacks during a pass do not alter that pass, and
//!    are fully visible to the next one.
//! 4. Under `SkipRemoved`, a pass delivers to exactly the snapshot members
//!    that were not removed before being visited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use herald_registry::{Invocation, ObserverRegistry, RegistryConfig, RemovalPolicy};
use proptest::prelude::*;

const POOL: usize = 8;

trait Tagged: Send + Sync {
    fn tag(&self) -> usize;
}

struct Tag(usize);

impl Tagged for Tag {
    fn tag(&self) -> usize {
        self.0
    }
}

fn pool() -> Vec<Arc<dyn Tagged>> {
    (0..POOL).map(|i| Arc::new(Tag(i)) as Arc<dyn Tagged>).collect()
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Remove(usize),
    Notify,
}

/// Membership change performed by a callback while visiting `at`.
#[derive(Debug, Clone)]
enum Reentry {
    Add { at: usize, who: usize },
    Remove { at: usize, who: usize },
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..POOL).prop_map(Op::Add),
        2 => (0..POOL).prop_map(Op::Remove),
        1 => Just(Op::Notify),
    ]
}

fn reentry_strategy() -> impl Strategy<Value = Reentry> {
    prop_oneof![
        (0..POOL, 0..POOL).prop_map(|(at, who)| Reentry::Add { at, who }),
        (0..POOL, 0..POOL).prop_map(|(at, who)| Reentry::Remove { at, who }),
    ]
}

fn model_add(model: &mut Vec<usize>, who: usize) {
    if !model.contains(&who) {
        model.push(who);
    }
}

fn model_remove(model: &mut Vec<usize>, who: usize) {
    model.retain(|&m| m != who);
}

fn recorder() -> (Arc<Mutex<Vec<usize>>>, Invocation<dyn Tagged>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let call = Invocation::<dyn Tagged>::new("record", move |o| {
        seen_clone.lock().unwrap().push(o.tag());
    });
    (seen, call)
}

/// Invocation that records each visit and applies the matching reentries
/// to `registry` from inside the callback.
fn reentrant_recorder(
    registry: &Arc<ObserverRegistry<dyn Tagged>>,
    observers: &[Arc<dyn Tagged>],
    plan: &[Reentry],
) -> (Arc<Mutex<Vec<usize>>>, Invocation<dyn Tagged>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let registry = Arc::clone(registry);
    let observers = observers.to_vec();
    let plan = plan.to_vec();
    let call = Invocation::<dyn Tagged>::new("reenter", move |o| {
        let tag = o.tag();
        seen_clone.lock().unwrap().push(tag);
        for step in &plan {
            match *step {
                Reentry::Add { at, who } if at == tag => {
                    registry.add(&observers[who]);
                }
                Reentry::Remove { at, who } if at == tag => {
                    registry.remove(&observers[who]);
                }
                _ => {}
            }
        }
    });
    (seen, call)
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Registry matches an ordered-set model
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn registry_matches_model(ops in proptest::collection::vec(op_strategy(), 0..64)) {
        let observers = pool();
        let registry = ObserverRegistry::<dyn Tagged>::new();
        let mut model: Vec<usize> = Vec::new();

        for op in ops {
            match op {
                Op::Add(who) => {
                    let fresh = !model.contains(&who);
                    prop_assert_eq!(registry.add(&observers[who]), fresh);
                    model_add(&mut model, who);
                }
                Op::Remove(who) => {
                    let present = model.contains(&who);
                    prop_assert_eq!(registry.remove(&observers[who]), present);
                    model_remove(&mut model, who);
                }
                Op::Notify => {
                    let (seen, call) = recorder();
                    let report = registry.notify(&call).unwrap();
                    prop_assert_eq!(report.delivered, model.len());
                    prop_assert_eq!(&*seen.lock().unwrap(), &model);
                }
            }

            prop_assert_eq!(registry.len(), model.len());
            for (i, o) in observers.iter().enumerate() {
                prop_assert_eq!(registry.contains(o), model.contains(&i));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Reentrant mutation is deferred to the next pass
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reentrant_mutation_deferred(
        initial in proptest::collection::vec(0..POOL, 0..POOL),
        plan in proptest::collection::vec(reentry_strategy(), 0..12),
    ) {
        let observers = pool();
        let registry = Arc::new(ObserverRegistry::<dyn Tagged>::new());
        let mut model: Vec<usize> = Vec::new();
        for who in initial {
            registry.add(&observers[who]);
            model_add(&mut model, who);
        }

        let snapshot_model = model.clone();
        let (seen, call) = reentrant_recorder(&registry, &observers, &plan);
        registry.notify(&call).unwrap();

        // The pass visits exactly the starting membership.
        prop_assert_eq!(&*seen.lock().unwrap(), &snapshot_model);

        // Replay the plan against the model in visit order.
        for &tag in &snapshot_model {
            for step in &plan {
                match *step {
                    Reentry::Add { at, who } if at == tag => model_add(&mut model, who),
                    Reentry::Remove { at, who } if at == tag => model_remove(&mut model, who),
                    _ => {}
                }
            }
        }

        let (next_seen, next_call) = recorder();
        registry.notify(&next_call).unwrap();
        prop_assert_eq!(&*next_seen.lock().unwrap(), &model);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. SkipRemoved delivers only to still-registered snapshot members
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn skip_removed_delivers_unremoved_members(
        initial in proptest::collection::vec(0..POOL, 0..POOL),
        removals in proptest::collection::vec((0..POOL, 0..POOL), 0..8),
    ) {
        let observers = pool();
        let config = RegistryConfig::default().with_removal_policy(RemovalPolicy::SkipRemoved);
        let registry = Arc::new(ObserverRegistry::<dyn Tagged>::with_config(config));
        let mut model: Vec<usize> = Vec::new();
        for who in initial {
            registry.add(&observers[who]);
            model_add(&mut model, who);
        }

        let plan: Vec<Reentry> = removals
            .iter()
            .map(|&(at, who)| Reentry::Remove { at, who })
            .collect();
        let (seen, call) = reentrant_recorder(&registry, &observers, &plan);
        let report = registry.notify(&call).unwrap();

        // Walk the snapshot, dropping members removed before their turn.
        let mut removed = Vec::new();
        let mut expected = Vec::new();
        for &tag in &model {
            if removed.contains(&tag) {
                continue;
            }
            expected.push(tag);
            for &(at, who) in &removals {
                if at == tag {
                    removed.push(who);
                }
            }
        }

        prop_assert_eq!(&*seen.lock().unwrap(), &expected);
        prop_assert_eq!(report.delivered + report.skipped_removed, model.len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Dropped observers are never delivered
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dropped_observers_never_delivered(keep in proptest::collection::vec(any::<bool>(), POOL)) {
        let registry = ObserverRegistry::<dyn Tagged>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let mut alive = Vec::new();
        for (i, keep) in keep.iter().enumerate() {
            let o: Arc<dyn Tagged> = Arc::new(Tag(i));
            registry.add(&o);
            if *keep {
                alive.push(o);
            }
        }

        let hits_clone = Arc::clone(&hits);
        let call = Invocation::<dyn Tagged>::new("count", move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        let report = registry.notify(&call).unwrap();

        prop_assert_eq!(hits.load(Ordering::SeqCst), alive.len());
        prop_assert_eq!(report.delivered, alive.len());
        prop_assert_eq!(registry.len(), alive.len());
    }
}
