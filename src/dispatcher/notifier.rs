//! Delivery of reports to feature bindings and external observers.

use crate::builder::Binding;
use crate::core::FeatureKey;
use crate::dispatcher::report::Report;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Something that listens to a dispatcher's reports.
///
/// Observers are held weakly: dropping the last `Arc` ends the
/// subscription without calling [`Dispatcher::unsubscribe`].
///
/// [`Dispatcher::unsubscribe`]: crate::dispatcher::Dispatcher::unsubscribe
pub trait Observer: Send + Sync {
    /// Bindings evaluated against every committed report.
    ///
    /// Read once, when the observer subscribes.
    fn bindings(&self) -> Vec<Binding> {
        Vec::new()
    }

    /// Called with every report, committed or rejected, after the
    /// observer's bindings ran.
    fn on_report(&self, _report: &Report) {}
}

/// Handle returned by a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription#{}", self.0)
    }
}

struct Subscription {
    id: SubscriptionId,
    observer: Weak<dyn Observer>,
    bindings: Vec<Binding>,
}

/// Registry of installed feature bindings and observer subscriptions.
#[derive(Default)]
pub(crate) struct Notifier {
    internal: BTreeMap<FeatureKey, Vec<Binding>>,
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl Notifier {
    /// Install the bindings declared by `key`, unless already installed.
    pub(crate) fn install(&mut self, key: FeatureKey) -> usize {
        if self.internal.contains_key(&key) {
            return 0;
        }
        let bindings = key.bindings();
        if bindings.is_empty() {
            return 0;
        }
        let count = bindings.len();
        debug!(feature = key.name(), count, "bindings installed");
        self.internal.insert(key, bindings);
        count
    }

    /// Remove the bindings installed for `key`.
    pub(crate) fn teardown(&mut self, key: &FeatureKey) -> usize {
        match self.internal.remove(key) {
            Some(bindings) => {
                debug!(feature = key.name(), count = bindings.len(), "bindings torn down");
                bindings.len()
            }
            None => 0,
        }
    }

    pub(crate) fn installed(&self, key: &FeatureKey) -> &[Binding] {
        self.internal.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn subscribe<O: Observer + 'static>(&mut self, observer: &Arc<O>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let weak: Weak<O> = Arc::downgrade(observer);
        let weak: Weak<dyn Observer> = weak;
        let bindings = observer.bindings();
        debug!(%id, bindings = bindings.len(), "observer subscribed");

        self.subscriptions.push(Subscription {
            id,
            observer: weak,
            bindings,
        });
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        before != self.subscriptions.len()
    }

    /// Number of subscribed observers that are still alive.
    pub(crate) fn observer_count(&self) -> usize {
        self.subscriptions
            .iter()
            .filter(|subscription| subscription.observer.strong_count() > 0)
            .count()
    }

    /// Drop subscriptions whose observer has been released.
    fn prune(&mut self) {
        self.subscriptions.retain(|subscription| {
            let alive = subscription.observer.strong_count() > 0;
            if !alive {
                debug!(id = %subscription.id, "released observer pruned");
            }
            alive
        });
    }

    /// Deliver a report: installed feature bindings first, then each live
    /// observer's bindings followed by its `on_report`.
    pub(crate) fn broadcast(&mut self, report: &Report) {
        self.prune();

        let mutations = report.mutations();
        for bindings in self.internal.values() {
            for binding in bindings {
                binding.apply(mutations, &report.snapshot);
            }
        }

        for subscription in &self.subscriptions {
            let Some(observer) = subscription.observer.upgrade() else {
                continue;
            };
            for binding in &subscription.bindings {
                binding.apply(mutations, &report.snapshot);
            }
            observer.on_report(report);
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("installed", &self.internal.keys().collect::<Vec<_>>())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
