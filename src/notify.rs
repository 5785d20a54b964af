//! Source lifecycle capability: revision counting, change notification, and
//! resolution snapping.
//!
//! The image source core does not inherit from a base source type; it
//! consumes this small capability interface instead. [`SourceNotifier`] is
//! the provided implementation, but embedders wiring the source into a
//! larger scene graph can supply their own [`SourceLifecycle`].

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Observer callback registered with a [`SourceNotifier`].
pub type ChangeObserver = Box<dyn Fn() + Send + Sync>;

/// Revision and change-notification capability consumed by the source core.
///
/// The revision is a monotonically increasing counter bumped on every
/// configuration change; a retained image is valid only while its stored
/// revision equals the current one.
pub trait SourceLifecycle: Send + Sync {
    /// Current revision counter value.
    fn revision(&self) -> u64;

    /// Bumps the revision and notifies observers that the source changed.
    fn changed(&self);

    /// Snaps a requested resolution to the nearest supported one.
    ///
    /// Sources without a fixed resolution set return the input unchanged.
    fn find_nearest_resolution(&self, resolution: f64) -> f64;
}

/// Default [`SourceLifecycle`] implementation.
///
/// Keeps the revision in an atomic counter, fans change notifications out to
/// registered observers, and optionally snaps resolutions to a fixed list.
#[derive(Default)]
pub struct SourceNotifier {
    revision: AtomicU64,
    observers: Mutex<Vec<ChangeObserver>>,
    /// Supported resolutions, sorted descending (coarsest first).
    resolutions: Option<Vec<f64>>,
}

impl SourceNotifier {
    /// Creates a notifier without a fixed resolution set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier that snaps requests to the given resolutions.
    pub fn with_resolutions(mut resolutions: Vec<f64>) -> Self {
        resolutions.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            revision: AtomicU64::new(0),
            observers: Mutex::new(Vec::new()),
            resolutions: Some(resolutions),
        }
    }

    /// Registers an observer invoked on every [`SourceLifecycle::changed`].
    pub fn subscribe(&self, observer: impl Fn() + Send + Sync + 'static) {
        self.observers.lock().push(Box::new(observer));
    }
}

impl SourceLifecycle for SourceNotifier {
    fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    fn changed(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
        for observer in self.observers.lock().iter() {
            observer();
        }
    }

    fn find_nearest_resolution(&self, resolution: f64) -> f64 {
        match &self.resolutions {
            Some(resolutions) if !resolutions.is_empty() => resolutions
                .iter()
                .copied()
                .min_by(|a, b| {
                    let da = (a - resolution).abs();
                    let db = (b - resolution).abs();
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(resolution),
            _ => resolution,
        }
    }
}
