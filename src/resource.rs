//! Async derived state with latest-wins semantics.
//!
//! A resource watches one trigger state. Every identity change of the trigger
//! starts a fresh load and supersedes whatever load is still in flight: the
//! old request's token is cancelled, and a load that completes anyway is
//! refused at commit time unless its generation is still the newest one and
//! the session is still live. Failed loads keep the previous value on screen;
//! the next trigger change simply tries again.

use std::{
    collections::HashMap,
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    lifecycle::Lifecycle,
    random_id::RandomId,
    states::{State, StateRef},
};

/// Why a load produced no value.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The request was superseded or the session ended. Expected, not a fault.
    #[error("load cancelled")]
    Cancelled,
    /// Transport or decode failure. Keeps the previous value on screen.
    #[error("load failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LoadError {
    pub fn failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(err.into())
    }
}

/// Read handle for a resource's output. The session runtime is the only
/// writer.
pub struct Resource<T: 'static>(pub(crate) State<T>);

// we implement Copy and Clone instead of deriving them, cause we dont need the
// `T: Clone` bound
impl<T: 'static> Clone for Resource<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: 'static> Copy for Resource<T> {}

impl<T: Send + Sync + 'static> Resource<T> {
    pub fn get(&self) -> StateRef<'_, T> {
        self.0.get()
    }
}

type LoadFuture<T> = Pin<Box<dyn Future<Output = Result<T, LoadError>> + Send>>;

/// Trait used to type-erase loaders, so runners can be stored together.
pub(crate) trait Loader<K, T>: Send + Sync + 'static {
    fn load(&self, key: K, cancel: CancellationToken) -> LoadFuture<T>;
}

impl<K, T, F, Fut> Loader<K, T> for F
where
    F: Fn(K, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, LoadError>> + Send + 'static,
{
    fn load(&self, key: K, cancel: CancellationToken) -> LoadFuture<T> {
        Box::pin(self(key, cancel))
    }
}

/// Everything the session needs to drive one resource.
pub(crate) trait AnyResource: Send + Sync + 'static {
    /// Begin a new generation: cancel the superseded load, read the trigger,
    /// and spawn the fresh one onto the session's task set.
    fn start(&self, tasks: &mut JoinSet<()>);
}

struct Runner<K: 'static, T: 'static> {
    source: State<K>,
    output: State<T>,
    loader: Box<dyn Loader<K, T>>,
    lifecycle: Lifecycle,

    /// Monotonically increasing; a load may only commit while its own
    /// generation is still the latest one started.
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<CancellationToken>>,
}

pub(crate) fn runner<K, T>(
    source: State<K>,
    output: State<T>,
    lifecycle: Lifecycle,
    loader: impl Loader<K, T>,
) -> Arc<dyn AnyResource>
where
    K: Clone + Send + Sync + 'static,
    T: Display + Send + Sync + 'static,
{
    Arc::new(Runner {
        source,
        output,
        loader: Box::new(loader),
        lifecycle,
        generation: Arc::new(AtomicU64::new(0)),
        in_flight: Mutex::new(None),
    })
}

impl<K, T> AnyResource for Runner<K, T>
where
    K: Clone + Send + Sync + 'static,
    T: Display + Send + Sync + 'static,
{
    fn start(&self, tasks: &mut JoinSet<()>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // cancel whatever this run supersedes before starting the new request
        let token = self.lifecycle.request_token();
        let superseded = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(token.clone());
        if let Some(superseded) = superseded {
            superseded.cancel();
        }

        let key = match self.source.try_get() {
            Ok(value) => (*value).clone(),
            // the session is tearing down; there is nothing left to load for
            Err(_) => return,
        };

        let future = self.loader.load(key, token.clone());
        let output = self.output;
        let lifecycle = self.lifecycle.clone();
        let generations = Arc::clone(&self.generation);

        tasks.spawn(async move {
            // racing the token means even a loader that ignores it is dropped
            // at its next await point once superseded
            let result = tokio::select! {
                () = token.cancelled() => Err(LoadError::Cancelled),
                result = future => result,
            };

            match result {
                Ok(value) => {
                    let current = generations.load(Ordering::SeqCst);
                    if !still_wanted(&lifecycle, &token, generation, current) {
                        tracing::info!(generation, current, "dropping a superseded load result");
                        return;
                    }

                    output.set(value);
                }
                Err(LoadError::Cancelled) => {
                    tracing::info!(generation, "load cancelled");
                }
                Err(err) => {
                    tracing::error!(generation, error = %err, "load failed, keeping the previous value");
                }
            }
        });
    }
}

/// A result may only be committed while the session is live, the load's token
/// uncancelled, and its generation still the newest one started.
fn still_wanted(
    lifecycle: &Lifecycle,
    token: &CancellationToken,
    generation: u64,
    current: u64,
) -> bool {
    lifecycle.is_live() && !token.is_cancelled() && generation == current
}

/// The session's resources, keyed by the trigger state they watch.
#[derive(Default)]
pub(crate) struct Resources {
    by_source: HashMap<RandomId, Vec<Arc<dyn AnyResource>>>,

    pub(crate) tasks: JoinSet<()>,
}

impl Resources {
    pub(crate) fn insert(&mut self, source: RandomId, runner: Arc<dyn AnyResource>) {
        self.by_source.entry(source).or_default().push(runner);
    }

    /// Run every resource once. The session calls this when it begins, which
    /// is the component's mount.
    pub(crate) fn start_all(&mut self) {
        let runners: Vec<_> = self.by_source.values().flatten().cloned().collect();
        for runner in runners {
            runner.start(&mut self.tasks);
        }
    }

    /// React to one state change: restart every resource watching that id.
    pub(crate) fn trigger(&mut self, id: RandomId) {
        let Some(runners) = self.by_source.get(&id) else {
            return;
        };

        let runners = runners.clone();
        for runner in runners {
            runner.start(&mut self.tasks);
        }
    }
}
