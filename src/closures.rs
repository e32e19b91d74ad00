use generational_box::{AnyStorage, GenerationalBox, Owner, SyncStorage};
use rand::Rng;
use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinSet,
};

use crate::random_id::RandomId;

/// The session's registered closures, run on the session's task set when the
/// client clicks something or server code calls them.
pub(crate) struct Closures {
    owner: Owner<SyncStorage>,
    closures: HashMap<RandomId, Arc<dyn ClosureFn>>,

    pub(crate) call_rx: UnboundedReceiver<RandomId>,
    call_tx: UnboundedSender<RandomId>,

    pub(crate) tasks: JoinSet<()>,
}

impl Closures {
    pub(crate) fn create<F, Fut>(&mut self, rng: &mut impl Rng, func: F) -> Closure
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = RandomId::from_rng(rng);
        self.closures.insert(id, Arc::new(func));

        Closure {
            id,
            inner: self.owner.insert(ClosureInner {
                call_tx: self.call_tx.clone(),
            }),
        }
    }

    pub(crate) fn run(&mut self, id: RandomId) {
        let Some(closure) = self.closures.get(&id) else {
            tracing::warn!(%id, "no closure registered under this id");
            return;
        };

        let closure = closure.clone();
        self.tasks.spawn(async move { closure.call().await });
    }
}

impl Default for Closures {
    fn default() -> Self {
        let (call_tx, call_rx) = unbounded_channel();

        Self {
            owner: <SyncStorage as AnyStorage>::owner(),
            closures: Default::default(),
            call_rx,
            call_tx,
            tasks: JoinSet::new(),
        }
    }
}

/// Handle to a registered closure. Rendered into an attribute it becomes a
/// client-side call; [`Closure::call`] queues it from server code.
#[derive(Clone, Copy)]
pub struct Closure {
    pub(crate) id: RandomId,
    inner: GenerationalBox<ClosureInner, SyncStorage>,
}

pub(crate) struct ClosureInner {
    call_tx: UnboundedSender<RandomId>,
}

impl Closure {
    /// Queues the closure to be run.
    ///
    /// Note: this doesn't call the closure immediately; it will not run until
    /// the websocket session is established. After teardown it is a no-op.
    pub fn call(&self) {
        let Ok(inner) = self.inner.try_read() else {
            return;
        };
        let _ = inner.call_tx.send(self.id);
    }
}

/// Trait used to type-erase all closures, so they can be stored in the same
/// `HashMap`.
pub(crate) trait ClosureFn: Send + Sync {
    fn call(&self) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

impl<F, Fut> ClosureFn for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(self())
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;

    #[tokio::test]
    async fn runs_a_closure_that_updates_a_counter() {
        let mut ctx = Context::new(0);

        let state = ctx.use_state(0u32);
        let closure = ctx.use_closure(move || async move {
            state.set(1);
        });

        // run directly; going through call() needs the session loop
        ctx.closures.run(closure.id);
        ctx.closures.tasks.join_next().await.unwrap().unwrap();

        assert_eq!(1, *state.get());
    }

    #[tokio::test]
    async fn runs_a_closure_that_updates_a_string() {
        let mut ctx = Context::new(0);

        let state = ctx.use_state("my string".to_string());
        let closure = ctx.use_closure(move || async move {
            state.set("other string".to_string());
        });

        ctx.closures.run(closure.id);
        ctx.closures.tasks.join_next().await.unwrap().unwrap();

        assert_eq!("other string", state.get().as_str());
    }

    #[tokio::test]
    async fn call_queues_the_closure_by_id() {
        let mut ctx = Context::new(0);

        let closure = ctx.use_closure(|| async {});
        closure.call();

        assert_eq!(Some(closure.id), ctx.closures.call_rx.recv().await);
    }
}
