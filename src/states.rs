use generational_box::{
    AnyStorage, BorrowError, BorrowMutError, GenerationalBox, Owner, SyncStorage,
};
use rand::Rng;
use std::fmt::Display;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::random_id::RandomId;

/// Storage for every state cell a session creates.
///
/// Owns the generational-box arena, so cells die with the session, and the
/// change channel the session loop drains to push updates to the client.
pub(crate) struct States {
    owner: Owner<SyncStorage>,

    pub(crate) changes_rx: UnboundedReceiver<(RandomId, String)>,
    changes_tx: UnboundedSender<(RandomId, String)>,
}

impl States {
    pub(crate) fn create<T, R>(&mut self, rng: &mut R, value: T) -> State<T>
    where
        T: Display + Send + Sync + 'static,
        R: Rng,
    {
        State {
            inner: self.owner.insert(StateInner {
                value,
                changes_tx: self.changes_tx.clone(),
            }),
            id: RandomId::from_rng(rng),
        }
    }
}

impl Default for States {
    fn default() -> Self {
        let (changes_tx, changes_rx) = unbounded_channel();

        Self {
            owner: <SyncStorage as AnyStorage>::owner(),
            changes_rx,
            changes_tx,
        }
    }
}

/// A reactive cell. Writing it queues an update for the client.
pub struct State<T: 'static> {
    pub(crate) inner: GenerationalBox<StateInner<T>, SyncStorage>,
    pub(crate) id: RandomId,
}

// we implement Copy and Clone instead of deriving them, cause we dont need the
// `T: Clone` bound
impl<T: 'static> Clone for State<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: 'static> Copy for State<T> {}

pub(crate) struct StateInner<T: 'static> {
    pub(crate) value: T,
    pub(crate) changes_tx: UnboundedSender<(RandomId, String)>,
}

/// Type returned by [`State::get`].
pub type StateRef<'a, T> = <SyncStorage as AnyStorage>::Ref<'a, T>;

impl<T: Send + Sync + 'static> State<T> {
    pub fn get(&self) -> StateRef<'_, T> {
        self.try_get().unwrap()
    }

    pub fn try_get(&self) -> Result<StateRef<'_, T>, BorrowError> {
        let inner = self.inner.try_read()?;

        Ok(SyncStorage::map(inner, |inner| &inner.value))
    }
}

impl<T: Display + Send + Sync + 'static> State<T> {
    pub fn set(&self, value: T) {
        self.try_set(value).unwrap()
    }

    pub fn try_set(&self, value: T) -> Result<(), BorrowMutError> {
        let display = value.to_string();

        let mut inner = self.inner.try_write()?;
        inner.value = value;
        let changes_tx = inner.changes_tx.clone();
        drop(inner);

        // the session may already be gone; a change nobody can see is fine
        let _ = changes_tx.send((self.id, display));

        Ok(())
    }

    pub fn modify(&self, f: impl FnOnce(&T) -> T) {
        self.try_modify(f).unwrap()
    }

    pub fn try_modify(&self, f: impl FnOnce(&T) -> T) -> Result<(), ModifyError> {
        let value = {
            let current = self.try_get().map_err(ModifyError::Read)?;
            f(&current)
        };
        self.try_set(value).map_err(ModifyError::Write)?;

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModifyError {
    #[error("state is currently borrowed")]
    Read(BorrowError),
    #[error("state is currently mutably borrowed")]
    Write(BorrowMutError),
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn states_and_rng() -> (States, StdRng) {
        (States::default(), StdRng::seed_from_u64(0))
    }

    #[test]
    fn set_updates_the_value_and_queues_the_display() {
        let (mut states, mut rng) = states_and_rng();
        let state = states.create(&mut rng, 3u32);

        state.set(5);

        assert_eq!(5, *state.get());
        assert_eq!(
            Some((state.id, "5".to_string())),
            states.changes_rx.try_recv().ok()
        );
    }

    #[test]
    fn modify_reads_the_current_value() {
        let (mut states, mut rng) = states_and_rng();
        let state = states.create(&mut rng, 10u32);

        state.modify(|n| n + 1);
        state.modify(|n| n + 1);

        assert_eq!(12, *state.get());
    }

    #[test]
    fn cells_die_with_their_session() {
        let (mut states, mut rng) = states_and_rng();
        let state = states.create(&mut rng, 0u32);

        drop(states);

        assert!(state.try_get().is_err());
        assert!(state.try_set(1).is_err());
    }
}
