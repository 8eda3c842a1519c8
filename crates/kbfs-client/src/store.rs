//! Actor that owns model mutation.
//!
//! Events from any number of producers funnel through one mpsc channel into a
//! single task, which applies them one at a time. Readers never wait on that
//! task: they take a read guard on the shared state.
//!
//! ```text
//!   StoreHandle (Clone, Send+Sync)   mpsc     StoreActor (tokio task)
//!   ┌───────────────────────────┐  ──────▶  ┌─────────────────────────┐
//!   │ .send(event)              │           │ FsState::apply(event)   │──▶ FsRequest
//!   │ .barrier()                │  ◀──────  │ bump generation         │    (backend)
//!   │ .read(|state| ..)         │  oneshot  │ broadcast StoreChange   │
//!   └───────────────────────────┘           └─────────────────────────┘
//! ```
//!
//! Change notifications carry a monotonically increasing generation. A
//! subscriber that lags behind the broadcast buffer sees a gap in
//! generations and should re-read whatever it renders.

use std::sync::Arc;

use kbfs_types::{EditId, Path};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace};

use crate::config::ModelConfig;
use crate::event::{ChangeScope, FsEvent};
use crate::request::FsRequest;
use crate::state::FsState;

/// Shared model, read by renderers and written only by the actor.
pub type SharedFsState = Arc<RwLock<FsState>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store shut down")]
    Shutdown,
}

/// Emitted after each applied event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StoreChange {
    pub generation: u64,
    pub scope: ChangeScope,
}

enum StoreCommand {
    Apply(FsEvent),
    Barrier { reply: oneshot::Sender<u64> },
}

// ============================================================================
// StoreHandle (Send + Sync public API)
// ============================================================================

#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreCommand>,
    state: SharedFsState,
    changes: broadcast::Sender<StoreChange>,
}

impl StoreHandle {
    /// Queue an event. Events from one handle are applied in send order.
    pub fn send(&self, event: FsEvent) -> Result<(), StoreError> {
        self.tx
            .send(StoreCommand::Apply(event))
            .map_err(|_| StoreError::Shutdown)
    }

    /// Queue a new-folder row under `parent` and return its edit id.
    pub fn new_folder(&self, parent: Path) -> Result<EditId, StoreError> {
        let edit_id = EditId::new();
        self.send(FsEvent::NewFolderRow {
            parent_path: parent,
            edit_id: Some(edit_id),
        })?;
        Ok(edit_id)
    }

    /// Resolve once every event sent before this call has been applied.
    /// Returns the generation at that point.
    pub async fn barrier(&self) -> Result<u64, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Barrier { reply })
            .map_err(|_| StoreError::Shutdown)?;
        rx.await.map_err(|_| StoreError::Shutdown)
    }

    /// Run `f` against the current state under a read guard.
    pub fn read<R>(&self, f: impl FnOnce(&FsState) -> R) -> R {
        f(&self.state.read())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

// ============================================================================
// StoreActor (internal)
// ============================================================================

struct StoreActor {
    state: SharedFsState,
    changes: broadcast::Sender<StoreChange>,
    requests: mpsc::UnboundedSender<FsRequest>,
    generation: u64,
}

impl StoreActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<StoreCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                StoreCommand::Apply(event) => self.apply(event),
                StoreCommand::Barrier { reply } => {
                    let _ = reply.send(self.generation);
                }
            }
        }
        debug!(generation = self.generation, "store shutting down: channel closed");
    }

    #[tracing::instrument(skip_all, name = "store.apply", fields(generation = self.generation + 1))]
    fn apply(&mut self, event: FsEvent) {
        let scope = event.scope();
        let requests = self.state.write().apply(event);
        self.generation += 1;

        for request in requests {
            trace!(request = request.kind(), "dispatching request");
            if self.requests.send(request).is_err() {
                debug!("request receiver dropped");
            }
        }

        // No subscribers is fine.
        let _ = self.changes.send(StoreChange {
            generation: self.generation,
            scope,
        });
    }
}

// ============================================================================
// Public spawn function
// ============================================================================

/// Spawn the store actor on the current tokio runtime.
///
/// Returns the handle and the receiver on which outbound requests for the
/// backend arrive. The actor stops once every handle is dropped.
pub fn spawn_store(config: &ModelConfig) -> (StoreHandle, mpsc::UnboundedReceiver<FsRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (requests, requests_rx) = mpsc::unbounded_channel();
    let (changes, _) = broadcast::channel(config.change_buffer.max(1));
    let state: SharedFsState = Arc::new(RwLock::new(FsState::new(config)));

    let actor = StoreActor {
        state: Arc::clone(&state),
        changes: changes.clone(),
        requests,
        generation: 0,
    };
    tokio::spawn(actor.run(rx));
    info!(change_buffer = config.change_buffer, "store spawned");

    (StoreHandle { tx, state, changes }, requests_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbfs_types::RefreshTag;

    #[tokio::test]
    async fn test_barrier_orders_after_sends() {
        let (store, mut requests) = spawn_store(&ModelConfig::default());
        let path = Path::parse("/keybase/team/acme").unwrap();
        store
            .send(FsEvent::LoadFolder {
                tag: RefreshTag::PrimaryView,
                path: path.clone(),
            })
            .unwrap();
        assert_eq!(store.barrier().await.unwrap(), 1);
        assert_eq!(requests.recv().await, Some(FsRequest::List { path: path.clone() }));
        assert!(store.read(|s| s.refresh().is_loading(&path)));
    }

    #[tokio::test]
    async fn test_subscribers_see_generations() {
        let (store, _requests) = spawn_store(&ModelConfig::default());
        let mut changes = store.subscribe();
        store.send(FsEvent::FullReload).unwrap();
        store.send(FsEvent::PickerClose).unwrap();

        let first = changes.recv().await.unwrap();
        let second = changes.recv().await.unwrap();
        assert_eq!(first, StoreChange { generation: 1, scope: ChangeScope::All });
        assert_eq!(second.generation, 2);
        assert_eq!(second.scope, ChangeScope::Picker);
    }

    #[tokio::test]
    async fn test_new_folder_returns_edit_id() {
        let (store, _requests) = spawn_store(&ModelConfig::default());
        let parent = Path::parse("/keybase/private/alice").unwrap();
        let id = store.new_folder(parent.clone()).unwrap();
        store.barrier().await.unwrap();
        let edit = store.read(|s| s.edits().get(id).cloned()).unwrap();
        assert_eq!(edit.parent_path, parent);
        assert_eq!(edit.name, "New Folder");
    }
}
