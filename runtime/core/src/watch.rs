use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{AppState, AppStateError};

const DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub enum ReloadEvent {
    Reloaded,
    Failed(Arc<AppStateError>),
}

pub struct WatchHandle {
    pub join_handle: JoinHandle<()>,
    event_tx: broadcast::Sender<ReloadEvent>,
    /// Keep watcher alive for lifetime of handle.
    _watcher: RecommendedWatcher,
}

impl WatchHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.event_tx.subscribe()
    }
}

/// Reloads `state` whenever the file at `path` changes.
///
/// The parent directory is watched rather than the file itself so that
/// editors replacing the file on save are still picked up.
pub fn watch_config(path: PathBuf, state: Arc<Mutex<AppState>>) -> notify::Result<WatchHandle> {
    let (event_tx, _event_rx) = broadcast::channel(16);
    let (notify_tx, mut notify_rx) = mpsc::channel(16);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = notify_tx.blocking_send(res);
    })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    debug!(path = %path.display(), "watching repository connection file");

    let event_tx_clone = event_tx.clone();
    let join_handle = tokio::spawn(async move {
        let event_tx = event_tx_clone;
        let mut deadline: Option<tokio::time::Instant> = None;

        loop {
            let received = match deadline {
                Some(next_deadline) => {
                    tokio::select! {
                        received = notify_rx.recv() => received,
                        _ = tokio::time::sleep_until(next_deadline) => {
                            deadline = None;
                            reload_state(&state, &event_tx).await;
                            continue;
                        }
                    }
                }
                None => notify_rx.recv().await,
            };

            match received {
                Some(Ok(event)) => {
                    if is_relevant(&event, &path) {
                        deadline = Some(tokio::time::Instant::now() + DEBOUNCE);
                    }
                }
                Some(Err(err)) => {
                    // Missed events may hide a change, so reload anyway.
                    warn!(error = %err, "file watcher error");
                    deadline = Some(tokio::time::Instant::now() + DEBOUNCE);
                }
                None => break,
            }
        }
    });

    Ok(WatchHandle {
        join_handle,
        event_tx,
        _watcher: watcher,
    })
}

fn is_relevant(event: &Event, path: &Path) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) | EventKind::Other
    );
    let file_name = path.file_name();
    kind_matches
        && (event.paths.is_empty()
            || event
                .paths
                .iter()
                .any(|changed| changed.file_name() == file_name))
}

async fn reload_state(state: &Arc<Mutex<AppState>>, event_tx: &broadcast::Sender<ReloadEvent>) {
    let mut guard = state.lock().await;
    match guard.reload() {
        Ok(()) => {
            info!(
                path = %guard.config_path().display(),
                repositories = guard.loaded.len(),
                "reloaded repository connections"
            );
            let _ = event_tx.send(ReloadEvent::Reloaded);
        }
        Err(err) => {
            warn!(error = %err, "keeping previous repository connections");
            let _ = event_tx.send(ReloadEvent::Failed(Arc::new(err)));
        }
    }
}
