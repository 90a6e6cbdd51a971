//! Hot reload of provider definitions.
//!
//! One `notify` watcher per provider directory turns filesystem events into
//! typed [`WatchEvent`]s on a bounded channel. A single consumer,
//! [`apply_events`], owns every registry mutation caused by the filesystem,
//! so events are applied in the order they were observed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use yuzu_common::paths::is_provider_file;

use crate::metadata::{LoadMode, ProviderRegistry};

const EVENT_BUFFER: usize = 1000;

/// A registry mutation requested by the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A definition file was created, written or moved in.
    Load(PathBuf),
    /// A definition file was removed or moved out.
    Unload(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Load(path) | WatchEvent::Unload(path) => path,
        }
    }
}

/// Translate a raw `notify` event into registry operations.
///
/// Paths without an allowed extension are dropped. Directory filtering
/// happens when the event is applied, since the path may be gone by then.
pub fn classify(event: &Event, extensions: &[String]) -> Vec<WatchEvent> {
    let wanted = |path: &&PathBuf| is_provider_file(path, extensions);
    let load = |path: &PathBuf| WatchEvent::Load(path.clone());
    let unload = |path: &PathBuf| WatchEvent::Unload(path.clone());

    match event.kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To))
        | EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            event.paths.iter().filter(wanted).map(load).collect()
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().filter(wanted).map(unload).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut out = Vec::with_capacity(2);
            if let Some(from) = event.paths.first().filter(wanted) {
                out.push(unload(from));
            }
            if let Some(to) = event.paths.get(1).filter(wanted) {
                out.push(load(to));
            }
            out
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .filter(wanted)
            .map(|p| if p.exists() { load(p) } else { unload(p) })
            .collect(),
        _ => Vec::new(),
    }
}

/// Live `notify` watchers. Watching stops when this is dropped.
pub struct ProviderWatcher {
    watchers: Vec<RecommendedWatcher>,
}

impl ProviderWatcher {
    /// Number of directories successfully watched.
    pub fn watched(&self) -> usize {
        self.watchers.len()
    }
}

/// Start a recursive watcher for every directory in `dirs`.
///
/// Setup failures are logged and the directory is skipped; the channel
/// closes once every watcher is dropped.
pub fn watch_dirs(
    dirs: &[PathBuf],
    extensions: Vec<String>,
) -> (ProviderWatcher, mpsc::Receiver<WatchEvent>) {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let mut watchers = Vec::new();

    for dir in dirs {
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "provider directory does not exist, not watching");
            continue;
        }

        let tx = tx.clone();
        let extensions = extensions.clone();
        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for watch_event in classify(&event, &extensions) {
                    if tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "file watcher error"),
        };

        let watcher = notify::recommended_watcher(handler).and_then(|mut w| {
            w.watch(dir, RecursiveMode::Recursive)?;
            Ok(w)
        });

        match watcher {
            Ok(w) => {
                tracing::info!(path = %dir.display(), "watching provider directory");
                watchers.push(w);
            }
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "could not setup file watcher, please restart the server if config files change"
                );
            }
        }
    }

    (ProviderWatcher { watchers }, rx)
}

/// Apply one event to the registry. Failures are logged, never returned.
pub fn apply_event(registry: &ProviderRegistry, event: &WatchEvent) {
    match event {
        WatchEvent::Load(path) => {
            if !path.is_file() {
                tracing::debug!(path = %path.display(), "ignoring non-file path");
                return;
            }
            if let Err(e) = registry.load(path, LoadMode::Reload) {
                tracing::warn!(path = %path.display(), error = %e, "failed to reload provider");
                return;
            }
        }
        WatchEvent::Unload(path) => {
            registry.unload(path);
        }
    }
    tracing::info!(ids = ?registry.ids(), "providers");
}

/// Consume watch events until `cancel` fires or the channel closes.
pub async fn apply_events(
    registry: Arc<ProviderRegistry>,
    mut events: mpsc::Receiver<WatchEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("provider watcher cancelled");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("provider watch channel closed");
                    break;
                };
                tracing::debug!(event = ?event, "provider file event");
                apply_event(&registry, &event);
            }
        }
    }
}

/// Watch `dirs` and keep `registry` in sync until `cancel` fires.
pub async fn run_watcher(
    registry: Arc<ProviderRegistry>,
    dirs: Vec<PathBuf>,
    cancel: CancellationToken,
) {
    let (watcher, events) = watch_dirs(&dirs, registry.extensions().to_vec());
    if watcher.watched() == 0 {
        tracing::info!("no provider directories watched");
    }
    apply_events(registry, events, cancel).await;
    drop(watcher);
    tracing::info!("provider watcher stopped");
}
