use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::{Context, Result};

use crate::scanner;
use crate::scanner::types::{ScanEvent, ScanRequest};

/// Default bound on the scan-event queue. A session producing faster than
/// the interactive context drains blocks its own scan thread, never the
/// consumer.
pub const DEFAULT_QUEUE_LEN: usize = 1024;

/// Collaborator interface a session owner exposes to the channel.
pub trait SessionHandler {
    fn id(&self) -> u64;
    fn path(&self) -> &Path;
    fn depth(&self) -> u32;
    fn on_event(&mut self, event: &ScanEvent);
}

/// Multiplexes independent scan sessions over one bounded event queue.
///
/// Ownership follows the two-context model: scan threads only produce
/// immutable event values; the thread that owns the `SyncChannel` is the
/// only one that registers handlers and drains events via [`pump`]
/// (Self::pump). Cancellation flags are the sole state shared across the
/// boundary.
pub struct SyncChannel<H: SessionHandler> {
    handlers: HashMap<u64, H>,
    event_tx: mpsc::SyncSender<ScanEvent>,
    event_rx: mpsc::Receiver<ScanEvent>,
    /// Live sessions' cancellation flags, keyed by session id. Scan
    /// threads remove their own entry on completion.
    cancel_flags: Arc<Mutex<HashMap<u64, Arc<AtomicBool>>>>,
    /// Ids cancelled on this side; queued events for them are dropped.
    cancelled: HashSet<u64>,
    workers: Vec<JoinHandle<()>>,
}

impl<H: SessionHandler> SyncChannel<H> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_LEN)
    }

    pub fn with_capacity(queue_len: usize) -> Self {
        let (event_tx, event_rx) = mpsc::sync_channel(queue_len);
        Self {
            handlers: HashMap::new(),
            event_tx,
            event_rx,
            cancel_flags: Arc::new(Mutex::new(HashMap::new())),
            cancelled: HashSet::new(),
            workers: Vec::new(),
        }
    }

    /// Register the handler for its session id. At most one handler per
    /// session: registering twice replaces the previous one.
    pub fn subscribe(&mut self, handler: H) {
        let id = handler.id();
        if self.handlers.insert(id, handler).is_some() {
            tracing::debug!(session = id, "session handler replaced");
        }
    }

    pub fn unsubscribe(&mut self, id: u64) -> Option<H> {
        self.handlers.remove(&id)
    }

    pub fn handler(&self, id: u64) -> Option<&H> {
        self.handlers.get(&id)
    }

    pub fn handler_mut(&mut self, id: u64) -> Option<&mut H> {
        self.handlers.get_mut(&id)
    }

    pub fn handlers_mut(&mut self) -> impl Iterator<Item = &mut H> {
        self.handlers.values_mut()
    }

    /// Enqueue a scan session. Each session runs on its own thread so one
    /// scan never blocks another; within a session traversal is
    /// sequential.
    pub fn request(&mut self, request: ScanRequest) -> Result<()> {
        let session = request.session_id;
        let flag = Arc::new(AtomicBool::new(false));
        {
            let mut flags = self
                .cancel_flags
                .lock()
                .map_err(|_| anyhow::anyhow!("cancel registry poisoned"))?;
            flags.insert(session, flag.clone());
        }

        let tx = self.event_tx.clone();
        let registry = self.cancel_flags.clone();
        let handle = std::thread::Builder::new()
            .name(format!("canopy-scan-{session}"))
            .spawn(move || {
                let mut emit = |event: ScanEvent| {
                    // A closed channel means the consumer is gone; flip the
                    // session's own flag so the traversal unwinds quietly.
                    if tx.send(event).is_err() {
                        flag.store(true, Ordering::Relaxed);
                    }
                };
                if let Err(e) = scanner::scan(&request, &mut emit, &flag) {
                    tracing::warn!(session, error = %e, "scan session failed");
                }
                if let Ok(mut flags) = registry.lock() {
                    flags.remove(&session);
                }
            })
            .context("failed to spawn scan thread")?;
        self.workers.push(handle);
        Ok(())
    }

    /// Cancel a session. Idempotent: unknown or already-finished ids are a
    /// no-op. After this returns, [`pump`](Self::pump) delivers no further
    /// events for the id.
    pub fn cancel(&mut self, id: u64) {
        self.cancelled.insert(id);
        if let Ok(flags) = self.cancel_flags.lock() {
            if let Some(flag) = flags.get(&id) {
                flag.store(true, Ordering::Relaxed);
                tracing::debug!(session = id, "scan session cancelled");
            }
        }
    }

    /// Whether any session threads are still running.
    pub fn has_live_sessions(&self) -> bool {
        self.cancel_flags
            .lock()
            .map(|flags| !flags.is_empty())
            .unwrap_or(false)
    }

    /// Drain the event queue without blocking and dispatch to the
    /// registered handlers. Redundant stats events per (session, path) are
    /// coalesced to the newest; per-session order is otherwise preserved.
    /// Returns the number of events delivered.
    pub fn pump(&mut self) -> usize {
        let mut batch = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            if !self.cancelled.contains(&event.session_id()) {
                batch.push(event);
            }
        }
        coalesce_stats(&mut batch);

        let mut delivered = 0;
        for event in &batch {
            if let Some(handler) = self.handlers.get_mut(&event.session_id()) {
                handler.on_event(event);
                delivered += 1;
            }
        }
        delivered
    }

    /// Block until every session thread has finished. Diagnostic/test
    /// helper; the interactive context never calls this mid-frame.
    pub fn wait_idle(&mut self) {
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl<H: SessionHandler> Default for SyncChannel<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep only the newest `FolderStats` per (session, path) in a drained
/// batch, preserving the order of everything that survives.
fn coalesce_stats(events: &mut Vec<ScanEvent>) {
    let mut last: HashMap<(u64, std::path::PathBuf), usize> = HashMap::new();
    for (i, event) in events.iter().enumerate() {
        if let ScanEvent::FolderStats { session_id, path, .. } = event {
            last.insert((*session_id, path.clone()), i);
        }
    }
    let mut i = 0;
    events.retain(|event| {
        let keep = match event {
            ScanEvent::FolderStats { session_id, path, .. } => {
                last[&(*session_id, path.clone())] == i
            }
            _ => true,
        };
        i += 1;
        keep
    });
}
