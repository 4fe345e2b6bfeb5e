//! Debounced watch of the themes root.
//!
//! Filesystem events (or manual [`ThemeMonitor::notify_change`] calls) reset
//! a single deadline; when it passes, the cache is dropped and every
//! registered callback runs once.

use super::cache::ThemeCache;
use crate::common::{EngineError, EngineResult};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

type CallbackList = Arc<Mutex<Vec<ChangeCallback>>>;

pub struct ThemeMonitor {
    trigger: mpsc::UnboundedSender<()>,
    callbacks: CallbackList,
    cancel_token: CancellationToken,
    watcher: Option<RecommendedWatcher>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for ThemeMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeMonitor")
            .field("watching", &self.watcher.is_some())
            .field("stopped", &self.cancel_token.is_cancelled())
            .finish()
    }
}

fn fire(cache: &ThemeCache, callbacks: &CallbackList) {
    cache.invalidate();
    let snapshot: Vec<ChangeCallback> = match callbacks.lock() {
        Ok(list) => list.clone(),
        Err(_) => return,
    };
    log::debug!("Theme directory changed; notifying {} listener(s)", snapshot.len());
    for callback in snapshot {
        callback();
    }
}

async fn debounce_loop(
    mut events: mpsc::UnboundedReceiver<()>,
    debounce: Duration,
    cache: Arc<ThemeCache>,
    callbacks: CallbackList,
    cancel_token: CancellationToken,
) {
    let mut deadline: Option<Instant> = None;
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            event = events.recv() => match event {
                Some(()) => deadline = Some(Instant::now() + debounce),
                None => break,
            },
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                fire(&cache, &callbacks);
            }
        }
    }
}

impl ThemeMonitor {
    /// Spawns the debounce task. Needs a running tokio runtime.
    pub fn new(debounce: Duration, cache: Arc<ThemeCache>) -> Self {
        let (trigger, events) = mpsc::unbounded_channel();
        let callbacks: CallbackList = Arc::new(Mutex::new(Vec::new()));
        let cancel_token = CancellationToken::new();

        let task = tokio::spawn(debounce_loop(
            events,
            debounce,
            cache,
            Arc::clone(&callbacks),
            cancel_token.clone(),
        ));

        Self {
            trigger,
            callbacks,
            cancel_token,
            watcher: None,
            task,
        }
    }

    /// Starts delivering filesystem events under `root` into the debounce.
    pub fn watch(&mut self, root: &Path) -> EngineResult<()> {
        let trigger = self.trigger.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if !matches!(event.kind, EventKind::Access(_)) => {
                    let _ = trigger.send(());
                }
                Ok(_) => {}
                Err(e) => log::warn!("Theme watcher error: {e}"),
            }
        })
        .map_err(|e| EngineError::Watch(e.to_string()))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| EngineError::Watch(format!("{}: {e}", root.display())))?;

        log::info!("Watching {} for theme changes", root.display());
        self.watcher = Some(watcher);
        Ok(())
    }

    pub fn register_callback(&self, callback: ChangeCallback) {
        if let Ok(mut list) = self.callbacks.lock() {
            list.push(callback);
        }
    }

    /// Feeds a change into the debounce as if the watcher had seen one.
    pub fn notify_change(&self) {
        let _ = self.trigger.send(());
    }

    pub fn is_running(&self) -> bool {
        !self.cancel_token.is_cancelled() && !self.task.is_finished()
    }

    /// Stops watching and drops any pending deadline.
    pub fn stop(&mut self) {
        self.watcher = None;
        self.cancel_token.cancel();
    }
}

impl Drop for ThemeMonitor {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
