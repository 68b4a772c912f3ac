//! Main-thread dispatch
//!
//! Background work must not touch widgets directly. It posts a callback
//! through a [`PostHandle`]; the host drains the queue on its UI thread with
//! [`BindingEngine::run_pending`](crate::BindingEngine::run_pending).

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::engine::BindingEngine;
use crate::sync::lock;
use crate::widget::WidgetTree;

/// Callback executed on the main thread with access to the engine and tree
pub type MainThreadTask = Box<dyn FnOnce(&BindingEngine, &mut WidgetTree) + Send>;

/// Queue of callbacks waiting for the main thread
pub struct MainThread {
    sender: Sender<MainThreadTask>,
    receiver: Mutex<Receiver<MainThreadTask>>,
}

impl MainThread {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    #[must_use]
    pub fn handle(&self) -> PostHandle {
        PostHandle {
            sender: self.sender.clone(),
        }
    }

    /// Take every queued callback without running it
    pub(crate) fn drain(&self) -> Vec<MainThreadTask> {
        lock(&self.receiver).try_iter().collect()
    }
}

impl Default for MainThread {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MainThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainThread").finish_non_exhaustive()
    }
}

/// Cloneable, `Send` handle for posting work to the main thread
#[derive(Clone)]
pub struct PostHandle {
    sender: Sender<MainThreadTask>,
}

impl PostHandle {
    /// Schedule `task`; returns `false` once the engine is gone
    pub fn post(&self, task: impl FnOnce(&BindingEngine, &mut WidgetTree) + Send + 'static) -> bool {
        self.sender.send(Box::new(task)).is_ok()
    }
}

impl fmt::Debug for PostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostHandle").finish_non_exhaustive()
    }
}
