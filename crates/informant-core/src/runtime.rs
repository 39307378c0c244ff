//! The UI-owning execution context.
//!
//! Tree reads and writes happen on one thread. Work that originates
//! elsewhere (or that needs the tree while the caller does not hold it) is
//! posted as a [`UiTask`] and runs the next time the owner calls
//! [`UiContext::pump`]. Posting never waits.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::{Error, HostTree, Result};

pub type UiTask = Box<dyn FnOnce(&dyn HostTree) + Send>;

/// Cloneable, thread-safe posting handle.
#[derive(Clone)]
pub struct UiHandle {
    owner: ThreadId,
    queue: Arc<Mutex<VecDeque<UiTask>>>,
}

impl UiHandle {
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Fire-and-forget: queues `task` for the next pump.
    pub fn post(&self, task: impl FnOnce(&dyn HostTree) + Send + 'static) {
        self.queue.lock().push_back(Box::new(task));
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl std::fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle")
            .field("owner", &self.owner)
            .field("pending", &self.pending())
            .finish()
    }
}

/// Owner side of the queue; bound to the thread that created it.
pub struct UiContext {
    handle: UiHandle,
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new()
    }
}

impl UiContext {
    pub fn new() -> Self {
        Self {
            handle: UiHandle {
                owner: thread::current().id(),
                queue: Arc::new(Mutex::new(VecDeque::new())),
            },
        }
    }

    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Runs queued tasks (including ones they post) until the queue is empty.
    /// Returns how many ran.
    pub fn pump(&self, tree: &dyn HostTree) -> Result<usize> {
        if !self.handle.is_ui_thread() {
            return Err(Error::WrongThread);
        }
        let mut ran = 0;
        loop {
            // lock is not held while tasks run; they may post more work
            let batch: Vec<UiTask> = self.handle.queue.lock().drain(..).collect();
            if batch.is_empty() {
                break;
            }
            for task in batch {
                task(tree);
                ran += 1;
            }
        }
        if ran > 0 {
            log::debug!("ui pump ran {ran} task(s)");
        }
        Ok(ran)
    }
}
