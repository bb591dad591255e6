// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scanline-parallel worker pool
//!
//! A fixed set of OS threads that execute the same task once per worker and
//! report back. [`WorkerPool::run`] is a synchronous fan-out/join: it returns
//! only after every worker has finished the task, which makes it a full
//! barrier between command batches.
//!
//! Workers know their own index through [`WorkerPool::current_worker_id`];
//! the renderer uses it together with [`WorkerPool::worker_count`] to pick
//! the scanlines it owns (`line % worker_count == worker_id`).
//!
//! # Example
//!
//! ```
//! use rdpx::core::parallel::WorkerPool;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::new(3).unwrap();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = hits.clone();
//! pool.run(move |_id| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//! assert_eq!(hits.load(Ordering::SeqCst), 3);
//! ```

use crate::core::error::Result;
use log::{debug, error};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Task = Arc<dyn Fn(usize) + Send + Sync>;

enum Message {
    Run(Task),
    Shutdown,
}

thread_local! {
    static WORKER_ID: Cell<Option<usize>> = const { Cell::new(None) };
}

struct Worker {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

/// Fixed-size pool of render worker threads
pub struct WorkerPool {
    workers: Vec<Worker>,
    done: Receiver<bool>,
}

impl WorkerPool {
    /// Spawn `count` workers (`0` selects one per available core)
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a thread cannot be spawned.
    pub fn new(count: usize) -> Result<Self> {
        let count = match count {
            0 => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        };

        let (done_tx, done) = mpsc::channel();
        let mut workers = Vec::with_capacity(count);

        for id in 0..count {
            let (sender, receiver) = mpsc::channel::<Message>();
            let done_tx = done_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("rdpx-worker-{}", id))
                .spawn(move || worker_loop(id, receiver, done_tx))?;
            workers.push(Worker {
                sender,
                handle: Some(handle),
            });
        }

        debug!("Worker pool started with {} threads", count);

        Ok(Self { workers, done })
    }

    /// Run `task` once on every worker and wait for all of them
    ///
    /// The task receives the worker index. A panicking task is logged and
    /// counted as finished so the caller never deadlocks.
    pub fn run<F>(&self, task: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let task: Task = Arc::new(task);
        let mut pending = 0;

        for worker in &self.workers {
            if worker.sender.send(Message::Run(task.clone())).is_ok() {
                pending += 1;
            }
        }

        for _ in 0..pending {
            match self.done.recv() {
                Ok(true) => {}
                Ok(false) => error!("Render worker panicked while running a batch"),
                Err(_) => break,
            }
        }
    }

    /// Index of the calling worker thread, `None` outside the pool
    pub fn current_worker_id() -> Option<usize> {
        WORKER_ID.with(|id| id.get())
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop and join all workers
    pub fn close(self) {
        drop(self);
    }
}

fn worker_loop(id: usize, receiver: Receiver<Message>, done: Sender<bool>) {
    WORKER_ID.with(|slot| slot.set(Some(id)));

    while let Ok(message) = receiver.recv() {
        match message {
            Message::Run(task) => {
                let ok = panic::catch_unwind(AssertUnwindSafe(|| task(id))).is_ok();
                if done.send(ok).is_err() {
                    break;
                }
            }
            Message::Shutdown => break,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            let _ = worker.sender.send(Message::Shutdown);
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
        debug!("Worker pool stopped");
    }
}
