// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Execution Contexts
//!
//! The publish pipeline hops twice: from the caller onto a processing
//! context for the CPU-bound transforms, and from there onto the caller's
//! callback context to deliver the result. Both are [`Executor`]s.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

/// A unit of work submitted to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs on some execution context.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Runs every job immediately on the submitting thread.
///
/// Stands in for a host's main/UI context in tests and in hosts that drive
/// callbacks from their own loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// A single dedicated worker thread processing jobs in submission order.
///
/// The worker exits once the executor is dropped and queued jobs drain.
#[derive(Debug)]
pub struct BackgroundExecutor {
    sender: Mutex<Sender<Job>>,
}

impl BackgroundExecutor {
    /// Spawns the worker thread.
    pub fn spawn(name: &str) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job();
                }
                tracing::debug!("background executor stopped");
            })?;

        Ok(BackgroundExecutor {
            sender: Mutex::new(sender),
        })
    }
}

impl Executor for BackgroundExecutor {
    fn execute(&self, job: Job) {
        let sent = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .send(job);
        if let Err(mpsc::SendError(job)) = sent {
            // Worker is gone; run here rather than lose the completion
            tracing::warn!("background worker unavailable, running job inline");
            job();
        }
    }
}

/// Runs jobs on a tokio runtime's blocking pool.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        TokioExecutor { handle }
    }

    /// Uses the runtime the caller is currently inside of.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

#[cfg(feature = "tokio")]
impl Executor for TokioExecutor {
    fn execute(&self, job: Job) {
        drop(self.handle.spawn_blocking(job));
    }
}

/// Shared executor handle.
pub type SharedExecutor = Arc<dyn Executor>;
