/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, AtomicU64, Ordering};

/// Counters of a relay server.
#[derive(Debug, Default)]
pub struct RelayServerStats {
    accept_loop: AtomicIsize,
    alive_tasks: AtomicIsize,
    accepted: AtomicU64,
    accept_failed: AtomicU64,
    handshake_failed: AtomicU64,
    upstream_failed: AtomicU64,
    relay_failed: AtomicU64,
}

/// Decrease the alive count when dropped.
pub(crate) struct RelayAliveGuard(Arc<RelayServerStats>, bool);

impl Drop for RelayAliveGuard {
    fn drop(&mut self) {
        if self.1 {
            self.0.accept_loop.fetch_sub(1, Ordering::Relaxed);
        } else {
            self.0.alive_tasks.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

impl RelayServerStats {
    #[must_use]
    pub(crate) fn add_accept_loop(self: &Arc<Self>) -> RelayAliveGuard {
        self.accept_loop.fetch_add(1, Ordering::Relaxed);
        RelayAliveGuard(self.clone(), true)
    }

    /// Whether the accept loop is still running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.accept_loop.load(Ordering::Relaxed) > 0
    }

    #[must_use]
    pub(crate) fn add_task(self: &Arc<Self>) -> RelayAliveGuard {
        self.alive_tasks.fetch_add(1, Ordering::Relaxed);
        RelayAliveGuard(self.clone(), false)
    }

    pub fn alive_tasks(&self) -> isize {
        self.alive_tasks.load(Ordering::Relaxed)
    }

    pub(crate) fn add_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub(crate) fn add_accept_failed(&self) {
        self.accept_failed.fetch_add(1, Ordering::Relaxed);
    }
    pub fn accept_failed(&self) -> u64 {
        self.accept_failed.load(Ordering::Relaxed)
    }

    pub(crate) fn add_handshake_failed(&self) {
        self.handshake_failed.fetch_add(1, Ordering::Relaxed);
    }
    pub fn handshake_failed(&self) -> u64 {
        self.handshake_failed.load(Ordering::Relaxed)
    }

    pub(crate) fn add_upstream_failed(&self) {
        self.upstream_failed.fetch_add(1, Ordering::Relaxed);
    }
    pub fn upstream_failed(&self) -> u64 {
        self.upstream_failed.load(Ordering::Relaxed)
    }

    pub(crate) fn add_relay_failed(&self) {
        self.relay_failed.fetch_add(1, Ordering::Relaxed);
    }
    pub fn relay_failed(&self) -> u64 {
        self.relay_failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alive_guard() {
        let stats = Arc::new(RelayServerStats::default());
        let guard = stats.add_accept_loop();
        let task = stats.add_task();
        assert!(stats.is_running());
        assert_eq!(stats.alive_tasks(), 1);
        drop(task);
        assert_eq!(stats.alive_tasks(), 0);
        drop(guard);
        assert!(!stats.is_running());
    }
}
