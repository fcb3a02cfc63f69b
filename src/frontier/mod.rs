//! The shared crawl frontier
//!
//! The frontier is an append-only sequence of commands with a read cursor.
//! Workers claim entries strictly in index order, and discovered links are
//! appended through [`Frontier::try_admit`], which checks for duplicates,
//! whitelisted hosts and the per-host quota under the same write lock as
//! the append.
//!
//! Visited commands are recorded in a separate list with its own lock. The
//! two locks are never held at the same time.

use crate::command::Command;
use crate::robots::RobotRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Result of offering a discovered command to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Admission {
    /// Appended to the frontier
    Admitted,
    /// The exact URL is already in the frontier
    AlreadyQueued,
    /// No seed host matches the command's host
    HostNotWhitelisted,
    /// The host has reached its page quota
    QuotaExhausted,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// A command handed to exactly one worker
#[derive(Debug, Clone)]
pub struct Claimed {
    pub command: Command,
    pub index: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    commands: Vec<Command>,
    cursor: usize,
    host_counts: HashMap<String, usize>,
    seen: HashSet<String>,
}

impl QueueState {
    fn append(&mut self, command: Command, host: Option<String>) {
        if let Some(host) = host {
            *self.host_counts.entry(host).or_insert(0) += 1;
        }
        self.seen.insert(command.as_str().to_string());
        self.commands.push(command);
    }
}

/// Pending and visited commands shared by all workers
#[derive(Debug)]
pub struct Frontier {
    queue: RwLock<QueueState>,
    visited: RwLock<Vec<Command>>,
    quota: Option<usize>,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// `quota` caps the number of commands ever enqueued per host; `None`
    /// means unlimited.
    pub fn new(quota: Option<usize>) -> Self {
        Self {
            queue: RwLock::new(QueueState::default()),
            visited: RwLock::new(Vec::new()),
            quota,
        }
    }

    fn read_queue(&self) -> RwLockReadGuard<'_, QueueState> {
        self.queue.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_queue(&self) -> RwLockWriteGuard<'_, QueueState> {
        self.queue.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn quota_reached(&self, queue: &QueueState, host: &str) -> bool {
        let count = queue.host_counts.get(host).copied().unwrap_or(0);
        self.quota.is_some_and(|quota| count >= quota)
    }

    fn read_visited(&self) -> RwLockReadGuard<'_, Vec<Command>> {
        self.visited.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a seed command and counts it against its host
    ///
    /// Returns `false` when the exact URL is already queued or the host
    /// has used up its quota.
    pub fn seed(&self, command: Command) -> bool {
        let mut queue = self.write_queue();
        if queue.seen.contains(command.as_str()) {
            return false;
        }
        let host = command.host();
        if host.as_deref().is_some_and(|h| self.quota_reached(&queue, h)) {
            return false;
        }
        queue.append(command, host);
        true
    }

    /// Hands out the command at the cursor and advances it
    ///
    /// `None` means nothing is available right now; other workers may
    /// still append more.
    pub fn claim(&self) -> Option<Claimed> {
        let mut queue = self.write_queue();
        let index = queue.cursor;
        let command = queue.commands.get(index)?.clone();
        queue.cursor += 1;
        Some(Claimed { command, index })
    }

    /// Appends a discovered command if it passes dedup, whitelist and quota
    pub fn try_admit(&self, command: Command, robots: &RobotRegistry) -> Admission {
        let mut queue = self.write_queue();

        if queue.seen.contains(command.as_str()) {
            return Admission::AlreadyQueued;
        }

        let host = match command.host() {
            Some(host) if robots.contains_host(&host) => host,
            _ => return Admission::HostNotWhitelisted,
        };

        if self.quota_reached(&queue, &host) {
            return Admission::QuotaExhausted;
        }

        queue.append(command, Some(host));
        Admission::Admitted
    }

    /// Records a command a worker finished with, successfully or not
    pub fn record_visited(&self, command: Command) {
        self.visited
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }

    /// Number of commands ever enqueued
    pub fn size(&self) -> usize {
        self.read_queue().commands.len()
    }

    /// Number of commands workers have finished with
    pub fn visited_count(&self) -> usize {
        self.read_visited().len()
    }

    /// Index of the next command to hand out
    pub fn cursor(&self) -> usize {
        self.read_queue().cursor
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Commands enqueued for a host so far
    pub fn host_count(&self, host: &str) -> usize {
        self.read_queue().host_counts.get(host).copied().unwrap_or(0)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.read_queue().seen.contains(url)
    }

    /// Snapshot of every enqueued command in claim order
    pub fn commands(&self) -> Vec<Command> {
        self.read_queue().commands.clone()
    }

    /// Snapshot of every visited command in completion order
    pub fn visited(&self) -> Vec<Command> {
        self.read_visited().clone()
    }
}
