//! Robots.txt handling module
//!
//! This module parses robots.txt responses into per-host [`Robot`]s and
//! decides whether discovered links may ever enter the frontier.

mod exclusion;
mod parser;

pub use exclusion::{permits, ExclusionParseError};
pub use parser::{Action, Directive, Robot, RuleGroup};

/// The robots of every seed host, in seeding order
///
/// Filled sequentially while seeding and only read afterwards, so it is
/// shared between workers without a lock.
#[derive(Debug, Clone, Default)]
pub struct RobotRegistry {
    robots: Vec<Robot>,
}

impl RobotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a robot, replacing any earlier robot for the same host
    pub fn insert(&mut self, robot: Robot) {
        let host = robot.host();
        match self.robots.iter_mut().find(|r| r.host() == host) {
            Some(existing) => *existing = robot,
            None => self.robots.push(robot),
        }
    }

    /// The robot whose root host equals `host`
    pub fn for_host(&self, host: &str) -> Option<&Robot> {
        self.robots
            .iter()
            .find(|r| r.host().as_deref() == Some(host))
    }

    pub fn contains_host(&self, host: &str) -> bool {
        self.for_host(host).is_some()
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Robot> {
        self.robots.iter()
    }
}
