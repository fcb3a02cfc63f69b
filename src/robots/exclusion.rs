//! Exclusion decisions
//!
//! Decides whether a candidate command may be fetched under the `*` rule
//! group of its host's robot. Directive paths are resolved against the
//! robot's root URL and compared with the candidate by exact URL equality;
//! prefix and wildcard matching are not supported.

use crate::command::Command;
use crate::robots::parser::{Action, Directive, Robot};
use crate::robots::RobotRegistry;
use thiserror::Error;

/// A directive whose path does not resolve to a URL
#[derive(Debug, Error)]
#[error("Invalid robots.txt directive path '{path}': {source}")]
pub struct ExclusionParseError {
    pub path: String,
    pub source: url::ParseError,
}

/// Checks a candidate against the robot of its host
///
/// Candidates on hosts without a robot are permitted here; the frontier
/// refuses them separately as not whitelisted.
pub fn permits(candidate: &Command, registry: &RobotRegistry) -> bool {
    let robot = candidate
        .host()
        .and_then(|host| registry.for_host(&host));

    match robot {
        Some(robot) => robot.permits(candidate),
        None => true,
    }
}

impl Robot {
    /// Applies this robot's `*` group to a candidate
    ///
    /// - First directive `disallow:/`: denied unless a later `allow:` matches.
    /// - First directive `allow:/`: permitted unless a `disallow:` matches.
    /// - Otherwise the first matching directive decides, and a candidate no
    ///   directive matches is denied.
    ///
    /// A directive that fails to resolve denies the candidate.
    pub fn permits(&self, candidate: &Command) -> bool {
        if self.full_allow {
            return true;
        }

        // Only the `*` group binds this crawler; groups naming other agents
        // restrict nothing, so default-deny scanning never applies here.
        let Some(group) = self.group("*") else {
            return true;
        };
        let directives = group.directives.as_slice();
        let Some(first) = directives.first() else {
            return true;
        };

        let result = if first.is_root_disallow() {
            self.any_match(&directives[1..], Action::Allow, candidate)
        } else if first.is_root_allow() {
            self.any_match(directives, Action::Disallow, candidate)
                .map(|denied| !denied)
        } else {
            self.first_match(directives, candidate)
        };

        match result {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::debug!(url = %candidate, error = %e, "Denying candidate on bad directive");
                false
            }
        }
    }

    /// True if some directive with the given action matches the candidate
    fn any_match(
        &self,
        directives: &[Directive],
        action: Action,
        candidate: &Command,
    ) -> Result<bool, ExclusionParseError> {
        for directive in directives.iter().filter(|d| d.action == action) {
            if self.matches(directive, candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Decision of the first matching directive, deny when none matches
    fn first_match(
        &self,
        directives: &[Directive],
        candidate: &Command,
    ) -> Result<bool, ExclusionParseError> {
        for directive in directives {
            if self.matches(directive, candidate)? {
                return Ok(directive.action == Action::Allow);
            }
        }
        Ok(false)
    }

    fn matches(&self, directive: &Directive, candidate: &Command) -> Result<bool, ExclusionParseError> {
        let target = self
            .root_url
            .join(&directive.path)
            .map_err(|source| ExclusionParseError {
                path: directive.path.clone(),
                source,
            })?;
        Ok(target.as_str() == candidate.as_str())
    }
}
