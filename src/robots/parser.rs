//! Robots.txt parser implementation
//!
//! Turns a robots.txt response into a [`Robot`]: rule groups keyed by user
//! agent, each holding its allow/disallow directives in file order.

use crate::command::host_key;
use std::time::Duration;
use url::Url;

/// Whether a directive grants or refuses access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Allow,
    Disallow,
}

/// A single `allow:/...` or `disallow:/...` line
///
/// `path` is the fragment after the leading "/" (empty for the root rule),
/// kept relative so it can be resolved against the robot's root URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub action: Action,
    pub path: String,
}

impl Directive {
    pub fn allow(path: &str) -> Self {
        Self {
            action: Action::Allow,
            path: path.to_string(),
        }
    }

    pub fn disallow(path: &str) -> Self {
        Self {
            action: Action::Disallow,
            path: path.to_string(),
        }
    }

    /// True for `allow:/`
    pub fn is_root_allow(&self) -> bool {
        self.action == Action::Allow && self.path.is_empty()
    }

    /// True for `disallow:/`
    pub fn is_root_disallow(&self) -> bool {
        self.action == Action::Disallow && self.path.is_empty()
    }
}

/// Directives addressed to one user agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    /// Lowercase agent token, e.g. `*`
    pub agent: String,
    pub directives: Vec<Directive>,
    pub crawl_delay: Option<Duration>,
}

impl RuleGroup {
    fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
            directives: Vec::new(),
            crawl_delay: None,
        }
    }
}

/// Exclusion rules for one seed host
#[derive(Debug, Clone)]
pub struct Robot {
    /// robots.txt URL with the trailing "robots.txt" removed
    pub root_url: Url,

    /// Single group holding exactly `allow:/`, or no robots.txt at all
    pub full_allow: bool,

    /// Single group holding exactly `disallow:/`
    pub full_disallow: bool,

    /// Rule groups in the order they first appeared
    pub groups: Vec<RuleGroup>,

    /// `crawl-delay` of the `*` group, if any
    pub crawl_delay: Option<Duration>,
}

impl Robot {
    /// Builds a robot from a robots.txt response
    ///
    /// Only a 2xx response is parsed. Any other status means the host has no
    /// usable robots.txt and everything is allowed.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_spider::Robot;
    /// use url::Url;
    ///
    /// let robots_url = Url::parse("http://example.com/robots.txt").unwrap();
    /// let robot = Robot::from_response(&robots_url, 200, "User-agent: *\nDisallow:/");
    /// assert!(robot.full_disallow);
    /// assert_eq!(robot.root_url.as_str(), "http://example.com/");
    /// ```
    pub fn from_response(robots_url: &Url, status: u16, body: &str) -> Self {
        if !(200..300).contains(&status) {
            tracing::debug!(
                url = %robots_url,
                status,
                "No usable robots.txt, treating host as fully allowed"
            );
            return Self::allow_all(robots_url);
        }

        let groups = parse_groups(body);
        let full_allow = single_directive(&groups).is_some_and(Directive::is_root_allow);
        let full_disallow = single_directive(&groups).is_some_and(Directive::is_root_disallow);
        let crawl_delay = groups
            .iter()
            .find(|g| g.agent == "*")
            .and_then(|g| g.crawl_delay);

        Self {
            root_url: root_url(robots_url),
            full_allow,
            full_disallow,
            groups,
            crawl_delay,
        }
    }

    /// A robot without restrictions
    pub fn allow_all(robots_url: &Url) -> Self {
        Self {
            root_url: root_url(robots_url),
            full_allow: true,
            full_disallow: false,
            groups: Vec::new(),
            crawl_delay: None,
        }
    }

    /// Host (with explicit port) this robot governs
    pub fn host(&self) -> Option<String> {
        host_key(&self.root_url)
    }

    /// Looks up the group for an agent token (`*` for the wildcard group)
    pub fn group(&self, agent: &str) -> Option<&RuleGroup> {
        self.groups.iter().find(|g| g.agent == agent)
    }
}

/// Strips the trailing "robots.txt" segment from the robots URL
fn root_url(robots_url: &Url) -> Url {
    let mut root = robots_url.clone();
    let path = robots_url.path();
    let stripped = path.strip_suffix("robots.txt").unwrap_or(path);
    root.set_path(stripped);
    root.set_query(None);
    root.set_fragment(None);
    root
}

/// Returns the only directive when there is exactly one group with exactly one directive
fn single_directive(groups: &[RuleGroup]) -> Option<&Directive> {
    match groups {
        [group] if group.directives.len() == 1 => group.directives.first(),
        _ => None,
    }
}

/// Lowercases a line and removes every whitespace character
fn squash(line: &str) -> String {
    line.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Scans robots.txt content into rule groups
///
/// A `user-agent:` line opens a group; following directives attach to it
/// until the next `user-agent:` line. A group only exists once it has
/// received something. Blank, comment, and unrecognised lines are skipped.
fn parse_groups(body: &str) -> Vec<RuleGroup> {
    let mut groups: Vec<RuleGroup> = Vec::new();
    let mut current: Option<String> = None;

    for raw in body.lines() {
        let mut line = squash(raw);
        if let Some(idx) = line.find('#') {
            line.truncate(idx);
        }
        if line.is_empty() {
            continue;
        }

        if let Some(agent) = line.strip_prefix("user-agent:") {
            current = Some(agent.to_string());
            continue;
        }

        let Some(agent) = current.as_deref() else {
            continue;
        };
        let Some((key, value)) = line.split_once(':') else {
            tracing::trace!(line = raw, "Skipping unparseable robots.txt line");
            continue;
        };

        let idx = match groups.iter().position(|g| g.agent == agent) {
            Some(idx) => idx,
            None => {
                groups.push(RuleGroup::new(agent));
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];

        match key {
            "allow" | "disallow" => {
                let Some(path) = value.strip_prefix('/') else {
                    continue;
                };
                let directive = if key == "allow" {
                    Directive::allow(path)
                } else {
                    Directive::disallow(path)
                };
                group.directives.push(directive);
            }
            "crawl-delay" => {
                match value.parse::<f64>().map(Duration::try_from_secs_f64) {
                    Ok(Ok(delay)) => group.crawl_delay = Some(delay),
                    _ => tracing::debug!(value, "Ignoring unusable crawl-delay"),
                }
            }
            _ => {}
        }
    }

    groups.retain(|g| !g.directives.is_empty() || g.crawl_delay.is_some());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robots_url() -> Url {
        Url::parse("http://example.com/robots.txt").unwrap()
    }

    #[test]
    fn test_full_disallow() {
        let robot = Robot::from_response(&robots_url(), 200, "User-agent: *\nDisallow:/");
        assert!(robot.full_disallow);
        assert!(!robot.full_allow);
    }

    #[test]
    fn test_full_allow() {
        let robot = Robot::from_response(&robots_url(), 200, "User-agent: *\nAllow:/");
        assert!(robot.full_allow);
        assert!(!robot.full_disallow);
    }

    #[test]
    fn test_whitespace_and_case_are_ignored() {
        let robot = Robot::from_response(&robots_url(), 200, "USER-AGENT :  *\n  DisAllow : /Private ");
        let group = robot.group("*").unwrap();
        assert_eq!(group.directives, vec![Directive::disallow("private")]);
    }

    #[test]
    fn test_two_directives_is_not_full_disallow() {
        let robot =
            Robot::from_response(&robots_url(), 200, "User-agent: *\nDisallow: /\nAllow: /pub");
        assert!(!robot.full_disallow);
        assert_eq!(
            robot.group("*").unwrap().directives,
            vec![Directive::disallow(""), Directive::allow("pub")]
        );
    }

    #[test]
    fn test_two_groups_is_not_full_disallow() {
        let body = "User-agent: badbot\nDisallow: /\n\nUser-agent: *\nDisallow: /";
        let robot = Robot::from_response(&robots_url(), 200, body);
        assert_eq!(robot.groups.len(), 2);
        assert!(!robot.full_disallow);
    }

    #[test]
    fn test_groups_keep_file_order() {
        let body = "User-agent: b\nDisallow: /x\nUser-agent: a\nAllow: /y\nUser-agent: b\nAllow: /z";
        let robot = Robot::from_response(&robots_url(), 200, body);
        let agents: Vec<_> = robot.groups.iter().map(|g| g.agent.as_str()).collect();
        assert_eq!(agents, vec!["b", "a"]);
        assert_eq!(robot.group("b").unwrap().directives.len(), 2);
    }

    #[test]
    fn test_lines_before_any_agent_are_skipped() {
        let robot = Robot::from_response(&robots_url(), 200, "Disallow: /\nSitemap: /map.xml");
        assert!(robot.groups.is_empty());
        assert!(!robot.full_disallow);
    }

    #[test]
    fn test_comments_and_unknown_lines_are_skipped() {
        let body = "# hello\nUser-agent: * # everyone\nSitemap: http://example.com/s.xml\nnonsense\nDisallow: / # all";
        let robot = Robot::from_response(&robots_url(), 200, body);
        assert!(robot.full_disallow);
    }

    #[test]
    fn test_crawl_delay() {
        let body = "User-agent: *\nCrawl-delay: 2.5\nDisallow: /admin";
        let robot = Robot::from_response(&robots_url(), 200, body);
        assert_eq!(robot.crawl_delay, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_unrepresentable_crawl_delay_is_ignored() {
        for delay in ["1e20", "-3", "nan", "inf"] {
            let body = format!("User-agent: *\nCrawl-delay: {delay}\nDisallow: /x");
            let robot = Robot::from_response(&robots_url(), 200, &body);
            assert_eq!(robot.crawl_delay, None, "delay {delay}");
            assert_eq!(robot.groups.len(), 1);
        }
    }

    #[test]
    fn test_crawl_delay_only_from_wildcard_group() {
        let body = "User-agent: slowbot\nCrawl-delay: 30\n";
        let robot = Robot::from_response(&robots_url(), 200, body);
        assert_eq!(robot.crawl_delay, None);
    }

    #[test]
    fn test_not_found_is_full_allow() {
        let robot = Robot::from_response(&robots_url(), 404, "User-agent: *\nDisallow: /");
        assert!(robot.full_allow);
        assert!(robot.groups.is_empty());
    }

    #[test]
    fn test_server_error_is_full_allow() {
        let robot = Robot::from_response(&robots_url(), 503, "");
        assert!(robot.full_allow);
    }

    #[test]
    fn test_root_url_strips_robots_txt() {
        let url = Url::parse("http://localhost:2016/robots.txt").unwrap();
        let robot = Robot::from_response(&url, 200, "");
        assert_eq!(robot.root_url.as_str(), "http://localhost:2016/");
        assert_eq!(robot.host().as_deref(), Some("localhost:2016"));
    }
}
