//! Command-line matching and port argument parsing.

/// Command-line fragments that identify test runners and e2e servers.
pub const DEFAULT_MARKERS: [&str; 4] = ["jest", "entities.e2e.test", "tests/e2e", "--runTestsByPath"];

/// Test server and app server ports.
pub const DEFAULT_PORTS: [u16; 2] = [8082, 8081];

/// Case-insensitive substring test against any marker.
pub fn matches_marker<S: AsRef<str>>(cmd: &str, markers: &[S]) -> bool {
    let lower = cmd.to_lowercase();
    markers
        .iter()
        .any(|m| lower.contains(&m.as_ref().to_lowercase()))
}

/// Ports parsed from command-line arguments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PortList {
    pub ports: Vec<u16>,
    /// Tokens that were not a valid port number, in input order.
    pub rejected: Vec<String>,
}

/// Parse repeated and/or comma-separated port arguments, e.g.
/// `["8081", "8082, 8083"]`. Empty tokens are skipped.
pub fn parse_ports<S: AsRef<str>>(items: &[S]) -> PortList {
    let mut list = PortList::default();
    for token in items.iter().flat_map(|item| item.as_ref().split(',')) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<u16>() {
            Ok(port) => list.ports.push(port),
            Err(_) => list.rejected.push(token.to_string()),
        }
    }
    list
}

/// Selects Android emulator processes by command-line substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorFilter {
    pub pattern: String,
    pub exclude: Vec<String>,
}

impl Default for EmulatorFilter {
    fn default() -> Self {
        Self {
            pattern: "emulator".to_string(),
            exclude: vec!["grep".to_string()],
        }
    }
}

impl EmulatorFilter {
    pub fn matches(&self, cmd: &str) -> bool {
        cmd.contains(&self.pattern) && !self.exclude.iter().any(|x| cmd.contains(x.as_str()))
    }
}
