//! Agent registry: which workers exist and what they do, as shown to the planner.

/// Ordered map agent id → capability description.
///
/// Filled during registration (the planner does not list itself), then only read.
/// One registry per workflow; nothing is shared between conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentRegistry {
    entries: Vec<(String, String)>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name`; registering the same name again replaces its description.
    pub(crate) fn record(&mut self, name: &str, description: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some((_, d)) => *d = description.to_string(),
            None => self
                .entries
                .push((name.to_string(), description.to_string())),
        }
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, d)| d.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.description(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_idempotent_per_name() {
        let mut reg = AgentRegistry::new();
        reg.record("serper_agent", "search");
        reg.record("serper_agent", "web search");
        reg.record("reporter_agent", "delivers");
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.description("serper_agent"), Some("web search"));
        assert!(!reg.contains("meta_agent"));
    }
}
