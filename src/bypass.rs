// Keys that are never rate limited.
// Loaded once from config before the server starts, read-only afterwards.

#[derive(Debug, Clone, Default)]
pub struct BypassList {
    keys: Vec<String>,
}

impl BypassList {
    // Build from a comma-separated list: "10.0.0.1, 10.0.0.2"
    pub fn load(raw: &str) -> Self {
        let keys = raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self { keys }
    }

    // list is config sized, a linear scan is fine
    pub fn is_bypassed(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
