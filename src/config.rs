/// Interpreter tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Floor for the collection threshold. The heap collects once this many
    /// objects are live; afterwards the threshold is twice the survivors,
    /// never less than this.
    pub gc_threshold: usize,
    /// How many symbol-to-symbol hops a lookup follows before giving up
    /// with `CyclicBinding`.
    pub max_alias_depth: usize,
}

pub const DEFAULT_GC_THRESHOLD: usize = 256;
pub const DEFAULT_MAX_ALIAS_DEPTH: usize = 64;

impl Default for Config {
    fn default() -> Self {
        Config {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
        }
    }
}

impl Config {
    /// Defaults overridden by `SKEEM_GC_THRESHOLD` and `SKEEM_MAX_ALIAS_DEPTH`.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Some(n) = env_usize("SKEEM_GC_THRESHOLD") {
            config.gc_threshold = n;
        }
        if let Some(n) = env_usize("SKEEM_MAX_ALIAS_DEPTH") {
            config.max_alias_depth = n;
        }
        config
    }

    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold.max(1);
        self
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_floor_is_at_least_one() {
        let config = Config::default().with_gc_threshold(0);
        assert_eq!(config.gc_threshold, 1);
        assert_eq!(config.max_alias_depth, DEFAULT_MAX_ALIAS_DEPTH);
    }
}
