// Interpreter configuration

/// Default bound on nested user-function activations
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Remaining stack below which the recursive passes switch to a new segment
pub(crate) const RED_ZONE: usize = 128 * 1024;
/// Size of each stack segment allocated on demand
pub(crate) const STACK_GROWTH: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl Config {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
