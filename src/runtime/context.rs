use std::sync::Mutex;

/// Per-execution-context state the protocol layer reads: the current
/// safety level plus a warning sink. The layer itself never mutates the
/// level; raising it is the host's business.
#[derive(Debug)]
pub struct Context {
    safe_level: i32,
    warnings: Mutex<Vec<String>>,
}

impl Context {
    pub fn new() -> Self {
        Self::with_safe_level(0)
    }

    pub fn with_safe_level(safe_level: i32) -> Self {
        Self {
            safe_level,
            warnings: Mutex::new(Vec::new()),
        }
    }

    pub fn current_safe_level(&self) -> i32 {
        self.safe_level
    }

    pub fn report_warning(&self, message: impl Into<String>) {
        self.warnings.lock().unwrap().push(message.into());
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
