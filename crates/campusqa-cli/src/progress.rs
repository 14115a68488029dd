//! Progress reporting for long-running commands

use std::io::{self, Write};

/// Simple progress reporter for CLI commands
pub struct ProgressReporter {
    total: usize,
    processed: usize,
}

impl ProgressReporter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
        }
    }

    pub fn set_message(&self, msg: &str) {
        eprint!("\r{:<60}", msg);
        io::stderr().flush().ok();
    }

    pub fn advance(&mut self, n: usize) {
        self.processed = (self.processed + n).min(self.total);
        self.set_message(&format!("Embedding pages: {}/{}", self.processed, self.total));
    }

    pub fn finish(&self) {
        eprintln!("\rDone ({}/{})                    ", self.processed, self.total);
    }
}
