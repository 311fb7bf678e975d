pub mod catalog;
pub mod config;
pub mod coverage;
pub mod error;
pub mod executor;
pub mod gate;
pub mod gomodule;
pub mod mutants;
pub mod report;
pub mod results;
pub mod scanner;
pub mod scheduler;
pub mod toolchain;
pub mod workdir;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared by the scanner, the workers, and
/// any in-flight child process wait. Cancelling is one-way.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
