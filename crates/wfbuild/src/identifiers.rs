use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Produces fresh identifiers for workflow definitions and instances
pub trait IdentifierGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs rendered as 32 hex characters
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdentifierGenerator;

impl IdentifierGenerator for UuidIdentifierGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// `{prefix}{n}` with a process-local counter
#[derive(Debug)]
pub struct SequentialIdentifierGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdentifierGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdentifierGenerator for SequentialIdentifierGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}
