//! Task identifier generation.

use crate::error::Result;
use uuid::Uuid;

/// Produces fresh task identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<String>;
}

/// Random 128-bit (v4) UUIDs in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Result<String> {
        Ok(Uuid::new_v4().to_string())
    }
}
