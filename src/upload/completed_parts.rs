use anyhow::{Result, anyhow};

use crate::types::UploadedPart;
use crate::types::error::S3uploadError;

/// Parts resolved so far, in the order they were resolved.
///
/// Parts are resolved strictly in ascending part number order, so a part number that does not
/// exceed the last one is rejected.
#[derive(Debug, Default, Clone)]
pub struct CompletedParts {
    parts: Vec<UploadedPart>,
}

impl CompletedParts {
    pub fn push(&mut self, part: UploadedPart) -> Result<()> {
        if let Some(last) = self.parts.last() {
            if part.part_number <= last.part_number {
                return Err(anyhow!(S3uploadError::PartOutOfOrder(part.part_number)));
            }
        }

        self.parts.push(part);
        Ok(())
    }

    pub fn as_slice(&self) -> &[UploadedPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
