use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::trace;

use crate::types::{MIN_PART_NUMBER, PartRecord};
use crate::upload::e_tag::normalize_e_tag;

/// Parts already stored on the server for a resumed multipart upload, keyed by part number.
///
/// Built once from a `ListParts` result and read-only afterward.
#[derive(Debug, Default, Clone)]
pub struct PartRegistry {
    parts: HashMap<i32, PartRecord>,
}

impl PartRegistry {
    /// The first record wins when a part number appears more than once.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PartRecord>,
    {
        let mut parts = HashMap::new();
        for record in records {
            if record.part_number < MIN_PART_NUMBER {
                trace!(
                    part_number = record.part_number,
                    "invalid part number in listing. ignored."
                );
                continue;
            }

            match parts.entry(record.part_number) {
                Entry::Occupied(_) => {
                    trace!(
                        part_number = record.part_number,
                        "duplicate part number in listing. ignored."
                    );
                }
                Entry::Vacant(entry) => {
                    entry.insert(PartRecord {
                        part_number: record.part_number,
                        digest: normalize_e_tag(&record.digest),
                    });
                }
            }
        }

        PartRegistry { parts }
    }

    pub fn get(&self, part_number: i32) -> Option<&PartRecord> {
        self.parts.get(&part_number)
    }

    /// Returns the recorded part if its digest equals `digest` exactly.
    pub fn find_matching(&self, part_number: i32, digest: &str) -> Option<&PartRecord> {
        self.get(part_number)
            .filter(|record| record.digest == digest)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
