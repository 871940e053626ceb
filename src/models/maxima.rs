// Historical per-filesystem peaks used to normalize displays

use serde::{Deserialize, Serialize};

/// Peaks in order: node count, metadata ops, write IOPS, read IOPS, write bw, read bw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemMaxima {
    pub values: [u64; 6],
}

impl FilesystemMaxima {
    pub fn new(values: [u64; 6]) -> Self {
        Self { values }
    }

    /// Raises every component below `totals`. Returns true if anything increased.
    pub fn observe(&mut self, totals: &[u64; 6]) -> bool {
        let mut changed = false;
        for (max, &v) in self.values.iter_mut().zip(totals) {
            if v > *max {
                *max = v;
                changed = true;
            }
        }
        changed
    }
}
