//! Pending propagation markers
//!
//! At most one marker per target period, stored in `data/propagation.json`.
//! Markers are written through to disk immediately.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::engine::PropagationMarker;
use crate::error::TandemResult;
use crate::models::BudgetPeriod;

use super::file_io::{read_json, write_json_atomic};
use super::poisoned;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MarkerData {
    #[serde(default)]
    markers: Vec<PropagationMarker>,
}

pub struct PropagationRepository {
    path: PathBuf,
    markers: RwLock<HashMap<BudgetPeriod, PropagationMarker>>,
}

impl PropagationRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            markers: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> TandemResult<()> {
        let file_data: MarkerData = read_json(&self.path)?;
        let mut markers = self.markers.write().map_err(poisoned)?;
        *markers = file_data.markers.into_iter().map(|m| (m.target, m)).collect();
        Ok(())
    }

    pub fn save(&self) -> TandemResult<()> {
        let markers = self.pending()?;
        write_json_atomic(&self.path, &MarkerData { markers })
    }

    /// Pending markers, oldest first
    pub fn pending(&self) -> TandemResult<Vec<PropagationMarker>> {
        let markers = self.markers.read().map_err(poisoned)?;
        let mut list: Vec<_> = markers.values().cloned().collect();
        list.sort_by_key(|m| m.started_at);
        Ok(list)
    }

    pub fn record(&self, marker: PropagationMarker) -> TandemResult<()> {
        {
            let mut markers = self.markers.write().map_err(poisoned)?;
            markers.insert(marker.target, marker);
        }
        self.save()
    }

    pub fn clear(&self, target: BudgetPeriod) -> TandemResult<()> {
        {
            let mut markers = self.markers.write().map_err(poisoned)?;
            markers.remove(&target);
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PropagationKind;
    use tempfile::TempDir;

    #[test]
    fn test_markers_survive_reload_until_cleared() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("propagation.json");
        let repo = PropagationRepository::new(path.clone());

        let jan = BudgetPeriod::monthly(2025, 1);
        let mut marker = PropagationMarker::new(jan, jan.next(), PropagationKind::CarryForward);
        repo.record(marker.clone()).unwrap();
        marker.step = 2;
        repo.record(marker.clone()).unwrap();

        let reloaded = PropagationRepository::new(path.clone());
        reloaded.load().unwrap();
        let pending = reloaded.pending().unwrap();
        assert_eq!(pending, vec![marker]);

        reloaded.clear(jan.next()).unwrap();
        let again = PropagationRepository::new(path);
        again.load().unwrap();
        assert!(again.pending().unwrap().is_empty());
    }
}
