//! A render backend without a GPU.
//!
//! `HeadlessBackend` keeps the bookkeeping of a real backend (how many meshes
//! were created, released and drawn) and records draws into a [`DrawLog`].
//! Labels of released meshes are only kept by a backend built with
//! [`HeadlessBackend::recording_releases`]. It is what tests stream worlds against,
//! and what the demo falls back to when no adapter is available.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::trace;

use super::{MeshData, RenderBackend};

/// Totals of backend activity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub created: usize,
    pub released: usize,
    pub draws: usize,
    /// Number of meshes currently alive.
    pub live: usize,
    pub uploaded_vertices: usize,
    pub uploaded_indices: usize,
}

#[derive(Debug, Default)]
struct Ledger {
    stats: HeadlessStats,
    /// `None` unless release labels are being recorded.
    released_labels: Option<Vec<String>>,
}

type SharedLedger = Arc<Mutex<Ledger>>;

fn lock(ledger: &SharedLedger) -> MutexGuard<'_, Ledger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mesh "uploaded" to the headless backend.
#[derive(Debug)]
pub struct HeadlessMesh {
    label: String,
    index_count: u32,
    ledger: SharedLedger,
}

impl HeadlessMesh {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

impl Drop for HeadlessMesh {
    fn drop(&mut self) {
        let mut ledger = lock(&self.ledger);
        ledger.stats.released += 1;
        ledger.stats.live = ledger.stats.live.saturating_sub(1);
        if let Some(labels) = &mut ledger.released_labels {
            labels.push(std::mem::take(&mut self.label));
        }
    }
}

/// One recorded draw call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub label: String,
    pub index_count: u32,
}

/// The pass type of the headless backend: an ordered list of draws.
#[derive(Clone, Debug, Default)]
pub struct DrawLog {
    pub draws: Vec<DrawCall>,
}

impl DrawLog {
    pub fn total_indices(&self) -> u64 {
        self.draws.iter().map(|d| d.index_count as u64).sum()
    }
}

/// Render backend that only counts.
#[derive(Clone, Debug, Default)]
pub struct HeadlessBackend {
    ledger: SharedLedger,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that also remembers the label of every released mesh.
    pub fn recording_releases() -> Self {
        let ledger = Ledger {
            released_labels: Some(Vec::new()),
            ..Ledger::default()
        };
        HeadlessBackend {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn begin_pass(&self) -> DrawLog {
        DrawLog::default()
    }

    pub fn stats(&self) -> HeadlessStats {
        lock(&self.ledger).stats
    }

    /// Labels of every released mesh, in release order. Empty unless the
    /// backend was built with [`HeadlessBackend::recording_releases`].
    pub fn released_labels(&self) -> Vec<String> {
        lock(&self.ledger).released_labels.clone().unwrap_or_default()
    }
}

impl RenderBackend for HeadlessBackend {
    type Mesh = HeadlessMesh;
    type Pass<'p> = DrawLog;

    fn create_gpu_resources(&self, label: &str, mesh: &MeshData) -> HeadlessMesh {
        {
            let mut ledger = lock(&self.ledger);
            ledger.stats.created += 1;
            ledger.stats.live += 1;
            ledger.stats.uploaded_vertices += mesh.vertices.len();
            ledger.stats.uploaded_indices += mesh.indices.len();
        }
        trace!("Created headless mesh {label}");

        HeadlessMesh {
            label: label.to_owned(),
            index_count: mesh.index_count(),
            ledger: Arc::clone(&self.ledger),
        }
    }

    fn issue_draw<'p>(&self, mesh: &HeadlessMesh, pass: &mut Self::Pass<'p>) {
        lock(&self.ledger).stats.draws += 1;
        pass.draws.push(DrawCall {
            label: mesh.label.clone(),
            index_count: mesh.index_count,
        });
    }
}
