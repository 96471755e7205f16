use std::path::{Path, PathBuf};
use std::sync::Arc;

use frame_review_types::{FrameAnnotationSet, FrameSummary};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::asset::DynVideoAsset;

pub type ItemId = u64;

/// Output of the analysis collaborator for one video, before it joins a batch.
pub struct AnalyzedItem {
    pub source: PathBuf,
    pub frames: Vec<FrameAnnotationSet>,
    pub checked: bool,
    pub asset: DynVideoAsset,
    /// Wall time the analysis took, when the analyzer reported it.
    pub processing_time_ms: Option<u64>,
}

impl std::fmt::Debug for AnalyzedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzedItem")
            .field("source", &self.source)
            .field("frames", &self.frames.len())
            .field("checked", &self.checked)
            .field("processing_time_ms", &self.processing_time_ms)
            .finish_non_exhaustive()
    }
}

/// Immutable view of an item once it belongs to a batch.
pub struct ReviewItem {
    pub id: ItemId,
    pub source: PathBuf,
    pub label: String,
    pub frames: Vec<FrameAnnotationSet>,
    pub asset: DynVideoAsset,
    pub processing_time_ms: Option<u64>,
}

impl ReviewItem {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Clone)]
pub struct BatchEntry {
    pub item: Arc<ReviewItem>,
    pub checked: bool,
}

#[derive(Default)]
struct BatchStore {
    next_id: ItemId,
    selected: Option<ItemId>,
    entries: Vec<BatchEntry>,
}

impl BatchStore {
    fn entry_mut(&mut self, id: ItemId) -> Option<&mut BatchEntry> {
        self.entries.iter_mut().find(|entry| entry.item.id == id)
    }
}

#[derive(Clone, Default)]
pub struct BatchHandle {
    inner: Arc<Mutex<BatchStore>>,
}

impl BatchHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, analyzed: AnalyzedItem) -> ItemId {
        let label = item_label(&analyzed.source);
        let mut store = self.inner.lock();
        store.next_id = store.next_id.saturating_add(1).max(1);
        let id = store.next_id;
        store.entries.push(BatchEntry {
            item: Arc::new(ReviewItem {
                id,
                source: analyzed.source,
                label,
                frames: analyzed.frames,
                asset: analyzed.asset,
                processing_time_ms: analyzed.processing_time_ms,
            }),
            checked: analyzed.checked,
        });
        id
    }

    pub fn items_snapshot(&self) -> Vec<BatchEntry> {
        self.inner.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<Arc<ReviewItem>> {
        let store = self.inner.lock();
        store
            .entries
            .iter()
            .find(|entry| entry.item.id == id)
            .map(|entry| entry.item.clone())
    }

    /// Removes an item. Returns whether the selection was cleared by it.
    pub fn remove(&self, id: ItemId) -> bool {
        let mut store = self.inner.lock();
        if let Some(index) = store.entries.iter().position(|entry| entry.item.id == id) {
            store.entries.remove(index);
        }
        if store.selected == Some(id) {
            store.selected = None;
            return true;
        }
        false
    }

    pub fn set_checked(&self, id: ItemId, checked: bool) {
        if let Some(entry) = self.inner.lock().entry_mut(id) {
            entry.checked = checked;
        }
    }

    pub fn toggle_checked(&self, id: ItemId) -> Option<bool> {
        let mut store = self.inner.lock();
        let entry = store.entry_mut(id)?;
        entry.checked = !entry.checked;
        Some(entry.checked)
    }

    /// Selects an item by id. Unknown ids leave the selection unchanged.
    pub fn select(&self, id: ItemId) -> Option<Arc<ReviewItem>> {
        let mut store = self.inner.lock();
        let item = store
            .entries
            .iter()
            .find(|entry| entry.item.id == id)
            .map(|entry| entry.item.clone())?;
        store.selected = Some(id);
        Some(item)
    }

    pub fn selected(&self) -> Option<Arc<ReviewItem>> {
        let store = self.inner.lock();
        let id = store.selected?;
        store
            .entries
            .iter()
            .find(|entry| entry.item.id == id)
            .map(|entry| entry.item.clone())
    }

    /// Selects the first item when nothing is selected. Returns the item
    /// that became selected, if any.
    pub fn select_first_if_needed(&self) -> Option<Arc<ReviewItem>> {
        let mut store = self.inner.lock();
        if store.selected.is_some() {
            return None;
        }
        let first = store.entries.first().map(|entry| entry.item.clone())?;
        store.selected = Some(first.id);
        Some(first)
    }

    pub fn clear(&self) {
        let mut store = self.inner.lock();
        store.entries.clear();
        store.selected = None;
    }

    pub fn checked_items(&self) -> Vec<Arc<ReviewItem>> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.checked)
            .map(|entry| entry.item.clone())
            .collect()
    }
}

fn item_label(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Overlay counts for one item, overall and per frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemReport {
    pub totals: FrameSummary,
    pub frames: Vec<FrameSummary>,
    pub processing_time_ms: Option<u64>,
}

impl ItemReport {
    pub fn for_item(item: &ReviewItem) -> Self {
        let frames: Vec<FrameSummary> = item
            .frames
            .par_iter()
            .map(FrameAnnotationSet::summary)
            .collect();
        let totals = frames
            .par_iter()
            .copied()
            .reduce(FrameSummary::default, FrameSummary::merge);
        Self {
            totals,
            frames,
            processing_time_ms: item.processing_time_ms,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Inspector line for the frame at `index`, e.g. `frame 3 of 10`.
    pub fn frame_heading(&self, index: usize) -> Option<String> {
        (index < self.frames.len())
            .then(|| format!("frame {} of {}", index + 1, self.frames.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::StaticAsset;
    use frame_review_types::{FrameImage, Overlay, OverlayStatus, Rect, Size};

    fn analyzed(name: &str, statuses: &[&[OverlayStatus]]) -> AnalyzedItem {
        let frames = statuses
            .iter()
            .map(|frame| {
                let overlays = frame
                    .iter()
                    .enumerate()
                    .map(|(id, status)| Overlay {
                        id: id as u64,
                        rect: Rect::new(1.0, 1.0, 2.0, 2.0),
                        status: *status,
                        text: String::new(),
                    })
                    .collect();
                FrameAnnotationSet::new(FrameImage::blank(32, 18), overlays)
            })
            .collect();
        AnalyzedItem {
            source: PathBuf::from(format!("/clips/{name}")),
            frames,
            checked: false,
            asset: Arc::new(StaticAsset::new(1.0, Size::new(32.0, 18.0), 25.0)),
            processing_time_ms: None,
        }
    }

    #[test]
    fn removing_selected_item_clears_selection() {
        let batch = BatchHandle::new();
        let first = batch.add(analyzed("a.mp4", &[]));
        let second = batch.add(analyzed("b.mp4", &[]));
        assert_eq!(batch.select_first_if_needed().map(|item| item.id), Some(first));
        assert!(batch.select_first_if_needed().is_none());
        assert!(batch.select(second).is_some());
        assert!(!batch.remove(first));
        assert!(batch.remove(second));
        assert!(batch.selected().is_none());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn ids_are_stable_and_labels_come_from_file_names() {
        let batch = BatchHandle::new();
        let id = batch.add(analyzed("clip one.mov", &[]));
        assert_eq!(batch.item(id).map(|item| item.label.clone()).as_deref(), Some("clip one.mov"));
        assert!(batch.select(id + 10).is_none());
        assert!(batch.selected().is_none());
    }

    #[test]
    fn checked_flags_toggle() {
        let batch = BatchHandle::new();
        let id = batch.add(analyzed("a.mp4", &[]));
        assert_eq!(batch.toggle_checked(id), Some(true));
        assert_eq!(batch.checked_items().len(), 1);
        batch.set_checked(id, false);
        assert!(batch.checked_items().is_empty());
        assert_eq!(batch.toggle_checked(99), None);
        batch.clear();
        assert!(batch.is_empty());
    }

    #[test]
    fn report_totals_every_frame() {
        use OverlayStatus::*;
        let batch = BatchHandle::new();
        let id = batch.add(analyzed(
            "a.mp4",
            &[&[Pass, Pass], &[Warn, Fail], &[], &[Unknown]],
        ));
        let item = batch.item(id).expect("item present");
        let report = ItemReport::for_item(&item);
        assert_eq!(report.totals.pass, 2);
        assert_eq!(report.totals.warn, 1);
        assert_eq!(report.totals.fail, 1);
        assert_eq!(report.totals.unknown, 1);
        assert_eq!(report.frame_count(), 4);
        assert_eq!(report.frames[1].total(), 2);
        assert_eq!(report.frame_heading(0).as_deref(), Some("frame 1 of 4"));
        assert_eq!(report.frame_heading(4), None);
    }
}
