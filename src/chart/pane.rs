use std::rc::Rc;

use iced::Rectangle;
use uuid::Uuid;

use data::chart::series::SeriesKey;

use super::ChartError;
use super::series::{PlotSource, SeriesEntry, same_series};

/// Weight a freshly created pane starts with.
pub const INITIAL_PANE_WEIGHT: u32 = 100;
/// Weight of the transient drop-target pane while a drag is in flight.
pub const EMPTY_PANE_WEIGHT: u32 = INITIAL_PANE_WEIGHT / 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaneId(Uuid);

impl PaneId {
    pub fn unique() -> Self {
        Self(Uuid::new_v4())
    }
}

/// One horizontal slice of the chart stack.
///
/// Entry order is z-order and dataset-index space; the first pane's entry 0
/// is the price series when present.
pub struct Pane {
    id: PaneId,
    entries: Vec<SeriesEntry>,
    weight: u32,
    range: Option<(f32, f32)>,
}

impl Pane {
    pub fn new(weight: u32) -> Self {
        Self {
            id: PaneId::unique(),
            entries: Vec::new(),
            weight,
            range: None,
        }
    }

    pub fn id(&self) -> PaneId {
        self.id
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&SeriesEntry> {
        self.entries.get(index)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut SeriesEntry> {
        self.entries.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry; the assigned dataset index is the prior count.
    pub fn add_entry(&mut self, entry: SeriesEntry) -> usize {
        entry.source().set_pane(Some(self.id));
        self.entries.push(entry);
        self.recompute_range();
        self.entries.len() - 1
    }

    /// Remove the entry at `index`, compacting the indices after it.
    fn remove_entry(&mut self, index: usize) -> SeriesEntry {
        let entry = self.entries.remove(index);
        entry.source().set_pane(None);
        self.recompute_range();
        entry
    }

    /// Dataset index of the given source, matching through the disabled
    /// decorator.
    pub fn position_of(&self, source: &Rc<dyn PlotSource>) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| same_series(entry.source(), source))
    }

    pub fn position_of_key(&self, key: &SeriesKey) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key() == *key)
    }

    pub fn range(&self) -> Option<(f32, f32)> {
        self.range
    }

    /// Min/max over the finite values of enabled entries only.
    pub fn recompute_range(&mut self) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        for entry in self.entries.iter().filter(|e| !e.is_hidden()) {
            let source = entry.source();
            for item in 0..source.len() {
                if let Some(ohlc) = source.ohlc(item) {
                    if ohlc.low.is_finite() && ohlc.low < min {
                        min = ohlc.low;
                    }
                    if ohlc.high.is_finite() && ohlc.high > max {
                        max = ohlc.high;
                    }
                } else {
                    let y = source.y(item);
                    if y.is_finite() {
                        min = min.min(y);
                        max = max.max(y);
                    }
                }
            }
        }

        self.range = (min <= max).then_some((min, max));
    }

    /// Largest decimal precision among enabled entries, for axis labels.
    pub fn max_precision(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.is_hidden())
            .map(SeriesEntry::precision)
            .max()
            .unwrap_or(0)
    }
}

/// The ordered sequence of panes plus the transient drop-target bookkeeping.
#[derive(Default)]
pub struct PaneStack {
    panes: Vec<Pane>,
    drop_target: Option<PaneId>,
}

impl PaneStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    pub fn len(&self) -> usize {
        self.panes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.iter().find(|pane| pane.id() == id)
    }

    pub fn pane_mut(&mut self, id: PaneId) -> Option<&mut Pane> {
        self.panes.iter_mut().find(|pane| pane.id() == id)
    }

    pub fn pane_at(&self, index: usize) -> Option<&Pane> {
        self.panes.get(index)
    }

    pub fn index_of(&self, id: PaneId) -> Option<usize> {
        self.panes.iter().position(|pane| pane.id() == id)
    }

    pub fn push_pane(&mut self, pane: Pane) -> PaneId {
        let id = pane.id();
        self.panes.push(pane);
        id
    }

    pub fn insert_pane(&mut self, index: usize, pane: Pane) -> PaneId {
        let id = pane.id();
        let index = index.min(self.panes.len());
        self.panes.insert(index, pane);
        id
    }

    /// Append the transient drop-target pane for an active drag.
    ///
    /// At most one exists; a second call while one is live returns it.
    pub fn add_drop_target(&mut self) -> PaneId {
        if let Some(id) = self.drop_target {
            return id;
        }
        let id = self.push_pane(Pane::new(EMPTY_PANE_WEIGHT));
        self.drop_target = Some(id);
        id
    }

    pub fn drop_target(&self) -> Option<PaneId> {
        self.drop_target
    }

    /// Forget the drop-target marker; the pane itself stays until the
    /// deferred empty-pane sweep.
    pub fn clear_drop_target(&mut self) {
        self.drop_target = None;
    }

    /// Locate a source across all panes, matching through the disabled
    /// decorator. Absence is a contract violation on the caller's side.
    pub fn find_source(
        &self,
        source: &Rc<dyn PlotSource>,
    ) -> Result<(usize, usize), ChartError> {
        for (pane_index, pane) in self.panes.iter().enumerate() {
            if let Some(dataset) = pane.position_of(source) {
                return Ok((pane_index, dataset));
            }
        }
        Err(ChartError::SeriesNotFound(source.key()))
    }

    pub fn find_by_key(&self, key: &SeriesKey) -> Option<(usize, usize)> {
        self.panes.iter().enumerate().find_map(|(pane_index, pane)| {
            pane.position_of_key(key).map(|dataset| (pane_index, dataset))
        })
    }

    /// Move an entry between panes, keeping its renderer and rebinding the
    /// dataset's pane back-reference. Returns the new dataset index.
    pub fn move_entry(
        &mut self,
        from: PaneId,
        dataset: usize,
        to: PaneId,
    ) -> Result<usize, ChartError> {
        if from == to {
            return Err(ChartError::StaleEntry);
        }
        self.pane(to).ok_or(ChartError::PaneNotFound)?;

        let origin = self.pane_mut(from).ok_or(ChartError::PaneNotFound)?;
        if dataset >= origin.len() {
            return Err(ChartError::StaleEntry);
        }
        let entry = origin.remove_entry(dataset);

        let target = self
            .pane_mut(to)
            .expect("target pane checked above");
        Ok(target.add_entry(entry))
    }

    /// Remove a removable series, compacting indices and rescaling its pane.
    pub fn remove_series(
        &mut self,
        pane_id: PaneId,
        dataset: usize,
    ) -> Result<SeriesEntry, ChartError> {
        let pane = self.pane_mut(pane_id).ok_or(ChartError::PaneNotFound)?;
        let entry = pane.entry(dataset).ok_or(ChartError::StaleEntry)?;
        if !entry.removable() {
            return Err(ChartError::NotRemovable(entry.key()));
        }
        Ok(pane.remove_entry(dataset))
    }

    /// Drop panes with no entries, except the live drop target.
    ///
    /// Weights of removed panes are not redistributed; the survivors expand
    /// through weight-sum renormalization in `regions`.
    pub fn remove_empty_panes(&mut self) -> usize {
        let keep = self.drop_target;
        let before = self.panes.len();
        self.panes
            .retain(|pane| !pane.is_empty() || Some(pane.id()) == keep);
        before - self.panes.len()
    }

    pub fn total_weight(&self) -> u32 {
        self.panes.iter().map(Pane::weight).sum()
    }

    /// Vertical layout of the stack: each pane gets a slice of `bounds`
    /// proportional to its weight.
    pub fn regions(&self, bounds: Rectangle) -> Vec<(PaneId, Rectangle)> {
        let total = self.total_weight();
        if total == 0 {
            return Vec::new();
        }

        let mut y = bounds.y;
        let mut regions = Vec::with_capacity(self.panes.len());
        for pane in &self.panes {
            let height = bounds.height * pane.weight() as f32 / total as f32;
            regions.push((
                pane.id(),
                Rectangle {
                    x: bounds.x,
                    y,
                    width: bounds.width,
                    height,
                },
            ));
            y += height;
        }
        regions
    }

    /// Index of the pane whose region contains `point`, if any.
    pub fn pane_index_at(&self, bounds: Rectangle, point: iced::Point) -> Option<usize> {
        self.regions(bounds)
            .iter()
            .position(|(_, region)| region.contains(point))
    }
}
