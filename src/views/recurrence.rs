use log::debug;
use ndarray::Array2;

use crate::recording::Recording;
use crate::views::{Placeholder, ViewOutput};

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DensityBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl DensityBounds {
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let init = DensityBounds {
            x_min: first.0,
            x_max: first.0,
            y_min: first.1,
            y_max: first.1,
        };
        Some(rest.iter().fold(init, |b, &(x, y)| DensityBounds {
            x_min: b.x_min.min(x),
            x_max: b.x_max.max(x),
            y_min: b.y_min.min(y),
            y_max: b.y_max.max(y),
        }))
    }
}

/// 50 up to 1k points, 75 up to 10k, 100 beyond.
pub fn grid_size_for(point_count: usize) -> usize {
    match point_count {
        0..=1_000 => 50,
        1_001..=10_000 => 75,
        _ => 100,
    }
}

/// `floor((v - min) / range * (size - 1))` clamped; a flat range lands in the middle.
pub fn bin_index(value: f64, min: f64, max: f64, size: usize) -> usize {
    let last = size.saturating_sub(1);
    let range = max - min;
    if range <= f64::EPSILON || !range.is_finite() {
        return size / 2;
    }
    let idx = ((value - min) / range * last as f64).floor();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(last)
    }
}

/// `(x_i, y_i)` for `i < min(len_x, len_y)`, skipping non-finite pairs.
pub fn pair_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect()
}

/// Square 2D histogram; rows follow Y, columns follow X.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityGrid {
    counts: Array2<u32>,
    bounds: DensityBounds,
    max_count: u32,
}

impl DensityGrid {
    pub fn build(points: &[(f64, f64)], size: usize) -> Self {
        let size = size.max(1);
        let bounds = DensityBounds::from_points(points).unwrap_or_default();
        Self::build_with_bounds(points, size, bounds)
    }

    fn build_with_bounds(points: &[(f64, f64)], size: usize, bounds: DensityBounds) -> Self {
        let mut counts = Array2::<u32>::zeros((size, size));
        for &(x, y) in points {
            let col = bin_index(x, bounds.x_min, bounds.x_max, size);
            let row = bin_index(y, bounds.y_min, bounds.y_max, size);
            counts[[row, col]] += 1;
        }
        let max_count = counts.iter().copied().max().unwrap_or(0);
        Self {
            counts,
            bounds,
            max_count,
        }
    }

    pub fn size(&self) -> usize {
        self.counts.nrows()
    }

    pub fn bounds(&self) -> DensityBounds {
        self.bounds
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn count(&self, row: usize, col: usize) -> u32 {
        self.counts.get((row, col)).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }
}

#[derive(Clone, Debug)]
pub struct DensityFrame {
    pub x_channel: String,
    pub y_channel: String,
    pub x_label: String,
    pub y_label: String,
    pub grid: DensityGrid,
    /// Colour normaliser; pinned to the full-dataset maximum in progressive mode.
    pub normalizer: u32,
    pub points_used: usize,
    pub total_points: usize,
}

#[derive(Clone, Debug)]
struct PairCache {
    axes: (String, String),
    points: Vec<(f64, f64)>,
    grid_size: usize,
    full: DensityGrid,
}

#[derive(Clone, Debug)]
pub struct RecurrenceView {
    progressive: bool,
    cache: Option<PairCache>,
    subset: Option<(usize, DensityGrid)>,
    last_time: Option<f64>,
}

impl RecurrenceView {
    pub fn new(progressive: bool) -> Self {
        Self {
            progressive,
            cache: None,
            subset: None,
            last_time: None,
        }
    }

    pub fn progressive(&self) -> bool {
        self.progressive
    }

    pub fn set_progressive(&mut self, progressive: bool) {
        self.progressive = progressive;
        self.subset = None;
        self.last_time = None;
    }

    pub fn reset(&mut self) {
        self.cache = None;
        self.subset = None;
        self.last_time = None;
    }

    pub fn update(
        &mut self,
        recording: &Recording,
        axes: Option<(&str, &str)>,
        current_time: f64,
        duration: f64,
    ) {
        let Some((x_id, y_id)) = axes else {
            self.reset();
            return;
        };
        let (Some(x), Some(y)) = (recording.channel(x_id), recording.channel(y_id)) else {
            self.reset();
            return;
        };
        if x.is_empty() || y.is_empty() {
            self.reset();
            return;
        }
        let stale = self
            .cache
            .as_ref()
            .map_or(true, |c| c.axes.0 != x_id || c.axes.1 != y_id);
        if stale {
            let points = pair_points(&x.samples, &y.samples);
            let grid_size = grid_size_for(points.len());
            let full = DensityGrid::build(&points, grid_size);
            debug!(
                "density rebuild: x={x_id} y={y_id} points={} grid={grid_size} max={}",
                points.len(),
                full.max_count()
            );
            self.cache = Some(PairCache {
                axes: (x_id.to_owned(), y_id.to_owned()),
                points,
                grid_size,
                full,
            });
            self.subset = None;
            self.last_time = None;
        }
        if !self.progressive || self.last_time == Some(current_time) {
            return;
        }
        self.last_time = Some(current_time);
        let Some(cache) = &self.cache else {
            return;
        };
        let progress = if duration > 0.0 {
            (current_time / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let take = (progress * cache.points.len() as f64).floor() as usize;
        if matches!(&self.subset, Some((n, _)) if *n == take) {
            return;
        }
        let subset = &cache.points[..take];
        let bounds = DensityBounds::from_points(subset).unwrap_or(cache.full.bounds());
        let grid = DensityGrid::build_with_bounds(subset, cache.grid_size, bounds);
        self.subset = Some((take, grid));
    }

    /// The full grid is shown until playback has moved; afterwards the time-gated
    /// subset, even while paused.
    pub fn frame(
        &self,
        recording: &Recording,
        axes: Option<(&str, &str)>,
        current_time: f64,
        is_playing: bool,
    ) -> ViewOutput<DensityFrame> {
        let Some((x_id, y_id)) = axes else {
            return ViewOutput::Waiting(Placeholder::SelectTwoChannels);
        };
        let (Some(x), Some(y)) = (recording.channel(x_id), recording.channel(y_id)) else {
            return ViewOutput::Waiting(Placeholder::SelectTwoChannels);
        };
        if x.is_empty() || y.is_empty() {
            return ViewOutput::Waiting(Placeholder::NoData);
        }
        let Some(cache) = self
            .cache
            .as_ref()
            .filter(|c| c.axes.0 == x_id && c.axes.1 == y_id)
        else {
            return ViewOutput::Waiting(Placeholder::WaitingForData);
        };
        if cache.points.is_empty() {
            return ViewOutput::Waiting(Placeholder::NoData);
        }
        let started = is_playing || current_time > 0.0;
        let (grid, points_used) = match &self.subset {
            Some((n, grid)) if self.progressive && started => (grid.clone(), *n),
            _ => (cache.full.clone(), cache.points.len()),
        };
        ViewOutput::Ready(DensityFrame {
            x_channel: x.id.clone(),
            y_channel: y.id.clone(),
            x_label: x.label.clone(),
            y_label: y.label.clone(),
            grid,
            normalizer: cache.full.max_count(),
            points_used,
            total_points: cache.points.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalKind;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn pair_recording(x: Vec<f64>, y: Vec<f64>, rate: f64) -> Recording {
        Recording::new(
            vec![("ch1".into(), x), ("ch2".into(), y)],
            rate,
            SignalKind::Generic,
        )
        .unwrap()
    }

    #[test]
    fn grid_resolution_tiers() {
        assert_eq!(grid_size_for(10), 50);
        assert_eq!(grid_size_for(1_000), 50);
        assert_eq!(grid_size_for(1_001), 75);
        assert_eq!(grid_size_for(10_000), 75);
        assert_eq!(grid_size_for(10_001), 100);
    }

    #[test]
    fn bin_index_clamps_and_centres_flat_ranges() {
        assert_eq!(bin_index(0.0, 0.0, 1.0, 50), 0);
        assert_eq!(bin_index(1.0, 0.0, 1.0, 50), 49);
        assert_eq!(bin_index(5.0, 0.0, 1.0, 50), 49);
        assert_eq!(bin_index(-5.0, 0.0, 1.0, 50), 0);
        assert_eq!(bin_index(3.0, 3.0, 3.0, 50), 25);
    }

    #[test]
    fn counts_are_conserved() {
        let mut rng = StdRng::seed_from_u64(11);
        let points: Vec<(f64, f64)> = (0..1_000)
            .map(|_| (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
            .collect();
        let grid = DensityGrid::build(&points, grid_size_for(points.len()));
        assert_eq!(grid.size(), 50);
        assert_eq!(grid.total(), 1_000);
        // 1000 points over 2500 cells: sparse, a handful per cell at most.
        assert!(grid.max_count() >= 1 && grid.max_count() <= 8);
    }

    #[test]
    fn evenly_spread_points_fill_distinct_cells() {
        // 40 x 25 lattice over [0, 1]^2: every point lands in its own bin.
        let points: Vec<(f64, f64)> = (0..40)
            .flat_map(|i| (0..25).map(move |j| (i as f64 / 39.0, j as f64 / 24.0)))
            .collect();
        assert_eq!(points.len(), 1_000);
        let grid = DensityGrid::build(&points, grid_size_for(points.len()));
        assert_eq!(grid.size(), 50);
        assert_eq!(grid.total(), 1_000);
        assert_eq!(grid.max_count(), 1);
        assert_eq!(grid.count(0, 0), 1);
        assert_eq!(grid.count(49, 49), 1);
    }

    #[test]
    fn non_finite_pairs_are_dropped() {
        let points = pair_points(&[1.0, f64::NAN, 3.0, 4.0], &[1.0, 2.0, f64::INFINITY]);
        assert_eq!(points, vec![(1.0, 1.0)]);
        let grid = DensityGrid::build(&points, 50);
        assert_eq!(grid.total(), 1);
        assert_eq!(grid.count(25, 25), 1);
    }

    #[test]
    fn progressive_subset_pins_normalizer() {
        let x: Vec<f64> = (0..1_000).map(|i| (i as f64 * 0.01).sin()).collect();
        let y: Vec<f64> = (0..1_000).map(|i| (i as f64 * 0.013).cos()).collect();
        let rec = pair_recording(x, y, 100.0);
        let mut view = RecurrenceView::new(true);
        let axes = Some(("ch1", "ch2"));
        view.update(&rec, axes, 2.5, rec.duration());
        let out = view.frame(&rec, axes, 2.5, true);
        let frame = out.ready().unwrap();
        assert_eq!(frame.points_used, 250);
        assert_eq!(frame.grid.total(), 250);
        assert_eq!(frame.total_points, 1_000);

        view.update(&rec, axes, 10.0, rec.duration());
        let full = view.frame(&rec, axes, 10.0, false);
        let full = full.ready().unwrap();
        assert_eq!(full.points_used, 1_000);
        assert_eq!(full.normalizer, frame.normalizer);
        assert_eq!(full.normalizer, full.grid.max_count());
    }

    #[test]
    fn paused_subset_is_retained() {
        let rec = pair_recording(vec![1.0, 2.0, 3.0, 4.0], vec![4.0, 3.0, 2.0, 1.0], 1.0);
        let mut view = RecurrenceView::new(true);
        let axes = Some(("ch1", "ch2"));
        view.update(&rec, axes, 2.0, rec.duration());
        let first = view.frame(&rec, axes, 2.0, false);
        assert_eq!(first.ready().unwrap().points_used, 2);
        view.update(&rec, axes, 2.0, rec.duration());
        let again = view.frame(&rec, axes, 2.0, false);
        assert_eq!(again.ready().unwrap().points_used, 2);
    }

    #[test]
    fn idle_clock_shows_full_dataset() {
        let rec = pair_recording(vec![1.0, 2.0, 3.0, 4.0], vec![4.0, 3.0, 2.0, 1.0], 1.0);
        let mut view = RecurrenceView::new(true);
        let axes = Some(("ch1", "ch2"));
        view.update(&rec, axes, 0.0, rec.duration());
        let out = view.frame(&rec, axes, 0.0, false);
        assert_eq!(out.ready().unwrap().points_used, 4);
    }

    #[test]
    fn placeholders_without_pair_or_data() {
        let rec = pair_recording(vec![1.0, 2.0], vec![], 1.0);
        let mut view = RecurrenceView::new(false);
        assert_eq!(
            view.frame(&rec, None, 0.0, false).placeholder(),
            Some(Placeholder::SelectTwoChannels)
        );
        view.update(&rec, Some(("ch1", "ch2")), 0.0, rec.duration());
        assert_eq!(
            view.frame(&rec, Some(("ch1", "ch2")), 0.0, false).placeholder(),
            Some(Placeholder::NoData)
        );
    }
}
