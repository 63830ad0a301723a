//! Uniform grid over a fixed boundary.

use ahash::AHashSet;
use geo::Rect;

/// A uniform grid of cells over a fixed rectangle.  Items are inserted into
/// every cell their bounding box touches; boxes reaching past the boundary
/// are clamped to the outermost cells.
#[derive(Debug, Clone)]
pub struct IntersectionGrid<T> {
    bounds: Rect<f64>,
    cell_width: f64,
    cell_height: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<T>>,
}

impl<T: Copy + Eq + std::hash::Hash> IntersectionGrid<T> {
    /// Cells are roughly `cell_size` wide, but never more than
    /// `max_cells_per_axis` along either axis.
    pub fn new(bounds: Rect<f64>, cell_size: f64, max_cells_per_axis: usize) -> Self {
        let axis_cells = |extent: f64| -> usize {
            let n = (extent / cell_size).ceil();
            if n.is_finite() && n >= 1.0 { (n as usize).min(max_cells_per_axis.max(1)) } else { 1 }
        };

        let cols = axis_cells(bounds.width());
        let rows = axis_cells(bounds.height());

        Self {
            bounds,
            cell_width: bounds.width() / cols as f64,
            cell_height: bounds.height() / rows as f64,
            cols,
            rows,
            cells: (0..cols * rows).map(|_| Vec::new()).collect(),
        }
    }

    #[inline] pub fn cols(&self) -> usize { self.cols }

    #[inline] pub fn rows(&self) -> usize { self.rows }

    /// Column or row of a coordinate along one axis, clamped to the grid.
    #[inline]
    fn cell_index(value: f64, origin: f64, step: f64, count: usize) -> usize {
        if step.is_nan() || step <= 0.0 { return 0 }
        let i = ((value - origin) / step).floor();
        if i <= 0.0 || i.is_nan() { 0 } else { (i as usize).min(count - 1) }
    }

    /// Indices of all cells touched by `rect`.
    fn cells_of(&self, rect: &Rect<f64>) -> impl Iterator<Item = usize> + '_ {
        let (min, max) = (rect.min(), rect.max());
        let origin = self.bounds.min();
        let col0 = Self::cell_index(min.x, origin.x, self.cell_width, self.cols);
        let col1 = Self::cell_index(max.x, origin.x, self.cell_width, self.cols);
        let row0 = Self::cell_index(min.y, origin.y, self.cell_height, self.rows);
        let row1 = Self::cell_index(max.y, origin.y, self.cell_height, self.rows);

        (row0..=row1).flat_map(move |row| (col0..=col1).map(move |col| row * self.cols + col))
    }

    pub fn insert(&mut self, item: T, rect: &Rect<f64>) {
        let cells: Vec<usize> = self.cells_of(rect).collect();
        for cell in cells {
            self.cells[cell].push(item);
        }
    }

    /// Items already in any cell touched by `rect`, each once, in the order
    /// they were first met.
    pub fn probe(&self, rect: &Rect<f64>) -> Vec<T> {
        let mut seen = AHashSet::new();
        let mut found = Vec::new();
        for cell in self.cells_of(rect) {
            for &item in &self.cells[cell] {
                if seen.insert(item) {
                    found.push(item);
                }
            }
        }
        found
    }

    /// Probe for items sharing a cell with `rect`, then insert `item`.
    /// Inserting every item this way yields each overlapping pair exactly
    /// once.
    pub fn insert_and_probe(&mut self, item: T, rect: &Rect<f64>) -> Vec<T> {
        let found = self.probe(rect);
        self.insert(item, rect);
        found
    }
}
