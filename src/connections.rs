//! Connection graph between nearby particles.
//!
//! Every unordered pair closer than the threshold gets an edge whose
//! strength falls linearly from 1 at distance 0 to 0 at the threshold.
//! Brute force is O(n²) in the particle count; the grid search only
//! compares points in neighbouring cells of side at least `threshold` and
//! yields the same edges in the same order.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// How edge strength is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStyle {
    /// Fixed line width, connection alpha multiplied by strength
    FadeOpacity,
    /// Fixed color, line width multiplied by strength
    #[default]
    ScaleWidth,
}

/// Neighbour search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionSearch {
    #[default]
    BruteForce,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Index of the first particle, always `< b`
    pub a: usize,
    pub b: usize,
    pub distance: f64,
    /// `1 - distance / threshold`
    pub strength: f64,
}

/// Linear falloff: 1 at distance 0, 0 at and beyond `threshold`.
pub fn strength(distance: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / threshold).max(0.0)
}

fn edge(points: &[Vec2], a: usize, b: usize, threshold: f64) -> Option<Edge> {
    let distance = points[a].distance(points[b]);
    (distance < threshold).then(|| Edge {
        a,
        b,
        distance,
        strength: strength(distance, threshold),
    })
}

pub fn find(points: &[Vec2], threshold: f64, search: ConnectionSearch) -> Vec<Edge> {
    match search {
        ConnectionSearch::BruteForce => brute_force(points, threshold),
        ConnectionSearch::Grid => SpatialGrid::build(points, threshold).edges(points),
    }
}

pub fn brute_force(points: &[Vec2], threshold: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    if threshold <= 0.0 {
        return edges;
    }
    for a in 0..points.len() {
        for b in (a + 1)..points.len() {
            if let Some(e) = edge(points, a, b, threshold) {
                edges.push(e);
            }
        }
    }
    edges
}

/// Uniform bucket grid anchored at the minimum point so any finite
/// coordinates are accepted. Cells have side `threshold`, widened when that
/// would need more than [`MAX_CELLS_PER_POINT`] cells per point.
pub struct SpatialGrid {
    threshold: f64,
    cell: f64,
    origin: Vec2,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

/// Cell budget per point; a tiny threshold over a wide spread would otherwise
/// allocate an unbounded number of empty cells.
pub const MAX_CELLS_PER_POINT: usize = 4;

impl SpatialGrid {
    pub fn build(points: &[Vec2], threshold: f64) -> Self {
        let mut grid = Self {
            threshold,
            cell: threshold,
            origin: Vec2::ZERO,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        };
        if points.is_empty() || threshold <= 0.0 {
            return grid;
        }

        let (mut min, mut max) = (points[0], points[0]);
        for p in points {
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
        }
        grid.origin = min;

        let spread = max - min;
        let budget = (points.len() * MAX_CELLS_PER_POINT).max(1) as f64;
        let span = |extent: f64, cell: f64| (extent / cell).floor() + 1.0;
        if span(spread.x, threshold) * span(spread.y, threshold) > budget {
            // at most sqrt(budget) + 1 cells along each axis
            let per_axis = budget.sqrt();
            grid.cell = threshold.max(spread.x / per_axis).max(spread.y / per_axis);
        }
        grid.cols = span(spread.x, grid.cell).max(1.0) as usize;
        grid.rows = span(spread.y, grid.cell).max(1.0) as usize;
        grid.cells = vec![Vec::new(); grid.cols * grid.rows];

        for (i, p) in points.iter().enumerate() {
            let (cx, cy) = grid.cell_of(*p);
            grid.cells[cy * grid.cols + cx].push(i);
        }
        grid
    }

    fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let cx = ((p.x - self.origin.x) / self.cell).floor() as usize;
        let cy = ((p.y - self.origin.y) / self.cell).floor() as usize;
        (cx.min(self.cols - 1), cy.min(self.rows - 1))
    }

    /// Edges within the threshold, sorted by `(a, b)`.
    pub fn edges(&self, points: &[Vec2]) -> Vec<Edge> {
        let mut edges = Vec::new();
        if self.cells.is_empty() {
            return edges;
        }

        for (a, p) in points.iter().enumerate() {
            let (cx, cy) = self.cell_of(*p);
            for ny in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
                for nx in cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1) {
                    for &b in &self.cells[ny * self.cols + nx] {
                        if b <= a {
                            continue;
                        }
                        if let Some(e) = edge(points, a, b, self.threshold) {
                            edges.push(e);
                        }
                    }
                }
            }
        }

        edges.sort_by(|l, r| (l.a, l.b).cmp(&(r.a, r.b)));
        edges
    }
}
