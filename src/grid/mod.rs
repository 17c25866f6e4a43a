//! Reservoir Grid and Spatial Index
//!
//! Corner-point grid geometry plus the `GridIndex` used by the snap engine to
//! map wellpath coordinates onto grid columns and cells.
//!
//! ## Conventions
//!
//! - Cells are addressed by global index `i + nx * (j + ny * k)`.
//! - `k` increases downward; a column is the stack of cells sharing `(i, j)`.
//! - Corner order inside a cell: bit 0 = +i, bit 1 = +j, bit 2 = bottom face.
//! - A cell is inactive when ACTNUM is 0 or it has no thickness or no
//!   footprint area. Inactive cells are never returned by lookups.
//!
//! The index is built once and is read-only afterwards, so it can be shared
//! by reference across worker threads.

pub mod geometry;

use geometry::{horizontal_distance, point_in_polygon, polygon_area, polygon_centroid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum footprint area for a cell to count as active (m²).
const MIN_FOOTPRINT_AREA: f64 = 1e-9;

/// Padding of column bounding boxes in the lookup buckets (m).
const BUCKET_MARGIN: f64 = 1e-6;

/// Global cell index, `i + nx * (j + ny * k)`.
pub type CellIndex = usize;

/// Identifier of a grid column that holds at least one active cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {0}x{1}x{2}")]
    InvalidDimensions(usize, usize, usize),

    #[error("expected {expected} cells for the grid dimensions, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },

    #[error("ACTNUM has {actual} entries, expected {expected}")]
    ActnumLengthMismatch { expected: usize, actual: usize },

    #[error("cell size must be positive and finite, got ({0}, {1}, {2})")]
    InvalidCellSize(f64, f64, f64),
}

/// Eight corner coordinates `[x, y, z]` of one hexahedral cell.
pub type CellCorners = [[f64; 3]; 8];

/// Parameters of a regular (axis-aligned) grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectangularSpec {
    pub dims: (usize, usize, usize),
    pub cell_size: (f64, f64, f64),
    #[serde(default)]
    pub origin: (f64, f64),
    #[serde(default)]
    pub top_depth: f64,
}

/// Derived geometry of one cell.
#[derive(Debug, Clone)]
struct CellGeometry {
    /// Mid-depth horizontal projection, vertices in ring order.
    footprint: [(f64, f64); 4],
    top: f64,
    bottom: f64,
    centroid: [f64; 3],
    active: bool,
}

impl CellGeometry {
    fn from_corners(corners: &CellCorners, actnum: bool) -> Self {
        // Ring order around the face: (0,0) (1,0) (1,1) (0,1)
        let footprint = [0usize, 1, 3, 2].map(|c| {
            let top = corners[c];
            let bottom = corners[c + 4];
            ((top[0] + bottom[0]) / 2.0, (top[1] + bottom[1]) / 2.0)
        });
        let top = corners[..4].iter().map(|c| c[2]).sum::<f64>() / 4.0;
        let bottom = corners[4..].iter().map(|c| c[2]).sum::<f64>() / 4.0;
        let mut centroid = [0.0; 3];
        for c in corners {
            for (acc, v) in centroid.iter_mut().zip(c) {
                *acc += v / 8.0;
            }
        }
        let area = polygon_area(&footprint).abs();
        let active = actnum
            && bottom - top > 0.0
            && area > MIN_FOOTPRINT_AREA
            && centroid.iter().all(|v| v.is_finite());
        Self {
            footprint,
            top,
            bottom,
            centroid,
            active,
        }
    }
}

// ============================================================================
// Grid
// ============================================================================

/// Immutable corner-point grid.
#[derive(Debug, Clone)]
pub struct Grid {
    nx: usize,
    ny: usize,
    nz: usize,
    cells: Vec<CellGeometry>,
}

impl Grid {
    /// Build a grid from per-cell corners in global index order.
    ///
    /// `actnum` entries of 0 deactivate cells; when absent all cells with
    /// positive volume are active.
    pub fn from_corners(
        dims: (usize, usize, usize),
        corners: &[CellCorners],
        actnum: Option<&[i32]>,
    ) -> Result<Self, GridError> {
        let (nx, ny, nz) = dims;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(GridError::InvalidDimensions(nx, ny, nz));
        }
        let expected = nx * ny * nz;
        if corners.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: corners.len(),
            });
        }
        if let Some(act) = actnum {
            if act.len() != expected {
                return Err(GridError::ActnumLengthMismatch {
                    expected,
                    actual: act.len(),
                });
            }
        }
        let cells = corners
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let flag = actnum.map_or(true, |a| a[idx] != 0);
                CellGeometry::from_corners(c, flag)
            })
            .collect();
        Ok(Self { nx, ny, nz, cells })
    }

    /// Build an axis-aligned grid: `i` along +x, `j` along +y, `k` downward.
    pub fn rectangular(spec: &RectangularSpec, actnum: Option<&[i32]>) -> Result<Self, GridError> {
        let (nx, ny, nz) = spec.dims;
        let (dx, dy, dz) = spec.cell_size;
        if [dx, dy, dz].iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(GridError::InvalidCellSize(dx, dy, dz));
        }
        let mut corners = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let mut cell = [[0.0; 3]; 8];
                    for (c, corner) in cell.iter_mut().enumerate() {
                        let di = (c & 1) as f64;
                        let dj = ((c >> 1) & 1) as f64;
                        let dk = ((c >> 2) & 1) as f64;
                        *corner = [
                            spec.origin.0 + (i as f64 + di) * dx,
                            spec.origin.1 + (j as f64 + dj) * dy,
                            spec.top_depth + (k as f64 + dk) * dz,
                        ];
                    }
                    corners.push(cell);
                }
            }
        }
        Self::from_corners(spec.dims, &corners, actnum)
    }

    pub const fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub const fn global_index(&self, i: usize, j: usize, k: usize) -> CellIndex {
        i + self.nx * (j + self.ny * k)
    }

    /// `(i, j, k)` of a global index.
    pub const fn ijk(&self, cell: CellIndex) -> (usize, usize, usize) {
        let i = cell % self.nx;
        let j = (cell / self.nx) % self.ny;
        let k = cell / (self.nx * self.ny);
        (i, j, k)
    }

    pub fn is_active(&self, cell: CellIndex) -> bool {
        self.cells.get(cell).is_some_and(|c| c.active)
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|c| c.active).count()
    }

    /// Per-cell active mask in global index order.
    pub fn active_mask(&self) -> Vec<bool> {
        self.cells.iter().map(|c| c.active).collect()
    }

    /// Representative depth of a cell (centroid z).
    pub fn cell_depth(&self, cell: CellIndex) -> f64 {
        self.cells.get(cell).map_or(f64::NAN, |c| c.centroid[2])
    }

    /// Cell centroid `[x, y, z]`.
    pub fn cell_center(&self, cell: CellIndex) -> Option<[f64; 3]> {
        self.cells.get(cell).map(|c| c.centroid)
    }
}

// ============================================================================
// Grid Index
// ============================================================================

#[derive(Debug, Clone)]
struct ColumnEntry {
    i: usize,
    j: usize,
    /// Horizontal centroid used for proximity ordering.
    center: (f64, f64),
    /// Active cells, top to bottom.
    cells: Vec<CellIndex>,
}

/// Uniform bucket grid over column bounding boxes.
///
/// A column is listed in every bucket its padded bounding box touches, in
/// ascending column order, so a bucket holds every column that can contain a
/// point inside it.
#[derive(Debug, Clone)]
struct ColumnBuckets {
    min: (f64, f64),
    max: (f64, f64),
    size: (f64, f64),
    n: usize,
    buckets: Vec<Vec<usize>>,
}

impl ColumnBuckets {
    /// `boxes` are `[xmin, ymin, xmax, ymax]` per column.
    fn new(boxes: &[[f64; 4]]) -> Self {
        let n = ((boxes.len() as f64).sqrt().ceil() as usize).max(1);
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for b in boxes {
            min = (min.0.min(b[0]), min.1.min(b[1]));
            max = (max.0.max(b[2]), max.1.max(b[3]));
        }
        let size = (
            ((max.0 - min.0) / n as f64).max(BUCKET_MARGIN),
            ((max.1 - min.1) / n as f64).max(BUCKET_MARGIN),
        );
        let mut out = Self {
            min,
            max,
            size,
            n,
            buckets: vec![Vec::new(); n * n],
        };
        for (idx, b) in boxes.iter().enumerate() {
            let (i0, i1) = (out.slot_x(b[0]), out.slot_x(b[2]));
            let (j0, j1) = (out.slot_y(b[1]), out.slot_y(b[3]));
            for j in j0..=j1 {
                for i in i0..=i1 {
                    out.buckets[i + n * j].push(idx);
                }
            }
        }
        out
    }

    fn slot_x(&self, x: f64) -> usize {
        (((x - self.min.0) / self.size.0).floor().max(0.0) as usize).min(self.n - 1)
    }

    fn slot_y(&self, y: f64) -> usize {
        (((y - self.min.1) / self.size.1).floor().max(0.0) as usize).min(self.n - 1)
    }

    /// Columns whose bounding box may contain `(x, y)`, ascending.
    fn candidates(&self, x: f64, y: f64) -> &[usize] {
        let inside = x >= self.min.0 && x <= self.max.0 && y >= self.min.1 && y <= self.max.1;
        if !inside {
            return &[];
        }
        &self.buckets[self.slot_x(x) + self.n * self.slot_y(y)]
    }
}

/// Read-only spatial index over a `Grid`.
#[derive(Debug, Clone)]
pub struct GridIndex {
    grid: Grid,
    columns: Vec<ColumnEntry>,
    buckets: ColumnBuckets,
}

impl GridIndex {
    /// Build the column index. Columns without active cells are left out.
    pub fn new(grid: Grid) -> Self {
        let (nx, ny, nz) = grid.dims();
        let mut columns = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                let cells: Vec<CellIndex> = (0..nz)
                    .map(|k| grid.global_index(i, j, k))
                    .filter(|&c| grid.is_active(c))
                    .collect();
                if cells.is_empty() {
                    continue;
                }
                let centers: Vec<(f64, f64)> = cells
                    .iter()
                    .map(|&c| polygon_centroid(&grid.cells[c].footprint))
                    .collect();
                columns.push(ColumnEntry {
                    i,
                    j,
                    center: polygon_centroid(&centers),
                    cells,
                });
            }
        }
        let boxes: Vec<[f64; 4]> = columns
            .iter()
            .map(|col| {
                let mut b = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
                for &c in &col.cells {
                    for &(x, y) in &grid.cells[c].footprint {
                        b = [b[0].min(x), b[1].min(y), b[2].max(x), b[3].max(y)];
                    }
                }
                [
                    b[0] - BUCKET_MARGIN,
                    b[1] - BUCKET_MARGIN,
                    b[2] + BUCKET_MARGIN,
                    b[3] + BUCKET_MARGIN,
                ]
            })
            .collect();
        let buckets = ColumnBuckets::new(&boxes);
        tracing::debug!(
            columns = columns.len(),
            active_cells = grid.active_count(),
            buckets = buckets.buckets.len(),
            "Grid index built"
        );
        Self {
            grid,
            columns,
            buckets,
        }
    }

    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Find the column whose footprint contains `(x, y)`.
    ///
    /// Columns are scanned nearest-centroid first, lower column index first on
    /// equal distance; the first column with an active cell footprint
    /// containing the point wins. Only columns whose bounding box covers the
    /// point are considered.
    pub fn resolve_column(&self, x: f64, y: f64) -> Option<ColumnId> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let mut order: Vec<(f64, usize)> = self
            .buckets
            .candidates(x, y)
            .iter()
            .map(|&idx| (horizontal_distance((x, y), self.columns[idx].center), idx))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        order.into_iter().map(|(_, idx)| idx).find(|&idx| {
            self.columns[idx]
                .cells
                .iter()
                .any(|&c| point_in_polygon((x, y), &self.grid.cells[c].footprint))
        })
        .map(ColumnId)
    }

    /// Active cell of `column` whose vertical span contains `z`.
    ///
    /// Walks top to bottom; a depth on a shared face belongs to the upper cell.
    pub fn cell_at(&self, column: ColumnId, z: f64) -> Option<CellIndex> {
        let entry = self.columns.get(column.0)?;
        entry.cells.iter().copied().find(|&c| {
            let g = &self.grid.cells[c];
            z >= g.top && z <= g.bottom
        })
    }

    /// Active cells of a column, top to bottom.
    pub fn column_cells(&self, column: ColumnId) -> &[CellIndex] {
        self.columns.get(column.0).map_or(&[], |c| c.cells.as_slice())
    }

    /// `(i, j)` of a column.
    pub fn column_ij(&self, column: ColumnId) -> Option<(usize, usize)> {
        self.columns.get(column.0).map(|c| (c.i, c.j))
    }

    /// Representative depth of a cell (centroid z).
    pub fn cell_depth(&self, cell: CellIndex) -> f64 {
        self.grid.cell_depth(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(dims: (usize, usize, usize)) -> RectangularSpec {
        RectangularSpec {
            dims,
            cell_size: (100.0, 100.0, 10.0),
            origin: (0.0, 0.0),
            top_depth: 2000.0,
        }
    }

    #[test]
    fn test_rectangular_geometry() {
        let grid = Grid::rectangular(&spec((3, 2, 4)), None).unwrap();
        assert_eq!(grid.cell_count(), 24);
        assert_eq!(grid.active_count(), 24);
        let c = grid.global_index(1, 1, 2);
        assert_eq!(grid.ijk(c), (1, 1, 2));
        let center = grid.cell_center(c).unwrap();
        assert!((center[0] - 150.0).abs() < 1e-9);
        assert!((center[1] - 150.0).abs() < 1e-9);
        assert!((center[2] - 2025.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_column_and_cell() {
        let index = GridIndex::new(Grid::rectangular(&spec((3, 3, 4)), None).unwrap());
        let col = index.resolve_column(250.0, 150.0).unwrap();
        assert_eq!(index.column_ij(col), Some((2, 1)));

        let cell = index.cell_at(col, 2015.0).unwrap();
        assert_eq!(index.grid().ijk(cell), (2, 1, 1));

        // Shared face belongs to the upper cell
        let face = index.cell_at(col, 2010.0).unwrap();
        assert_eq!(index.grid().ijk(face), (2, 1, 0));

        assert!(index.cell_at(col, 1999.0).is_none());
        assert!(index.cell_at(col, 2040.5).is_none());
    }

    /// One 10 m thick cell spanning `x0..x1` and `y` 0..100.
    fn slab(x0: f64, x1: f64) -> CellCorners {
        let mut corners = [[0.0; 3]; 8];
        for (c, corner) in corners.iter_mut().enumerate() {
            let x = if c & 1 == 0 { x0 } else { x1 };
            let y = ((c >> 1) & 1) as f64 * 100.0;
            *corner = [x, y, 2000.0 + ((c >> 2) & 1) as f64 * 10.0];
        }
        corners
    }

    #[test]
    fn test_overlapping_columns_nearest_centroid_wins() {
        // Column 0 spans x 0..100, column 1 spans x 50..150
        let corners = [slab(0.0, 100.0), slab(50.0, 150.0)];
        let grid = Grid::from_corners((2, 1, 1), &corners, None).unwrap();
        let index = GridIndex::new(grid);
        let ij = |x: f64| index.resolve_column(x, 50.0).and_then(|c| index.column_ij(c));
        assert_eq!(ij(20.0), Some((0, 0)));
        assert_eq!(ij(60.0), Some((0, 0)));
        assert_eq!(ij(90.0), Some((1, 0)));
        assert_eq!(ij(140.0), Some((1, 0)));
        // Equidistant from both centroids: lower column index wins
        assert_eq!(ij(75.0), Some((0, 0)));
    }

    #[test]
    fn test_lookup_covers_every_column() {
        let index = GridIndex::new(Grid::rectangular(&spec((7, 5, 2)), None).unwrap());
        for j in 0..5 {
            for i in 0..7 {
                let x = i as f64 * 100.0 + 50.0;
                let y = j as f64 * 100.0 + 50.0;
                let col = index.resolve_column(x, y).unwrap();
                assert_eq!(index.column_ij(col), Some((i, j)), "({x}, {y})");
            }
        }
        // Outer corner and a shared face
        let corner = index.resolve_column(700.0, 500.0).unwrap();
        assert_eq!(index.column_ij(corner), Some((6, 4)));
        let face = index.resolve_column(100.0, 50.0).unwrap();
        assert_eq!(index.column_ij(face), Some((0, 0)));
        assert!(index.resolve_column(700.5, 250.0).is_none());
    }

    #[test]
    fn test_outside_footprint() {
        let index = GridIndex::new(Grid::rectangular(&spec((2, 2, 2)), None).unwrap());
        assert!(index.resolve_column(-5.0, 50.0).is_none());
        assert!(index.resolve_column(50.0, 250.0).is_none());
        assert!(index.resolve_column(f64::NAN, 50.0).is_none());
    }

    #[test]
    fn test_inactive_cells_skipped() {
        // 1x1x3 column with the middle cell switched off
        let grid = Grid::rectangular(&spec((1, 1, 3)), Some(&[1, 0, 1])).unwrap();
        let index = GridIndex::new(grid);
        let col = index.resolve_column(50.0, 50.0).unwrap();
        assert_eq!(index.column_cells(col), &[0, 2]);
        assert!(index.cell_at(col, 2015.0).is_none());
        assert_eq!(index.cell_at(col, 2025.0), Some(2));
    }

    #[test]
    fn test_fully_inactive_column_never_matches() {
        let grid = Grid::rectangular(&spec((2, 1, 1)), Some(&[0, 1])).unwrap();
        let index = GridIndex::new(grid);
        assert_eq!(index.column_count(), 1);
        assert!(index.resolve_column(50.0, 50.0).is_none());
        assert!(index.resolve_column(150.0, 50.0).is_some());
    }

    #[test]
    fn test_zero_thickness_cell_is_inactive() {
        let mut corners = [[0.0; 3]; 8];
        for (c, corner) in corners.iter_mut().enumerate() {
            *corner = [(c & 1) as f64 * 10.0, ((c >> 1) & 1) as f64 * 10.0, 1500.0];
        }
        let grid = Grid::from_corners((1, 1, 1), &[corners], None).unwrap();
        assert_eq!(grid.active_count(), 0);
    }

    #[test]
    fn test_dimension_errors() {
        assert_eq!(
            Grid::from_corners((0, 1, 1), &[], None).unwrap_err(),
            GridError::InvalidDimensions(0, 1, 1)
        );
        assert!(matches!(
            Grid::rectangular(&spec((2, 2, 2)), Some(&[1, 1])),
            Err(GridError::ActnumLengthMismatch { expected: 8, actual: 2 })
        ));
    }
}
