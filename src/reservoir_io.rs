//! Reservoir Model Files
//!
//! JSON representation of the simulator outputs the snap engine reads:
//!
//! - grid: `{"rectangular": {...}}` or `{"corner_point": {"dims": [..], "corners": [..]}}`,
//!   plus an optional `"actnum"` array
//! - restart: `{"steps": [{"date": "2020-01-01", "keywords": {"SWAT": [..]}}]}`
//! - init: `{"keywords": {"PERMX": [..]}}`
//!
//! Property arrays are in global cell order and must match the grid's cell
//! count.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::grid::{CellCorners, Grid, GridError, GridIndex, RectangularSpec};
use crate::properties::{PropertyError, PropertyStore, ReportStep};
use crate::types::{flexible_date, ReportStepPolicy};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("grid: {0}")]
    Grid(#[from] GridError),

    #[error("properties: {0}")]
    Property(#[from] PropertyError),
}

// ============================================================================
// File Layouts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridGeometry {
    Rectangular(RectangularSpec),
    CornerPoint {
        dims: (usize, usize, usize),
        corners: Vec<CellCorners>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFile {
    #[serde(flatten)]
    pub geometry: GridGeometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actnum: Option<Vec<i32>>,
}

impl GridFile {
    pub fn build(&self) -> Result<Grid, GridError> {
        let actnum = self.actnum.as_deref();
        match &self.geometry {
            GridGeometry::Rectangular(spec) => Grid::rectangular(spec, actnum),
            GridGeometry::CornerPoint { dims, corners } => Grid::from_corners(*dims, corners, actnum),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(with = "flexible_date")]
    pub date: chrono::NaiveDate,
    pub keywords: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestartFile {
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitFile {
    pub keywords: BTreeMap<String, Vec<f64>>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let file = File::open(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write any model file layout as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    let file = File::create(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, value).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Loaders
// ============================================================================

pub fn load_grid(path: &Path) -> Result<Grid, ModelError> {
    let grid = read_json::<GridFile>(path)?.build()?;
    let (nx, ny, nz) = grid.dims();
    info!(
        path = %path.display(),
        nx, ny, nz,
        active = grid.active_count(),
        "Loaded grid"
    );
    Ok(grid)
}

pub fn load_restart(path: &Path) -> Result<Vec<ReportStep>, ModelError> {
    let file: RestartFile = read_json(path)?;
    let steps: Vec<ReportStep> = file
        .steps
        .into_iter()
        .map(|s| {
            s.keywords
                .into_iter()
                .fold(ReportStep::new(s.date), |step, (kw, values)| step.with_keyword(&kw, values))
        })
        .collect();
    info!(path = %path.display(), steps = steps.len(), "Loaded restart report steps");
    Ok(steps)
}

pub fn load_init(path: &Path) -> Result<BTreeMap<String, Vec<f64>>, ModelError> {
    let file: InitFile = read_json(path)?;
    info!(path = %path.display(), keywords = file.keywords.len(), "Loaded init properties");
    Ok(file.keywords)
}

/// Grid index plus property archive, loaded once per run.
#[derive(Debug)]
pub struct ReservoirModel {
    pub index: GridIndex,
    pub store: PropertyStore,
}

impl ReservoirModel {
    pub fn load(
        grid: &Path,
        restart: &Path,
        init: Option<&Path>,
        policy: ReportStepPolicy,
    ) -> Result<Self, ModelError> {
        let grid = load_grid(grid)?;
        let mut store = PropertyStore::new(load_restart(restart)?)?.with_policy(policy);
        if let Some(init) = init {
            store = store.with_statics(load_init(init)?);
        }
        let store = store.bind_to_grid(&grid.active_mask())?;
        Ok(Self {
            index: GridIndex::new(grid),
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_grid_json() {
        let json = r#"{
            "rectangular": {"dims": [2, 1, 3], "cell_size": [10.0, 10.0, 5.0], "top_depth": 1000.0},
            "actnum": [1, 1, 0, 1, 1, 1]
        }"#;
        let file: GridFile = serde_json::from_str(json).unwrap();
        let grid = file.build().unwrap();
        assert_eq!(grid.dims(), (2, 1, 3));
        assert_eq!(grid.active_count(), 5);
        assert!(!grid.is_active(2));
    }

    #[test]
    fn test_corner_point_grid_json() {
        let mut corners = [[0.0; 3]; 8];
        for (c, corner) in corners.iter_mut().enumerate() {
            *corner = [
                (c & 1) as f64 * 50.0,
                ((c >> 1) & 1) as f64 * 50.0,
                2000.0 + ((c >> 2) & 1) as f64 * 4.0,
            ];
        }
        let file = GridFile {
            geometry: GridGeometry::CornerPoint {
                dims: (1, 1, 1),
                corners: vec![corners],
            },
            actnum: None,
        };
        let text = serde_json::to_string(&file).unwrap();
        assert!(text.contains("corner_point"));
        let grid = serde_json::from_str::<GridFile>(&text).unwrap().build().unwrap();
        assert!((grid.cell_depth(0) - 2002.0).abs() < 1e-9);
    }

    #[test]
    fn test_restart_and_init_load() {
        let dir = tempfile::tempdir().unwrap();
        let grid_path = dir.path().join("grid.json");
        let restart_path = dir.path().join("restart.json");
        let init_path = dir.path().join("init.json");

        write_json(
            &grid_path,
            &GridFile {
                geometry: GridGeometry::Rectangular(RectangularSpec {
                    dims: (1, 1, 2),
                    cell_size: (1.0, 1.0, 1.0),
                    origin: (0.0, 0.0),
                    top_depth: 0.0,
                }),
                actnum: Some(vec![1, 0]),
            },
        )
        .unwrap();
        std::fs::write(
            &restart_path,
            r#"{"steps": [
                {"date": "2020", "keywords": {"swat": [0.2, 0.9]}},
                {"date": "2021-06", "keywords": {"SWAT": [0.3, 0.9]}}
            ]}"#,
        )
        .unwrap();
        std::fs::write(&init_path, r#"{"keywords": {"PERMX": [150.0, 10.0]}}"#).unwrap();

        let model = ReservoirModel::load(
            &grid_path,
            &restart_path,
            Some(&init_path),
            ReportStepPolicy::NearestPreceding,
        )
        .unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let swat = model.store.values_at_date(date, "SWAT").unwrap();
        assert!((swat[0] - 0.2).abs() < 1e-12);
        // Inactive cell masked
        assert!(swat[1].is_nan());
        assert!(model.store.static_values("PERMX").unwrap()[1].is_nan());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let grid_path = dir.path().join("grid.json");
        let restart_path = dir.path().join("restart.json");
        std::fs::write(
            &grid_path,
            r#"{"rectangular": {"dims": [1, 1, 2], "cell_size": [1.0, 1.0, 1.0]}}"#,
        )
        .unwrap();
        std::fs::write(
            &restart_path,
            r#"{"steps": [{"date": "2020", "keywords": {"SWAT": [0.2]}}]}"#,
        )
        .unwrap();
        let err = ReservoirModel::load(&grid_path, &restart_path, None, ReportStepPolicy::Nearest)
            .unwrap_err();
        assert!(matches!(err, ModelError::Property(PropertyError::LengthMismatch { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = load_grid(Path::new("/nonexistent/grid.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
