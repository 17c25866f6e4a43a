//! Wellpath trajectory files
//!
//! Plain-text trajectory format shared with RMS:
//!
//! ```text
//! 1.0                      <- version
//! Unknown                  <- well type
//! A-1H 456000.0 6780000.0 25.0   <- name [rkb_x [rkb_y [rkb_z]]]
//! 1                        <- number of logs
//! MD 1 lin                 <- one "NAME unit scale" line per log
//! 456010.0 6780010.0 1580.0 1605.0   <- rows: x y z log...
//! ```
//!
//! Blank lines and lines starting with `--` are ignored. Output writes the
//! same shape with two-decimal values, or the ResInsight flavor
//! (`name` followed by `x y tvd md` rows).

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Measured depth column name.
pub const MD_HEADER: &str = "MD";

#[derive(Debug, Error)]
pub enum WellPathError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}: unexpected end of file while reading {what}")]
    Truncated { origin: String, what: &'static str },

    #[error("{origin}: line {line}: {message}")]
    Malformed {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("column {0} already exists")]
    DuplicateColumn(String),

    #[error("column {header} has {actual} values, wellpath has {expected} points")]
    ColumnLength {
        header: String,
        expected: usize,
        actual: usize,
    },

    #[error("output file {0} exists, cannot overwrite unless explicitly told to")]
    OutputExists(PathBuf),
}

/// Output flavor of `WellPath::write_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Rms,
    ResInsight,
}

/// One trajectory point.
#[derive(Debug, Clone, PartialEq)]
pub struct WellPathPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Extra log values, in `WellPath::log_headers` order.
    pub logs: Vec<f64>,
}

/// Ordered trajectory plus header metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct WellPath {
    pub version: String,
    pub well_type: String,
    pub name: String,
    /// Reference datum `(x, y, z)`.
    pub rkb: (f64, f64, f64),
    /// File the path was read from, if any.
    pub source: Option<PathBuf>,
    log_headers: Vec<String>,
    points: Vec<WellPathPoint>,
}

impl WellPath {
    pub fn new(name: &str) -> Self {
        Self {
            version: "1.0".to_string(),
            well_type: "Unknown".to_string(),
            name: name.to_string(),
            rkb: (0.0, 0.0, 0.0),
            source: None,
            log_headers: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Create a wellpath with the given extra log headers.
    pub fn with_logs(name: &str, headers: &[&str]) -> Self {
        let mut wp = Self::new(name);
        wp.log_headers = headers.iter().map(|h| (*h).to_string()).collect();
        wp
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[WellPathPoint] {
        &self.points
    }

    pub fn log_headers(&self) -> &[String] {
        &self.log_headers
    }

    fn column_index(&self, header: &str) -> Option<usize> {
        self.log_headers.iter().position(|h| h == header)
    }

    pub fn has_column(&self, header: &str) -> bool {
        self.column_index(header).is_some()
    }

    /// Append a point. Missing log values are padded with NaN.
    pub fn push_point(&mut self, x: f64, y: f64, z: f64, mut logs: Vec<f64>) {
        logs.resize(self.log_headers.len(), f64::NAN);
        self.points.push(WellPathPoint { x, y, z, logs });
        if self.points.len() == 1 {
            self.update_rkb();
        }
    }

    /// Values of a log column, if present.
    pub fn column(&self, header: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(header)?;
        Some(self.points.iter().map(|p| p.logs[idx]).collect())
    }

    /// Measured depth of point `idx`, when the path carries an MD log.
    pub fn md(&self, idx: usize) -> Option<f64> {
        let col = self.column_index(MD_HEADER)?;
        self.points.get(idx).map(|p| p.logs[col])
    }

    /// Append a log column.
    pub fn add_column(&mut self, header: &str, values: Vec<f64>) -> Result<(), WellPathError> {
        if self.has_column(header) || ["x", "y", "z"].contains(&header) {
            return Err(WellPathError::DuplicateColumn(header.to_string()));
        }
        if values.len() != self.points.len() {
            return Err(WellPathError::ColumnLength {
                header: header.to_string(),
                expected: self.points.len(),
                actual: values.len(),
            });
        }
        self.log_headers.push(header.to_string());
        for (p, v) in self.points.iter_mut().zip(values) {
            p.logs.push(v);
        }
        Ok(())
    }

    /// Overwrite an existing log column.
    pub fn replace_column(&mut self, header: &str, values: &[f64]) -> Result<(), WellPathError> {
        let idx = self
            .column_index(header)
            .ok_or_else(|| WellPathError::Malformed {
                origin: self.name.clone(),
                line: 0,
                message: format!("no column named {header}"),
            })?;
        if values.len() != self.points.len() {
            return Err(WellPathError::ColumnLength {
                header: header.to_string(),
                expected: self.points.len(),
                actual: values.len(),
            });
        }
        for (p, v) in self.points.iter_mut().zip(values) {
            p.logs[idx] = *v;
        }
        Ok(())
    }

    /// Overwrite `header` when present, otherwise append it.
    pub fn set_column(&mut self, header: &str, values: Vec<f64>) -> Result<(), WellPathError> {
        if self.has_column(header) {
            self.replace_column(header, &values)
        } else {
            self.add_column(header, values)
        }
    }

    /// Replace the z (TVD) values of all points.
    pub fn set_depths(&mut self, depths: &[f64]) {
        for (p, z) in self.points.iter_mut().zip(depths) {
            p.z = *z;
        }
        self.update_rkb();
    }

    /// RKB follows the first point: `(x0, y0, MD0 - TVD0)` when MD is known.
    fn update_rkb(&mut self) {
        let Some(first) = self.points.first() else {
            return;
        };
        let Some(md) = self.md(0) else {
            return;
        };
        if md.is_finite() && first.z.is_finite() {
            self.rkb = (first.x, first.y, md - first.z);
        }
    }

    /// Where the snapped path is written.
    ///
    /// `<output_dir>/<name>.out` for single-token well names, otherwise the
    /// input file name with `.out` appended.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        let single_token = self.name.len() > 1 && self.name.split_whitespace().count() == 1;
        match &self.source {
            Some(src) if !single_token => {
                let mut out = src.clone().into_os_string();
                out.push(".out");
                PathBuf::from(out)
            }
            _ => output_dir.join(format!("{}.out", self.name.trim())),
        }
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    /// Read a wellpath file.
    pub fn from_file(path: &Path) -> Result<Self, WellPathError> {
        let file = File::open(path).map_err(|source| WellPathError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut wp = Self::parse(BufReader::new(file), &path.display().to_string())?;
        wp.source = Some(path.to_path_buf());
        Ok(wp)
    }

    /// Parse a wellpath from any buffered reader. `origin` names the source
    /// in error messages.
    pub fn parse<R: BufRead>(reader: R, origin: &str) -> Result<Self, WellPathError> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(n, l)| (n + 1, l))
            .filter(|(_, l)| {
                l.as_ref().map_or(true, |s| {
                    let t = s.trim();
                    !t.is_empty() && !t.starts_with("--")
                })
            });

        let mut next = |what: &'static str| -> Result<(usize, String), WellPathError> {
            match lines.next() {
                Some((n, Ok(line))) => Ok((n, line.split_whitespace().collect::<Vec<_>>().join(" "))),
                Some((_, Err(source))) => Err(WellPathError::Io {
                    path: PathBuf::from(origin),
                    source,
                }),
                None => Err(WellPathError::Truncated {
                    origin: origin.to_string(),
                    what,
                }),
            }
        };
        let malformed = |line: usize, message: String| WellPathError::Malformed {
            origin: origin.to_string(),
            line,
            message,
        };

        let (_, version) = next("version")?;
        let (_, well_type) = next("well type")?;
        let (name_line_no, name_line) = next("well name")?;
        let mut tokens = name_line.split(' ');
        let name = tokens.next().unwrap_or_default().to_string();
        let mut rkb = [0.0; 3];
        for (slot, tok) in rkb.iter_mut().zip(tokens) {
            *slot = tok
                .parse()
                .map_err(|e| malformed(name_line_no, format!("could not parse RKB value '{tok}': {e}")))?;
        }

        let (count_line_no, count_line) = next("number of logs")?;
        let num_logs: usize = count_line
            .parse()
            .map_err(|e| malformed(count_line_no, format!("no <num_logs> integer: {e}")))?;

        let mut wp = Self::new(&name);
        wp.version = version;
        wp.well_type = well_type;
        wp.rkb = (rkb[0], rkb[1], rkb[2]);
        for _ in 0..num_logs {
            let (_, header_line) = next("log header")?;
            let header = header_line.split(' ').next().unwrap_or_default().to_string();
            if wp.has_column(&header) {
                return Err(WellPathError::DuplicateColumn(header));
            }
            wp.log_headers.push(header);
        }

        let width = 3 + num_logs;
        loop {
            let (row_no, row) = match next("row") {
                Ok(line) => line,
                Err(WellPathError::Truncated { .. }) => break,
                Err(e) => return Err(e),
            };
            let values = row
                .split(' ')
                .map(str::parse::<f64>)
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|e| malformed(row_no, format!("invalid number: {e}")))?;
            if values.len() != width {
                return Err(malformed(
                    row_no,
                    format!("expected {width} columns, got {}", values.len()),
                ));
            }
            wp.push_point(values[0], values[1], values[2], values[3..].to_vec());
        }
        Ok(wp)
    }

    // ------------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------------

    pub fn write_to<W: Write>(&self, out: &mut W, format: OutputFormat) -> std::io::Result<()> {
        let fmt_row = |vals: &[f64]| {
            vals.iter()
                .map(|v| format!("{v:.2}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        match format {
            OutputFormat::ResInsight => {
                writeln!(out, "{}", self.name)?;
                let md = self.column_index(MD_HEADER);
                for p in &self.points {
                    let mut row = vec![p.x, p.y, p.z];
                    if let Some(idx) = md {
                        row.push(p.logs[idx]);
                    }
                    writeln!(out, "{}", fmt_row(&row))?;
                }
            }
            OutputFormat::Rms => {
                writeln!(out, "{}", self.version)?;
                writeln!(out, "{}", self.well_type)?;
                writeln!(out, "{} {}", self.name, fmt_row(&[self.rkb.0, self.rkb.1, self.rkb.2]))?;
                writeln!(out, "{}", self.log_headers.len())?;
                for h in &self.log_headers {
                    writeln!(out, "{h} 1 lin")?;
                }
                for p in &self.points {
                    let mut row = vec![p.x, p.y, p.z];
                    row.extend_from_slice(&p.logs);
                    writeln!(out, "{}", fmt_row(&row))?;
                }
            }
        }
        Ok(())
    }

    /// Write to `path`, refusing to clobber an existing file unless `overwrite`.
    ///
    /// Returns the number of rows written.
    pub fn write_file(
        &self,
        path: &Path,
        overwrite: bool,
        format: OutputFormat,
    ) -> Result<usize, WellPathError> {
        let io_err = |source| WellPathError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = if overwrite {
            File::create(path)
        } else {
            OpenOptions::new().write(true).create_new(true).open(path)
        }
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => WellPathError::OutputExists(path.to_path_buf()),
            _ => io_err(e),
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, format).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        Ok(self.len())
    }
}
