// src/export.rs
//
// JSON / JSONL persistence of geometry snapshots.
//
// A snapshot records the shape after one step of a rollout: control points,
// NURBS weights (if any) and the positions of the action variables. Each
// record carries `schema_version` so downstream tooling can reject files
// it does not understand.
//
// - write_snapshot_json: one pretty-printed document
// - SnapshotWriter: one JSON object per line
//
// Write errors are returned to the caller.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::rl::geometry::Geometry;
use crate::shape::ShapeParameterization;

/// Current snapshot schema version.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    pub schema_version: u32,
    /// `b_spline`, `nurbs` or `cube`.
    pub kind: String,
    pub step: u64,
    pub control_points: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
    /// Positions of the action variables, in action order.
    pub actions: Vec<f64>,
}

impl GeometrySnapshot {
    pub fn capture(geometry: &Geometry, step: u64) -> Self {
        let shape = geometry.shape_definition();
        let spline = shape.spline();
        let actions = geometry
            .action_targets()
            .iter()
            .filter_map(|t| shape.variable(*t))
            .map(|v| v.current_position())
            .collect();
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            kind: shape.kind().to_string(),
            step,
            control_points: spline.control_points().to_vec(),
            weights: spline.weights().map(<[f64]>::to_vec),
            actions,
        }
    }
}

fn create_parent_dirs(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write one snapshot as pretty JSON, creating parent directories.
pub fn write_snapshot_json<P: AsRef<Path>>(path: P, snapshot: &GeometrySnapshot) -> io::Result<()> {
    let path = path.as_ref();
    create_parent_dirs(path)?;
    let json = serde_json::to_string_pretty(snapshot).map_err(io::Error::other)?;
    fs::write(path, json)
}

/// Read snapshots back from a JSONL file, skipping blank lines.
pub fn read_snapshots_jsonl<P: AsRef<Path>>(path: P) -> io::Result<Vec<GeometrySnapshot>> {
    fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(io::Error::other))
        .collect()
}

/// JSONL sink: one snapshot per line.
pub struct SnapshotWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl SnapshotWriter {
    /// Open `path`, truncating unless `append` is set.
    pub fn create<P: AsRef<Path>>(path: P, append: bool) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        create_parent_dirs(&path)?;

        let mut options = OpenOptions::new();
        options.create(true).write(true);
        if append {
            options.append(true);
        } else {
            options.truncate(true);
        }
        let file = options.open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write(&mut self, snapshot: &GeometrySnapshot) -> io::Result<()> {
        let line = serde_json::to_string(snapshot).map_err(io::Error::other)?;
        writeln!(self.writer, "{line}")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshots written through this writer.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeometryConfig;

    fn nurbs_geometry() -> Geometry {
        GeometryConfig::from_yaml_str(
            r#"
shape_definition:
  type: nurbs
  space_dimensions:
    - { name: x, number_of_points: 3, degree: 2 }
discrete_actions: false
"#,
        )
        .unwrap()
        .build()
        .unwrap()
    }

    #[test]
    fn test_capture_records_weights_and_actions() {
        let geometry = nurbs_geometry();
        let snapshot = GeometrySnapshot::capture(&geometry, 3);
        assert_eq!(snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(snapshot.kind, "nurbs");
        assert_eq!(snapshot.step, 3);
        assert_eq!(snapshot.control_points, vec![vec![0.0], vec![0.5], vec![1.0]]);
        assert_eq!(snapshot.weights, Some(vec![1.0; 3]));
        assert_eq!(snapshot.actions, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_jsonl_writer_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snapshots.jsonl");
        let mut geometry = nurbs_geometry();

        {
            let mut writer = SnapshotWriter::create(&path, false).unwrap();
            writer.write(&GeometrySnapshot::capture(&geometry, 0)).unwrap();
            geometry.apply_random_action(5);
            writer.write(&GeometrySnapshot::capture(&geometry, 1)).unwrap();
            writer.flush().unwrap();
            assert_eq!(writer.written(), 2);
            assert_eq!(writer.path(), path.as_path());
        }
        {
            let mut writer = SnapshotWriter::create(&path, true).unwrap();
            writer.write(&GeometrySnapshot::capture(&geometry, 2)).unwrap();
        }

        let snapshots = read_snapshots_jsonl(&path).unwrap();
        assert_eq!(snapshots.len(), 3);
        for (read, current) in snapshots[1].control_points.iter().zip(geometry.control_points()) {
            assert!((read[0] - current[0]).abs() < 1e-12);
        }
        assert_ne!(snapshots[0].control_points, snapshots[1].control_points);
        assert_eq!(snapshots[2].step, 2);

        // Truncates without append.
        SnapshotWriter::create(&path, false).unwrap();
        assert!(read_snapshots_jsonl(&path).unwrap().is_empty());
    }

    #[test]
    fn test_single_snapshot_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("shape.json");
        let snapshot = GeometrySnapshot::capture(&nurbs_geometry(), 0);
        write_snapshot_json(&path, &snapshot).unwrap();

        let back: GeometrySnapshot = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, snapshot);
    }
}
