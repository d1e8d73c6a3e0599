//! # Path
//!
//! This module defines the path followed by the [`crate::follower::Follower`], and the sources
//! paths are loaded from. Paths are produced ahead of time by an external generator, this module
//! only reads them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A waypoint of a path.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// Target position along the world X axis
    pub x: f64,

    /// Target position along the world Y axis
    pub y: f64,

    /// Target heading in trigonometric radians
    pub dir: f64,

    /// Scale applied to the translation command while this point is the target. This is a
    /// feed-forward gain, not a speed in physical units.
    pub speed: f64,
}

/// An ordered, non-empty sequence of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<PathPoint>,
}

/// Loads paths stored as files under a root directory.
///
/// The file extension selects the format:
/// - `.csv`: one point per row with the header `x,y,dir,speed`
/// - `.json`: an array of `{"x", "y", "dir", "speed"}` objects
#[derive(Debug, Clone)]
pub struct FilePathSource {
    root: PathBuf,
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// A source of pre-computed paths.
pub trait PathSource {
    /// Get the path with the given identifier.
    fn get_path(&self, id: &str) -> Result<Path, PathError>;
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Attempted to create a path from an empty sequence")]
    EmptyPath,

    #[error("Path point {0} contains a non-finite value")]
    InvalidPoint(usize),

    #[error("The software root environment variable (ODO_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the path file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot parse the path CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Cannot parse the path JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unrecognised path file format for {0:?}, expected .csv or .json")]
    UnknownFormat(PathBuf),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathPoint {
    pub fn new(x: f64, y: f64, dir: f64, speed: f64) -> Self {
        Self { x, y, dir, speed }
    }

    /// Return the 2D position vector of the point.
    pub fn position2(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance from this point to the given position.
    pub fn dist_to(&self, point: &Vector2<f64>) -> f64 {
        (self.position2() - point).norm()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.dir.is_finite() && self.speed.is_finite()
    }
}

impl Path {
    /// Create a new path from the given points.
    ///
    /// The sequence must contain at least one point and all values must be finite.
    pub fn new(points: Vec<PathPoint>) -> Result<Self, PathError> {
        if points.is_empty() {
            return Err(PathError::EmptyPath);
        }

        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(PathError::InvalidPoint(i));
        }

        Ok(Self { points })
    }

    /// Get the point at the given index.
    pub fn get(&self, index: usize) -> Option<&PathPoint> {
        self.points.get(index)
    }

    /// Get the number of points in the path
    pub fn get_num_points(&self) -> usize {
        self.points.len()
    }

    /// Index of the final point.
    pub fn last_index(&self) -> usize {
        self.points.len() - 1
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    /// Return the length of the path, the sum of the distances between consecutive points.
    pub fn get_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[1].dist_to(&w[0].position2()))
            .sum()
    }
}

impl FilePathSource {
    /// Create a source reading path files from the given directory.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Create a source reading from the `paths` directory of the software root.
    pub fn from_sw_root() -> Result<Self, PathError> {
        let mut root = util::host::get_sw_root().map_err(|_| PathError::SwRootNotSet)?;
        root.push("paths");

        Ok(Self::new(root))
    }

    fn read_csv(file_path: &std::path::Path) -> Result<Vec<PathPoint>, PathError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(file_path)?;

        let mut points = Vec::new();
        for record in reader.deserialize() {
            points.push(record?);
        }

        Ok(points)
    }

    fn read_json(file_path: &std::path::Path) -> Result<Vec<PathPoint>, PathError> {
        let json = std::fs::read_to_string(file_path)
            .map_err(|e| PathError::FileLoadError(file_path.to_path_buf(), e))?;

        Ok(serde_json::from_str(&json)?)
    }
}

impl PathSource for FilePathSource {
    fn get_path(&self, id: &str) -> Result<Path, PathError> {
        let file_path = self.root.join(id);

        if !file_path.is_file() {
            return Err(PathError::FileLoadError(
                file_path,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        let points = match file_path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Self::read_csv(&file_path)?,
            Some("json") => Self::read_json(&file_path)?,
            _ => return Err(PathError::UnknownFormat(file_path)),
        };

        Path::new(points)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn test_new_path() {
        assert!(matches!(Path::new(vec![]), Err(PathError::EmptyPath)));
        assert!(matches!(
            Path::new(vec![
                PathPoint::new(0.0, 0.0, 0.0, 1.0),
                PathPoint::new(f64::NAN, 0.0, 0.0, 1.0)
            ]),
            Err(PathError::InvalidPoint(1))
        ));

        let path = Path::new(vec![
            PathPoint::new(0.0, 0.0, 0.0, 1.0),
            PathPoint::new(3.0, 4.0, 0.0, 1.0),
            PathPoint::new(3.0, 10.0, 0.0, 1.0),
        ])
        .unwrap();

        assert_eq!(path.get_num_points(), 3);
        assert_eq!(path.last_index(), 2);
        assert_eq!(path.get_length(), 11.0);
        assert_eq!(path.get(1), Some(&PathPoint::new(3.0, 4.0, 0.0, 1.0)));
        assert_eq!(path.get(3), None);
    }

    #[test]
    fn test_single_point_length() {
        let path = Path::new(vec![PathPoint::new(1.0, 1.0, 0.0, 1.0)]).unwrap();
        assert_eq!(path.get_length(), 0.0);
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            "square.csv",
            "x, y, dir, speed\n0, 0, 0, 1\n100, 0, 0, 0.5\n100, 100, 1.5707963267948966, 0.5\n",
        );

        let path = FilePathSource::new(dir.path()).get_path("square.csv").unwrap();

        assert_eq!(path.get_num_points(), 3);
        assert_eq!(path.get(1), Some(&PathPoint::new(100.0, 0.0, 0.0, 0.5)));
        assert_eq!(path.get(2).unwrap().dir, std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            "line.json",
            r#"[{"x": 0.0, "y": 0.0, "dir": 0.0, "speed": 1.0},
                {"x": 50.0, "y": 0.0, "dir": 0.0, "speed": 1.0}]"#,
        );

        let path = FilePathSource::new(dir.path()).get_path("line.json").unwrap();

        assert_eq!(path.get_num_points(), 2);
        assert_eq!(path.get_length(), 50.0);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let source = FilePathSource::new(dir.path());

        write(&dir, "empty.csv", "x,y,dir,speed\n");
        write(&dir, "bad.csv", "x,y,dir,speed\n0,0,zero,1\n");
        write(&dir, "path.txt", "0,0,0,1\n");

        assert!(matches!(source.get_path("empty.csv"), Err(PathError::EmptyPath)));
        assert!(matches!(source.get_path("bad.csv"), Err(PathError::CsvError(_))));
        assert!(matches!(source.get_path("path.txt"), Err(PathError::UnknownFormat(_))));
        assert!(matches!(source.get_path("missing.csv"), Err(PathError::FileLoadError(..))));
    }
}
