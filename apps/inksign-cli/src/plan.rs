//! Placement instructions for the `sign` command
//!
//! Placements come either from repeated `--place PAGE:X:Y` flags sharing one
//! signature image, or from a JSON plan file:
//!
//! ```json
//! {
//!   "scale": 1.5,
//!   "placements": [
//!     { "page": 1, "x": 800, "y": 1150, "image": "sig.png" },
//!     { "page": 2, "x": 40, "y": 60, "width": 200, "height": 60, "image": "initials.png" }
//!   ]
//! }
//! ```
//!
//! Coordinates are page pixels at the plan's scale. Image paths are relative
//! to the plan file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignPlan {
    #[serde(default)]
    pub scale: Option<f64>,
    pub placements: Vec<PlanEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanEntry {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    pub image: PathBuf,
}

impl SignPlan {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&content, base)
    }

    /// Parse a plan, resolving relative image paths against `base_dir`
    pub fn from_json(json: &str, base_dir: &Path) -> anyhow::Result<Self> {
        let mut plan: SignPlan =
            serde_json::from_str(json).context("Failed to parse placement plan")?;
        if plan.placements.is_empty() {
            bail!("Placement plan has no placements");
        }
        for entry in &mut plan.placements {
            if entry.image.is_relative() {
                entry.image = base_dir.join(&entry.image);
            }
        }
        Ok(plan)
    }

    /// Build a plan from `--place` flags that all use `image`
    pub fn from_places(places: &[PlaceArg], image: &Path) -> Self {
        Self {
            scale: None,
            placements: places
                .iter()
                .map(|place| PlanEntry {
                    page: place.page,
                    x: place.x,
                    y: place.y,
                    width: None,
                    height: None,
                    image: image.to_path_buf(),
                })
                .collect(),
        }
    }
}

/// A `PAGE:X:Y` placement flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceArg {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

impl std::str::FromStr for PlaceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [page, x, y] = parts.as_slice() else {
            return Err(format!("expected PAGE:X:Y, got {:?}", s));
        };

        let page: u32 = page
            .parse()
            .map_err(|_| format!("invalid page number: {}", page))?;
        if page == 0 {
            return Err("pages are numbered from 1".to_string());
        }
        let x: f64 = x.parse().map_err(|_| format!("invalid x: {}", x))?;
        let y: f64 = y.parse().map_err(|_| format!("invalid y: {}", y))?;

        Ok(Self { page, x, y })
    }
}

/// Stroke list for the `draw` command: `[[[x, y], ...], ...]`
pub fn parse_strokes(json: &str) -> anyhow::Result<Vec<Vec<[f32; 2]>>> {
    serde_json::from_str(json).context("Failed to parse strokes (expected [[[x, y], ...], ...])")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_parse_place_arg() {
        let place: PlaceArg = "2:800:1150.5".parse().unwrap();
        assert_eq!(
            place,
            PlaceArg {
                page: 2,
                x: 800.0,
                y: 1150.5
            }
        );
    }

    #[test]
    fn test_parse_place_arg_invalid() {
        assert!("1:2".parse::<PlaceArg>().is_err());
        assert!("0:1:1".parse::<PlaceArg>().is_err());
        assert!("a:1:1".parse::<PlaceArg>().is_err());
        assert!("1:x:1".parse::<PlaceArg>().is_err());
        assert!("1:1:1:1".parse::<PlaceArg>().is_err());
    }

    #[test]
    fn test_plan_resolves_relative_images() {
        let json = r#"{
            "scale": 2.0,
            "placements": [
                { "page": 1, "x": 10, "y": 20, "image": "sig.png" },
                { "page": 2, "x": 0, "y": 0, "width": 90, "height": 30, "image": "/abs/initials.png" }
            ]
        }"#;
        let plan = SignPlan::from_json(json, Path::new("/work/plans")).unwrap();

        assert_eq!(plan.scale, Some(2.0));
        assert_eq!(plan.placements[0].image, PathBuf::from("/work/plans/sig.png"));
        assert_eq!(plan.placements[0].width, None);
        assert_eq!(plan.placements[1].image, PathBuf::from("/abs/initials.png"));
        assert_eq!(plan.placements[1].height, Some(30.0));
    }

    #[test]
    fn test_plan_requires_placements() {
        assert!(SignPlan::from_json(r#"{ "placements": [] }"#, Path::new(".")).is_err());
        assert!(SignPlan::from_json(r#"{ "scale": 1.0 }"#, Path::new(".")).is_err());
    }

    #[test]
    fn test_plan_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{ "placements": [ {{ "page": 1, "x": 1, "y": 2, "image": "s.png" }} ] }}"#
        )
        .unwrap();

        let plan = SignPlan::from_file(&path).unwrap();
        assert_eq!(plan.placements[0].image, dir.path().join("s.png"));
    }

    #[test]
    fn test_plan_from_places() {
        let places = vec![
            PlaceArg {
                page: 1,
                x: 1.0,
                y: 2.0,
            },
            PlaceArg {
                page: 3,
                x: 4.0,
                y: 5.0,
            },
        ];
        let plan = SignPlan::from_places(&places, Path::new("sig.png"));
        assert_eq!(plan.placements.len(), 2);
        assert_eq!(plan.placements[1].page, 3);
        assert_eq!(plan.placements[1].image, PathBuf::from("sig.png"));
    }

    #[test]
    fn test_parse_strokes() {
        let strokes = parse_strokes("[[[0, 0], [10, 5.5]], [[3, 3]]]").unwrap();
        assert_eq!(strokes, vec![vec![[0.0, 0.0], [10.0, 5.5]], vec![[3.0, 3.0]]]);
        assert!(parse_strokes("{}").is_err());
    }
}
