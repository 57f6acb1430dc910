use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Geometry of a candidate mark as it travels on disk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeRecord {
    /// 2-D ellipse, extruded through every z-slice of the stack.
    Ellipse {
        center: [f64; 2],
        radii: [f64; 2],
        #[serde(default)]
        angle: f64,
    },
    /// Axis-aligned ellipsoid.
    Ellipsoid { center: [f64; 3], radii: [f64; 3] },
    PointSet { points: Vec<[i64; 3]> },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MarkRecord {
    pub id: u64,
    #[serde(flatten)]
    pub shape: ShapeRecord,
}

/// Dense energy volume, x fastest, then y, then z.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StackRecord {
    pub width: usize,
    pub height: usize,
    #[serde(default = "default_depth")]
    pub depth: usize,
    pub values: Vec<f64>,
}

fn default_depth() -> usize {
    1
}

impl StackRecord {
    /// `None` when the dimensions overflow.
    pub fn expected_len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)?.checked_mul(self.depth)
    }
}

/// Everything a run needs besides its configuration: the energy volume,
/// the candidate pool and the marks accepted at the start.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SceneDefinition {
    #[serde(default = "default_scene_name")]
    pub name: String,
    pub stack: StackRecord,
    pub pool: Vec<MarkRecord>,
    #[serde(default)]
    pub initial: Vec<u64>,
}

fn default_scene_name() -> String {
    "scene".to_string()
}

impl SceneDefinition {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scene file {:?}: {}", path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse scene JSON {:?}: {}", path, e))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| format!("Failed to write scene {:?}: {}", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_record_uses_flat_kind_tag() {
        let json = r#"{ "id": 7, "kind": "ellipse", "center": [3.0, 4.0], "radii": [2.0, 1.0] }"#;
        let rec: MarkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.id, 7);
        assert_eq!(
            rec.shape,
            ShapeRecord::Ellipse {
                center: [3.0, 4.0],
                radii: [2.0, 1.0],
                angle: 0.0
            }
        );
    }

    #[test]
    fn scene_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let scene = SceneDefinition {
            name: "tiny".to_string(),
            stack: StackRecord {
                width: 2,
                height: 1,
                depth: 1,
                values: vec![-1.0, 1.0],
            },
            pool: vec![MarkRecord {
                id: 1,
                shape: ShapeRecord::PointSet {
                    points: vec![[0, 0, 0]],
                },
            }],
            initial: vec![],
        };
        scene.save_to_file(&path).unwrap();
        let loaded = SceneDefinition::load_from_file(&path).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn expected_len_guards_against_overflow() {
        let mut stack = StackRecord {
            width: 3,
            height: 2,
            depth: 2,
            values: vec![],
        };
        assert_eq!(stack.expected_len(), Some(12));
        stack.width = usize::MAX;
        assert_eq!(stack.expected_len(), None);
    }
}
