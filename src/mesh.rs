use crate::geometry::{Point, Pose};
use crate::polygon::VisibilityPolygon;
use serde::{Deserialize, Serialize};

/// Renderable view mesh: a triangle fan in the viewer's local frame.
///
/// Vertex 0 is the local origin. Triangle `k` is `[0, k + 2, k + 1]`, which
/// winds clockwise for the counter-clockwise boundary order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewMesh {
    pub name: String,
    pub vertices: Vec<Point>,
    pub triangles: Vec<[u32; 3]>,
}

impl ViewMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Flat index buffer, three indices per triangle
    pub fn indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Turns a visibility polygon into a local-space triangle fan
pub struct MeshTriangulator;

impl MeshTriangulator {
    /// Rebuild `mesh` in place from `polygon` as seen from `pose`
    pub fn triangulate_into(pose: &Pose, polygon: &VisibilityPolygon, mesh: &mut ViewMesh) {
        mesh.clear();

        let n = polygon.points.len();
        mesh.vertices.reserve(n + 1);
        mesh.vertices.push(Point::zero());
        mesh.vertices
            .extend(polygon.points.iter().map(|&p| pose.inverse_transform_point(p)));

        let triangle_count = n.saturating_sub(1);
        mesh.triangles.reserve(triangle_count);
        for k in 0..triangle_count {
            let k = k as u32;
            mesh.triangles.push([0, k + 2, k + 1]);
        }
    }

    pub fn triangulate(pose: &Pose, polygon: &VisibilityPolygon) -> ViewMesh {
        let mut mesh = ViewMesh {
            name: "ViewMesh".to_string(),
            ..ViewMesh::default()
        };
        Self::triangulate_into(pose, polygon, &mut mesh);
        mesh
    }
}
