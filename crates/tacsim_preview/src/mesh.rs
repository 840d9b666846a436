use anyhow::ensure;
use glam::Vec3;
use tacsim_utils::{ok, AnyResult, AnyhowResultExt};

/// An indexed triangle mesh, as handed from the loaders to the viewer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    /// Per-vertex normals. Empty until [`TriangleMesh::compute_vertex_normals`] is called.
    pub normals: Vec<Vec3>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
            normals: vec![],
        }
    }

    /// A mesh without any triangles has nothing that could be displayed.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.triangles.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Appends another mesh, offsetting its indices past the current vertices.
    ///
    /// `other` is validated on its own first, so its indices can't be shifted into range.
    pub fn append(&mut self, other: TriangleMesh) -> AnyResult {
        other.validate()?;
        // With every index below its own vertex count, offset indices fit once the total does
        u32::try_from(self.positions.len() + other.positions.len())
            .otherwise("mesh has too many vertices for 32-bit indices")?;
        let base = u32::try_from(self.positions.len())?;

        self.positions.extend(other.positions);
        self.triangles.extend(
            other
                .triangles
                .into_iter()
                .map(|[a, b, c]| [a + base, b + base, c + base]),
        );
        self.normals.clear();
        ok()
    }

    /// Checks that every triangle only refers to existing vertices.
    pub fn validate(&self) -> AnyResult {
        let count = self.positions.len();
        for (i, triangle) in self.triangles.iter().enumerate() {
            ensure!(
                triangle.iter().all(|&index| (index as usize) < count),
                "triangle {i} refers to a vertex out of range ({triangle:?}, {count} vertices)"
            );
        }
        ok()
    }

    /// Computes smooth per-vertex normals.
    ///
    /// Every vertex gets the normalized sum of its adjacent face normals, weighted by face area.
    /// Vertices without any non-degenerate face fall back to +Y.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for &[a, b, c] in &self.triangles {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let (Some(&pa), Some(&pb), Some(&pc)) =
                (self.positions.get(a), self.positions.get(b), self.positions.get(c))
            else {
                continue;
            };

            // Unnormalized, so its length is twice the face area
            let face_normal = (pb - pa).cross(pc - pa);
            normals[a] += face_normal;
            normals[b] += face_normal;
            normals[c] += face_normal;
        }

        for normal in &mut normals {
            let n = normal.normalize_or_zero();
            *normal = if n == Vec3::ZERO { Vec3::Y } else { n };
        }

        self.normals = normals;
    }

    /// Axis-aligned bounds of all vertices, `None` for a mesh without any.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
        )
    }
}
