//! Native mesh loaders
//!
//! OBJ files are read with [`tobj`], glTF files (both `.gltf` and `.glb`) with [`gltf`], STL with
//! [`stl_io`] and PLY with [`ply_rs`]. Every other format has to go through a
//! [`crate::Converter`] first.

use crate::TriangleMesh;
use anyhow::{bail, Context};
use glam::{Mat4, Vec3};
use itertools::Itertools;
use log::*;
use ply_rs::ply::{DefaultElement, Property};
use std::{fs::File, io::BufReader, path::Path};
use tacsim_utils::{ok, AnyResult, AnyhowResultExt};

pub trait MeshLoader {
    /// Whether files with this (lowercase, dotless) extension can be loaded directly.
    fn supports(&self, extension: &str) -> bool;

    /// Reads the whole file into a single mesh. Normals aren't computed here.
    fn load(&self, path: &Path) -> AnyResult<TriangleMesh>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLoader;

impl NativeLoader {
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] =
        &["obj", "gltf", "glb", "stl", "ply"];
}

impl MeshLoader for NativeLoader {
    fn supports(&self, extension: &str) -> bool {
        Self::SUPPORTED_EXTENSIONS.contains(&extension)
    }

    fn load(&self, path: &Path) -> AnyResult<TriangleMesh> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mesh = match extension.as_str() {
            "obj" => load_obj(path)?,
            "gltf" | "glb" => load_gltf(path)?,
            "stl" => load_stl(path)?,
            "ply" => load_ply(path)?,
            other => bail!("no native loader for `.{other}` files"),
        };
        mesh.validate()?;

        debug!(
            "Loaded {} vertices and {} triangles from {}",
            mesh.positions.len(),
            mesh.triangles.len(),
            path.display()
        );
        Ok(mesh)
    }
}

pub fn load_obj(path: &Path) -> AnyResult<TriangleMesh> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &options).otherwise("couldn't parse OBJ")?;

    // Materials don't matter for a preview, a missing .mtl shouldn't stop it
    if let Err(err) = materials {
        debug!("Ignoring OBJ materials: {err}");
    }

    let mut mesh = TriangleMesh::default();
    for model in models {
        trace!("OBJ model `{}`", model.name);
        let positions = model
            .mesh
            .positions
            .into_iter()
            .tuples()
            .map(|(x, y, z)| Vec3::new(x, y, z))
            .collect();
        let triangles = model
            .mesh
            .indices
            .into_iter()
            .tuples()
            .map(|(a, b, c)| [a, b, c])
            .collect();
        mesh.append(TriangleMesh::new(positions, triangles))
            .with_context(|| format!("invalid OBJ model `{}`", model.name))?;
    }

    Ok(mesh)
}

pub fn load_gltf(path: &Path) -> AnyResult<TriangleMesh> {
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).otherwise("couldn't parse glTF")?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)
        .otherwise("couldn't read glTF buffers")?;

    let mut mesh = TriangleMesh::default();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                append_node(&mut mesh, &node, Mat4::IDENTITY, &buffers)?;
            }
        }
        // Scene-less files are just a bag of meshes
        None => {
            for gltf_mesh in document.meshes() {
                append_mesh(&mut mesh, &gltf_mesh, Mat4::IDENTITY, &buffers)?;
            }
        }
    }

    Ok(mesh)
}

/// Reads both ASCII and binary STL. Duplicate vertices of neighbouring facets are merged.
pub fn load_stl(path: &Path) -> AnyResult<TriangleMesh> {
    let mut reader = BufReader::new(File::open(path).otherwise("couldn't open STL")?);
    let stl = stl_io::read_stl(&mut reader).otherwise("couldn't parse STL")?;

    let positions = stl
        .vertices
        .iter()
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();
    let triangles = stl
        .faces
        .iter()
        .map(|face| -> AnyResult<[u32; 3]> {
            let [a, b, c] = face.vertices;
            Ok([u32::try_from(a)?, u32::try_from(b)?, u32::try_from(c)?])
        })
        .collect::<AnyResult<_>>()?;

    Ok(TriangleMesh::new(positions, triangles))
}

/// Reads the `vertex` and `face` elements of a PLY file. Polygons are split into triangle fans.
pub fn load_ply(path: &Path) -> AnyResult<TriangleMesh> {
    let mut reader = BufReader::new(File::open(path).otherwise("couldn't open PLY")?);
    let ply = ply_rs::parser::Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .otherwise("couldn't parse PLY")?;

    let mut positions = vec![];
    for vertex in ply.payload.get("vertex").into_iter().flatten() {
        positions.push(Vec3::new(
            ply_scalar(vertex, "x")?,
            ply_scalar(vertex, "y")?,
            ply_scalar(vertex, "z")?,
        ));
    }

    let mut triangles = vec![];
    for face in ply.payload.get("face").into_iter().flatten() {
        let indices = face
            .get("vertex_indices")
            .or_else(|| face.get("vertex_index"))
            .otherwise("PLY face without vertex indices")?;
        let indices = ply_indices(indices)?;

        if let Some((&first, rest)) = indices.split_first() {
            triangles.extend(rest.windows(2).map(|pair| [first, pair[0], pair[1]]));
        }
    }

    Ok(TriangleMesh::new(positions, triangles))
}

fn ply_scalar(element: &DefaultElement, name: &str) -> AnyResult<f32> {
    let property = element
        .get(name)
        .otherwise(format!("PLY vertex without `{name}`"))?;

    Ok(match *property {
        Property::Float(v) => v,
        Property::Double(v) => v as f32,
        Property::Char(v) => f32::from(v),
        Property::UChar(v) => f32::from(v),
        Property::Short(v) => f32::from(v),
        Property::UShort(v) => f32::from(v),
        Property::Int(v) => v as f32,
        Property::UInt(v) => v as f32,
        _ => bail!("PLY property `{name}` is a list"),
    })
}

fn ply_indices(property: &Property) -> AnyResult<Vec<u32>> {
    let indices: Vec<i64> = match property {
        Property::ListChar(list) => list.iter().map(|&i| i64::from(i)).collect(),
        Property::ListUChar(list) => list.iter().map(|&i| i64::from(i)).collect(),
        Property::ListShort(list) => list.iter().map(|&i| i64::from(i)).collect(),
        Property::ListUShort(list) => list.iter().map(|&i| i64::from(i)).collect(),
        Property::ListInt(list) => list.iter().map(|&i| i64::from(i)).collect(),
        Property::ListUInt(list) => list.iter().map(|&i| i64::from(i)).collect(),
        _ => bail!("PLY vertex indices must be a list of integers"),
    };

    indices
        .into_iter()
        .map(|i| u32::try_from(i).otherwise(format!("invalid PLY vertex index {i}")))
        .collect()
}

fn append_node(
    mesh: &mut TriangleMesh,
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
) -> AnyResult {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(gltf_mesh) = node.mesh() {
        append_mesh(mesh, &gltf_mesh, transform, buffers)?;
    }
    for child in node.children() {
        append_node(mesh, &child, transform, buffers)?;
    }
    ok()
}

fn append_mesh(
    mesh: &mut TriangleMesh,
    gltf_mesh: &gltf::Mesh,
    transform: Mat4,
    buffers: &[gltf::buffer::Data],
) -> AnyResult {
    for primitive in gltf_mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            warn!(
                "Skipping a {:?} primitive of mesh {}",
                primitive.mode(),
                gltf_mesh.index()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
        let Some(positions) = reader.read_positions() else {
            warn!("Skipping a primitive without positions in mesh {}", gltf_mesh.index());
            continue;
        };

        let positions: Vec<_> = positions
            .map(|p| transform.transform_point3(Vec3::from(p)))
            .collect();
        let triangles = match reader.read_indices() {
            Some(indices) => indices.into_u32().tuples().map(|(a, b, c)| [a, b, c]).collect(),
            None => (0..u32::try_from(positions.len())?)
                .tuples()
                .map(|(a, b, c)| [a, b, c])
                .collect(),
        };

        mesh.append(TriangleMesh::new(positions, triangles))
            .with_context(|| {
                format!(
                    "invalid primitive {} of mesh {}",
                    primitive.index(),
                    gltf_mesh.index()
                )
            })?;
    }
    ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    // Three vertices of a unit right triangle, followed by u16 indices 0, 1, 2 and padding
    const TRIANGLE_BUFFER: &str =
        "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA=";

    // The same buffer, followed by u32 indices 0xFFFFFFFF, 0, 0
    const WRAPPING_INDEX_BUFFER: &str =
        "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAD/////AAAAAAAAAAA=";

    fn triangle_gltf(indexed: bool, translation: [f32; 3]) -> String {
        let indices = if indexed { r#", "indices": 1"# } else { "" };
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "mesh": 0, "translation": [{}, {}, {}] }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}{indices} }}] }}],
  "buffers": [{{ "byteLength": 44, "uri": "{TRIANGLE_BUFFER}" }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#,
            translation[0], translation[1], translation[2]
        )
    }

    #[test]
    fn supported_extensions() {
        let loader = NativeLoader;
        assert!(loader.supports("obj"));
        assert!(loader.supports("glb"));
        assert!(loader.supports("gltf"));
        assert!(loader.supports("stl"));
        assert!(loader.supports("ply"));
        assert!(!loader.supports("fbx"));
        assert!(!loader.supports("mb"));
        assert!(!loader.supports(""));
    }

    #[test]
    fn obj_faces_are_triangulated_and_merged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crate.obj");
        fs::write(
            &path,
            "o quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n\
             o tri\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 5 6 7\n",
        )
        .unwrap();

        let mesh = NativeLoader.load(&path).unwrap();
        assert_eq!(mesh.triangles.len(), 3);
        assert_eq!(mesh.positions.len(), 7);
        assert!(mesh.positions.contains(&Vec3::new(0.0, 1.0, 1.0)));
    }

    #[test]
    fn obj_without_faces_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("points.obj");
        fs::write(&path, "# only points\nv 0 0 0\nv 1 0 0\n").unwrap();

        assert!(NativeLoader.load(&path).unwrap().is_empty());
    }

    #[test]
    fn obj_with_missing_material_library_still_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("textured.obj");
        fs::write(&path, "mtllib gone.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        assert_eq!(NativeLoader.load(&path).unwrap().triangles.len(), 1);
    }

    #[test]
    fn gltf_indexed_triangle_with_node_transform() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("triangle.gltf");
        fs::write(&path, triangle_gltf(true, [0.0, 0.0, 5.0])).unwrap();

        let mesh = NativeLoader.load(&path).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(
            mesh.positions,
            vec![
                Vec3::new(0.0, 0.0, 5.0),
                Vec3::new(1.0, 0.0, 5.0),
                Vec3::new(0.0, 1.0, 5.0)
            ]
        );
    }

    #[test]
    fn gltf_without_indices_uses_vertex_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("triangle.gltf");
        fs::write(&path, triangle_gltf(false, [0.0, 0.0, 0.0])).unwrap();

        let mesh = NativeLoader.load(&path).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(mesh.positions[1], Vec3::X);
    }

    #[test]
    fn gltf_index_past_its_own_primitive_is_rejected() {
        let gltf = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "meshes": [{{ "primitives": [
    {{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }},
    {{ "attributes": {{ "POSITION": 0 }}, "indices": 2 }}
  ] }}],
  "buffers": [{{ "byteLength": 56, "uri": "{WRAPPING_INDEX_BUFFER}" }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }},
    {{ "buffer": 0, "byteOffset": 44, "byteLength": 12, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }},
    {{ "bufferView": 2, "componentType": 5125, "count": 3, "type": "SCALAR" }}
  ]
}}"#
        );
        let dir = tempdir().unwrap();
        let path = dir.path().join("wrapping.gltf");
        fs::write(&path, gltf).unwrap();

        let err = NativeLoader.load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("primitive 1 of mesh 0"), "{err:#}");
    }

    fn binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut bytes = vec![0u8; 80];
        bytes[..10].copy_from_slice(b"binary stl");
        bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            // Normal, left for readers to recompute
            bytes.extend_from_slice(&[0u8; 12]);
            for vertex in triangle {
                for coordinate in vertex {
                    bytes.extend_from_slice(&coordinate.to_le_bytes());
                }
            }
            // Attribute byte count
            bytes.extend_from_slice(&[0u8; 2]);
        }
        bytes
    }

    #[test]
    fn stl_facets_share_vertices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plate.stl");
        fs::write(
            &path,
            binary_stl(&[
                [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
                [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            ]),
        )
        .unwrap();

        let mesh = NativeLoader.load(&path).unwrap();
        assert_eq!(mesh.triangles.len(), 2);
        assert_eq!(mesh.positions.len(), 4);
        assert!(mesh.positions.contains(&Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn ply_polygons_are_fanned_into_triangles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("panel.ply");
        fs::write(
            &path,
            "ply\n\
             format ascii 1.0\n\
             element vertex 4\n\
             property float x\n\
             property float y\n\
             property float z\n\
             element face 1\n\
             property list uchar int vertex_indices\n\
             end_header\n\
             0 0 0\n\
             1 0 0\n\
             1 1 0\n\
             0 1 0\n\
             4 0 1 2 3\n",
        )
        .unwrap();

        let mesh = NativeLoader.load(&path).unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.positions[2], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn ply_index_out_of_range_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.ply");
        fs::write(
            &path,
            "ply\n\
             format ascii 1.0\n\
             element vertex 3\n\
             property float x\n\
             property float y\n\
             property float z\n\
             element face 1\n\
             property list uchar int vertex_indices\n\
             end_header\n\
             0 0 0\n\
             1 0 0\n\
             0 1 0\n\
             3 0 1 7\n",
        )
        .unwrap();

        assert!(NativeLoader.load(&path).is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.fbx");
        fs::write(&path, "").unwrap();
        assert!(NativeLoader.load(&path).is_err());
    }

    #[test]
    fn malformed_gltf_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.gltf");
        fs::write(&path, "{ this is not json").unwrap();
        assert!(NativeLoader.load(&path).is_err());
    }
}
