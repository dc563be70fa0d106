use std::f32::consts::TAU;

use bevy_math::{Vec2, Vec3};
use bevy_render::{
    mesh::{Indices, Mesh, PrimitiveTopology},
    render_asset::RenderAssetUsages,
};

use crate::primitives::{ground_point, Triangle};

/// Vertex and index buffers of a flat, `+Y` facing indicator mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
}

impl IndicatorMesh {
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        IndicatorMesh {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Adds a ground-plane vertex, with its UV projected from the XZ plane over `[-extent, extent]`.
    pub fn push_vertex(&mut self, position: Vec3, extent: f32) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(Vec3::Y);
        self.uvs.push(planar_uv(position, extent));
        index
    }

    pub fn push_triangle(&mut self, indices: [u32; 3]) {
        self.indices.extend_from_slice(&indices);
    }

    /// Get the triangle at `index`, if it exists.
    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let tri = self.indices.get(index * 3..index * 3 + 3)?;
        Some(Triangle::from([
            *self.positions.get(tri[0] as usize)?,
            *self.positions.get(tri[1] as usize)?,
            *self.positions.get(tri[2] as usize)?,
        ]))
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.triangle_count()).filter_map(|index| self.triangle(index))
    }

    pub fn clear(&mut self) {
        *self = IndicatorMesh::default();
    }

    /// Copies the buffers into a render [`Mesh`].
    pub fn to_mesh(&self) -> Mesh {
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone())
        .with_inserted_indices(Indices::U32(self.indices.clone()))
    }
}

impl From<&IndicatorMesh> for Mesh {
    fn from(mesh: &IndicatorMesh) -> Self {
        mesh.to_mesh()
    }
}

#[inline]
fn planar_uv(position: Vec3, extent: f32) -> Vec2 {
    let scale = 0.5 / extent.max(f32::EPSILON);
    Vec2::new(0.5 + position.x * scale, 0.5 - position.z * scale)
}

/// Triangle fan from `apex` over the `rim` points, in order.
///
/// Rim points must run counter-clockwise seen from above for the fan to face `+Y`. When `closed`,
/// the last rim point is joined back to the first.
pub fn fan(apex: Vec3, rim: &[Vec3], extent: f32, closed: bool) -> IndicatorMesh {
    let triangles = match closed {
        true => rim.len(),
        false => rim.len().saturating_sub(1),
    };
    let mut mesh = IndicatorMesh::with_capacity(rim.len() + 1, triangles);
    let apex = mesh.push_vertex(apex, extent);
    for point in rim {
        mesh.push_vertex(*point, extent);
    }
    for i in 0..triangles as u32 {
        let next = (i + 1) % rim.len() as u32;
        mesh.push_triangle([apex, apex + 1 + i, apex + 1 + next]);
    }
    mesh
}

/// Flat disc of `radius` centered on the origin.
pub fn disc(radius: f32, segments: u32) -> IndicatorMesh {
    let segments = segments.max(3);
    let step = TAU / segments as f32;
    let rim: Vec<Vec3> = (0..segments)
        .map(|i| ground_point(step * i as f32, radius))
        .collect();
    fan(Vec3::ZERO, &rim, radius, true)
}
