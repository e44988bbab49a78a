/// Vertex data for the triangle and its input layout

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::mem::{offset_of, size_of};

/// Vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum VertexFormat {
    /// vec2 (8 bytes)
    R32G32_SFLOAT,
    /// vec3 (12 bytes)
    R32G32B32_SFLOAT,
}

impl VertexFormat {
    /// Size in bytes of one attribute of this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            VertexFormat::R32G32_SFLOAT => 8,
            VertexFormat::R32G32B32_SFLOAT => 12,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Binding index
    pub binding: u32,
    /// Format of the attribute
    pub format: VertexFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Interleaved position + color vertex
///
/// `repr(C)` with no padding: 8 bytes of position followed by 12 bytes of color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Clip-space position (location 0)
    pub pos: Vec2,
    /// Linear RGB color (location 1)
    pub color: Vec3,
}

impl Vertex {
    pub const fn new(pos: Vec2, color: Vec3) -> Self {
        Self { pos, color }
    }

    /// Byte stride of one vertex in binding 0
    pub const fn stride() -> u32 {
        size_of::<Vertex>() as u32
    }

    /// Attribute descriptions for binding 0
    pub fn attributes() -> [VertexAttribute; 2] {
        [
            VertexAttribute {
                location: 0,
                binding: 0,
                format: VertexFormat::R32G32_SFLOAT,
                offset: offset_of!(Vertex, pos) as u32,
            },
            VertexAttribute {
                location: 1,
                binding: 0,
                format: VertexFormat::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, color) as u32,
            },
        ]
    }
}

/// The three vertices of the triangle, clockwise in framebuffer space
pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex::new(Vec2::new(0.0, -0.5), Vec3::new(1.0, 1.0, 1.0)),
    Vertex::new(Vec2::new(0.5, 0.5), Vec3::new(0.0, 1.0, 0.0)),
    Vertex::new(Vec2::new(-0.5, 0.5), Vec3::new(0.0, 0.0, 1.0)),
];

#[cfg(test)]
#[path = "vertex_tests.rs"]
mod tests;
