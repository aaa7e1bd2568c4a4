use bevy::log::trace;
use glam::Vec2;
use thiserror::Error;

/// Largest depth whose `(depth + 1)^2` vertices are addressable with `u32` indices.
pub const MAX_GRID_DEPTH: i32 = 65534;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid depth must be an integer in 1..={max}, got {depth}", max = MAX_GRID_DEPTH)]
    InvalidArgument { depth: i64 },
    #[error("vertex index {max_index} does not fit a 16-bit index buffer")]
    IndexOverflow { max_index: u32 },
}

/// A regular `depth x depth` cell lattice over the unit square, two triangles per cell.
///
/// Vertices are `(x / depth, y / depth)` in row-major order (`y` outer, `x` inner), so
/// point `(x, y)` lives at `y * (depth + 1) + x`. Triangles are emitted in two passes:
/// every cell's `(x,y) (x+1,y) (x+1,y+1)` triangle first, then every cell's
/// `(x,y) (x,y+1) (x+1,y)` triangle. That order is part of the output contract.
#[derive(Clone, Debug, PartialEq)]
pub struct GridMesh {
    depth: u32,
    vertices: Vec<Vec2>,
    indices: Vec<u32>,
}

pub fn build_grid(depth: i32) -> Result<GridMesh, GridError> {
    if depth <= 0 || depth > MAX_GRID_DEPTH {
        return Err(GridError::InvalidArgument {
            depth: depth as i64,
        });
    }

    let n = depth as u32;
    let stride = n + 1;
    let idx = |x: u32, y: u32| y * stride + x;

    let side = stride as usize;
    let mut vertices = Vec::with_capacity(side * side);
    for y in 0..=n {
        for x in 0..=n {
            vertices.push(Vec2::new(x as f32 / n as f32, y as f32 / n as f32));
        }
    }

    let cells = n as usize;
    let mut indices = Vec::with_capacity(6 * cells * cells);
    for y in 0..n {
        for x in 0..n {
            indices.extend_from_slice(&[idx(x, y), idx(x + 1, y), idx(x + 1, y + 1)]);
        }
    }
    for y in 0..n {
        for x in 0..n {
            indices.extend_from_slice(&[idx(x, y), idx(x, y + 1), idx(x + 1, y)]);
        }
    }

    trace!(
        "built grid depth={} vertices={} indices={}",
        n,
        vertices.len(),
        indices.len()
    );

    Ok(GridMesh {
        depth: n,
        vertices,
        indices,
    })
}

impl GridMesh {
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Tightly packed `[f32; 2]` vertex data, ready for a vertex buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Narrows the index buffer for devices that draw with 16-bit indices.
    pub fn indices_u16(&self) -> Result<Vec<u16>, GridError> {
        let max_index = (self.vertices.len() - 1) as u32;
        if max_index > u16::MAX as u32 {
            return Err(GridError::IndexOverflow { max_index });
        }
        Ok(self.indices.iter().map(|&i| i as u16).collect())
    }
}
