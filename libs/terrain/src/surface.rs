use glam::{Vec2, Vec3};

use crate::grid::GridMesh;
use crate::heightmap::Heightmap;
use crate::types::TerrainConfig;

#[derive(Clone, Debug)]
pub struct TerrainMeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// World position of a grid point: the unit square is stretched to `extent`, centred
/// on the origin, and lifted by the heightmap. The plane is laid out as `(x, -z)` so the
/// terrain lies on bevy's XZ ground plane with height along +Y.
pub fn displace(uv: Vec2, heightmap: &Heightmap, config: &TerrainConfig) -> Vec3 {
    let l = config.extent;
    let h = heightmap.sample(uv) * config.height_scale + config.height_offset;
    let px = uv.x * l - l / 2.0;
    let py = uv.y * l - l / 2.0;
    Vec3::new(px, h, -py)
}

pub fn build_terrain_mesh_data(
    grid: &GridMesh,
    heightmap: &Heightmap,
    config: &TerrainConfig,
) -> TerrainMeshData {
    let n = grid.depth() as usize;
    let stride = n + 1;

    let points: Vec<Vec3> = grid
        .vertices()
        .iter()
        .map(|&uv| displace(uv, heightmap, config))
        .collect();

    // Smooth normals from the displaced lattice, one-sided at the borders.
    let mut normals = Vec::with_capacity(points.len());
    for gy in 0..=n {
        for gx in 0..=n {
            let gx_l = gx.saturating_sub(1);
            let gx_r = (gx + 1).min(n);
            let gy_d = gy.saturating_sub(1);
            let gy_u = (gy + 1).min(n);

            let along_x = points[gy * stride + gx_r] - points[gy * stride + gx_l];
            let along_y = points[gy_u * stride + gx] - points[gy_d * stride + gx];

            let normal = along_x.cross(along_y).normalize_or(Vec3::Y);
            normals.push(normal.to_array());
        }
    }

    TerrainMeshData {
        positions: points.iter().map(|p| p.to_array()).collect(),
        normals,
        uvs: grid.vertices().iter().map(|uv| uv.to_array()).collect(),
        indices: grid.indices().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_grid;

    const EPS: f32 = 1e-5;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < EPS)
    }

    #[test]
    fn flat_map_spans_extent_at_offset() {
        let config = TerrainConfig::default();
        let grid = build_grid(4).unwrap();
        let data = build_terrain_mesh_data(&grid, &Heightmap::flat(), &config);

        let half = config.extent / 2.0;
        let y = config.height_offset;
        assert!(close(data.positions[0], [-half, y, half]));
        assert!(close(data.positions[4], [half, y, half]));
        assert!(close(data.positions[20], [-half, y, -half]));
        assert!(close(data.positions[24], [half, y, -half]));
    }

    #[test]
    fn flat_map_normals_point_up() {
        let grid = build_grid(3).unwrap();
        let data = build_terrain_mesh_data(&grid, &Heightmap::flat(), &TerrainConfig::default());
        assert!(data.normals.iter().all(|&n| close(n, [0.0, 1.0, 0.0])));
    }

    #[test]
    fn buffers_line_up_with_grid() {
        let grid = build_grid(5).unwrap();
        let data = build_terrain_mesh_data(&grid, &Heightmap::flat(), &TerrainConfig::default());
        assert_eq!(data.positions.len(), grid.vertex_count());
        assert_eq!(data.normals.len(), grid.vertex_count());
        assert_eq!(data.uvs.len(), grid.vertex_count());
        assert_eq!(data.indices, grid.indices());
        assert_eq!(data.uvs[7], grid.vertices()[7].to_array());
    }

    #[test]
    fn heightmap_lifts_vertices() {
        let config = TerrainConfig::default();
        let map = Heightmap::new(1, 1, vec![1.0]).unwrap();
        let p = displace(Vec2::new(0.5, 0.5), &map, &config);
        assert!(close(p.to_array(), [0.0, 1.5 - 0.8, 0.0]));
    }

    #[test]
    fn slope_tilts_normals_downhill() {
        // height rises with u, so normals lean towards -X
        let map = Heightmap::new(2, 1, vec![0.0, 1.0]).unwrap();
        let grid = build_grid(4).unwrap();
        let data = build_terrain_mesh_data(&grid, &map, &TerrainConfig::default());
        let centre = data.normals[2 * 5 + 2];
        assert!(centre[0] < 0.0);
        assert!(centre[1] > 0.0);
    }
}
