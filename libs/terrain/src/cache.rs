use bevy::log::debug;
use bevy::prelude::Resource;
use std::collections::HashMap;
use std::sync::Arc;

use crate::grid::{GridError, GridMesh, build_grid};

/// Built grids keyed by depth. Grids are deterministic, so a hit is always valid.
#[derive(Resource, Default)]
pub struct GridCache {
    grids: HashMap<i32, Arc<GridMesh>>,
}

impl GridCache {
    pub fn get_or_build(&mut self, depth: i32) -> Result<Arc<GridMesh>, GridError> {
        if let Some(grid) = self.grids.get(&depth) {
            return Ok(Arc::clone(grid));
        }

        let grid = Arc::new(build_grid(depth)?);
        debug!("grid cache miss for depth {depth}");
        self.grids.insert(depth, Arc::clone(&grid));
        Ok(grid)
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    pub fn clear(&mut self) {
        self.grids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_depth_shares_the_grid() {
        let mut cache = GridCache::default();
        let a = cache.get_or_build(4).unwrap();
        let b = cache.get_or_build(4).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.get_or_build(5).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = GridCache::default();
        assert!(matches!(
            cache.get_or_build(0),
            Err(GridError::InvalidArgument { depth: 0 })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_drops_entries() {
        let mut cache = GridCache::default();
        cache.get_or_build(2).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
