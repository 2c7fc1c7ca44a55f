//! Collision detection between circles and wall tiles
//!
//! Entities are circles in maze coordinates; walls are unit squares. Tiles
//! outside the grid never collide: that band is where exits lead.

use glam::Vec2;

use super::grid::{Grid, TilePos};

/// Extra reach beyond the body radius when looking for rubbed tiles
pub const RUB_SCAN_PAD: f32 = 0.2;
/// Contact tolerance for counting a tile as rubbed
pub const RUB_CONTACT_PAD: f32 = 0.12;

/// Closest point of tile `t` to `p`
#[inline]
fn closest_point(tile: TilePos, p: Vec2) -> Vec2 {
    let min = Vec2::new(tile.x as f32, tile.y as f32);
    p.clamp(min, min + Vec2::ONE)
}

/// Squared distance from `p` to the square of `tile`
#[inline]
pub fn tile_distance_sq(tile: TilePos, p: Vec2) -> f32 {
    (p - closest_point(tile, p)).length_squared()
}

/// True if a circle at `pos` overlaps any wall tile
pub fn circle_hits_wall(grid: &Grid, pos: Vec2, radius: f32) -> bool {
    let lo = (pos - Vec2::splat(radius)).floor();
    let hi = (pos + Vec2::splat(radius)).floor();

    for ty in lo.y as i32..=hi.y as i32 {
        for tx in lo.x as i32..=hi.x as i32 {
            let tile = TilePos::new(tx, ty);
            if grid.is_wall(tile) && tile_distance_sq(tile, pos) < radius * radius {
                return true;
            }
        }
    }
    false
}

/// Wall tiles touched by an attempted move from `from` to `to`.
///
/// Scans the box spanning both positions and keeps tiles within reach of the
/// attempted position, so a grazing slide still registers contact.
/// `margin` excludes the unbreakable border band.
pub fn rub_contacts(grid: &Grid, from: Vec2, to: Vec2, radius: f32, margin: i32) -> Vec<TilePos> {
    let pad = Vec2::splat(radius + RUB_SCAN_PAD);
    let lo = (from.min(to) - pad).floor();
    let hi = (from.max(to) + pad).ceil();
    let reach = radius + RUB_CONTACT_PAD;

    let mut tiles = Vec::new();
    for ty in lo.y as i32..=hi.y as i32 {
        for tx in lo.x as i32..=hi.x as i32 {
            let tile = TilePos::new(tx, ty);
            if !grid.is_wall(tile) || tile.in_border(margin) {
                continue;
            }
            if tile_distance_sq(tile, to) < reach * reach {
                tiles.push(tile);
            }
        }
    }
    tiles
}

/// Outcome of a per-axis sliding move
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlideResult {
    pub pos: Vec2,
    /// Attempted X target when the X step was refused
    pub blocked_x: Option<Vec2>,
    /// Attempted Y target when the Y step was refused
    pub blocked_y: Option<Vec2>,
}

/// Move a circle by `delta`, resolving X then Y.
///
/// A blocked axis keeps its coordinate; there is no push-out, so diagonal input
/// against a wall slides along it.
pub fn slide(grid: &Grid, pos: Vec2, delta: Vec2, radius: f32) -> SlideResult {
    let mut result = SlideResult {
        pos,
        ..Default::default()
    };

    if delta.x != 0.0 {
        let next = Vec2::new(result.pos.x + delta.x, result.pos.y);
        if circle_hits_wall(grid, next, radius) {
            result.blocked_x = Some(next);
        } else {
            result.pos = next;
        }
    }

    if delta.y != 0.0 {
        let next = Vec2::new(result.pos.x, result.pos.y + delta.y);
        if circle_hits_wall(grid, next, radius) {
            result.blocked_y = Some(next);
        } else {
            result.pos = next;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FLOOR;

    /// Open 3x1 corridor at row 5, columns 4..=6
    fn corridor() -> Grid {
        let mut grid = Grid::filled(1);
        for x in 4..=6 {
            grid.set(TilePos::new(x, 5), FLOOR);
        }
        grid
    }

    #[test]
    fn test_centered_circle_is_clear() {
        let grid = corridor();
        assert!(!circle_hits_wall(&grid, Vec2::new(5.5, 5.5), 0.3));
    }

    #[test]
    fn test_touching_edge_is_not_overlap() {
        let grid = corridor();
        // exactly tangent to the north wall
        assert!(!circle_hits_wall(&grid, Vec2::new(5.5, 5.5), 0.5));
        assert!(circle_hits_wall(&grid, Vec2::new(5.5, 5.4), 0.5));
    }

    #[test]
    fn test_outside_grid_never_collides() {
        let grid = Grid::filled(FLOOR);
        assert!(!circle_hits_wall(&grid, Vec2::new(-0.5, 8.5), 0.3));
        let walls = Grid::filled(1);
        assert!(!circle_hits_wall(&walls, Vec2::new(-3.0, -3.0), 0.3));
    }

    #[test]
    fn test_slide_blocks_only_the_colliding_axis() {
        let grid = corridor();
        let start = Vec2::new(5.5, 5.5);
        let result = slide(&grid, start, Vec2::new(0.2, -0.4), 0.3);
        assert!((result.pos.x - 5.7).abs() < 1e-5);
        assert_eq!(result.pos.y, 5.5);
        assert!(result.blocked_x.is_none());
        assert!(result.blocked_y.is_some());
    }

    #[test]
    fn test_rub_contacts_find_the_wall_ahead() {
        let grid = corridor();
        let from = Vec2::new(5.5, 5.5);
        let to = Vec2::new(5.5, 5.1);
        let tiles = rub_contacts(&grid, from, to, 0.3, 1);
        assert!(tiles.contains(&TilePos::new(5, 4)));
        assert!(!tiles.contains(&TilePos::new(5, 6)));
    }

    #[test]
    fn test_rub_contacts_skip_border() {
        let mut grid = Grid::filled(1);
        grid.set(TilePos::new(1, 1), FLOOR);
        let tiles = rub_contacts(&grid, Vec2::new(1.5, 1.5), Vec2::new(1.5, 1.1), 0.3, 1);
        assert!(tiles.iter().all(|t| !t.in_border(1)));
        assert!(tiles.is_empty());
    }
}
