//! Static table geometry: playing area, pockets, cushions, the D and the spots.
//!
//! The table is portrait. Width runs along x, length (twice the width) along
//! y, and y grows downward. The balk end with the D is the bottom cushion;
//! the black spot sits near the top cushion.

use glam::Vec2;
use serde::Serialize;

use crate::api::types::{BallKind, BodyRole};
use crate::config::{CushionPhysics, TableConfig};
use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial, PhysicsBody, PhysicsWorld};

const BALL_RADIUS_RATIO: f32 = 0.0148;
const CUSHION_RATIO: f32 = 0.05;
const CORNER_POCKET_RATIO: f32 = 3.27;
const MIDDLE_POCKET_RATIO: f32 = 3.96;
const BALK_FROM_BOTTOM: f32 = 0.2065;
const D_RADIUS_RATIO: f32 = 0.1642;
const PINK_FROM_TOP: f32 = 0.25;
const BLACK_FROM_TOP: f32 = 0.0908;
/// Rack spacing in ball radii: touching balls plus a small gap.
pub const RACK_SPACING: f32 = 2.05;
pub const RACK_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PocketKind {
    Corner,
    Middle,
}

impl PocketKind {
    pub fn code(self) -> u32 {
        match self {
            PocketKind::Corner => 0,
            PocketKind::Middle => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pocket {
    pub position: Vec2,
    pub radius: f32,
    pub kind: PocketKind,
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Shrink every side by `margin`.
    pub fn inset(&self, margin: f32) -> Rect {
        Rect {
            min: self.min + Vec2::splat(margin),
            max: self.max - Vec2::splat(margin),
        }
    }
}

/// Immutable table description, derived entirely from center and width.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub center: Vec2,
    pub width: f32,
    pub length: f32,
    pub cushion_thickness: f32,
    pub ball_radius: f32,
    pub corner_pocket_radius: f32,
    pub middle_pocket_radius: f32,
    pub d_radius: f32,
    pub balk_y: f32,
    /// Top-left, top-right, middle-left, middle-right, bottom-left, bottom-right.
    pub pockets: [Pocket; 6],
    /// Static rectangles: cushion segments between pocket gaps, then the outer rails.
    pub cushions: Vec<Rect>,
}

impl Table {
    pub fn new(config: &TableConfig) -> Self {
        let center = Vec2::new(config.center_x, config.center_y);
        let width = config.width;
        let length = width * 2.0;
        let ball_radius = width * BALL_RADIUS_RATIO;
        let cushion_thickness = width * CUSHION_RATIO;
        let corner_pocket_radius = ball_radius * CORNER_POCKET_RATIO;
        let middle_pocket_radius = ball_radius * MIDDLE_POCKET_RATIO;

        let left = center.x - width * 0.5;
        let right = center.x + width * 0.5;
        let top = center.y - length * 0.5;
        let bottom = center.y + length * 0.5;

        let corner = |x, y| Pocket {
            position: Vec2::new(x, y),
            radius: corner_pocket_radius,
            kind: PocketKind::Corner,
        };
        let middle = |x| Pocket {
            position: Vec2::new(x, center.y),
            radius: middle_pocket_radius,
            kind: PocketKind::Middle,
        };
        let pockets = [
            corner(left, top),
            corner(right, top),
            middle(left),
            middle(right),
            corner(left, bottom),
            corner(right, bottom),
        ];

        let t = cushion_thickness;
        let cr = corner_pocket_radius;
        let mr = middle_pocket_radius;
        let rect = |x0: f32, y0: f32, x1: f32, y1: f32| Rect {
            min: Vec2::new(x0, y0),
            max: Vec2::new(x1, y1),
        };
        let cushions = vec![
            // Long sides, split around the middle pockets.
            rect(left - t, top + cr, left, center.y - mr),
            rect(left - t, center.y + mr, left, bottom - cr),
            rect(right, top + cr, right + t, center.y - mr),
            rect(right, center.y + mr, right + t, bottom - cr),
            // Short sides.
            rect(left + cr, top - t, right - cr, top),
            rect(left + cr, bottom, right - cr, bottom + t),
            // Outer rails behind the pocket mouths.
            rect(left - 2.0 * t, top - 2.0 * t, left - t, bottom + 2.0 * t),
            rect(right + t, top - 2.0 * t, right + 2.0 * t, bottom + 2.0 * t),
            rect(left - t, top - 2.0 * t, right + t, top - t),
            rect(left - t, bottom + t, right + t, bottom + 2.0 * t),
        ];

        Self {
            center,
            width,
            length,
            cushion_thickness,
            ball_radius,
            corner_pocket_radius,
            middle_pocket_radius,
            d_radius: width * D_RADIUS_RATIO,
            balk_y: bottom - length * BALK_FROM_BOTTOM,
            pockets,
            cushions,
        }
    }

    /// The cloth inside the cushion lines.
    pub fn play_area(&self) -> Rect {
        let half = Vec2::new(self.width, self.length) * 0.5;
        Rect {
            min: self.center - half,
            max: self.center + half,
        }
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.length * 0.5
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.length * 0.5
    }

    /// Centre of the D: the brown spot.
    pub fn d_center(&self) -> Vec2 {
        Vec2::new(self.center.x, self.balk_y)
    }

    /// Inside the D's radius and on the balk side of the balk line.
    pub fn is_in_legal_placement_zone(&self, p: Vec2) -> bool {
        p.distance(self.d_center()) <= self.d_radius && p.y >= self.balk_y
    }

    /// Fixed spot for a color. Reds and the cue ball have none.
    pub fn spot_for(&self, kind: BallKind) -> Option<Vec2> {
        let d = self.d_center();
        let spot = match kind {
            BallKind::Yellow => Vec2::new(d.x + self.d_radius, d.y),
            BallKind::Green => Vec2::new(d.x - self.d_radius, d.y),
            BallKind::Brown => d,
            BallKind::Blue => self.center,
            BallKind::Pink => Vec2::new(self.center.x, self.top() + self.length * PINK_FROM_TOP),
            BallKind::Black => Vec2::new(self.center.x, self.top() + self.length * BLACK_FROM_TOP),
            BallKind::Cue | BallKind::Red => return None,
        };
        Some(spot)
    }

    /// The 15-ball rack, apex first, then row by row toward the top cushion.
    pub fn red_triangle_positions(&self) -> Vec<Vec2> {
        let spacing = self.ball_radius * RACK_SPACING;
        let row_step = spacing * 60f32.to_radians().sin();
        let pink_y = self.top() + self.length * PINK_FROM_TOP;
        let apex = Vec2::new(self.center.x, pink_y - spacing);

        let mut positions = Vec::with_capacity(15);
        for row in 0..RACK_ROWS {
            let y = apex.y - row as f32 * row_step;
            for col in 0..=row {
                let x = apex.x + (col as f32 - row as f32 * 0.5) * spacing;
                positions.push(Vec2::new(x, y));
            }
        }
        positions
    }

    /// Pocket whose centre is closest to `p`.
    pub fn nearest_pocket(&self, p: Vec2) -> usize {
        let mut best = 0;
        let mut best_dist = f32::MAX;
        for (i, pocket) in self.pockets.iter().enumerate() {
            let d = pocket.position.distance_squared(p);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    }

    /// Insert every cushion and rail into the world as fixed bodies.
    pub fn build_cushions(&self, world: &mut PhysicsWorld, physics: &CushionPhysics) -> Vec<PhysicsBody> {
        let material = ColliderMaterial {
            restitution: physics.restitution,
            friction: physics.friction,
            density: 1.0,
        };
        self.cushions
            .iter()
            .map(|rect| {
                let half = rect.half_extents();
                let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
                    half_width: half.x,
                    half_height: half.y,
                })
                .with_position(rect.center());
                world.create_body(BodyRole::Cushion, &desc, material)
            })
            .collect()
    }
}
