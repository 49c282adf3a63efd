//! Pot detection: the capture test against pocket mouths, plus a safety net
//! for balls that leave the cloth without being captured.

use glam::Vec2;

use crate::api::types::BallId;
use crate::components::ball::Ball;
use crate::components::table::{Pocket, PocketKind, Table};
use crate::config::CaptureTuning;
use crate::core::physics::PhysicsWorld;

/// Does a ball at `position` moving at `velocity` (units per tick) drop into `pocket`?
///
/// The capture radius is a fraction of the pocket radius and shrinks for fast
/// balls. A fast ball heading away from the pocket centre skims the jaw and
/// stays up even inside the radius.
pub fn capture_test(position: Vec2, velocity: Vec2, pocket: &Pocket, tuning: &CaptureTuning) -> bool {
    let to_pocket = pocket.position - position;
    let distance = to_pocket.length();
    let speed = velocity.length();

    let mut threshold = match pocket.kind {
        PocketKind::Corner => tuning.corner_fraction,
        PocketKind::Middle => tuning.middle_fraction,
    };
    if speed > tuning.very_fast_speed {
        threshold *= tuning.very_fast_scale;
    } else if speed > tuning.fast_speed {
        threshold *= tuning.fast_scale;
    }

    if distance >= pocket.radius * threshold {
        return false;
    }

    if speed > tuning.skim_speed {
        let heading = velocity.dot(to_pocket.normalize_or_zero());
        if heading < tuning.skim_dot {
            return false;
        }
    }
    true
}

/// Nearest pocket for a ball whose centre is more than `escape_depth` radii
/// past a cushion line.
pub fn escaped_into(position: Vec2, radius: f32, table: &Table, tuning: &CaptureTuning) -> Option<usize> {
    let area = table.play_area();
    let depth = tuning.escape_depth * radius;
    let outside = position.x < area.min.x - depth
        || position.x > area.max.x + depth
        || position.y < area.min.y - depth
        || position.y > area.max.y + depth;
    outside.then(|| table.nearest_pocket(position))
}

/// Every ball on the table that is potted this tick, with its pocket index.
pub fn find_pots(world: &PhysicsWorld, balls: &[Ball], table: &Table, tuning: &CaptureTuning) -> Vec<(BallId, usize)> {
    let mut pots = Vec::new();
    for ball in balls.iter().filter(|b| b.is_on_table()) {
        if let Some(pocket) = ball.captured_by(world, &table.pockets, tuning) {
            pots.push((ball.id, pocket));
            continue;
        }
        let Some(position) = ball.position(world) else {
            continue;
        };
        if let Some(pocket) = escaped_into(position, ball.radius, table, tuning) {
            log::warn!(
                "{:?} ball {} left the table at ({:.1}, {:.1}), potting into pocket {}",
                ball.kind, ball.id.0, position.x, position.y, pocket
            );
            pots.push((ball.id, pocket));
        }
    }
    pots
}
