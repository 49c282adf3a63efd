//! Where balls go: the standard layout, rejection-sampled random layouts,
//! validity checks for hand-placed balls and respawn spot selection.

use glam::Vec2;
use rand::Rng;

use crate::api::types::{BallKind, GameMode};
use crate::components::table::Table;
use crate::config::PlacementTuning;
use crate::error::PlacementError;

/// Why a point is not a legal resting place, if it is not.
pub fn check_position(table: &Table, p: Vec2, occupied: &[Vec2], tuning: &PlacementTuning) -> Result<(), PlacementError> {
    let r = table.ball_radius;
    if !table.play_area().inset(r).contains(p) {
        return Err(PlacementError::OutOfBounds { x: p.x, y: p.y });
    }
    let spacing = tuning.ball_spacing * r;
    if occupied.iter().any(|o| o.distance(p) < spacing) {
        return Err(PlacementError::Obstructed { x: p.x, y: p.y });
    }
    let clearance = tuning.pocket_clearance * r;
    if table
        .pockets
        .iter()
        .any(|pocket| pocket.position.distance(p) < pocket.radius + clearance)
    {
        return Err(PlacementError::Obstructed { x: p.x, y: p.y });
    }
    Ok(())
}

pub fn is_valid_position(table: &Table, p: Vec2, occupied: &[Vec2], tuning: &PlacementTuning) -> bool {
    check_position(table, p, occupied, tuning).is_ok()
}

/// Rejection sampling: uniform points on the cloth until one is valid.
pub fn sample_position<R: Rng + ?Sized>(
    rng: &mut R,
    table: &Table,
    kind: BallKind,
    occupied: &[Vec2],
    tuning: &PlacementTuning,
) -> Result<Vec2, PlacementError> {
    let area = table.play_area().inset(table.ball_radius);
    for _ in 0..tuning.max_attempts {
        let p = Vec2::new(
            rng.gen_range(area.min.x..=area.max.x),
            rng.gen_range(area.min.y..=area.max.y),
        );
        if is_valid_position(table, p, occupied, tuning) {
            return Ok(p);
        }
    }
    Err(PlacementError::Exhausted {
        kind,
        attempts: tuning.max_attempts,
    })
}

/// Starting positions for every object ball in `kinds` under `mode`, as
/// `(index into kinds, position or failure)`. The cue ball is skipped: it is
/// always placed by hand.
pub fn arrange<R: Rng + ?Sized>(
    mode: GameMode,
    kinds: &[BallKind],
    table: &Table,
    rng: &mut R,
    tuning: &PlacementTuning,
) -> Vec<(usize, Result<Vec2, PlacementError>)> {
    let mut placed = Vec::with_capacity(kinds.len());
    let mut occupied = Vec::with_capacity(kinds.len());

    // Fixed positions first so sampled balls keep clear of them.
    let mut rack = table.red_triangle_positions().into_iter();
    for (i, kind) in kinds.iter().enumerate() {
        let fixed = match (mode, kind) {
            (_, BallKind::Cue) | (GameMode::Unset, _) | (GameMode::RandomAll, _) => None,
            (GameMode::Standard, BallKind::Red) => rack.next(),
            (GameMode::RandomReds, BallKind::Red) => None,
            (_, color) => table.spot_for(*color),
        };
        if let Some(p) = fixed {
            occupied.push(p);
            placed.push((i, Ok(p)));
        }
    }

    let sampled: fn(BallKind) -> bool = match mode {
        GameMode::RandomReds => |k: BallKind| k == BallKind::Red,
        GameMode::RandomAll => |k: BallKind| k != BallKind::Cue,
        GameMode::Standard | GameMode::Unset => |_: BallKind| false,
    };
    for (i, kind) in kinds.iter().enumerate() {
        if !sampled(*kind) {
            continue;
        }
        let result = sample_position(rng, table, *kind, &occupied, tuning);
        if let Ok(p) = result {
            occupied.push(p);
        }
        placed.push((i, result));
    }
    placed
}

/// Spot for a potted color: its own when clear, else the highest-value clear
/// spot, else its own regardless.
pub fn respawn_spot(table: &Table, kind: BallKind, occupied: &[Vec2]) -> Option<Vec2> {
    let own = table.spot_for(kind)?;
    let clearance = 2.0 * table.ball_radius;
    let is_clear = |spot: Vec2| occupied.iter().all(|o| o.distance(spot) >= clearance);

    if is_clear(own) {
        return Some(own);
    }
    let fallback = BallKind::COLORS
        .iter()
        .rev()
        .filter_map(|k| table.spot_for(*k))
        .find(|spot| is_clear(*spot));
    Some(fallback.unwrap_or(own))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn roster() -> Vec<BallKind> {
        let mut kinds = vec![BallKind::Cue];
        kinds.extend(std::iter::repeat(BallKind::Red).take(15));
        kinds.extend(BallKind::COLORS);
        kinds
    }

    fn table() -> Table {
        Table::new(&TableConfig::default())
    }

    #[test]
    fn standard_layout_is_rack_plus_spots() {
        let table = table();
        let kinds = roster();
        let mut rng = SmallRng::seed_from_u64(1);
        let placed = arrange(GameMode::Standard, &kinds, &table, &mut rng, &PlacementTuning::default());

        assert_eq!(placed.len(), 21);
        assert!(placed.iter().all(|(i, _)| kinds[*i] != BallKind::Cue));
        let rack = table.red_triangle_positions();
        for (i, result) in &placed {
            let p = result.expect("standard layout never fails");
            match kinds[*i] {
                BallKind::Red => assert!(rack.contains(&p)),
                color => assert_eq!(Some(p), table.spot_for(color)),
            }
        }
    }

    #[test]
    fn random_reds_keep_colors_on_spots() {
        let table = table();
        let kinds = roster();
        let tuning = PlacementTuning::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let placed = arrange(GameMode::RandomReds, &kinds, &table, &mut rng, &tuning);
        assert_eq!(placed.len(), 21);
        for (i, result) in &placed {
            if kinds[*i].is_color() {
                assert_eq!(result.ok(), table.spot_for(kinds[*i]));
            }
        }
    }

    #[test]
    fn rejection_sampling_respects_spacing_over_many_trials() {
        let table = table();
        let kinds = roster();
        let tuning = PlacementTuning::default();
        let r = table.ball_radius;
        let mut rng = SmallRng::seed_from_u64(0xba1e);

        for trial in 0..1000 {
            let placed = arrange(GameMode::RandomAll, &kinds, &table, &mut rng, &tuning);
            let points: Vec<Vec2> = placed.iter().filter_map(|(_, p)| p.ok()).collect();
            for (a, p) in points.iter().enumerate() {
                for q in &points[a + 1..] {
                    assert!(p.distance(*q) >= 2.5 * r, "trial {}: balls {:?} {:?} too close", trial, p, q);
                }
                for pocket in &table.pockets {
                    assert!(
                        p.distance(pocket.position) >= pocket.radius + 2.0 * r,
                        "trial {}: {:?} too close to pocket",
                        trial,
                        p
                    );
                }
            }
        }
    }

    #[test]
    fn exhaustion_is_reported_not_panicked() {
        let table = table();
        let tuning = PlacementTuning { max_attempts: 3, ..PlacementTuning::default() };
        // Cover the cloth so nothing fits.
        let area = table.play_area();
        let mut occupied = Vec::new();
        let mut y = area.min.y;
        while y <= area.max.y {
            let mut x = area.min.x;
            while x <= area.max.x {
                occupied.push(Vec2::new(x, y));
                x += table.ball_radius;
            }
            y += table.ball_radius;
        }
        let mut rng = SmallRng::seed_from_u64(3);
        let err = sample_position(&mut rng, &table, BallKind::Pink, &occupied, &tuning).unwrap_err();
        assert_eq!(err, PlacementError::Exhausted { kind: BallKind::Pink, attempts: 3 });
    }

    #[test]
    fn position_checks_name_the_problem() {
        let table = table();
        let tuning = PlacementTuning::default();
        let area = table.play_area();
        let outside = Vec2::new(area.min.x - 1.0, table.center.y);
        assert!(matches!(check_position(&table, outside, &[], &tuning), Err(PlacementError::OutOfBounds { .. })));

        let p = table.center;
        let near = p + Vec2::new(2.0 * table.ball_radius, 0.0);
        assert!(matches!(check_position(&table, p, &[near], &tuning), Err(PlacementError::Obstructed { .. })));

        let by_pocket = table.pockets[2].position + Vec2::new(table.pockets[2].radius + table.ball_radius, 0.0);
        assert!(matches!(check_position(&table, by_pocket, &[], &tuning), Err(PlacementError::Obstructed { .. })));
        assert!(is_valid_position(&table, p, &[], &tuning));
    }

    #[test]
    fn respawn_prefers_own_then_highest_clear_spot() {
        let table = table();
        let spot = |k| table.spot_for(k).unwrap_or_default();

        assert_eq!(respawn_spot(&table, BallKind::Black, &[]), Some(spot(BallKind::Black)));

        // Black spot taken: black goes to the pink spot.
        let blocked = [spot(BallKind::Black) + Vec2::new(1.0, 0.0)];
        assert_eq!(respawn_spot(&table, BallKind::Black, &blocked), Some(spot(BallKind::Pink)));

        // Yellow spot taken: the black spot is the best clear one.
        let blocked = [spot(BallKind::Yellow)];
        assert_eq!(respawn_spot(&table, BallKind::Yellow, &blocked), Some(spot(BallKind::Black)));

        // Every spot taken: own spot regardless.
        let all: Vec<Vec2> = BallKind::COLORS.iter().map(|k| spot(*k)).collect();
        assert_eq!(respawn_spot(&table, BallKind::Green, &all), Some(spot(BallKind::Green)));

        assert_eq!(respawn_spot(&table, BallKind::Red, &[]), None);
    }
}
