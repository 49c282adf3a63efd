use glam::Vec2;

use crate::api::types::{BallId, BallKind, BodyRole};
use crate::core::physics::CollisionPair;

/// A collision start, sorted by what touched what.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    BallBall {
        a: (BallId, BallKind),
        b: (BallId, BallKind),
        /// Unit normal from `a` toward `b`.
        normal: Vec2,
    },
    BallCushion {
        ball: (BallId, BallKind),
        /// Unit normal from the ball toward the cushion.
        normal: Vec2,
    },
}

/// Match one engine event on body roles. Contact ends and cushion-cushion
/// pairs carry nothing for the game.
pub fn classify(pair: &CollisionPair) -> Option<Contact> {
    if !pair.started {
        return None;
    }
    match (pair.role_a, pair.role_b) {
        (BodyRole::Ball { id: ia, kind: ka }, BodyRole::Ball { id: ib, kind: kb }) => Some(Contact::BallBall {
            a: (ia, ka),
            b: (ib, kb),
            normal: pair.normal,
        }),
        (BodyRole::Ball { id, kind }, BodyRole::Cushion) => Some(Contact::BallCushion {
            ball: (id, kind),
            normal: pair.normal,
        }),
        (BodyRole::Cushion, BodyRole::Ball { id, kind }) => Some(Contact::BallCushion {
            ball: (id, kind),
            normal: -pair.normal,
        }),
        (BodyRole::Cushion, BodyRole::Cushion) => None,
    }
}

/// Contacts in engine order.
pub fn contacts(pairs: &[CollisionPair]) -> impl Iterator<Item = Contact> + '_ {
    pairs.iter().filter_map(classify)
}
