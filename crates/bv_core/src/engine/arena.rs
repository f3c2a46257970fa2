//! Reference arena physics for headless matches
//!
//! A flat floor between two walls, lane along x. Bodies are axis-aligned
//! boxes (feet at `position`, width `2 * radius`, height scaled by size).
//! Good enough to drive the match engine deterministically without a game
//! engine; not meant to match any real engine's contact solver.
//!
//! [`ArenaHost`] runs one frame in the order a game engine would:
//! match update, physics step, then collision and trigger callbacks.

use serde::{Deserialize, Serialize};

use super::match_machine::Match;
use super::ports::{BodyState, InputSource, Physics, Presentation};
use super::timer::sanitize_dt;
use super::types::{lane_right, Contact, LayerMask, PlayerId, Vec3};
use crate::error::Result;

/// Contacts below this impulse are resting contact, not collisions.
const MIN_REPORTED_IMPULSE: f32 = 0.5;
const GROUND_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaSpec {
    /// Walls sit at `x = ±half_width`
    pub half_width: f32,
    pub floor_y: f32,
    pub gravity: f32,
    pub base_radius: f32,
    pub base_height: f32,
    /// Extra reach of an attack collider beyond the body, at size 1
    pub attack_reach: f32,
    /// Horizontal velocity decay per second on the floor
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ArenaSpec {
    fn default() -> Self {
        Self {
            half_width: 6.0,
            floor_y: 0.0,
            gravity: -9.81,
            base_radius: 0.5,
            base_height: 2.0,
            attack_reach: 0.6,
            friction: 4.0,
            restitution: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArenaBody {
    position: Vec3,
    velocity: Vec3,
    facing: Vec3,
    size: f32,
    mass: f32,
    dynamic: bool,
}

impl ArenaBody {
    fn radius(&self, spec: &ArenaSpec) -> f32 {
        spec.base_radius * self.size
    }

    fn height(&self, spec: &ArenaSpec) -> f32 {
        spec.base_height * self.size
    }

    fn overlaps_vertically(&self, other: &ArenaBody, spec: &ArenaSpec) -> bool {
        self.position.y < other.position.y + other.height(spec)
            && other.position.y < self.position.y + self.height(spec)
    }
}

/// One reported collision, from `player`'s point of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyContact {
    pub player: PlayerId,
    pub contact: Contact,
    pub impulse: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArenaContacts {
    pub collisions: Vec<BodyContact>,
}

#[derive(Debug, Clone, Default)]
pub struct ArenaPhysics {
    spec: ArenaSpec,
    bodies: [Option<ArenaBody>; 2],
}

impl ArenaPhysics {
    pub fn new(spec: ArenaSpec) -> Self {
        Self { spec, bodies: [None, None] }
    }

    pub fn spec(&self) -> &ArenaSpec {
        &self.spec
    }

    fn body_mut(&mut self, id: PlayerId) -> Option<&mut ArenaBody> {
        self.bodies[id.index()].as_mut()
    }

    fn wall_limit(&self, body: &ArenaBody) -> f32 {
        (self.spec.half_width - body.radius(&self.spec)).max(0.0)
    }

    /// Whether `attacker`'s attack collider overlaps `target`'s body.
    pub fn attack_reaches(&self, attacker: PlayerId, target: PlayerId) -> bool {
        let (Some(a), Some(t)) = (&self.bodies[attacker.index()], &self.bodies[target.index()])
        else {
            return false;
        };
        let dx = t.position.x - a.position.x;
        let ahead = dx * a.facing.x >= 0.0;
        let reach = a.radius(&self.spec) + self.spec.attack_reach * a.size + t.radius(&self.spec);
        ahead && dx.abs() <= reach && a.overlaps_vertically(t, &self.spec)
    }

    /// Integrate dynamic bodies and resolve floor, wall and body contacts.
    pub fn step(&mut self, dt: f32) -> ArenaContacts {
        let mut contacts = ArenaContacts::default();
        let dt = sanitize_dt(dt);
        if dt == 0.0 {
            return contacts;
        }

        let spec = self.spec;
        for id in PlayerId::ALL {
            let Some(body) = self.bodies[id.index()] else { continue };
            if !body.dynamic {
                continue;
            }
            let limit = self.wall_limit(&body);
            let mut body = body;

            body.velocity.y += spec.gravity * dt;
            body.position += body.velocity * dt;

            if body.position.y < spec.floor_y {
                let impact = -body.velocity.y.min(0.0) * body.mass;
                body.position.y = spec.floor_y;
                body.velocity.y = body.velocity.y.max(0.0);
                report(&mut contacts, id, Contact::Environment, impact);
            }

            if body.position.x.abs() > limit {
                let impact = body.velocity.x.abs() * body.mass;
                body.position.x = body.position.x.clamp(-limit, limit);
                if body.velocity.x * body.position.x > 0.0 {
                    body.velocity.x = 0.0;
                }
                report(&mut contacts, id, Contact::Environment, impact);
            }

            if body.position.y <= spec.floor_y + GROUND_EPSILON {
                let keep = (1.0 - spec.friction * dt).max(0.0);
                body.velocity.x *= keep;
                body.velocity.z *= keep;
            }

            self.bodies[id.index()] = Some(body);
        }

        self.resolve_body_contact(&mut contacts);
        contacts
    }

    fn resolve_body_contact(&mut self, contacts: &mut ArenaContacts) {
        let spec = self.spec;
        let [Some(a), Some(b)] = &mut self.bodies else { return };
        if !a.overlaps_vertically(b, &spec) {
            return;
        }

        let dx = b.position.x - a.position.x;
        let min_gap = a.radius(&spec) + b.radius(&spec);
        if dx.abs() >= min_gap {
            return;
        }

        let dir = if dx >= 0.0 { 1.0 } else { -1.0 };
        let push = (min_gap - dx.abs()) / 2.0;
        a.position.x -= push * dir;
        b.position.x += push * dir;

        let closing = (b.velocity.x - a.velocity.x) * dir;
        if closing >= 0.0 || !(a.dynamic || b.dynamic) {
            return;
        }
        let inv_a = 1.0 / a.mass.max(super::combat::MIN_MASS);
        let inv_b = 1.0 / b.mass.max(super::combat::MIN_MASS);
        let j = -(1.0 + spec.restitution) * closing / (inv_a + inv_b);
        a.velocity.x -= j * inv_a * dir;
        b.velocity.x += j * inv_b * dir;

        report(contacts, PlayerId::One, Contact::Player(PlayerId::Two), j);
        report(contacts, PlayerId::Two, Contact::Player(PlayerId::One), j);
    }
}

fn report(contacts: &mut ArenaContacts, player: PlayerId, contact: Contact, impulse: f32) {
    if impulse >= MIN_REPORTED_IMPULSE {
        contacts.collisions.push(BodyContact { player, contact, impulse });
    }
}

/// Ray against a 2D box in the x/y plane. Returns the entry distance.
fn ray_box(origin: Vec3, dir: Vec3, min: (f32, f32), max: (f32, f32)) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    for (o, d, lo, hi) in [(origin.x, dir.x, min.0, max.0), (origin.y, dir.y, min.1, max.1)] {
        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (t1, t2) = ((lo - o) / d, (hi - o) / d);
        t_near = t_near.max(t1.min(t2));
        t_far = t_far.min(t1.max(t2));
    }
    if t_near > t_far || t_far < 0.0 {
        None
    } else {
        Some(t_near.max(0.0))
    }
}

impl Physics for ArenaPhysics {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<bool> {
        let len = direction.norm();
        if !(len > 0.0) || !max_distance.is_finite() {
            return Ok(false);
        }
        let dir = direction / len;
        let mut nearest = f32::INFINITY;

        if dir.y < 0.0 {
            let t = (origin.y - self.spec.floor_y) / -dir.y;
            if t >= 0.0 {
                nearest = nearest.min(t);
            }
        }
        if dir.x > 0.0 {
            let t = (self.spec.half_width - origin.x) / dir.x;
            if t >= 0.0 {
                nearest = nearest.min(t);
            }
        } else if dir.x < 0.0 {
            let t = (origin.x + self.spec.half_width) / -dir.x;
            if t >= 0.0 {
                nearest = nearest.min(t);
            }
        }

        if mask == LayerMask::All {
            for body in self.bodies.iter().flatten() {
                let r = body.radius(&self.spec);
                let min = (body.position.x - r, body.position.y);
                let max = (body.position.x + r, body.position.y + body.height(&self.spec));
                if let Some(t) = ray_box(origin, dir, min, max) {
                    nearest = nearest.min(t);
                }
            }
        }

        Ok(nearest <= max_distance)
    }

    fn apply_impulse(&mut self, body: PlayerId, impulse: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.velocity += impulse;
        }
    }

    fn set_velocity(&mut self, body: PlayerId, velocity: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.velocity = velocity;
        }
    }

    fn teleport(&mut self, body: PlayerId, position: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.position = position;
        }
    }

    fn move_by(&mut self, body: PlayerId, delta: Vec3) {
        let Some(b) = self.bodies[body.index()] else { return };
        let limit = self.wall_limit(&b);
        if let Some(b) = self.body_mut(body) {
            b.position += delta;
            b.position.x = b.position.x.clamp(-limit, limit);
        }
    }

    fn face(&mut self, body: PlayerId, forward: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.facing = forward;
        }
    }

    fn spawn_body(&mut self, body: PlayerId, position: Vec3, size: f32) {
        let facing = if position.x <= 0.0 { lane_right() } else { -lane_right() };
        self.bodies[body.index()] = Some(ArenaBody {
            position,
            velocity: Vec3::zeros(),
            facing,
            size,
            mass: size,
            dynamic: false,
        });
    }

    fn activate_body(&mut self, body: PlayerId, mass: f32, size: f32) {
        if let Some(b) = self.body_mut(body) {
            b.mass = mass;
            b.size = size;
            b.dynamic = true;
        }
    }

    fn remove_body(&mut self, body: PlayerId) {
        self.bodies[body.index()] = None;
    }

    fn body_state(&self, body: PlayerId) -> Option<BodyState> {
        self.bodies[body.index()]
            .map(|b| BodyState { position: b.position, velocity: b.velocity })
    }
}

/// Drives a match over [`ArenaPhysics`] one frame at a time.
pub struct ArenaHost<P, I> {
    game: Match<P, ArenaPhysics, I>,
}

impl<P: Presentation, I: InputSource> ArenaHost<P, I> {
    pub fn new(game: Match<P, ArenaPhysics, I>) -> Self {
        Self { game }
    }

    pub fn game(&self) -> &Match<P, ArenaPhysics, I> {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Match<P, ArenaPhysics, I> {
        &mut self.game
    }

    pub fn into_inner(self) -> Match<P, ArenaPhysics, I> {
        self.game
    }

    pub fn step(&mut self, dt: f32) -> ArenaContacts {
        self.game.advance(dt);
        let contacts = self.game.physics_mut().step(dt);

        for hit in &contacts.collisions {
            self.game.on_body_collision(hit.player, hit.contact, hit.impulse);
        }
        for attacker in PlayerId::ALL {
            let Some(kind) = self.game.bubbleman(attacker).active_attack() else { continue };
            if self.game.physics().attack_reaches(attacker, attacker.opponent()) {
                self.game.on_attack_overlap(attacker, kind.is_punch());
            }
        }
        contacts
    }
}
