//! Narrowphase and sequential-impulse contact solver.

use ballpit_common::ContactMaterial;
use glam::Vec3;

use crate::arena::Arena;
use crate::body::{Plane, RigidBody};

/// Approach speeds below this do not bounce, which keeps resting stacks quiet.
const RESTITUTION_THRESHOLD: f32 = 0.5;
/// Allowed penetration before positional correction kicks in.
const PENETRATION_SLOP: f32 = 0.005;
/// Fraction of the remaining penetration removed per substep.
const CORRECTION_PERCENT: f32 = 0.8;

#[derive(Debug, Clone)]
pub(crate) struct Contact {
    /// Body slot pushed along `normal`.
    pub a: usize,
    /// Other body slot, `None` for a static plane.
    pub b: Option<usize>,
    /// Unit vector from `b` toward `a`.
    pub normal: Vec3,
    pub point: Vec3,
    pub depth: f32,
    pub material: ContactMaterial,
    normal_mass: f32,
    tangents: [Vec3; 2],
    tangent_mass: [f32; 2],
    target_normal_velocity: f32,
    normal_impulse: f32,
    tangent_impulse: [f32; 2],
}

impl Contact {
    fn new(
        a: usize,
        b: Option<usize>,
        normal: Vec3,
        point: Vec3,
        depth: f32,
        material: ContactMaterial,
    ) -> Self {
        Self {
            a,
            b,
            normal,
            point,
            depth,
            material,
            normal_mass: 0.0,
            tangents: [Vec3::ZERO; 2],
            tangent_mass: [0.0; 2],
            target_normal_velocity: 0.0,
            normal_impulse: 0.0,
            tangent_impulse: [0.0; 2],
        }
    }
}

/// Combined surface response for a pair of bodies.
pub(crate) fn combine_materials(
    a: Option<ContactMaterial>,
    b: Option<ContactMaterial>,
    default: ContactMaterial,
) -> ContactMaterial {
    match (a, b) {
        (Some(a), Some(b)) => ContactMaterial {
            friction: a.friction * b.friction,
            restitution: a.restitution * b.restitution,
        },
        _ => default,
    }
}

/// All-pairs contact generation: sphere/sphere, then sphere/plane.
pub(crate) fn detect(
    bodies: &Arena<RigidBody>,
    planes: &Arena<Plane>,
    default: ContactMaterial,
) -> Vec<Contact> {
    let mut contacts = Vec::new();
    let count = bodies.slot_count();

    for i in 0..count {
        let Some(a) = bodies.slot(i) else { continue };
        for j in (i + 1)..count {
            let Some(b) = bodies.slot(j) else { continue };
            if !a.is_dynamic() && !b.is_dynamic() {
                continue;
            }
            let delta = a.position - b.position;
            let reach = a.radius + b.radius;
            let dist_sq = delta.length_squared();
            if dist_sq >= reach * reach {
                continue;
            }
            let dist = dist_sq.sqrt();
            let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };
            let depth = reach - dist;
            let point = a.position - normal * (a.radius - depth * 0.5);
            contacts.push(Contact::new(
                i,
                Some(j),
                normal,
                point,
                depth,
                combine_materials(a.material, b.material, default),
            ));
        }

        if !a.is_dynamic() {
            continue;
        }
        for plane in planes.values() {
            let dist = plane.distance_to_point(a.position);
            if dist >= a.radius {
                continue;
            }
            contacts.push(Contact::new(
                i,
                None,
                plane.normal,
                a.position - plane.normal * a.radius,
                a.radius - dist,
                default,
            ));
        }
    }

    contacts
}

fn effective_mass(a: &RigidBody, b: Option<&RigidBody>, point: Vec3, dir: Vec3) -> f32 {
    let ra = point - a.position;
    let mut k = a.inv_mass() + a.inv_inertia() * ra.cross(dir).length_squared();
    if let Some(b) = b {
        let rb = point - b.position;
        k += b.inv_mass() + b.inv_inertia() * rb.cross(dir).length_squared();
    }
    if k > 0.0 { 1.0 / k } else { 0.0 }
}

fn relative_velocity(a: &RigidBody, b: Option<&RigidBody>, point: Vec3) -> Vec3 {
    let va = a.velocity_at(point);
    match b {
        Some(b) => va - b.velocity_at(point),
        None => va,
    }
}

fn bodies_for<'a>(
    bodies: &'a mut Arena<RigidBody>,
    a: usize,
    b: Option<usize>,
) -> Option<(&'a mut RigidBody, Option<&'a mut RigidBody>)> {
    match b {
        Some(b) => bodies.pair_mut(a, b).map(|(a, b)| (a, Some(b))),
        None => bodies.slot_mut(a).map(|a| (a, None)),
    }
}

/// Cache effective masses, tangent basis and restitution targets.
pub(crate) fn prepare(contacts: &mut [Contact], bodies: &Arena<RigidBody>) {
    for c in contacts.iter_mut() {
        let Some(a) = bodies.slot(c.a) else { continue };
        let b = c.b.and_then(|b| bodies.slot(b));

        c.normal_mass = effective_mass(a, b, c.point, c.normal);
        let (t1, t2) = c.normal.any_orthonormal_pair();
        c.tangents = [t1, t2];
        c.tangent_mass = [
            effective_mass(a, b, c.point, t1),
            effective_mass(a, b, c.point, t2),
        ];

        let vn = relative_velocity(a, b, c.point).dot(c.normal);
        c.target_normal_velocity = if vn < -RESTITUTION_THRESHOLD {
            -c.material.restitution * vn
        } else {
            0.0
        };
    }
}

/// Fixed number of Gauss-Seidel passes over every contact.
pub(crate) fn solve(contacts: &mut [Contact], bodies: &mut Arena<RigidBody>, iterations: u32) {
    for _ in 0..iterations {
        for c in contacts.iter_mut() {
            solve_contact(c, bodies);
        }
    }
}

fn solve_contact(c: &mut Contact, bodies: &mut Arena<RigidBody>) {
    let Some((a, mut b)) = bodies_for(bodies, c.a, c.b) else {
        return;
    };

    // Normal: accumulated impulse stays non-negative.
    let vn = relative_velocity(a, b.as_deref(), c.point).dot(c.normal);
    let lambda = (c.target_normal_velocity - vn) * c.normal_mass;
    let accumulated = (c.normal_impulse + lambda).max(0.0);
    let applied = accumulated - c.normal_impulse;
    c.normal_impulse = accumulated;
    let impulse = c.normal * applied;
    a.apply_impulse_at(impulse, c.point);
    if let Some(b) = b.as_deref_mut() {
        b.apply_impulse_at(-impulse, c.point);
    }

    // Friction: Coulomb cone approximated per tangent axis.
    let limit = c.material.friction * c.normal_impulse;
    for axis in 0..2 {
        let tangent = c.tangents[axis];
        let vt = relative_velocity(a, b.as_deref(), c.point).dot(tangent);
        let lambda = -vt * c.tangent_mass[axis];
        let accumulated = (c.tangent_impulse[axis] + lambda).clamp(-limit, limit);
        let applied = accumulated - c.tangent_impulse[axis];
        c.tangent_impulse[axis] = accumulated;
        let impulse = tangent * applied;
        a.apply_impulse_at(impulse, c.point);
        if let Some(b) = b.as_deref_mut() {
            b.apply_impulse_at(-impulse, c.point);
        }
    }
}

/// Push overlapping bodies apart in proportion to their inverse masses.
pub(crate) fn correct_positions(contacts: &[Contact], bodies: &mut Arena<RigidBody>) {
    for c in contacts {
        let excess = c.depth - PENETRATION_SLOP;
        if excess <= 0.0 {
            continue;
        }
        let Some((a, b)) = bodies_for(bodies, c.a, c.b) else {
            continue;
        };
        let total_inv = a.inv_mass() + b.as_ref().map_or(0.0, |b| b.inv_mass());
        if total_inv <= 0.0 {
            continue;
        }
        let correction = c.normal * (excess * CORRECTION_PERCENT / total_inv);
        a.position += correction * a.inv_mass();
        if let Some(b) = b {
            b.position -= correction * b.inv_mass();
        }
    }
}
