use crate::{
    foundation::core::{Mat4, Quat, Vec3},
    foundation::error::{RibError, RibResult},
    scene::model::{AnimTransform, ParticleDef, PointKey, TransformDef},
};

/// Interpolation contract for sampled animation values.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f32 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        (*a as f64 + ((*b as f64 - *a as f64) * t)) as f32
    }
}

impl Lerp for [f32; 3] {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        [
            <f32 as Lerp>::lerp(&a[0], &b[0], t),
            <f32 as Lerp>::lerp(&a[1], &b[1], t),
            <f32 as Lerp>::lerp(&a[2], &b[2], t),
        ]
    }
}

impl Lerp for Vec3 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a.lerp(*b, t as f32)
    }
}

impl<T: Lerp + Copy> Lerp for Option<T> {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Some(a), Some(b)) => Some(T::lerp(a, b, t)),
            (Some(v), None) | (None, Some(v)) => Some(*v),
            (None, None) => None,
        }
    }
}

/// Decomposed rigid transform used for motion sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Translation.
    pub translation: Vec3,
    /// Rotation.
    pub rotation: Quat,
    /// Non-uniform scale.
    pub scale: Vec3,
}

impl Pose {
    /// Convert a host TRS definition (XYZ euler, radians).
    pub fn from_def(def: &TransformDef) -> Self {
        let [rx, ry, rz] = def.rotation;
        Self {
            translation: Vec3::from_array(def.location),
            rotation: Quat::from_euler(glam::EulerRot::ZYX, rz, ry, rx),
            scale: Vec3::from_array(def.scale),
        }
    }

    /// Object-to-world matrix.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Lerp for Pose {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            translation: <Vec3 as Lerp>::lerp(&a.translation, &b.translation, t),
            rotation: a.rotation.slerp(b.rotation, t as f32),
            scale: <Vec3 as Lerp>::lerp(&a.scale, &b.scale, t),
        }
    }
}

/// Locate the keys bracketing `time` in a frame-sorted key list.
///
/// Returns `(lower, upper, t)`; times outside the keyed range hold the end key (`lower == upper`).
/// Returns `None` for an empty list.
pub fn bracket<K>(keys: &[K], time: f64, frame_of: impl Fn(&K) -> f64) -> Option<(usize, usize, f64)> {
    let last = keys.len().checked_sub(1)?;
    if time <= frame_of(&keys[0]) {
        return Some((0, 0, 0.0));
    }
    if time >= frame_of(&keys[last]) {
        return Some((last, last, 0.0));
    }

    let idx = keys.partition_point(|k| frame_of(k) <= time);
    let (a, b) = (idx - 1, idx);
    let fa = frame_of(&keys[a]);
    let fb = frame_of(&keys[b]);
    let span = fb - fa;
    let t = if span <= 0.0 { 0.0 } else { (time - fa) / span };
    Some((a, b, t))
}

impl AnimTransform {
    /// Sample the transform at a (possibly fractional) host frame.
    pub fn sample(&self, time: f64) -> Pose {
        match self {
            Self::Static(def) => Pose::from_def(def),
            Self::Keyed { keys } => match bracket(keys, time, |k| k.frame) {
                None => Pose::from_def(&TransformDef::default()),
                Some((a, b, t)) => {
                    let pa = Pose::from_def(&keys[a].transform);
                    if a == b {
                        return pa;
                    }
                    let pb = Pose::from_def(&keys[b].transform);
                    Pose::lerp(&pa, &pb, t)
                }
            },
        }
    }

    /// Return `true` when the transform can change over time.
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Keyed { keys } if keys.len() > 1)
    }
}

/// Sample deformed point positions at `time`.
///
/// Falls back to `base` when there are no deformation keys. Keys whose point count differs from
/// `base` are a topology error.
pub fn sample_points(
    entity: &str,
    base: &[[f32; 3]],
    keys: &[PointKey],
    time: f64,
) -> RibResult<Vec<[f32; 3]>> {
    let Some((a, b, t)) = bracket(keys, time, |k| k.frame) else {
        return Ok(base.to_vec());
    };
    for key in [&keys[a], &keys[b]] {
        if key.points.len() != base.len() {
            return Err(RibError::MotionTopology {
                entity: entity.to_owned(),
                expected: base.len(),
                found: key.points.len(),
            });
        }
    }
    if a == b {
        return Ok(keys[a].points.clone());
    }
    Ok(keys[a]
        .points
        .iter()
        .zip(&keys[b].points)
        .map(|(pa, pb)| <[f32; 3] as Lerp>::lerp(pa, pb, t))
        .collect())
}

impl Lerp for ParticleDef {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            location: <[f32; 3] as Lerp>::lerp(&a.location, &b.location, t),
            size: <f32 as Lerp>::lerp(&a.size, &b.size, t),
            velocity: Lerp::lerp(&a.velocity, &b.velocity, t),
            age: Lerp::lerp(&a.age, &b.age, t),
            lifetime: Lerp::lerp(&a.lifetime, &b.lifetime, t),
        }
    }
}

/// Sample particle states at `time`.
///
/// Bracketing keys with equal particle counts are interpolated per particle; otherwise the nearer
/// key is held, and any resulting count change across motion samples is reported by the caller.
pub fn sample_particles(keys: &[crate::scene::model::ParticleKey], time: f64) -> Vec<ParticleDef> {
    let Some((a, b, t)) = bracket(keys, time, |k| k.frame) else {
        return Vec::new();
    };
    let (ka, kb) = (&keys[a], &keys[b]);
    if a == b {
        return ka.particles.clone();
    }
    if ka.particles.len() != kb.particles.len() {
        return if t < 0.5 {
            ka.particles.clone()
        } else {
            kb.particles.clone()
        };
    }
    ka.particles
        .iter()
        .zip(&kb.particles)
        .map(|(pa, pb)| ParticleDef::lerp(pa, pb, t))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/scene/anim.rs"]
mod tests;
