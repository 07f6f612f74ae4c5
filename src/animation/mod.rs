//! Keyframe animation clips imported from the asset.
//!
//! A clip is a set of channels. Each channel drives one path (translation,
//! rotation or scale) of one node, addressed by the node's source index, and is
//! sampled with the interpolation mode the asset declares.

pub mod mixer;

use cgmath::{InnerSpace, Quaternion, Vector3, VectorSpace};

pub use mixer::AnimationMixer;

#[derive(Clone, Debug, PartialEq)]
pub enum Keyframes {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
    /// Morph target weights; imported but not played.
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
    /// Values are stored as `(in-tangent, value, out-tangent)` triples.
    CubicSpline,
}

/// One sampled value, ready to be written into a node's local transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    Translation(Vector3<f32>),
    Rotation(Quaternion<f32>),
    Scale(Vector3<f32>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    /// Source index of the animated node.
    pub target: usize,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
    pub interpolation: Interpolation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: &str, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|channel| channel.timestamps.last().copied())
            .fold(0.0, f32::max);
        Self {
            name: name.to_string(),
            channels,
            duration,
        }
    }
}

/**
 * Position of `t` between keyframes: the index of the keyframe at or before `t`
 * and the normalised distance to the next one. Times outside the track clamp to
 * its ends.
 */
fn locate(timestamps: &[f32], t: f32) -> (usize, usize, f32, f32) {
    let last = timestamps.len() - 1;
    if t <= timestamps[0] {
        return (0, 0, 0.0, 0.0);
    }
    if t >= timestamps[last] {
        return (last, last, 0.0, 0.0);
    }
    let next = timestamps.partition_point(|&ts| ts <= t);
    let prev = next - 1;
    let dt = timestamps[next] - timestamps[prev];
    let s = if dt > 0.0 {
        (t - timestamps[prev]) / dt
    } else {
        0.0
    };
    (prev, next, s, dt)
}

fn hermite<T>(v0: T, b0: T, v1: T, a1: T, s: f32, dt: f32) -> T
where
    T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
{
    let s2 = s * s;
    let s3 = s2 * s;
    v0 * (2.0 * s3 - 3.0 * s2 + 1.0)
        + b0 * (dt * (s3 - 2.0 * s2 + s))
        + v1 * (-2.0 * s3 + 3.0 * s2)
        + a1 * (dt * (s3 - s2))
}

fn sample_vector(
    values: &[Vector3<f32>],
    interpolation: Interpolation,
    (prev, next, s, dt): (usize, usize, f32, f32),
) -> Option<Vector3<f32>> {
    match interpolation {
        Interpolation::Step => values.get(prev).copied(),
        Interpolation::Linear => {
            let a = *values.get(prev)?;
            let b = *values.get(next)?;
            Some(a.lerp(b, s))
        }
        Interpolation::CubicSpline => {
            let v0 = *values.get(prev * 3 + 1)?;
            if prev == next {
                return Some(v0);
            }
            let b0 = *values.get(prev * 3 + 2)?;
            let a1 = *values.get(next * 3)?;
            let v1 = *values.get(next * 3 + 1)?;
            Some(hermite(v0, b0, v1, a1, s, dt))
        }
    }
}

fn sample_rotation(
    values: &[Quaternion<f32>],
    interpolation: Interpolation,
    (prev, next, s, dt): (usize, usize, f32, f32),
) -> Option<Quaternion<f32>> {
    match interpolation {
        Interpolation::Step => values.get(prev).copied(),
        Interpolation::Linear => {
            let a = *values.get(prev)?;
            let b = *values.get(next)?;
            if prev == next {
                return Some(a);
            }
            // shortest arc
            let b = if a.dot(b) < 0.0 { -b } else { b };
            Some(a.slerp(b, s).normalize())
        }
        Interpolation::CubicSpline => {
            let v0 = *values.get(prev * 3 + 1)?;
            if prev == next {
                return Some(v0.normalize());
            }
            let b0 = *values.get(prev * 3 + 2)?;
            let a1 = *values.get(next * 3)?;
            let v1 = *values.get(next * 3 + 1)?;
            Some(hermite(v0, b0, v1, a1, s, dt).normalize())
        }
    }
}

impl Channel {
    /// Value of this channel at clip time `t` (seconds), or `None` for empty
    /// or unsupported tracks.
    pub fn sample(&self, t: f32) -> Option<Sample> {
        if self.timestamps.is_empty() {
            return None;
        }
        let at = locate(&self.timestamps, t);
        match &self.keyframes {
            Keyframes::Translation(values) => {
                sample_vector(values, self.interpolation, at).map(Sample::Translation)
            }
            Keyframes::Scale(values) => {
                sample_vector(values, self.interpolation, at).map(Sample::Scale)
            }
            Keyframes::Rotation(values) => {
                sample_rotation(values, self.interpolation, at).map(Sample::Rotation)
            }
            Keyframes::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Rotation3};

    use super::*;

    fn translation(interpolation: Interpolation, values: Vec<Vector3<f32>>) -> Channel {
        Channel {
            target: 0,
            keyframes: Keyframes::Translation(values),
            timestamps: vec![0.0, 1.0, 2.0],
            interpolation,
        }
    }

    #[test]
    fn duration_is_the_latest_keyframe() {
        let mut late = translation(Interpolation::Linear, vec![Vector3::new(0.0, 0.0, 0.0); 3]);
        late.timestamps = vec![0.0, 3.5];
        let clip = AnimationClip::new(
            "clip",
            vec![
                translation(Interpolation::Linear, vec![Vector3::new(0.0, 0.0, 0.0); 3]),
                late,
            ],
        );
        assert_eq!(clip.duration, 3.5);
    }

    #[test]
    fn linear_and_step_sampling() {
        let values = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 4.0, 0.0),
        ];
        let linear = translation(Interpolation::Linear, values.clone());
        assert_eq!(
            linear.sample(0.5),
            Some(Sample::Translation(Vector3::new(1.0, 0.0, 0.0)))
        );
        assert_eq!(
            linear.sample(1.5),
            Some(Sample::Translation(Vector3::new(2.0, 2.0, 0.0)))
        );
        // clamps outside the track
        assert_eq!(linear.sample(-1.0), Some(Sample::Translation(values[0])));
        assert_eq!(linear.sample(9.0), Some(Sample::Translation(values[2])));

        let step = translation(Interpolation::Step, values.clone());
        assert_eq!(step.sample(1.9), Some(Sample::Translation(values[1])));
    }

    #[test]
    fn cubic_spline_hits_keyframe_values() {
        let zero = Vector3::new(0.0, 0.0, 0.0);
        let values = vec![
            zero,
            Vector3::new(0.0, 0.0, 0.0),
            zero,
            zero,
            Vector3::new(1.0, 0.0, 0.0),
            zero,
            zero,
            Vector3::new(1.0, 1.0, 0.0),
            zero,
        ];
        let channel = translation(Interpolation::CubicSpline, values);
        assert_eq!(
            channel.sample(1.0),
            Some(Sample::Translation(Vector3::new(1.0, 0.0, 0.0)))
        );
        // zero tangents give a smoothstep between keys
        match channel.sample(0.5) {
            Some(Sample::Translation(v)) => assert!((v.x - 0.5).abs() < 1e-6),
            other => panic!("unexpected sample {other:?}"),
        }
    }

    #[test]
    fn rotation_slerps_halfway() {
        let channel = Channel {
            target: 0,
            keyframes: Keyframes::Rotation(vec![
                Quaternion::from_angle_y(Deg(0.0)),
                Quaternion::from_angle_y(Deg(90.0)),
            ]),
            timestamps: vec![0.0, 1.0],
            interpolation: Interpolation::Linear,
        };
        let Some(Sample::Rotation(q)) = channel.sample(0.5) else {
            panic!("expected a rotation");
        };
        let expected = Quaternion::from_angle_y(Deg(45.0));
        assert!((q.dot(expected).abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_tracks_sample_nothing() {
        let channel = Channel {
            target: 0,
            keyframes: Keyframes::Other,
            timestamps: vec![0.0],
            interpolation: Interpolation::Linear,
        };
        assert_eq!(channel.sample(0.0), None);
    }
}
