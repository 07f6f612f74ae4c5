use crate::{
    animation::{AnimationClip, Sample},
    data_structures::scene_graph::SceneGraph,
};

/// Playback controller for one clip, looping on repeat.
#[derive(Clone, Debug)]
pub struct AnimationMixer {
    clip: AnimationClip,
    time: f64,
}

impl AnimationMixer {
    pub fn new(clip: AnimationClip) -> Self {
        Self { clip, time: 0.0 }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Playback time wrapped into the clip, so negative times run backwards from the end.
    pub fn local_time(&self) -> f32 {
        let duration = self.clip.duration as f64;
        if duration <= 0.0 {
            return 0.0;
        }
        self.time.rem_euclid(duration) as f32
    }

    /// Writes the sampled pose into the local transforms of the targeted nodes.
    ///
    /// World transforms are left stale; refresh them once all mixers are applied.
    pub fn apply(&self, graph: &mut SceneGraph) {
        let t = self.local_time();
        for channel in self.clip.channels.iter() {
            let Some(sample) = channel.sample(t) else {
                continue;
            };
            let Some(node) = graph.find_by_source_mut(channel.target) else {
                log::warn!(
                    "Clip {} animates node {} which is not in the scene.",
                    self.clip.name,
                    channel.target
                );
                continue;
            };
            match sample {
                Sample::Translation(position) => node.local.position = position,
                Sample::Rotation(rotation) => node.local.rotation = rotation,
                Sample::Scale(scale) => node.local.scale = scale,
            }
        }
    }
}
