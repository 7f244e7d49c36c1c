use glam::Quat;
use playground_common::NodeId;
use serde::{Deserialize, Serialize};

use crate::node::Node;

/// Node property an animation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimatedProperty {
    RotationY,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationKey {
    pub frame: f32,
    pub value: f32,
}

/// Keyframed float animation, linearly interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub property: AnimatedProperty,
    pub frames_per_second: f32,
    pub keys: Vec<AnimationKey>,
}

impl Animation {
    /// Value at `frame`, clamped to the first and last keys.
    pub fn value_at(&self, frame: f32) -> Option<f32> {
        let first = self.keys.first()?;
        if frame <= first.frame {
            return Some(first.value);
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if frame <= b.frame {
                let span = b.frame - a.frame;
                if span <= 0.0 {
                    return Some(b.value);
                }
                let t = (frame - a.frame) / span;
                return Some(a.value + (b.value - a.value) * t);
            }
        }
        self.keys.last().map(|k| k.value)
    }
}

/// An animation playing on a node between two frames.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Playback {
    pub target: NodeId,
    pub animation: Animation,
    pub from: f32,
    pub to: f32,
    pub looping: bool,
    pub frame: f32,
}

impl Playback {
    /// Advance by `dt` seconds and write the value to `node`. Returns `false`
    /// once a non-looping playback has finished.
    pub fn advance(&mut self, node: &mut Node, dt: f32) -> bool {
        self.frame += dt * self.animation.frames_per_second;
        let length = self.to - self.from;
        let mut alive = true;
        if self.frame > self.to {
            if self.looping && length > 0.0 {
                self.frame = self.from + (self.frame - self.from) % length;
            } else {
                self.frame = self.to;
                alive = false;
            }
        }
        if let Some(value) = self.animation.value_at(self.frame) {
            match self.animation.property {
                AnimatedProperty::RotationY => {
                    node.transform.rotation = Quat::from_rotation_y(value);
                }
            }
        }
        alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use std::f32::consts::PI;

    fn spin() -> Animation {
        Animation {
            name: "spin".into(),
            property: AnimatedProperty::RotationY,
            frames_per_second: 30.0,
            keys: vec![
                AnimationKey { frame: 0.0, value: 0.0 },
                AnimationKey { frame: 50.0, value: PI },
                AnimationKey { frame: 100.0, value: 0.0 },
            ],
        }
    }

    #[test]
    fn interpolates_between_keys() {
        let anim = spin();
        assert_eq!(anim.value_at(0.0), Some(0.0));
        assert!((anim.value_at(25.0).unwrap() - PI / 2.0).abs() < 1e-5);
        assert!((anim.value_at(75.0).unwrap() - PI / 2.0).abs() < 1e-5);
        assert_eq!(anim.value_at(150.0), Some(0.0));
    }

    #[test]
    fn empty_animation_has_no_value() {
        let mut anim = spin();
        anim.keys.clear();
        assert_eq!(anim.value_at(10.0), None);
    }

    #[test]
    fn looping_playback_wraps() {
        let mut node = Node::new("box", NodeKind::Transform);
        let mut playback = Playback {
            target: NodeId::new(),
            animation: spin(),
            from: 0.0,
            to: 100.0,
            looping: true,
            frame: 0.0,
        };
        // 4 seconds at 30 fps = frame 120, wrapped to 20.
        assert!(playback.advance(&mut node, 4.0));
        assert!((playback.frame - 20.0).abs() < 1e-3);
    }

    #[test]
    fn one_shot_playback_finishes() {
        let mut node = Node::new("box", NodeKind::Transform);
        let mut playback = Playback {
            target: NodeId::new(),
            animation: spin(),
            from: 0.0,
            to: 100.0,
            looping: false,
            frame: 0.0,
        };
        assert!(!playback.advance(&mut node, 10.0));
        assert_eq!(playback.frame, 100.0);
    }
}
