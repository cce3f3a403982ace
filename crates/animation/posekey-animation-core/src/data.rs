//! Keyframe data model.
//!
//! A [`Track`] is an ordered list of [`Key`]s, unique by frame. Vector tracks are
//! three independent scalar tracks so axes can be keyed at different frames.

use serde::{Deserialize, Serialize};

use crate::math::{Quat, Vec3};

/// Per-key easing. The earlier key of a segment decides how that segment is timed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

/// One keyed sample on a track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Key<T> {
    pub frame: i32,
    pub value: T,
    #[serde(default)]
    pub ease: Ease,
}

impl<T> Key<T> {
    pub fn new(frame: i32, value: T) -> Self {
        Self {
            frame,
            value,
            ease: Ease::Linear,
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

/// Sparse, frame-sorted key list. Serializes as a plain JSON array of keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Track<T> {
    keys: Vec<Key<T>>,
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T> Track<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a track from arbitrary keys. Keys are sorted by frame; when two keys
    /// share a frame the later one in the input wins.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key<T>>,
    {
        let mut track = Self::new();
        for k in keys {
            track.upsert(k.frame, k.value, Some(k.ease));
        }
        track
    }

    /// Insert a key, or overwrite the key already at `frame`. On overwrite the
    /// ease is only replaced when one is given.
    pub fn upsert(&mut self, frame: i32, value: T, ease: Option<Ease>) {
        match self.keys.binary_search_by_key(&frame, |k| k.frame) {
            Ok(idx) => {
                let key = &mut self.keys[idx];
                key.value = value;
                if let Some(e) = ease {
                    key.ease = e;
                }
            }
            Err(idx) => self.keys.insert(
                idx,
                Key {
                    frame,
                    value,
                    ease: ease.unwrap_or_default(),
                },
            ),
        }
    }

    #[inline]
    pub fn keys(&self) -> &[Key<T>] {
        &self.keys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key_at(&self, frame: i32) -> Option<&Key<T>> {
        self.keys
            .binary_search_by_key(&frame, |k| k.frame)
            .ok()
            .map(|idx| &self.keys[idx])
    }

    pub fn key_frames(&self) -> impl Iterator<Item = i32> + '_ {
        self.keys.iter().map(|k| k.frame)
    }

    /// First and last keyed frame.
    pub fn frame_range(&self) -> Option<(i32, i32)> {
        match (self.keys.first(), self.keys.last()) {
            (Some(a), Some(b)) => Some((a.frame, b.frame)),
            _ => None,
        }
    }
}

pub type ScalarTrack = Track<f32>;
pub type OrientationTrack = Track<Quat>;
/// Always sampled stepwise (see `sampling::sample_bool`).
pub type BoolTrack = Track<bool>;

/// Three independent per-axis scalar tracks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorTrack {
    #[serde(default)]
    pub x: ScalarTrack,
    #[serde(default)]
    pub y: ScalarTrack,
    #[serde(default)]
    pub z: ScalarTrack,
}

impl VectorTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert all three axes at `frame`.
    pub fn upsert(&mut self, frame: i32, value: Vec3, ease: Option<Ease>) {
        self.x.upsert(frame, value[0], ease);
        self.y.upsert(frame, value[1], ease);
        self.z.upsert(frame, value[2], ease);
    }

    /// Upsert a single axis (0 = x, 1 = y, 2 = z). Other axis indices are ignored.
    pub fn upsert_axis(&mut self, axis: usize, frame: i32, value: f32, ease: Option<Ease>) {
        if let Some(track) = self.axis_mut(axis) {
            track.upsert(frame, value, ease);
        }
    }

    pub fn axis(&self, axis: usize) -> Option<&ScalarTrack> {
        match axis {
            0 => Some(&self.x),
            1 => Some(&self.y),
            2 => Some(&self.z),
            _ => None,
        }
    }

    fn axis_mut(&mut self, axis: usize) -> Option<&mut ScalarTrack> {
        match axis {
            0 => Some(&mut self.x),
            1 => Some(&mut self.y),
            2 => Some(&mut self.z),
            _ => None,
        }
    }

    /// True when no axis carries a key.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty() && self.z.is_empty()
    }

    /// Union of keyed frames across the three axes, ascending.
    pub fn key_frames(&self) -> Vec<i32> {
        let mut frames: Vec<i32> = self
            .x
            .key_frames()
            .chain(self.y.key_frames())
            .chain(self.z.key_frames())
            .collect();
        frames.sort_unstable();
        frames.dedup();
        frames
    }
}
