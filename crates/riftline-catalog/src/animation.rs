//! Animation descriptors and playback timing.
//!
//! An animation is read-only data: a frame count, a base frame duration, and
//! an ordered keyframe list. Playback scales frame duration by a speed
//! multiplier; the time of frame `k` is `k * base_frame_duration / speed`.
//! The scheduler converts keyframe times into absolute trigger times when an
//! ability is cast.

use serde::{Deserialize, Serialize};

use riftline_world::ids::{AnimationId, EffectId, SoundId, VfxId};

// ---------------------------------------------------------------------------
// KeyframeTrigger
// ---------------------------------------------------------------------------

/// The side effect attached to a keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyframeTrigger {
    /// Deal the casting ability's damage to the captured targets.
    Damage,
    /// Spawn the casting ability's projectile from the caster's position at
    /// fire time.
    Projectile,
    /// Apply (or ground, for zone abilities) the given effect.
    Effect(EffectId),
    /// Play a sound cue. No simulation consequence; forwarded to clients.
    Sound(SoundId),
    /// Play a visual cue. No simulation consequence; forwarded to clients.
    Vfx(VfxId),
}

impl KeyframeTrigger {
    /// Damage and projectile keyframes are the ones a hard CC interrupt
    /// cancels; cosmetic triggers do not gate interruption.
    #[inline]
    pub fn is_combat_effect(self) -> bool {
        matches!(
            self,
            KeyframeTrigger::Damage | KeyframeTrigger::Projectile | KeyframeTrigger::Effect(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Keyframe
// ---------------------------------------------------------------------------

/// One `(frame index, trigger)` pair on an animation's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Frame index in `[0, total_frames)`.
    pub frame: u32,
    /// What fires when the playhead reaches the frame.
    pub trigger: KeyframeTrigger,
}

// ---------------------------------------------------------------------------
// AnimationDef
// ---------------------------------------------------------------------------

/// A read-only animation descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDef {
    /// Catalog id.
    pub id: AnimationId,
    /// Number of frames on the timeline.
    pub total_frames: u32,
    /// Seconds per frame at speed 1.0.
    pub base_frame_duration: f64,
    /// Whether playback loops (idle/walk cycles; cast animations do not).
    pub looped: bool,
    /// Keyframes in ascending frame order.
    pub keyframes: Vec<Keyframe>,
}

impl AnimationDef {
    /// Seconds from playback start until `frame`, at the given speed
    /// multiplier. Speed must be positive.
    #[inline]
    pub fn frame_time(&self, frame: u32, speed: f64) -> f64 {
        frame as f64 * self.base_frame_duration / speed
    }

    /// Total playback duration at the given speed multiplier.
    #[inline]
    pub fn duration(&self, speed: f64) -> f64 {
        self.frame_time(self.total_frames, speed)
    }

    /// Keyframes paired with their playback times at the given speed, in
    /// timeline order.
    pub fn timed_keyframes(&self, speed: f64) -> impl Iterator<Item = (f64, Keyframe)> + '_ {
        self.keyframes
            .iter()
            .map(move |kf| (self.frame_time(kf.frame, speed), *kf))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
