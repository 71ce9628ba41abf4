//! Content identifiers.
//!
//! Catalog tables (champions, abilities, effects, animations, items) are
//! keyed by small opaque newtypes. They are part of the shared vocabulary:
//! entity records store them, the catalog resolves them, and the wire
//! protocol carries them verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! content_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

content_id!(
    /// Identifies a champion definition in the catalog.
    ChampionId
);
content_id!(
    /// Identifies an ability definition in the catalog.
    AbilityId
);
content_id!(
    /// Identifies an effect definition in the catalog.
    EffectId
);
content_id!(
    /// Identifies an animation descriptor in the catalog.
    AnimationId
);
content_id!(
    /// Identifies an item definition in the catalog.
    ItemId
);
content_id!(
    /// Identifies a champion passive in the catalog.
    PassiveId
);
content_id!(
    /// Identifies a sound cue referenced by animation keyframes.
    SoundId
);
content_id!(
    /// Identifies a visual effect cue referenced by animation keyframes.
    VfxId
);

/// Identifies a connected player within a session. Stable for the lifetime
/// of the connection slot, including across reconnects inside the grace
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}
