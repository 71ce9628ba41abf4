//! Reference content: a small champion roster with real numbers.
//!
//! This is the content the integration tests and demos run on. It exercises
//! every definition feature the simulation dispatches on: skillshot
//! projectiles, self-cast shields, area casts with CC, zone grounding, DoT
//! ticks, and stacking buffs.

use riftline_world::champion::StatKind;
use riftline_world::ids::{
    AbilityId, AnimationId, ChampionId, EffectId, ItemId, PassiveId, SoundId, VfxId,
};
use riftline_world::math::Vec2;
use riftline_world::records::{DamageKind, DamageTemplate};
use riftline_world::shape::Collider;

use crate::ability::{AbilityDef, AbilityRank, AbilityShape, ProjectileSpec, TargetType, ZoneSpec};
use crate::animation::{AnimationDef, Keyframe, KeyframeTrigger};
use crate::champion::{ChampionDef, GrowthTable};
use crate::effect::{EffectCategory, EffectDef, StackPolicy};
use crate::item::ItemDef;
use crate::map::{BushGroupDef, BushSpread, Lane, MapBounds, MapGeometry};
use crate::Catalog;

// Champion roster.
/// Melee bruiser with a stun ultimate.
pub const WARDEN: ChampionId = ChampionId(1);
/// Ranged caster with a burn zone.
pub const PYRE: ChampionId = ChampionId(2);

// Abilities.
/// Skillshot projectile.
pub const PIERCING_BOLT: AbilityId = AbilityId(10);
/// Instant self shield.
pub const BULWARK: AbilityId = AbilityId(11);
/// Point-blank slow nova.
pub const FROST_NOVA: AbilityId = AbilityId(12);
/// Single-target stun nuke.
pub const SUNDER: AbilityId = AbilityId(13);
/// Ground-targeted burn zone.
pub const SCORCHED_GROUND: AbilityId = AbilityId(14);

// Effects.
/// Hard CC stun.
pub const STUN: EffectId = EffectId(1);
/// Move-speed slow.
pub const CHILL: EffectId = EffectId(2);
/// True-damage burn.
pub const IGNITE: EffectId = EffectId(3);
/// Flat shield.
pub const BARRIER: EffectId = EffectId(4);
/// Stacking armor buff.
pub const RESOLVE: EffectId = EffectId(5);

// Animations.
/// Shared basic-attack swing.
pub const ANIM_ATTACK: AnimationId = AnimationId(1);
/// Bolt cast.
pub const ANIM_BOLT: AnimationId = AnimationId(2);
/// Nova cast.
pub const ANIM_NOVA: AnimationId = AnimationId(3);
/// Sunder cast.
pub const ANIM_SUNDER: AnimationId = AnimationId(4);
/// Instant-cast flourish (cosmetic keyframes only).
pub const ANIM_FLOURISH: AnimationId = AnimationId(5);
/// Scorched-ground cast.
pub const ANIM_SCORCH: AnimationId = AnimationId(6);

// Items.
/// +attack damage.
pub const LONGSWORD: ItemId = ItemId(1);
/// +armor.
pub const CHAIN_VEST: ItemId = ItemId(2);
/// +ability power.
pub const AMP_TOME: ItemId = ItemId(3);

fn uniform_ranks(
    count: u8,
    cost: f64,
    cooldown: f64,
    base_damage: Option<(f64, f64, DamageKind)>,
) -> Vec<AbilityRank> {
    (0..count)
        .map(|r| AbilityRank {
            cost: cost + 5.0 * r as f64,
            cooldown: (cooldown - 0.5 * r as f64).max(1.0),
            damage: base_damage.map(|(base, per_rank, kind)| DamageTemplate {
                amount: base + per_rank * r as f64,
                kind,
            }),
        })
        .collect()
}

/// Build the reference catalog.
pub fn demo_catalog() -> Catalog {
    let map = MapGeometry {
        bounds: MapBounds {
            min: Vec2::new(-4000.0, -4000.0),
            max: Vec2::new(4000.0, 4000.0),
        },
        lanes: vec![Lane {
            waypoints: vec![
                Vec2::new(-3500.0, -3500.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(3500.0, 3500.0),
            ],
        }],
        bush_groups: vec![
            BushGroupDef {
                center: Vec2::new(500.0, 0.0),
                spread: BushSpread::Horizontal,
                count: 1,
                padding: 0.0,
            },
            BushGroupDef {
                center: Vec2::new(-1200.0, 800.0),
                spread: BushSpread::Cluster,
                count: 3,
                padding: 30.0,
            },
        ],
    };
    let mut catalog = Catalog::new(map);

    // -- animations ---------------------------------------------------------

    catalog.insert_animation(AnimationDef {
        id: ANIM_ATTACK,
        total_frames: 6,
        base_frame_duration: 0.1,
        looped: false,
        keyframes: vec![Keyframe {
            frame: 3,
            trigger: KeyframeTrigger::Damage,
        }],
    });
    catalog.insert_animation(AnimationDef {
        id: ANIM_BOLT,
        total_frames: 6,
        base_frame_duration: 0.1,
        looped: false,
        keyframes: vec![Keyframe {
            frame: 3,
            trigger: KeyframeTrigger::Projectile,
        }],
    });
    catalog.insert_animation(AnimationDef {
        id: ANIM_NOVA,
        total_frames: 8,
        base_frame_duration: 0.1,
        looped: false,
        keyframes: vec![
            Keyframe {
                frame: 4,
                trigger: KeyframeTrigger::Damage,
            },
            Keyframe {
                frame: 4,
                trigger: KeyframeTrigger::Effect(CHILL),
            },
        ],
    });
    catalog.insert_animation(AnimationDef {
        id: ANIM_SUNDER,
        total_frames: 6,
        base_frame_duration: 0.1,
        looped: false,
        keyframes: vec![
            Keyframe {
                frame: 0,
                trigger: KeyframeTrigger::Sound(SoundId(1)),
            },
            Keyframe {
                frame: 3,
                trigger: KeyframeTrigger::Damage,
            },
            Keyframe {
                frame: 3,
                trigger: KeyframeTrigger::Effect(STUN),
            },
            Keyframe {
                frame: 4,
                trigger: KeyframeTrigger::Vfx(VfxId(1)),
            },
        ],
    });
    catalog.insert_animation(AnimationDef {
        id: ANIM_FLOURISH,
        total_frames: 4,
        base_frame_duration: 0.1,
        looped: false,
        keyframes: vec![Keyframe {
            frame: 0,
            trigger: KeyframeTrigger::Vfx(VfxId(2)),
        }],
    });
    catalog.insert_animation(AnimationDef {
        id: ANIM_SCORCH,
        total_frames: 8,
        base_frame_duration: 0.1,
        looped: false,
        keyframes: vec![Keyframe {
            frame: 4,
            trigger: KeyframeTrigger::Effect(IGNITE),
        }],
    });

    // -- effects ------------------------------------------------------------

    catalog.insert_effect(
        EffectDef::new(STUN, "Sundered", EffectCategory::Cc, 1.5)
            .with_cc(crate::effect::CcKind::Stun),
    );
    catalog.insert_effect(
        EffectDef::new(CHILL, "Chilled", EffectCategory::Debuff, 2.5).with_stat_mod(
            StatKind::MoveSpeed,
            0.0,
            -0.30,
        ),
    );
    catalog.insert_effect(
        EffectDef::new(IGNITE, "Ignited", EffectCategory::Dot, 4.0)
            .with_tick_interval(1.0)
            .with_periodic_damage(DamageTemplate {
                amount: 10.0,
                kind: DamageKind::True,
            })
            .uncleansable(),
    );
    catalog.insert_effect(
        EffectDef::new(BARRIER, "Bulwark", EffectCategory::Shield, 3.0).with_shield(80.0),
    );
    catalog.insert_effect(
        EffectDef::new(RESOLVE, "Resolve", EffectCategory::Buff, 5.0)
            .with_stat_mod(StatKind::Armor, 20.0, 0.0)
            .with_stacking(StackPolicy::Stack(3)),
    );

    // -- abilities ----------------------------------------------------------

    let mut bolt = AbilityDef::new(
        PIERCING_BOLT,
        "Piercing Bolt",
        TargetType::Skillshot,
        900.0,
        ANIM_BOLT,
    );
    bolt.ranks = uniform_ranks(5, 40.0, 8.0, Some((60.0, 25.0, DamageKind::Physical)));
    bolt.projectile = Some(ProjectileSpec {
        speed: 1400.0,
        ttl: 1.2,
        radius: 30.0,
        piercing: false,
    });
    catalog.insert_ability(bolt);

    let mut bulwark = AbilityDef::new(BULWARK, "Bulwark", TargetType::SelfCast, 0.0, ANIM_FLOURISH);
    bulwark.ranks = uniform_ranks(5, 60.0, 14.0, None);
    bulwark.applies_effects = vec![BARRIER];
    catalog.insert_ability(bulwark);

    let mut nova = AbilityDef::new(FROST_NOVA, "Frost Nova", TargetType::NoTarget, 0.0, ANIM_NOVA);
    nova.ranks = uniform_ranks(5, 70.0, 10.0, Some((70.0, 30.0, DamageKind::Magical)));
    nova.shape = AbilityShape::Circle { radius: 350.0 };
    catalog.insert_ability(nova);

    let mut sunder = AbilityDef::new(SUNDER, "Sunder", TargetType::TargetEnemy, 500.0, ANIM_SUNDER);
    sunder.max_rank = 3;
    sunder.ranks = uniform_ranks(3, 100.0, 80.0, Some((150.0, 100.0, DamageKind::Physical)));
    catalog.insert_ability(sunder);

    let mut scorch = AbilityDef::new(
        SCORCHED_GROUND,
        "Scorched Ground",
        TargetType::GroundTarget,
        800.0,
        ANIM_SCORCH,
    );
    scorch.ranks = uniform_ranks(5, 80.0, 12.0, None);
    scorch.shape = AbilityShape::Circle { radius: 250.0 };
    scorch.zone = Some(ZoneSpec {
        radius: 250.0,
        duration: 4.0,
        tick_interval: Some(1.0),
        damage: Some(DamageTemplate {
            amount: 25.0,
            kind: DamageKind::Magical,
        }),
    });
    catalog.insert_ability(scorch);

    // -- champions ----------------------------------------------------------

    catalog.insert_champion(ChampionDef {
        id: WARDEN,
        name: "Warden".to_owned(),
        stats: GrowthTable::default()
            .with(StatKind::MaxHealth, 640.0, 96.0)
            .with(StatKind::MaxResource, 280.0, 40.0)
            .with(StatKind::AttackDamage, 62.0, 3.2)
            .with(StatKind::Armor, 34.0, 4.2)
            .with(StatKind::MagicResist, 32.0, 1.9)
            .with(StatKind::AttackSpeed, 0.68, 0.02)
            .with(StatKind::MoveSpeed, 340.0, 0.0)
            .with(StatKind::HealthRegen, 1.6, 0.12)
            .with(StatKind::ResourceRegen, 1.4, 0.1)
            .with(StatKind::AttackRange, 150.0, 0.0),
        abilities: [PIERCING_BOLT, BULWARK, FROST_NOVA, SUNDER],
        passive: PassiveId(1),
        collider: Collider::circle(25.0),
        basic_attack_animation: ANIM_ATTACK,
    });

    catalog.insert_champion(ChampionDef {
        id: PYRE,
        name: "Pyre".to_owned(),
        stats: GrowthTable::default()
            .with(StatKind::MaxHealth, 570.0, 84.0)
            .with(StatKind::MaxResource, 340.0, 46.0)
            .with(StatKind::AttackDamage, 55.0, 2.8)
            .with(StatKind::AbilityPower, 0.0, 0.0)
            .with(StatKind::Armor, 26.0, 3.4)
            .with(StatKind::MagicResist, 30.0, 1.6)
            .with(StatKind::AttackSpeed, 0.66, 0.025)
            .with(StatKind::MoveSpeed, 330.0, 0.0)
            .with(StatKind::HealthRegen, 1.2, 0.1)
            .with(StatKind::ResourceRegen, 1.8, 0.12)
            .with(StatKind::AttackRange, 550.0, 0.0),
        abilities: [PIERCING_BOLT, SCORCHED_GROUND, FROST_NOVA, SUNDER],
        passive: PassiveId(2),
        collider: Collider::circle(22.0),
        basic_attack_animation: ANIM_ATTACK,
    });

    // -- items --------------------------------------------------------------

    catalog.insert_item(ItemDef::new(LONGSWORD, "Longsword", 350).with_modifier(
        crate::effect::StatModTemplate {
            stat: StatKind::AttackDamage,
            flat: 10.0,
            percent: 0.0,
        },
    ));
    catalog.insert_item(ItemDef::new(CHAIN_VEST, "Chain Vest", 800).with_modifier(
        crate::effect::StatModTemplate {
            stat: StatKind::Armor,
            flat: 40.0,
            percent: 0.0,
        },
    ));
    catalog.insert_item(ItemDef::new(AMP_TOME, "Amplifying Tome", 435).with_modifier(
        crate::effect::StatModTemplate {
            stat: StatKind::AbilityPower,
            flat: 20.0,
            percent: 0.0,
        },
    ));

    catalog
}
