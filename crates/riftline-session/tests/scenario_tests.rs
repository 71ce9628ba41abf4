//! Full-loop conformance scenarios: interruption, combat invariants,
//! post-collision separation.

use std::sync::Arc;

use riftline_catalog::config::SessionConfig;
use riftline_catalog::content::{demo_catalog, STUN, WARDEN};
use riftline_net::protocol::{ClientMessage, ClientPayload};
use riftline_session::prelude::*;
use riftline_sim::effect::apply_effect;
use riftline_world::champion::AbilitySlot;
use riftline_world::entity::EntityId;
use riftline_world::ids::PlayerId;
use riftline_world::math::Vec2;
use riftline_world::records::{EntityKind, Team};
use riftline_world::shape::signed_gap;

struct Rig {
    session: Session,
    inputs: InputSender,
    _outbound: OutboundReceiver,
    sequence: u32,
}

impl Rig {
    fn new(seed: u64) -> Self {
        // RUST_LOG=riftline_session=debug surfaces tick internals on failure.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
        let (input_tx, input_rx) = input_queue();
        let (outbound_tx, outbound_rx) = outbound_queue();
        let mut session = Session::new(SessionSetup {
            catalog: Arc::new(demo_catalog()),
            config: SessionConfig::default(),
            seed,
            inputs: input_rx,
            outbound: outbound_tx,
            sinks: Vec::new(),
            path_provider: None,
        })
        .unwrap();
        session.start();
        Self {
            session,
            inputs: input_tx,
            _outbound: outbound_rx,
            sequence: 0,
        }
    }

    fn send(&mut self, player: PlayerId, payload: ClientPayload) {
        self.sequence += 1;
        self.inputs
            .send(InputEnvelope {
                player,
                message: ClientMessage {
                    sequence: self.sequence,
                    client_time: 0.0,
                    payload,
                },
            })
            .unwrap();
    }

    /// Ticks until simulation time passes `t`.
    fn run_until(&mut self, t: f64) {
        while self.session.sim_time() < t {
            self.session.tick();
        }
    }
}

/// Place both champions near the map center so casts are in range from
/// tick one.
fn duel_setup(rig: &mut Rig) -> (EntityId, EntityId) {
    let caster = rig
        .session
        .add_player(PlayerId(1), Team::Blue, WARDEN)
        .unwrap();
    let victim = rig
        .session
        .add_player(PlayerId(2), Team::Red, WARDEN)
        .unwrap();
    rig.session.world_mut().get_mut(caster).unwrap().position = Vec2::ZERO;
    rig.session.world_mut().get_mut(victim).unwrap().position = Vec2::new(300.0, 0.0);
    // Learn the ultimate on the caster.
    let champ = rig
        .session
        .world_mut()
        .get_mut(caster)
        .unwrap()
        .champion
        .as_deref_mut()
        .unwrap();
    champ.level = 6;
    champ.slot_mut(AbilitySlot::R).rank = 1;
    (caster, victim)
}

#[test]
fn stun_before_the_damage_keyframe_wins() {
    let mut rig = Rig::new(11);
    let (caster, victim) = duel_setup(&mut rig);

    // Cast the ultimate: damage keyframe at 0.3s into the animation.
    rig.send(
        PlayerId(1),
        ClientPayload::Ability {
            slot: AbilitySlot::R,
            target_unit: Some(victim),
            target_point: None,
        },
    );
    rig.session.tick(); // cast commits

    // Stun the caster at ~0.1s, before the keyframe.
    rig.run_until(0.1);
    {
        let catalog = demo_catalog();
        let stun = catalog.effect(STUN).unwrap().clone();
        let record = rig.session.world_mut().get_mut(caster).unwrap();
        apply_effect(record, &stun, victim, 1);
    }

    rig.run_until(0.5);

    // No damage dealt, no stun applied to the victim, no projectile.
    let victim_record = rig.session.world().get(victim).unwrap();
    let damageable = victim_record.damageable.as_ref().unwrap();
    assert_eq!(damageable.health, damageable.max_health, "no damage landed");
    assert!(damageable.effects.is_empty(), "no effect landed");
    assert!(
        !rig.session
            .world()
            .iter()
            .any(|r| r.kind == EntityKind::Projectile),
        "no projectile spawned"
    );

    // The cast was committed: the 100 resource is spent (regen claws back
    // a couple of points over the half second) and the cooldown is running.
    let caster_state = rig
        .session
        .world()
        .get(caster)
        .unwrap()
        .champion
        .as_deref()
        .unwrap();
    assert!(caster_state.resource < 200.0);
    assert!(caster_state.slot(AbilitySlot::R).cooldown_remaining > 0.0);

    // And the caster is visibly stunned.
    let caster_effects = &rig
        .session
        .world()
        .get(caster)
        .unwrap()
        .damageable
        .as_ref()
        .unwrap()
        .effects;
    assert!(caster_effects.iter().any(|e| e.effect == STUN));
}

#[test]
fn health_stays_in_bounds_through_a_brawl() {
    let mut rig = Rig::new(23);
    let (caster, victim) = duel_setup(&mut rig);

    rig.send(PlayerId(1), ClientPayload::TargetUnit(victim));
    rig.send(PlayerId(2), ClientPayload::TargetUnit(caster));

    for _ in 0..500 {
        rig.session.tick();
        for record in rig.session.world().iter() {
            if let Some(d) = record.damageable.as_ref() {
                assert!(
                    d.health >= 0.0 && d.health <= d.max_health,
                    "health bounds violated on {:?}: {} / {}",
                    record.id,
                    d.health,
                    d.max_health
                );
            }
        }
    }
}

#[test]
fn collidable_pairs_end_the_tick_separated() {
    let mut rig = Rig::new(31);
    let (caster, victim) = duel_setup(&mut rig);

    // March them through each other.
    rig.send(PlayerId(1), ClientPayload::Move(Vec2::new(600.0, 0.0)));
    rig.send(PlayerId(2), ClientPayload::Move(Vec2::new(-600.0, 0.0)));

    const EPSILON: f64 = 1e-6;
    for _ in 0..300 {
        rig.session.tick();
        let a = rig.session.world().get(caster).unwrap();
        let b = rig.session.world().get(victim).unwrap();
        if !a.blocks_collision() || !b.blocks_collision() {
            continue;
        }
        let gap = signed_gap(a.position, &a.collider, b.position, &b.collider);
        assert!(
            gap >= -EPSILON,
            "pair left overlapping after resolution: gap {gap}"
        );
    }
}

#[test]
fn dead_entities_keep_their_id_until_end_of_tick() {
    let mut rig = Rig::new(47);
    let (_caster, victim) = duel_setup(&mut rig);

    // Kill the victim directly; the record survives (dead) because
    // champions await respawn rather than removal.
    rig.session
        .world_mut()
        .get_mut(victim)
        .unwrap()
        .damageable
        .as_mut()
        .unwrap()
        .health = 0.0;
    rig.session.tick();

    let record = rig.session.world().get(victim).unwrap();
    assert!(record.dead);
    assert!(record.champion.as_deref().unwrap().respawn_timer.is_some());

    // And the respawn brings them back at full health.
    let respawn_ticks = (10.0 / rig.session.config().tick_dt()) as u64;
    rig.session.run_ticks(respawn_ticks);
    let record = rig.session.world().get(victim).unwrap();
    assert!(!record.dead);
    let damageable = record.damageable.as_ref().unwrap();
    assert_eq!(damageable.health, damageable.max_health);
}
