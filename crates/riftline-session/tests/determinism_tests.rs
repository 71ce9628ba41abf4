//! Determinism conformance: identical seeds and inputs produce identical
//! per-tick state hashes and identical outbound delta streams.

use std::sync::Arc;

use riftline_catalog::config::SessionConfig;
use riftline_catalog::content::{demo_catalog, PYRE, WARDEN};
use riftline_net::protocol::{ClientMessage, ClientPayload, ServerMessage};
use riftline_session::prelude::*;
use riftline_world::champion::AbilitySlot;
use riftline_world::ids::PlayerId;
use riftline_world::math::Vec2;
use riftline_world::records::Team;

struct Scripted {
    session: Session,
    inputs: InputSender,
    outbound: OutboundReceiver,
}

fn scripted_session(seed: u64) -> Scripted {
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
    session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
    session.add_player(PlayerId(2), Team::Red, PYRE).unwrap();
    session.start();
    Scripted {
        session,
        inputs: input_tx,
        outbound: outbound_rx,
    }
}

/// Drive a fixed input script for 300 ticks; collect per-tick hashes and
/// the outbound stream.
fn run_script(seed: u64) -> (Vec<String>, Vec<OutboundEnvelope>) {
    let mut rig = scripted_session(seed);
    // Drain the start handshake.
    let _: Vec<_> = rig.outbound.try_iter().collect();

    let mut hashes = Vec::new();
    let mut stream = Vec::new();
    let mut sequence = 0u32;
    let send = |player: u32, payload: ClientPayload, sequence: &mut u32| {
        *sequence += 1;
        rig.inputs
            .send(InputEnvelope {
                player: PlayerId(player),
                message: ClientMessage {
                    sequence: *sequence,
                    client_time: 0.0,
                    payload,
                },
            })
            .unwrap();
    };

    for tick in 0..300u64 {
        match tick {
            0 => {
                send(1, ClientPayload::LevelUp { slot: AbilitySlot::Q }, &mut sequence);
                send(2, ClientPayload::LevelUp { slot: AbilitySlot::E }, &mut sequence);
                send(1, ClientPayload::Move(Vec2::new(200.0, 200.0)), &mut sequence);
                send(2, ClientPayload::Move(Vec2::new(-200.0, -200.0)), &mut sequence);
            }
            120 => {
                // Close enough to fight: both walked ~3300 units inward.
                send(
                    1,
                    ClientPayload::Ability {
                        slot: AbilitySlot::Q,
                        target_unit: None,
                        target_point: Some(Vec2::new(400.0, 400.0)),
                    },
                    &mut sequence,
                );
            }
            140 => {
                send(
                    2,
                    ClientPayload::Ability {
                        slot: AbilitySlot::E,
                        target_unit: None,
                        target_point: None,
                    },
                    &mut sequence,
                );
            }
            _ => {}
        }
        rig.session.tick();
        hashes.push(rig.session.state_hash().unwrap());
        stream.extend(rig.outbound.try_iter());
    }
    (hashes, stream)
}

#[test]
fn identical_runs_are_bit_identical() {
    let (hashes_a, stream_a) = run_script(0xDEADBEEF);
    let (hashes_b, stream_b) = run_script(0xDEADBEEF);

    assert_eq!(hashes_a.len(), hashes_b.len());
    for (tick, (a, b)) in hashes_a.iter().zip(hashes_b.iter()).enumerate() {
        assert_eq!(a, b, "state hash diverged at tick {tick}");
    }
    assert_eq!(
        stream_a.len(),
        stream_b.len(),
        "outbound message counts diverged"
    );
    for (i, (a, b)) in stream_a.iter().zip(stream_b.iter()).enumerate() {
        assert_eq!(a, b, "outbound message {i} diverged");
    }
}

#[test]
fn update_ticks_increase_per_client() {
    let (_hashes, stream) = run_script(7);
    for player in [PlayerId(1), PlayerId(2)] {
        let ticks: Vec<u64> = stream
            .iter()
            .filter(|e| e.player == player)
            .filter_map(|e| match &e.message {
                ServerMessage::StateUpdate(update) => Some(update.tick),
                _ => None,
            })
            .collect();
        assert!(!ticks.is_empty());
        assert!(
            ticks.windows(2).all(|w| w[0] < w[1]),
            "deltas for {player:?} are not tick-ordered"
        );
    }
}

#[test]
fn creation_precedes_any_reference() {
    // A delta that names an entity the client has never seen must itself
    // be a creation record.
    let (_hashes, stream) = run_script(21);
    for player in [PlayerId(1), PlayerId(2)] {
        let mut known = std::collections::BTreeSet::new();
        for envelope in stream.iter().filter(|e| e.player == player) {
            let update = match &envelope.message {
                ServerMessage::StateUpdate(update) => update,
                ServerMessage::FullState { update, .. } => update,
                _ => continue,
            };
            for delta in &update.deltas {
                if delta.removed {
                    known.remove(&delta.entity);
                    continue;
                }
                if !known.contains(&delta.entity) {
                    assert!(
                        delta.created.is_some(),
                        "first reference to {:?} for {player:?} is not a creation",
                        delta.entity
                    );
                    known.insert(delta.entity);
                }
            }
        }
    }
}
