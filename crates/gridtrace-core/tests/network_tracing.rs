//! Integration tests for direction maintenance and feeder membership

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use gridtrace_core::config::TraceConfig;
use gridtrace_core::direction::{ClearDirection, RemoveDirection, SetDirection};
use gridtrace_core::network::{EquipmentKind, FeederDirection, Network, NetworkBuilder};
use gridtrace_core::processing::run_post_load;
use gridtrace_core::trace::conditions::downstream;
use gridtrace_core::trace::{
    NetworkState, NetworkStateOperators, NetworkTrace, NetworkTraceStep, Visitation, CURRENT,
    NORMAL,
};
use gridtrace_core::traversal::{QueueType, Traversal};

fn directions(
    network: &Network,
    operators: &dyn NetworkStateOperators,
) -> BTreeMap<String, FeederDirection> {
    network
        .all_terminals()
        .map(|t| (t.mrid.clone(), *operators.terminal_direction(t)))
        .collect()
}

/// b0-t2 feeds a ring c1 -> c2 -> c3 that closes back on the head node
fn ring() -> Network {
    NetworkBuilder::new()
        .equipment("b0", EquipmentKind::Breaker, 2)
        .equipment("c1", EquipmentKind::AcLineSegment, 2)
        .equipment("c2", EquipmentKind::AcLineSegment, 2)
        .equipment("c3", EquipmentKind::AcLineSegment, 2)
        .connect("b0-t2", "c1-t1")
        .connect("b0-t2", "c3-t2")
        .connect("c1-t2", "c2-t1")
        .connect("c2-t2", "c3-t1")
        .feeder("fdr", "b0-t2")
        .build()
        .unwrap()
}

const RING_TERMINALS: [&str; 6] = ["c1-t1", "c1-t2", "c2-t1", "c2-t2", "c3-t1", "c3-t2"];

#[test]
fn test_ring_terminates_with_both_directions() {
    let mut network = ring();
    let steps = Rc::new(Cell::new(0_usize));
    let counter = Rc::clone(&steps);
    let mut trace = SetDirection::trace(NORMAL);
    trace.add_step_action(move |_: &NetworkTraceStep<FeederDirection>, _: &mut Network, _| {
        counter.set(counter.get() + 1);
    });
    trace
        .run_from_terminal(&mut network, "b0-t2", FeederDirection::Downstream, false)
        .unwrap();

    let terminals = network.all_terminals().count();
    assert!(steps.get() >= RING_TERMINALS.len());
    assert!(steps.get() <= 4 * terminals, "{} steps", steps.get());

    // Each branch around the ring keeps its own visited set, so both
    // directions of travel reach every ring terminal
    for terminal in RING_TERMINALS {
        assert_eq!(
            NORMAL.get_direction(&network, terminal),
            FeederDirection::Both,
            "{terminal}"
        );
    }
    assert_eq!(
        NORMAL.get_direction(&network, "b0-t2"),
        FeederDirection::Downstream
    );
    assert!(NORMAL.get_direction(&network, "b0-t1").is_none());
}

#[test]
fn test_set_direction_is_idempotent() {
    let mut network = ring();
    SetDirection.run(&mut network, NORMAL).unwrap();
    let first = directions(&network, NORMAL);

    SetDirection.run(&mut network, NORMAL).unwrap();
    assert_eq!(directions(&network, NORMAL), first);
}

#[test]
fn test_clear_then_reapply_restores_directions() {
    let mut network = ring();
    SetDirection.run(&mut network, NORMAL).unwrap();
    let before = directions(&network, NORMAL);

    let heads = ClearDirection.run(&mut network, "c2-t1", NORMAL).unwrap();
    assert_eq!(heads, vec!["b0-t2"]);
    for terminal in RING_TERMINALS {
        assert!(NORMAL.get_direction(&network, terminal).is_none(), "{terminal}");
    }

    for head in &heads {
        SetDirection.run_terminal(&mut network, head, NORMAL).unwrap();
    }
    assert_eq!(directions(&network, NORMAL), before);
}

/// fdrA at a0-t2 and fdrB at b0-t2 meet at junction j; j-t3 is a spur
fn dual_fed() -> NetworkBuilder {
    NetworkBuilder::new()
        .equipment("a0", EquipmentKind::Breaker, 2)
        .equipment("ca", EquipmentKind::AcLineSegment, 2)
        .equipment("j", EquipmentKind::Junction, 3)
        .equipment("cb", EquipmentKind::AcLineSegment, 2)
        .equipment("b0", EquipmentKind::Breaker, 2)
        .connect("a0-t2", "ca-t1")
        .connect("ca-t2", "j-t1")
        .connect("j-t2", "cb-t2")
        .connect("cb-t1", "b0-t2")
        .feeder("fdrA", "a0-t2")
        .feeder("fdrB", "b0-t2")
}

#[test]
fn test_remove_direction_leaves_the_other_feed() {
    let mut network = dual_fed().build().unwrap();
    SetDirection.run(&mut network, NORMAL).unwrap();
    assert_eq!(
        NORMAL.get_direction(&network, "j-t1"),
        FeederDirection::Both
    );

    RemoveDirection
        .run(&mut network, "a0-t2", FeederDirection::Downstream, NORMAL)
        .unwrap();

    // Identical to fdrB alone energizing the line
    let mut only_b = dual_fed().open("a0", NetworkState::Normal).build().unwrap();
    SetDirection.run(&mut only_b, NORMAL).unwrap();
    assert_eq!(directions(&network, NORMAL), directions(&only_b, NORMAL));
    assert_eq!(
        NORMAL.get_direction(&network, "j-t3"),
        FeederDirection::Downstream
    );
}

/// b0 -- c1 -- { b2 (open in current) -- c3 -- ec4 ; b5 -- c6 -- ec7 }
fn split_feeder() -> Network {
    NetworkBuilder::new()
        .equipment("b0", EquipmentKind::Breaker, 2)
        .equipment("c1", EquipmentKind::AcLineSegment, 2)
        .equipment("b2", EquipmentKind::Breaker, 2)
        .equipment("c3", EquipmentKind::AcLineSegment, 2)
        .equipment("ec4", EquipmentKind::EnergyConsumer, 1)
        .equipment("b5", EquipmentKind::Breaker, 2)
        .equipment("c6", EquipmentKind::AcLineSegment, 2)
        .equipment("ec7", EquipmentKind::EnergyConsumer, 1)
        .connect("b0-t2", "c1-t1")
        .connect("c1-t2", "b2-t1")
        .connect("c1-t2", "b5-t1")
        .connect("b2-t2", "c3-t1")
        .connect("c3-t2", "ec4-t1")
        .connect("b5-t2", "c6-t1")
        .connect("c6-t2", "ec7-t1")
        .open("b2", NetworkState::Current)
        .feeder("fdr", "b0-t2")
        .build()
        .unwrap()
}

fn downstream_equipment(
    network: &mut Network,
    operators: &'static dyn NetworkStateOperators,
) -> BTreeSet<String> {
    let reached = Rc::new(RefCell::new(BTreeSet::new()));
    let sink = Rc::clone(&reached);

    let mut trace = NetworkTrace::basic(
        operators,
        QueueType::BreadthFirst,
        Visitation::Terminal,
        |_, _, _| (),
    );
    trace
        .add_queue_condition(downstream::<()>(operators))
        .add_step_action(move |step: &NetworkTraceStep<()>, _: &mut Network, _| {
            if let Some(eq) = &step.path.to_equipment {
                sink.borrow_mut().insert(eq.clone());
            }
        });
    trace.add_start_equipment(network, "b0", ()).unwrap();
    trace.run_queued(false, network).unwrap();

    let reached = reached.borrow().clone();
    reached
}

#[test]
fn test_downstream_trace_respects_each_state() {
    let mut network = split_feeder();
    run_post_load(&mut network, &TraceConfig::default()).unwrap();

    let normal = downstream_equipment(&mut network, NORMAL);
    assert!(normal.contains("ec4"));
    assert!(normal.contains("ec7"));

    let current = downstream_equipment(&mut network, CURRENT);
    assert!(current.contains("ec7"));
    assert!(!current.contains("ec4"));
    assert!(!current.contains("c3"));
}

/// Zone transformer zt feeds busbar bb, which feeds two feeders. fdr1 steps
/// down to LV at tx1.
fn zone() -> Network {
    NetworkBuilder::new()
        .transformer("zt", &[33000, 11000])
        .equipment("bb", EquipmentKind::BusbarSection, 1)
        .equipment("b1", EquipmentKind::Breaker, 2)
        .equipment("c1", EquipmentKind::AcLineSegment, 2)
        .transformer("tx1", &[11000, 415])
        .equipment("lv1", EquipmentKind::AcLineSegment, 2)
        .equipment("b2", EquipmentKind::Breaker, 2)
        .equipment("c2", EquipmentKind::AcLineSegment, 2)
        .base_voltage("lv1", 415)
        .connect("zt-t2", "bb-t1")
        .connect("bb-t1", "b1-t1")
        .connect("bb-t1", "b2-t1")
        .connect("b1-t2", "c1-t1")
        .connect("c1-t2", "tx1-t1")
        .connect("tx1-t2", "lv1-t1")
        .connect("b2-t2", "c2-t1")
        .substation("zone", &["zt"])
        .feeder("fdr1", "b1-t2")
        .feeder("fdr2", "b2-t2")
        .lv_feeder("lvf", "tx1-t2")
        .build()
        .unwrap()
}

fn feeder_members(network: &Network, feeder: &str) -> Vec<String> {
    NORMAL
        .feeder_equipment(network.feeder(feeder).unwrap())
        .iter()
        .cloned()
        .collect()
}

#[test]
fn test_feeder_membership_stops_at_boundaries() {
    let mut network = zone();
    let summary = run_post_load(&mut network, &TraceConfig::default()).unwrap();

    assert_eq!(feeder_members(&network, "fdr1"), vec!["b1", "c1", "tx1"]);
    assert_eq!(feeder_members(&network, "fdr2"), vec!["b2", "c2"]);

    let lv: Vec<&String> = NORMAL
        .lv_feeder_equipment(network.lv_feeder("lvf").unwrap())
        .iter()
        .collect();
    assert_eq!(lv, vec!["lv1"]);
    assert!(NORMAL
        .feeder_lv_feeders(network.feeder("fdr1").unwrap())
        .contains("lvf"));
    assert!(NORMAL
        .feeder_lv_feeders(network.feeder("fdr2").unwrap())
        .is_empty());

    for eq in ["zt", "bb"] {
        let equipment = network.equipment(eq).unwrap();
        assert!(NORMAL.equipment_feeders(equipment).is_empty(), "{eq}");
    }

    let normal = summary.state(NetworkState::Normal).unwrap();
    assert_eq!(normal.feeders_processed, 2);
    assert_eq!(normal.equipment_associated, 6);
}

#[test]
fn test_post_load_rerun_is_stable() {
    let mut network = zone();
    let config = TraceConfig::default();
    let first = run_post_load(&mut network, &config).unwrap();
    let directions_before = directions(&network, CURRENT);

    let second = run_post_load(&mut network, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(directions(&network, CURRENT), directions_before);
}
