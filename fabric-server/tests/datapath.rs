//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use fabric_server::association::{AssociationStatus, DatapathPort};
use fabric_server::config::{Config, IslConfigEntry};
use fabric_server::consts::*;
use fabric_server::default_rules;
use fabric_server::link::LinkStatus;
use fabric_utils::id::{DatapathId, DataplaneId};
use fabric_utils::ipc::{ClientMsg, InboundMsg, PortConfigOp};
use fabric_utils::mac_addr::MacAddr;
use fabric_utils::route_mod::{Action, Match, RouteModKind, RouteOption};

use crate::common::*;

#[test]
fn default_rules_order() {
    let rules = default_rules(CT0, D1, false);
    assert_eq!(rules.len(), DEFAULT_RULES);
    assert!(rules.iter().all(|rule| rule.id == D1.get()));
    assert!(rules.iter().all(|rule| rule.ct_id() == Some(CT0)));

    // Tables are cleared first.
    let tables = [PORT_TABLE, ROUTE_TABLE, OUTPUT_TABLE];
    for (rule, table) in rules[0..3].iter().zip(tables) {
        assert_eq!(rule.kind, RouteModKind::Delete);
        assert!(rule.matches.is_empty());
        assert!(
            rule.options
                .contains(&RouteOption::Priority(PRIORITY_LOWEST))
        );
        assert!(rule.options.contains(&RouteOption::TableNo(table)));
    }

    // Broadcast frames are accepted.
    assert_eq!(rules[3].matches, vec![Match::Ethernet(MacAddr::BROADCAST)]);
    assert_eq!(rules[3].actions, vec![Action::GotoTable(ROUTE_TABLE)]);

    // Everything else is dropped.
    for (rule, table) in rules[4..7].iter().zip(tables) {
        assert_eq!(rule.kind, RouteModKind::Add);
        assert!(rule.matches.is_empty());
        assert!(rule.actions.is_empty());
        assert!(rule.options.contains(&RouteOption::Priority(
            PRIORITY_LOWEST + PRIORITY_BAND
        )));
        assert!(rule.options.contains(&RouteOption::TableNo(table)));
    }

    // Control traffic is punted to the controller.
    for rule in &rules[7..] {
        assert_eq!(rule.kind, RouteModKind::Add);
        assert_eq!(rule.actions, vec![Action::Controller]);
        assert!(
            rule.options.contains(&RouteOption::Priority(PRIORITY_HIGH))
        );
        assert!(rule.options.contains(&RouteOption::TableNo(ROUTE_TABLE)));
    }
    assert_eq!(
        rules[7].matches,
        vec![
            Match::Ethertype(ETHERTYPE_IP),
            Match::NwProto(IPPROTO_OSPF)
        ]
    );
    assert_eq!(
        rules[10].matches,
        vec![
            Match::Ethertype(ETHERTYPE_IP),
            Match::NwProto(IPPROTO_UDP),
            Match::Ipv4 {
                addr: RIPV2_GROUP,
                mask: std::net::Ipv4Addr::BROADCAST,
            },
        ]
    );
    assert_eq!(
        rules[16].matches,
        vec![Match::Ethertype(ETHERTYPE_DISCOVERY)]
    );
}

#[test]
fn datapath_initialized_once() {
    let mut fabric = Fabric::new(vec![], vec![]);
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);

    fabric.register_datapath_port(CT0, D1, 1);
    fabric.register_datapath_port(CT0, D1, 2);
    assert_eq!(
        drain_route_mods(&mut proxy_rx),
        default_rules(CT0, D1, false)
    );

    // The same datapath behind another controller is a distinct one.
    let mut proxy1_rx = fabric.ipc.subscribe_proxy(CT1);
    fabric.register_datapath_port(CT1, D1, 1);
    assert_eq!(drain_route_mods(&mut proxy1_rx).len(), DEFAULT_RULES);

    // Once down, the datapath gets initialized again.
    fabric.datapath_down(CT0, D1);
    fabric.register_datapath_port(CT0, D1, 1);
    assert_eq!(drain_route_mods(&mut proxy_rx).len(), DEFAULT_RULES);
}

#[test]
fn aggregation_switch() {
    let mut fabric = Fabric::new(
        vec![port_map_entry(C1, 7, AGGREGATION_SWITCH_ID, 3)],
        vec![],
    );
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);

    fabric.register_client_port(C1, 7, MAC1);
    fabric.register_datapath_port(CT0, AGGREGATION_SWITCH_ID, 3);
    fabric.register_datapath_port(CT0, AGGREGATION_SWITCH_ID, 4);

    let route_mods = drain_route_mods(&mut proxy_rx);
    assert_eq!(route_mods.len(), 1);
    assert_eq!(route_mods, default_rules(CT0, AGGREGATION_SWITCH_ID, true));
    assert!(route_mods[0].matches.is_empty());
    assert_eq!(route_mods[0].actions, vec![Action::Controller]);
    assert!(
        route_mods[0]
            .options
            .contains(&RouteOption::Priority(PRIORITY_HIGH))
    );

    // Its ports aren't associated.
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::IdleClient);
    assert_eq!(fabric.master.associations().len(), 1);
}

#[test]
fn configured_aggregation_switches() {
    let mut config = Config::default();
    config.aggregation_switches = [D2].into();
    let mut fabric = Fabric::with_config(config);
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);
    assert!(fabric.master.config().is_aggregation_switch(D2));

    fabric.register_datapath_port(CT0, D2, 1);
    assert_eq!(drain_route_mods(&mut proxy_rx).len(), 1);
    fabric.register_datapath_port(CT0, AGGREGATION_SWITCH_ID, 1);
    assert_eq!(drain_route_mods(&mut proxy_rx).len(), DEFAULT_RULES);
}

#[test]
fn datapath_down_cascades() {
    // C1:7 egresses through D1:3 and D1:1 is linked to D2:2.
    let isl_entry =
        IslConfigEntry::new(C2, CT0, D1, 1, MAC1, CT0, D2, 2, MAC2);
    let mut fabric =
        Fabric::new(vec![port_map_entry(C1, 7, D1, 3)], vec![isl_entry]);
    let mut client_rx = fabric.ipc.subscribe_client(C1);

    fabric.register_client_port(C1, 7, MAC1);
    fabric.register_datapath_port(CT0, D1, 3);
    fabric.master.process_msg(InboundMsg::DataplaneMap {
        client_id: C1,
        client_port: 7,
        dataplane_id: DataplaneId::new(1),
        dataplane_port: 7,
    });
    fabric.register_datapath_port(CT0, D1, 1);
    fabric.register_datapath_port(CT0, D2, 2);
    fabric.register_datapath_port(CT0, D1, 4);
    drain(&mut client_rx);

    fabric.datapath_down(CT0, D1);

    // The association falls back to an idle client port and the client is
    // told so.
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::IdleClient);
    assert_eq!(assoc.dataplane, None);
    assert_eq!(
        drain_client(&mut client_rx),
        vec![ClientMsg::PortConfig {
            client_id: C1,
            client_port: 7,
            operation: PortConfigOp::Reset,
        }]
    );

    // Idle datapath ports are gone.
    let d1_4 = DatapathPort::new(CT0, D1, 4);
    assert!(fabric.master.associations().get_by_datapath(&d1_4).is_none());
    assert_eq!(fabric.master.associations().len(), 1);

    // Both link directions lost their end on D1.
    let d2 = DatapathPort::new(CT0, D2, 2);
    let (_, link) = fabric.master.links().get_by_remote(&d2).unwrap();
    assert_eq!(link.status(), LinkStatus::IdleRemote);
    let (_, link) = fabric.master.links().get_by_local(&d2).unwrap();
    assert_eq!(link.status(), LinkStatus::IdleLocal);

    // Nothing is left on D1.
    assert_eq!(
        fabric
            .master
            .associations()
            .indexes_by_datapath(CT0, D1)
            .count(),
        0
    );
    let links = fabric.master.links();
    assert_eq!(links.indexes_by_local_datapath(CT0, D1).count(), 0);
    assert_eq!(links.indexes_by_remote_datapath(CT0, D1).count(), 0);
    assert!(!fabric.master.is_initialized(CT0, D1));
}

#[test]
fn datapath_reassociates_after_down() {
    let mut fabric = Fabric::new(vec![port_map_entry(C1, 7, D1, 3)], vec![]);
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);
    fabric.register_client_port(C1, 7, MAC1);
    fabric.register_datapath_port(CT0, D1, 3);
    fabric.datapath_down(CT0, D1);
    drain(&mut proxy_rx);

    fabric.register_datapath_port(CT0, D1, 3);
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::Associated);
    assert_eq!(drain_route_mods(&mut proxy_rx).len(), DEFAULT_RULES + 2);
}

#[test]
fn unknown_datapath_down() {
    let mut fabric = Fabric::new(vec![], vec![]);
    fabric.register_datapath_port(CT0, D1, 1);
    fabric.datapath_down(CT0, DatapathId::new(0x1234));
    assert_eq!(fabric.master.associations().len(), 1);
    assert!(fabric.master.is_initialized(CT0, D1));
}
