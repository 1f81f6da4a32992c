//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use fabric_utils::id::DatapathId;
use fabric_utils::route_mod::{
    Action, Match, RouteMod, RouteModKind, RouteOption,
};
use tracing::info;

use crate::consts::{ETHERTYPE_IP, ETHERTYPE_IPV6, IPPROTO_TCP};
use crate::error::TranslateError;
use crate::southbound::openflow::{
    FlowMod, FlowModCommand, Instruction, Masked, OFPCML_MAX, OFPP_CONTROLLER,
    OfAction, OxmMatch, SetField,
};

// ===== global functions =====

/// Translates an abstract route operation into an OpenFlow 1.3 flow
/// modification addressed to the datapath named by the operation's `id`.
///
/// Descriptors without an OpenFlow counterpart are skipped when flagged as
/// optional. Any other unsupported descriptor fails the whole operation.
pub fn translate(route_mod: &RouteMod) -> Result<FlowMod, TranslateError> {
    let mut flow_mod = FlowMod::new(DatapathId::new(route_mod.id));

    flow_mod.command = match route_mod.kind {
        RouteModKind::Add => FlowModCommand::Add,
        RouteModKind::Delete => FlowModCommand::DeleteStrict,
        RouteModKind::Modify => FlowModCommand::ModifyStrict,
    };

    for m in &route_mod.matches {
        add_match(&mut flow_mod.pattern, m)?;
    }

    let mut apply_actions = vec![];
    let mut write_metadata = None;
    let mut goto_table = None;
    for action in &route_mod.actions {
        match action {
            Action::Output(port) => apply_actions.push(OfAction::Output {
                port: *port,
                max_len: OFPCML_MAX,
            }),
            Action::Controller => apply_actions.push(OfAction::Output {
                port: OFPP_CONTROLLER,
                max_len: OFPCML_MAX,
            }),
            Action::SetEthSrc(addr) => {
                apply_actions.push(OfAction::SetField(SetField::EthSrc(*addr)))
            }
            Action::SetEthDst(addr) => {
                apply_actions.push(OfAction::SetField(SetField::EthDst(*addr)))
            }
            Action::WriteMetadata(metadata) => {
                write_metadata = Some(*metadata);
            }
            Action::GotoTable(table_id) => {
                goto_table = Some(*table_id);
            }
            Action::PushMpls(..)
            | Action::SwapMpls(..)
            | Action::PopMpls
            | Action::Other { .. } => {
                if !action.is_optional() {
                    return Err(TranslateError::UnsupportedAction(
                        action.kind(),
                    ));
                }
                info!(kind = action.kind(), "dropping unsupported action");
            }
        }
    }
    if !apply_actions.is_empty() {
        flow_mod
            .instructions
            .push(Instruction::ApplyActions(apply_actions));
    }
    if let Some(metadata) = write_metadata {
        flow_mod
            .instructions
            .push(Instruction::WriteMetadata(metadata));
    }
    if let Some(table_id) = goto_table {
        flow_mod.instructions.push(Instruction::GotoTable(table_id));
    }

    for option in &route_mod.options {
        match option {
            RouteOption::Priority(priority) => flow_mod.priority = *priority,
            RouteOption::IdleTimeout(timeout) => {
                flow_mod.idle_timeout = *timeout
            }
            RouteOption::HardTimeout(timeout) => {
                flow_mod.hard_timeout = *timeout
            }
            RouteOption::TableNo(table_id) => flow_mod.table_id = *table_id,
            // Addressing information, consumed before reaching the proxy.
            RouteOption::CtId(..) => (),
            RouteOption::Other { .. } => {
                if !option.is_optional() {
                    return Err(TranslateError::UnsupportedOption(
                        option.kind(),
                    ));
                }
                info!(kind = option.kind(), "dropping unsupported option");
            }
        }
    }

    Ok(flow_mod)
}

// ===== helper functions =====

fn add_match(pattern: &mut OxmMatch, m: &Match) -> Result<(), TranslateError> {
    match m {
        Match::Ipv4 { addr, mask } => {
            pattern.eth_type = Some(ETHERTYPE_IP);
            pattern.ipv4_dst = Some(Masked {
                value: *addr,
                mask: *mask,
            });
        }
        Match::Ipv6 { addr, mask } => {
            pattern.eth_type = Some(ETHERTYPE_IPV6);
            pattern.ipv6_dst = Some(Masked {
                value: *addr,
                mask: *mask,
            });
        }
        Match::Ethernet(addr) => pattern.eth_dst = Some(*addr),
        Match::Ethertype(eth_type) => pattern.eth_type = Some(*eth_type),
        Match::NwProto(proto) => pattern.ip_proto = Some(*proto),
        Match::TpSrc(port) => {
            pattern.ip_proto = Some(IPPROTO_TCP);
            pattern.tcp_src = Some(*port);
        }
        Match::TpDst(port) => {
            pattern.ip_proto = Some(IPPROTO_TCP);
            pattern.tcp_dst = Some(*port);
        }
        Match::InPort(port) => pattern.in_port = Some(*port),
        Match::Metadata(metadata) => pattern.metadata = Some(*metadata),
        Match::Mpls(..) | Match::VlanId(..) | Match::Other { .. } => {
            if !m.is_optional() {
                return Err(TranslateError::UnsupportedMatch(m.kind()));
            }
            info!(kind = m.kind(), "dropping unsupported match");
        }
    }

    Ok(())
}
