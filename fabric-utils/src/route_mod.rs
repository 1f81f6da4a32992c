//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::id::ControllerId;
use crate::mac_addr::MacAddr;

// Type codes with this bit set denote descriptors that a receiver unable to
// honor them is allowed to skip.
pub const OPTIONAL_FLAG: u8 = 0x80;

/// Abstract flow-table operation exchanged between clients, the coordinator
/// and the datapath-facing proxies.
///
/// The `id` field addresses the operation: it carries a client identifier when
/// emitted by a client and a datapath identifier once rewritten by the
/// coordinator.
#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct RouteMod {
    pub kind: RouteModKind,
    pub id: u64,
    #[new(default)]
    pub matches: Vec<Match>,
    #[new(default)]
    pub actions: Vec<Action>,
    #[new(default)]
    pub options: Vec<RouteOption>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteModKind {
    Add,
    Delete,
    Modify,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Match {
    Ipv4 { addr: Ipv4Addr, mask: Ipv4Addr },
    Ipv6 { addr: Ipv6Addr, mask: Ipv6Addr },
    Ethernet(MacAddr),
    Mpls(u32),
    InPort(u32),
    VlanId(u16),
    Ethertype(u16),
    NwProto(u8),
    TpSrc(u16),
    TpDst(u16),
    Metadata(u64),
    Other { kind: u8, value: Vec<u8> },
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Output(u32),
    SetEthSrc(MacAddr),
    SetEthDst(MacAddr),
    PushMpls(u32),
    SwapMpls(u32),
    PopMpls,
    WriteMetadata(u64),
    GotoTable(u8),
    Controller,
    Other { kind: u8, value: Vec<u8> },
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteOption {
    Priority(u16),
    IdleTimeout(u16),
    HardTimeout(u16),
    CtId(ControllerId),
    TableNo(u8),
    Other { kind: u8, value: Vec<u8> },
}

// ===== impl RouteMod =====

impl RouteMod {
    pub fn with_match(mut self, m: Match) -> Self {
        self.matches.push(m);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_option(mut self, option: RouteOption) -> Self {
        self.options.push(option);
        self
    }

    // Removes all output actions, returning the port of the first one.
    pub fn take_output(&mut self) -> Option<u32> {
        let port = self.actions.iter().find_map(|action| match action {
            Action::Output(port) => Some(*port),
            _ => None,
        });
        self.actions
            .retain(|action| !matches!(action, Action::Output(..)));
        port
    }

    // Returns the controller that owns this operation, if set.
    pub fn ct_id(&self) -> Option<ControllerId> {
        self.options.iter().rev().find_map(|option| match option {
            RouteOption::CtId(ct_id) => Some(*ct_id),
            _ => None,
        })
    }
}

// ===== impl RouteModKind =====

impl std::fmt::Display for RouteModKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteModKind::Add => write!(f, "add"),
            RouteModKind::Delete => write!(f, "delete"),
            RouteModKind::Modify => write!(f, "modify"),
        }
    }
}

// ===== impl Match =====

impl Match {
    pub fn kind(&self) -> u8 {
        match self {
            Match::Ipv4 { .. } => 1,
            Match::Ipv6 { .. } => 2,
            Match::Ethernet(..) => 3,
            Match::Mpls(..) => 4,
            Match::InPort(..) => 5,
            Match::VlanId(..) => 6,
            Match::Ethertype(..) => 7,
            Match::NwProto(..) => 8,
            Match::TpSrc(..) => 9,
            Match::TpDst(..) => 10,
            Match::Metadata(..) => 11,
            Match::Other { kind, .. } => *kind,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.kind() & OPTIONAL_FLAG != 0
    }
}

// ===== impl Action =====

impl Action {
    pub fn kind(&self) -> u8 {
        match self {
            Action::Output(..) => 1,
            Action::SetEthSrc(..) => 2,
            Action::SetEthDst(..) => 3,
            Action::PushMpls(..) => 4,
            Action::PopMpls => 5,
            Action::SwapMpls(..) => 6,
            Action::WriteMetadata(..) => 7,
            Action::GotoTable(..) => 8,
            Action::Controller => 9,
            Action::Other { kind, .. } => *kind,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.kind() & OPTIONAL_FLAG != 0
    }
}

// ===== impl RouteOption =====

impl RouteOption {
    pub fn kind(&self) -> u8 {
        match self {
            RouteOption::Priority(..) => 1,
            RouteOption::IdleTimeout(..) => 2,
            RouteOption::HardTimeout(..) => 3,
            RouteOption::CtId(..) => 4,
            RouteOption::TableNo(..) => 5,
            RouteOption::Other { kind, .. } => *kind,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.kind() & OPTIONAL_FLAG != 0
    }
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_output() {
        let mut rm = RouteMod::new(RouteModKind::Add, 1)
            .with_action(Action::SetEthDst(MacAddr::BROADCAST))
            .with_action(Action::Output(7))
            .with_action(Action::Output(8));
        assert_eq!(rm.take_output(), Some(7));
        assert_eq!(rm.actions, vec![Action::SetEthDst(MacAddr::BROADCAST)]);
        assert_eq!(rm.take_output(), None);

        let mut rm = RouteMod::new(RouteModKind::Delete, 1);
        assert_eq!(rm.take_output(), None);
    }

    #[test]
    fn test_optional_flag() {
        assert!(!Match::Mpls(16).is_optional());
        assert!(Match::Other { kind: 0x81, value: vec![] }.is_optional());
        assert!(!Action::Other { kind: 0x7f, value: vec![] }.is_optional());
        assert!(RouteOption::Other { kind: 0xff, value: vec![1] }.is_optional());
    }

    #[test]
    fn test_ct_id() {
        let rm = RouteMod::new(RouteModKind::Add, 1)
            .with_option(RouteOption::CtId(ControllerId(1)))
            .with_option(RouteOption::Priority(10))
            .with_option(RouteOption::CtId(ControllerId(2)));
        assert_eq!(rm.ct_id(), Some(ControllerId(2)));
    }
}
