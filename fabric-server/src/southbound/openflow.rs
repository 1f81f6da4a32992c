//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};

use enum_as_inner::EnumAsInner;
use fabric_utils::id::DatapathId;
use fabric_utils::mac_addr::MacAddr;
use serde::{Deserialize, Serialize};

// OpenFlow 1.3 reserved port: send to controller.
pub const OFPP_CONTROLLER: u32 = 0xfffffffd;
// OpenFlow 1.3 buffer length meaning "send the whole packet".
pub const OFPCML_MAX: u16 = 0xffe5;

/// OpenFlow 1.3 flow table modification.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct FlowMod {
    pub datapath: DatapathId,
    pub command: FlowModCommand,
    pub table_id: u8,
    pub priority: u16,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    #[serde(rename = "match")]
    pub pattern: OxmMatch,
    pub instructions: Vec<Instruction>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowModCommand {
    Add,
    ModifyStrict,
    DeleteStrict,
}

/// Match fields of a flow entry. Absent fields are wildcarded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct OxmMatch {
    pub in_port: Option<u32>,
    pub metadata: Option<u64>,
    pub eth_dst: Option<MacAddr>,
    pub eth_type: Option<u16>,
    pub ip_proto: Option<u8>,
    pub ipv4_dst: Option<Masked<Ipv4Addr>>,
    pub ipv6_dst: Option<Masked<Ipv6Addr>>,
    pub tcp_src: Option<u16>,
    pub tcp_dst: Option<u16>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Masked<T> {
    pub value: T,
    pub mask: T,
}

#[derive(Clone, Debug, Eq, PartialEq, EnumAsInner)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Instruction {
    ApplyActions(Vec<OfAction>),
    WriteMetadata(u64),
    GotoTable(u8),
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OfAction {
    Output { port: u32, max_len: u16 },
    SetField(SetField),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetField {
    EthSrc(MacAddr),
    EthDst(MacAddr),
}

// ===== impl FlowMod =====

impl FlowMod {
    pub fn new(datapath: DatapathId) -> FlowMod {
        FlowMod {
            datapath,
            command: FlowModCommand::Add,
            table_id: 0,
            priority: 0,
            idle_timeout: 0,
            hard_timeout: 0,
            pattern: Default::default(),
            instructions: Default::default(),
        }
    }

    // Returns the actions applied immediately, if any.
    pub fn apply_actions(&self) -> &[OfAction] {
        self.instructions
            .iter()
            .find_map(Instruction::as_apply_actions)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
