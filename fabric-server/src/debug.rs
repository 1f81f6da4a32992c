//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use fabric_utils::id::{ClientId, ControllerId, DatapathId};
use fabric_utils::ipc::{ClientMsg, InboundMsg, ProxyMsg};
use tracing::{debug, debug_span};

use crate::association::Association;
use crate::link::Link;

// Coordinator debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Datapaths
    DatapathInit(ControllerId, DatapathId, bool),
    DatapathDown(ControllerId, DatapathId),
    // Tables
    AssociationUpdate(&'a Association),
    LinkUpdate(&'a Link),
    // Messages
    MsgRx(&'a InboundMsg),
    ProxyMsgTx(ControllerId, &'a ProxyMsg),
    ClientMsgTx(ClientId, &'a ClientMsg),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::DatapathInit(ct_id, dp_id, aggregation) => {
                // Parent span(s): fabric
                debug!(%ct_id, %dp_id, %aggregation, "{}", self);
            }
            Debug::DatapathDown(ct_id, dp_id) => {
                // Parent span(s): fabric
                debug!(%ct_id, %dp_id, "{}", self);
            }
            Debug::AssociationUpdate(assoc) => {
                // Parent span(s): fabric
                let data = serde_json::to_string(&assoc).unwrap();
                debug!(status = %assoc.status(), %data, "{}", self);
            }
            Debug::LinkUpdate(link) => {
                // Parent span(s): fabric
                let data = serde_json::to_string(&link).unwrap();
                debug!(status = %link.status(), %data, "{}", self);
            }
            Debug::MsgRx(msg) => {
                // Parent span(s): fabric
                debug_span!("ipc").in_scope(|| {
                    debug_span!("input").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(%data, "{}", self);
                    })
                })
            }
            Debug::ProxyMsgTx(ct_id, msg) => {
                // Parent span(s): fabric
                debug_span!("ipc").in_scope(|| {
                    debug_span!("output").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(%ct_id, %data, "{}", self);
                    })
                })
            }
            Debug::ClientMsgTx(client_id, msg) => {
                // Parent span(s): fabric
                debug_span!("ipc").in_scope(|| {
                    debug_span!("output").in_scope(|| {
                        let data = serde_json::to_string(&msg).unwrap();
                        debug!(%client_id, %data, "{}", self);
                    })
                })
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::DatapathInit(..) => {
                write!(f, "initializing datapath")
            }
            Debug::DatapathDown(..) => {
                write!(f, "datapath down")
            }
            Debug::AssociationUpdate(..) => {
                write!(f, "association updated")
            }
            Debug::LinkUpdate(..) => {
                write!(f, "inter-switch link updated")
            }
            Debug::MsgRx(..) | Debug::ProxyMsgTx(..) | Debug::ClientMsgTx(..) => {
                write!(f, "message")
            }
        }
    }
}
