//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use fabric_server::error::{Error, with_source};
use fabric_server::southbound::openflow::FlowMod;
use fabric_server::southbound::translator::translate;
use fabric_utils::id::{ClientId, ControllerId, DatapathId};
use fabric_utils::ipc::{InboundMsg, IpcBus, ProxyMsg};
use fabric_utils::{Sender, UnboundedReceiver};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::SendError;
use tracing::{Instrument, debug_span, info, warn};

// First line sent by an agent after connecting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Hello {
    Client {
        client_id: ClientId,
    },
    Proxy {
        ct_id: ControllerId,
        encoding: Encoding,
    },
}

// Representation of the flow-table operations written to a proxy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Abstract,
    Openflow13,
}

// Messages written to proxies speaking OpenFlow 1.3.
#[derive(Debug, Serialize)]
enum Openflow13Msg {
    FlowMod(FlowMod),
    #[serde(untagged)]
    Proxy(ProxyMsg),
}

// Agent connection errors.
#[derive(Debug)]
pub enum TransportError {
    AcceptError(std::io::Error),
    RecvError(std::io::Error),
    SendError(std::io::Error),
    DecodeError(serde_json::Error),
}

// ===== impl TransportError =====

impl TransportError {
    pub(crate) fn log(&self) {
        match self {
            TransportError::AcceptError(error)
            | TransportError::RecvError(error)
            | TransportError::SendError(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
            TransportError::DecodeError(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::AcceptError(..) => {
                write!(f, "failed to accept connection")
            }
            TransportError::RecvError(..) => {
                write!(f, "failed to read from agent")
            }
            TransportError::SendError(..) => {
                write!(f, "failed to write to agent")
            }
            TransportError::DecodeError(..) => {
                write!(f, "failed to decode agent message")
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::AcceptError(error)
            | TransportError::RecvError(error)
            | TransportError::SendError(error) => Some(error),
            TransportError::DecodeError(error) => Some(error),
        }
    }
}

// ===== global functions =====

pub(crate) async fn listen_loop(
    listener: TcpListener,
    ipc: IpcBus,
    master_tx: Sender<InboundMsg>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let ipc = ipc.clone();
                let master_tx = master_tx.clone();
                let span = debug_span!("agent", %peer);
                tokio::spawn(
                    agent_task(stream, ipc, master_tx).instrument(span),
                );
            }
            Err(error) => {
                TransportError::AcceptError(error).log();
            }
        }
    }
}

// ===== helper functions =====

async fn agent_task(
    stream: TcpStream,
    ipc: IpcBus,
    master_tx: Sender<InboundMsg>,
) {
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // The first line identifies the agent.
    let mut line = String::new();
    let hello = match reader.read_line(&mut line).await {
        Ok(0) => return,
        Ok(_) => match serde_json::from_str::<Hello>(&line) {
            Ok(hello) => hello,
            Err(error) => {
                TransportError::DecodeError(error).log();
                return;
            }
        },
        Err(error) => {
            TransportError::RecvError(error).log();
            return;
        }
    };
    info!(?hello, "agent connected");

    let write_task = match hello {
        Hello::Client { client_id } => {
            let client_rx = ipc.subscribe_client(client_id);
            tokio::spawn(
                write_loop(write_half, client_rx, |msg| {
                    Some(serde_json::to_string(&msg).unwrap())
                })
                .in_current_span(),
            )
        }
        Hello::Proxy { ct_id, encoding } => {
            let proxy_rx = ipc.subscribe_proxy(ct_id);
            tokio::spawn(
                write_loop(write_half, proxy_rx, move |msg| {
                    encode_proxy_msg(msg, encoding)
                })
                .in_current_span(),
            )
        }
    };

    // The coordinator is gone when its channel is closed, nothing left to do.
    let _ = read_loop(reader, &master_tx).await;
    write_task.abort();
    info!("agent disconnected");
}

// Forwards every inbound message read from the agent to the coordinator.
async fn read_loop<R>(
    mut reader: R,
    master_tx: &Sender<InboundMsg>,
) -> Result<(), SendError<InboundMsg>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => return Ok(()),
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<InboundMsg>(&line) {
                    Ok(msg) => master_tx.send(msg).await?,
                    Err(error) => TransportError::DecodeError(error).log(),
                }
            }
            Err(error) => {
                TransportError::RecvError(error).log();
                return Ok(());
            }
        }
    }
}

async fn write_loop<T, F>(
    mut stream: OwnedWriteHalf,
    mut msg_rx: UnboundedReceiver<T>,
    encode: F,
) where
    F: Fn(T) -> Option<String>,
{
    while let Some(msg) = msg_rx.recv().await {
        let Some(mut line) = encode(msg) else {
            continue;
        };
        line.push('\n');
        if let Err(error) = stream.write_all(line.as_bytes()).await {
            TransportError::SendError(error).log();
            return;
        }
    }
}

// Encodes a message destined to a proxy. Route operations that can't be
// expressed in the proxy's encoding are dropped.
fn encode_proxy_msg(msg: ProxyMsg, encoding: Encoding) -> Option<String> {
    let msg = match (encoding, msg) {
        (Encoding::Abstract, msg) => {
            return Some(serde_json::to_string(&msg).unwrap());
        }
        (Encoding::Openflow13, ProxyMsg::RouteMod(route_mod)) => {
            match translate(&route_mod) {
                Ok(flow_mod) => Openflow13Msg::FlowMod(flow_mod),
                Err(error) => {
                    let dp_id = DatapathId::new(route_mod.id);
                    Error::Translate(dp_id, error).log();
                    return None;
                }
            }
        }
        (Encoding::Openflow13, msg) => Openflow13Msg::Proxy(msg),
    };
    Some(serde_json::to_string(&msg).unwrap())
}

// ===== unit tests =====
