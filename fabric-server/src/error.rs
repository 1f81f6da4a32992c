//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::path::PathBuf;

use fabric_utils::id::{ClientId, DatapathId};
use fabric_utils::ipc::IpcError;
use tracing::{info, warn, warn_span};

use crate::association::{AssociationStatus, DatapathPort};
use crate::config::IslConfigEntry;

// Coordinator errors.
#[derive(Debug)]
pub enum Error {
    // Registration
    ClientPortNotConfigured(ClientId, u32),
    IslConfigMismatch(DatapathPort, IslConfigEntry),
    DataplaneMapStale(ClientId, u32, Option<AssociationStatus>),
    // Route propagation
    RouteMissingOutput(ClientId),
    RouteUnknownClientPort(ClientId, u32),
    // Southbound
    Translate(DatapathId, TranslateError),
    // Message delivery
    Ipc(IpcError),
}

// Errors preventing a route operation from being expressed as an OpenFlow
// flow modification.
#[derive(Debug, Eq, PartialEq)]
pub enum TranslateError {
    UnsupportedMatch(u8),
    UnsupportedAction(u8),
    UnsupportedOption(u8),
}

// Errors loading the static port-mapping configuration.
#[derive(Debug)]
pub enum ConfigError {
    Open(PathBuf, csv::Error),
    Parse(PathBuf, csv::Error),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::ClientPortNotConfigured(client_id, client_port) => {
                warn!(%client_id, %client_port, "{}", self);
            }
            Error::IslConfigMismatch(port, entry) => {
                warn_span!("isl").in_scope(|| {
                    warn!(%port, ?entry, "{}", self);
                });
            }
            Error::DataplaneMapStale(client_id, client_port, status) => {
                info!(%client_id, %client_port, ?status, "{}", self);
            }
            Error::RouteMissingOutput(client_id) => {
                warn_span!("route").in_scope(|| {
                    warn!(%client_id, "{}", self);
                });
            }
            Error::RouteUnknownClientPort(client_id, client_port) => {
                warn_span!("route").in_scope(|| {
                    warn!(%client_id, %client_port, "{}", self);
                });
            }
            Error::Translate(dp_id, error) => {
                warn!(%dp_id, error = %with_source(error), "{}", self);
            }
            Error::Ipc(error) => {
                let destination = error.destination();
                warn!(%destination, error = %with_source(error), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ClientPortNotConfigured(..) => {
                write!(f, "no port mapping for client port")
            }
            Error::IslConfigMismatch(..) => {
                write!(
                    f,
                    "inter-switch link record doesn't identify the registering port unambiguously"
                )
            }
            Error::DataplaneMapStale(..) => {
                write!(f, "ignoring dataplane mapping for unassociated port")
            }
            Error::RouteMissingOutput(..) => {
                write!(f, "route update without output port")
            }
            Error::RouteUnknownClientPort(..) => {
                write!(f, "route update destined to unassociated client port")
            }
            Error::Translate(..) => {
                write!(f, "failed to translate route operation")
            }
            Error::Ipc(..) => {
                write!(f, "failed to deliver message")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Translate(_, error) => Some(error),
            Error::Ipc(error) => Some(error),
            _ => None,
        }
    }
}

impl From<IpcError> for Error {
    fn from(error: IpcError) -> Error {
        Error::Ipc(error)
    }
}

// ===== impl TranslateError =====

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::UnsupportedMatch(kind) => {
                write!(f, "unsupported match (type {kind})")
            }
            TranslateError::UnsupportedAction(kind) => {
                write!(f, "unsupported action (type {kind})")
            }
            TranslateError::UnsupportedOption(kind) => {
                write!(f, "unsupported option (type {kind})")
            }
        }
    }
}

impl std::error::Error for TranslateError {}

// ===== impl ConfigError =====

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Open(path, ..) => {
                write!(f, "failed to open {}", path.display())
            }
            ConfigError::Parse(path, ..) => {
                write!(f, "failed to parse {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Open(_, error) | ConfigError::Parse(_, error) => {
                Some(error)
            }
        }
    }
}

// ===== global functions =====

pub fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
