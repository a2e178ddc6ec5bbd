//! Host-process side of the IPC contract.
//!
//! [`MemoryHost`] keeps the mapping in memory; [`FileHost`] reads and writes
//! the `mcpServers` object of a JSON file. Both answer requests through
//! [`dispatch`].

pub mod document;
pub mod file;
pub mod memory;

use serde_json::{Value, json};

use crate::error::IpcError;
use crate::ipc::protocol::{self, AckResponse, ToggleServerRequest, UpdateServerRequest};

pub use document::ConfigDocument;
pub use file::FileHost;
pub use memory::MemoryHost;

/// Reply to a request, plus whether the document was changed.
#[derive(Debug)]
pub struct Dispatched {
    pub reply: Value,
    pub changed: bool,
}

impl Dispatched {
    fn read(reply: Value) -> Self {
        Self {
            reply,
            changed: false,
        }
    }

    fn ack(result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                reply: AckResponse::ok().to_value(),
                changed: true,
            },
            Err(e) => Self {
                reply: AckResponse::failed(e.to_string()).to_value(),
                changed: false,
            },
        }
    }
}

/// Apply one request to `document`.
///
/// Failed edits are reported in the reply (`{success: false, error}`); only
/// an unknown channel is a transport error.
pub fn dispatch(
    document: &mut ConfigDocument,
    channel: &str,
    payload: Value,
) -> Result<Dispatched, IpcError> {
    let dispatched = match channel {
        protocol::LOAD_CONFIG => Dispatched::read(json!({ "mcpServers": document.servers() })),
        protocol::ADD_SERVERS => match payload {
            Value::Object(servers) => {
                document.add(servers);
                Dispatched::ack(Ok(()))
            }
            _ => Dispatched::ack(Err(anyhow::anyhow!(
                "Invalid payload for {}: expected an object",
                channel
            ))),
        },
        protocol::UPDATE_SERVER => Dispatched::ack(
            parse_payload::<UpdateServerRequest>(channel, payload)
                .and_then(|req| document.update(&req.name, &req.config)),
        ),
        protocol::REMOVE_SERVER => match payload {
            Value::String(name) => Dispatched::ack(document.remove(&name)),
            _ => Dispatched::ack(Err(anyhow::anyhow!(
                "Invalid payload for {}: expected a server name",
                channel
            ))),
        },
        protocol::TOGGLE_SERVER => Dispatched::ack(
            parse_payload::<ToggleServerRequest>(channel, payload)
                .and_then(|req| document.toggle(&req.name, req.enabled)),
        ),
        other => {
            return Err(IpcError::Transport(format!(
                "No handler registered for channel '{other}'"
            )));
        }
    };
    Ok(dispatched)
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    channel: &str,
    payload: Value,
) -> anyhow::Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| anyhow::anyhow!("Invalid payload for {}: {}", channel, e))
}
