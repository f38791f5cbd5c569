//! JSON frame codec
//!
//! A frame is a JSON array `[event, arg0, arg1, ...]` carried in one
//! WebSocket text message. Outbound frames are encoded once into `Bytes` and
//! shared by every recipient.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::registry::{RoomId, StepEvent};

use super::message::{event, InboundMessage, Namespace, OutboundMessage};

/// Decode a client frame received on `namespace`
pub fn decode(namespace: Namespace, text: &str) -> Result<InboundMessage, ProtocolError> {
    let (name, args) = split_event(text)?;

    let message = match name.as_str() {
        event::JOIN_ROOM => InboundMessage::JoinRoom(room_arg(&args, event::JOIN_ROOM, 0)?),
        event::INTRODUCE => InboundMessage::Introduce {
            room: room_arg(&args, event::INTRODUCE, 0)?,
            // A missing structure is stored as null, like any other document
            structure: Arc::new(args.get(1).cloned().unwrap_or(Value::Null)),
        },
        event::STEP => {
            let step_id = args.first().cloned().ok_or(ProtocolError::MissingArgument {
                event: event::STEP,
                index: 0,
            })?;
            let room = match args.get(2) {
                None | Some(Value::Null) => None,
                Some(_) => Some(room_arg(&args, event::STEP, 2)?),
            };
            InboundMessage::Step {
                step: StepEvent {
                    step_id,
                    value: args.get(1).cloned(),
                },
                room,
            }
        }
        _ => return Err(ProtocolError::UnknownEvent(name)),
    };

    if message.namespace() != namespace {
        return Err(ProtocolError::UnexpectedEvent {
            namespace: namespace.as_str(),
            event: name,
        });
    }

    Ok(message)
}

/// Encode a server frame
pub fn encode(message: &OutboundMessage) -> Result<Bytes, ProtocolError> {
    let result = match message {
        OutboundMessage::Rooms(rooms) => {
            let ids: Vec<&str> = rooms.iter().map(RoomId::as_str).collect();
            serde_json::to_vec(&(event::ROOMS, ids))
        }
        OutboundMessage::Tree(structure) => {
            serde_json::to_vec(&(event::TREE, structure.as_deref()))
        }
        OutboundMessage::Step(step) => match &step.value {
            Some(value) => serde_json::to_vec(&(event::STEP, &step.step_id, value)),
            None => serde_json::to_vec(&(event::STEP, &step.step_id)),
        },
    };

    result
        .map(Bytes::from)
        .map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Encode a client frame (used by the producer client)
pub fn encode_inbound(message: &InboundMessage) -> Result<String, ProtocolError> {
    let result = match message {
        InboundMessage::JoinRoom(room) => serde_json::to_string(&(event::JOIN_ROOM, room.as_str())),
        InboundMessage::Introduce { room, structure } => serde_json::to_string(&(
            event::INTRODUCE,
            room.as_str(),
            structure.as_ref(),
        )),
        InboundMessage::Step { step, room } => match (room, &step.value) {
            (Some(room), value) => serde_json::to_string(&(
                event::STEP,
                &step.step_id,
                value.as_ref().unwrap_or(&Value::Null),
                room.as_str(),
            )),
            (None, Some(value)) => serde_json::to_string(&(event::STEP, &step.step_id, value)),
            (None, None) => serde_json::to_string(&(event::STEP, &step.step_id)),
        },
    };

    result.map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decode a server frame (used by clients)
pub fn decode_outbound(text: &str) -> Result<OutboundMessage, ProtocolError> {
    let (name, args) = split_event(text)?;

    match name.as_str() {
        event::ROOMS => {
            let ids = match args.first() {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(ProtocolError::InvalidArgument {
                        event: event::ROOMS,
                        index: 0,
                        expected: "an array of room ids",
                    })
                }
                None => {
                    return Err(ProtocolError::MissingArgument {
                        event: event::ROOMS,
                        index: 0,
                    })
                }
            };
            let rooms = ids
                .iter()
                .map(|id| {
                    id.as_str()
                        .and_then(|s| RoomId::new(s).ok())
                        .ok_or(ProtocolError::InvalidArgument {
                            event: event::ROOMS,
                            index: 0,
                            expected: "an array of room ids",
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(OutboundMessage::Rooms(rooms))
        }
        event::TREE => Ok(OutboundMessage::Tree(match args.first() {
            None | Some(Value::Null) => None,
            Some(structure) => Some(Arc::new(structure.clone())),
        })),
        event::STEP => {
            let step_id = args.first().cloned().ok_or(ProtocolError::MissingArgument {
                event: event::STEP,
                index: 0,
            })?;
            Ok(OutboundMessage::Step(StepEvent {
                step_id,
                value: args.get(1).cloned(),
            }))
        }
        _ => Err(ProtocolError::UnknownEvent(name)),
    }
}

fn split_event(text: &str) -> Result<(String, Vec<Value>), ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(ProtocolError::NotAnEvent);
    };

    let mut items = items.into_iter();
    match items.next() {
        Some(Value::String(name)) => Ok((name, items.collect())),
        _ => Err(ProtocolError::NotAnEvent),
    }
}

fn room_arg(args: &[Value], event: &'static str, index: usize) -> Result<RoomId, ProtocolError> {
    match args.get(index) {
        None => Err(ProtocolError::MissingArgument { event, index }),
        Some(Value::String(id)) => RoomId::new(id.as_str()).map_err(|_| {
            ProtocolError::InvalidArgument {
                event,
                index,
                expected: "a non-empty room id",
            }
        }),
        Some(_) => Err(ProtocolError::InvalidArgument {
            event,
            index,
            expected: "a string room id",
        }),
    }
}
