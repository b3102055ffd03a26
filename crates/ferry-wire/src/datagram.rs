//! Whole-datagram framing
//!
//! Everything a node puts on the segment is one datagram: a control
//! marker byte, then either a control message (type tag plus body) or a
//! data packet (header snapshot, data header, payload). This module
//! composes the individual codecs into a single decode entry point so
//! the session engine never touches raw bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use ferry_core::PacketHeader;

use crate::data_header::DataHeader;
use crate::error::{WireError, WireResult};
use crate::header::{
    PACKET_HEADER_WIRE_SIZE, decode_packet_header, encode_packet_header,
};
use crate::summary::SummaryVector;
use crate::tag::{ControlMarker, MessageType, TypeTag};

/// Body of a control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlBody {
    /// Presence advertisement. Carries a data header whose hop count is
    /// stamped above the receiver drop threshold; the other fields are
    /// not interpreted.
    Beacon(DataHeader),
    /// Summary vector from the session initiator.
    Reply(SummaryVector),
    /// Summary vector from the responder, ending the session.
    ReplyBack(SummaryVector),
}

impl ControlBody {
    /// The type tag this body travels under.
    pub fn message_type(&self) -> MessageType {
        match self {
            ControlBody::Beacon(_) => MessageType::Beacon,
            ControlBody::Reply(_) => MessageType::Reply,
            ControlBody::ReplyBack(_) => MessageType::ReplyBack,
        }
    }
}

/// A data packet in transit between stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    /// Network-header snapshot of the original packet.
    pub header: PacketHeader,
    /// Flood-control header.
    pub data: DataHeader,
    /// Opaque application payload.
    pub payload: Bytes,
}

/// Any datagram a node can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram {
    /// Protocol-internal control message; never delivered upward.
    Control(ControlBody),
    /// Ordinary data packet.
    Data(DataFrame),
}

impl Datagram {
    /// Exact number of bytes `encode` produces.
    pub fn serialized_size(&self) -> usize {
        ControlMarker::WIRE_SIZE
            + match self {
                Datagram::Control(body) => {
                    TypeTag::WIRE_SIZE
                        + match body {
                            ControlBody::Beacon(h) => h.serialized_size(),
                            ControlBody::Reply(v) | ControlBody::ReplyBack(v) => {
                                v.serialized_size()
                            }
                        }
                }
                Datagram::Data(frame) => {
                    PACKET_HEADER_WIRE_SIZE + frame.data.serialized_size() + frame.payload.len()
                }
            }
    }

    /// Write the datagram in network byte order.
    pub fn encode(&self, buf: &mut impl BufMut) {
        match self {
            Datagram::Control(body) => {
                ControlMarker::Control.encode(buf);
                TypeTag::new(body.message_type()).encode(buf);
                match body {
                    ControlBody::Beacon(h) => h.encode(buf),
                    ControlBody::Reply(v) | ControlBody::ReplyBack(v) => v.encode(buf),
                }
            }
            Datagram::Data(frame) => {
                ControlMarker::NotSet.encode(buf);
                encode_packet_header(&frame.header, buf);
                frame.data.encode(buf);
                buf.put_slice(&frame.payload);
            }
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.serialized_size());
        self.encode(&mut buf);
        debug_assert_eq!(buf.len(), self.serialized_size());
        buf.freeze()
    }

    /// Decode a whole received datagram.
    ///
    /// Control messages with an unrecognized type tag are a
    /// [`WireError::UnknownMessageType`]; the caller logs and drops.
    pub fn decode(mut buf: Bytes) -> WireResult<Self> {
        let marker = ControlMarker::decode(&mut buf)?;
        if marker.is_control() {
            let tag = TypeTag::decode(&mut buf)?;
            let body = match tag {
                TypeTag::Invalid(byte) => return Err(WireError::UnknownMessageType(byte)),
                TypeTag::Valid(MessageType::Beacon) => {
                    ControlBody::Beacon(DataHeader::decode(&mut buf)?)
                }
                TypeTag::Valid(MessageType::Reply) => {
                    ControlBody::Reply(SummaryVector::decode(&mut buf)?)
                }
                TypeTag::Valid(MessageType::ReplyBack) => {
                    ControlBody::ReplyBack(SummaryVector::decode(&mut buf)?)
                }
            };
            Ok(Datagram::Control(body))
        } else {
            let header = decode_packet_header(&mut buf)?;
            let data = DataHeader::decode(&mut buf)?;
            let payload = buf;
            Ok(Datagram::Data(DataFrame {
                header,
                data,
                payload,
            }))
        }
    }
}
