#[cfg(test)]
mod rtcp_packet_test;

use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;

type Result<T> = std::result::Result<T, util::Error>;

pub(crate) const PACKET_HEADER_LENGTH: usize = 4;

const WORD_LENGTH: usize = 4;

const VERSION_SHIFT: u8 = 6;
const VERSION_MASK: u8 = 0x3;
const PADDING_SHIFT: u8 = 5;
const PADDING_MASK: u8 = 0x1;
const COUNT_MASK: u8 = 0x1f;
const COUNT_MAX: u8 = (1 << 5) - 1;

/// One stored RTCP packet of a hint sample, kept as its 4-byte header plus
/// the verbatim word-aligned payload. A legacy layout: current writers emit
/// RTCP through the regular packetizer instead.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct RtcpPacket {
    /// 2-bit RTCP version.
    pub version: u8,
    pub padding: bool,
    /// 5-bit reception report count.
    pub report_count: u8,
    pub payload_type: u8,
    /// Everything after the header, a whole number of 32-bit words.
    pub data: Bytes,
}

impl fmt::Display for RtcpPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RTCP hint packet: pt {}, {} payload words",
            self.payload_type,
            self.word_length()
        )
    }
}

impl RtcpPacket {
    /// Payload length in 32-bit words, the form stored on the wire.
    pub fn word_length(&self) -> u16 {
        (self.data.len() / WORD_LENGTH) as u16
    }

    /// Length of the packet once rebuilt for the network.
    pub fn wire_length(&self) -> usize {
        PACKET_HEADER_LENGTH + self.data.len()
    }
}

impl MarshalSize for RtcpPacket {
    fn marshal_size(&self) -> usize {
        PACKET_HEADER_LENGTH + self.data.len()
    }
}

impl Marshal for RtcpPacket {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        // a header with no payload words is invalid, as on read
        if self.data.is_empty() || self.data.len() % WORD_LENGTH != 0 {
            return Err(Error::InvalidMedia.into());
        }
        if self.report_count > COUNT_MAX {
            return Err(Error::InvalidFormat.into());
        }
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort.into());
        }

        let b0 = ((self.version & VERSION_MASK) << VERSION_SHIFT)
            | ((self.padding as u8) << PADDING_SHIFT)
            | (self.report_count & COUNT_MASK);
        buf.put_u8(b0);
        buf.put_u8(self.payload_type);
        buf.put_u16(self.word_length());
        buf.put(self.data.clone());

        Ok(self.marshal_size())
    }
}

impl Unmarshal for RtcpPacket {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < PACKET_HEADER_LENGTH {
            return Err(Error::TruncatedInput.into());
        }

        let b0 = raw_packet.get_u8();
        let version = (b0 >> VERSION_SHIFT) & VERSION_MASK;
        let padding = (b0 >> PADDING_SHIFT) & PADDING_MASK == 1;
        let report_count = b0 & COUNT_MASK;
        let payload_type = raw_packet.get_u8();

        let byte_length = raw_packet.get_u16() as usize * WORD_LENGTH;
        if byte_length < WORD_LENGTH {
            return Err(Error::InvalidMedia.into());
        }
        if raw_packet.remaining() < byte_length {
            log::warn!(
                "RTCP hint packet has more data ({}) than available",
                byte_length
            );
            return Err(Error::InvalidMedia.into());
        }

        let mut data = Vec::new();
        data.try_reserve_exact(byte_length)
            .map_err(|_| Error::OutOfMemory)?;
        data.resize(byte_length, 0);
        raw_packet.copy_to_slice(&mut data);

        Ok(RtcpPacket {
            version,
            padding,
            report_count,
            payload_type,
            data: Bytes::from(data),
        })
    }
}
