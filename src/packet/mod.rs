
use std::fmt;

use bytes::Buf;
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::data_table::DataTableEntry;
use crate::entry::HintProtocol;
use crate::error::Error;
use crate::rtcp_packet::RtcpPacket;
use crate::rtp_packet::RtpPacket;

type Result<T> = std::result::Result<T, util::Error>;

/// One packet slot of a hint sample. The variant is decided by the track's
/// protocol, never by the sample itself.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum HintPacket {
    Rtp(RtpPacket),
    Rtcp(RtcpPacket),
}

impl fmt::Display for HintPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintPacket::Rtp(packet) => write!(f, "{}", packet),
            HintPacket::Rtcp(packet) => write!(f, "{}", packet),
        }
    }
}

impl HintPacket {
    /// Builds the empty packet variant matching the track's protocol.
    pub fn new(protocol: HintProtocol) -> Result<Self> {
        match protocol {
            HintProtocol::Rtp | HintProtocol::SecureRtp | HintProtocol::ReliableRtp => {
                Ok(HintPacket::Rtp(RtpPacket::default()))
            }
            HintProtocol::Rtcp => Ok(HintPacket::Rtcp(RtcpPacket::default())),
            HintProtocol::FileDelivery => Err(Error::UnsupportedProtocol.into()),
        }
    }

    /// Decodes the packet variant matching the track's protocol.
    pub fn unmarshal<B>(protocol: HintProtocol, raw_packet: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        match protocol {
            HintProtocol::Rtp | HintProtocol::SecureRtp | HintProtocol::ReliableRtp => {
                Ok(HintPacket::Rtp(RtpPacket::unmarshal(raw_packet)?))
            }
            HintProtocol::Rtcp => Ok(HintPacket::Rtcp(RtcpPacket::unmarshal(raw_packet)?)),
            HintProtocol::FileDelivery => Err(Error::UnsupportedProtocol.into()),
        }
    }

    /// Length of the packet once rebuilt for the network.
    pub fn wire_length(&self) -> usize {
        match self {
            HintPacket::Rtp(packet) => packet.wire_length(),
            HintPacket::Rtcp(packet) => packet.wire_length(),
        }
    }

    /// Inserts a payload descriptor at the front or the back of the data
    /// table. Only RTP packets own a data table.
    pub fn append_entry(&mut self, entry: DataTableEntry, at_begin: bool) -> Result<()> {
        match self {
            HintPacket::Rtp(packet) => {
                packet.append_entry(entry, at_begin);
                Ok(())
            }
            HintPacket::Rtcp(_) => Err(Error::InvalidOperation.into()),
        }
    }

    /// Adjusts every reference into hint sample `hint_sample_number` of the
    /// hint track itself after that sample's data moved by `delta` bytes.
    /// Only RTP packets own a data table.
    pub fn offset_data(&mut self, delta: u32, hint_sample_number: u32) -> Result<()> {
        match self {
            HintPacket::Rtp(packet) => {
                packet.offset_data(delta, hint_sample_number);
                Ok(())
            }
            HintPacket::Rtcp(_) => Err(Error::InvalidOperation.into()),
        }
    }
}

impl MarshalSize for HintPacket {
    fn marshal_size(&self) -> usize {
        match self {
            HintPacket::Rtp(packet) => packet.marshal_size(),
            HintPacket::Rtcp(packet) => packet.marshal_size(),
        }
    }
}

impl Marshal for HintPacket {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        match self {
            HintPacket::Rtp(packet) => packet.marshal_to(buf),
            HintPacket::Rtcp(packet) => packet.marshal_to(buf),
        }
    }
}
