
use std::convert::TryFrom;
use std::fmt;

use bytes::{Buf, BufMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::boxes::{boxes_size, read_boxes, write_boxes, FourCc, HintBox, BOX_HEADER_LENGTH};
use crate::error::Error;

type Result<T> = std::result::Result<T, util::Error>;

pub const SAMPLE_ENTRY_TYPE_RTP: FourCc = FourCc::new(b"rtp ");
pub const SAMPLE_ENTRY_TYPE_SRTP: FourCc = FourCc::new(b"srtp");
pub const SAMPLE_ENTRY_TYPE_RRTP: FourCc = FourCc::new(b"rrtp");
pub const SAMPLE_ENTRY_TYPE_RTCP: FourCc = FourCc::new(b"rtcp");
pub const SAMPLE_ENTRY_TYPE_FDP: FourCc = FourCc::new(b"fdp ");

/// Reserved bytes every sample entry starts with.
const SAMPLE_ENTRY_RESERVED_LENGTH: usize = 6;

/// Reserved bytes, data reference index, the version pair and the 4-byte
/// protocol trailer.
const FIXED_FIELDS_LENGTH: usize = 16;

/// The delivery protocol a hint track describes, from the fourcc of its
/// sample entry. Fixed at track creation; every sample of the track is
/// decoded in this protocol's layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HintProtocol {
    Rtp,
    SecureRtp,
    ReliableRtp,
    Rtcp,
    FileDelivery,
}

impl HintProtocol {
    pub fn fourcc(self) -> FourCc {
        match self {
            HintProtocol::Rtp => SAMPLE_ENTRY_TYPE_RTP,
            HintProtocol::SecureRtp => SAMPLE_ENTRY_TYPE_SRTP,
            HintProtocol::ReliableRtp => SAMPLE_ENTRY_TYPE_RRTP,
            HintProtocol::Rtcp => SAMPLE_ENTRY_TYPE_RTCP,
            HintProtocol::FileDelivery => SAMPLE_ENTRY_TYPE_FDP,
        }
    }
}

impl TryFrom<FourCc> for HintProtocol {
    type Error = Error;

    fn try_from(fourcc: FourCc) -> std::result::Result<Self, Error> {
        match fourcc {
            SAMPLE_ENTRY_TYPE_RTP => Ok(HintProtocol::Rtp),
            SAMPLE_ENTRY_TYPE_SRTP => Ok(HintProtocol::SecureRtp),
            SAMPLE_ENTRY_TYPE_RRTP => Ok(HintProtocol::ReliableRtp),
            SAMPLE_ENTRY_TYPE_RTCP => Ok(HintProtocol::Rtcp),
            SAMPLE_ENTRY_TYPE_FDP => Ok(HintProtocol::FileDelivery),
            _ => Err(Error::UnsupportedProtocol),
        }
    }
}

impl fmt::Display for HintProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HintProtocol::Rtp => "RTP",
            HintProtocol::SecureRtp => "SRTP",
            HintProtocol::ReliableRtp => "RRTP",
            HintProtocol::Rtcp => "RTCP",
            HintProtocol::FileDelivery => "FDP",
        };
        write!(f, "{}", s)
    }
}

/// Protocol-dependent trailer of the entry. The slot is 4 bytes either way.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtocolParams {
    /// Largest packet, in bytes, the track's packetizer may emit.
    Packet { max_packet_size: u32 },
    /// FEC partition bookkeeping of a file-delivery session.
    FileDelivery {
        partition_entry_id: u16,
        fec_overhead: u16,
    },
}

/// The `rtp `/`srtp`/`rrtp`/`rtcp`/`fdp ` sample entry of a hint track.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HintSampleEntry {
    pub protocol: HintProtocol,
    pub data_reference_index: u16,
    pub hint_track_version: u16,
    pub last_compatible_version: u16,
    pub params: ProtocolParams,
    /// Trailing child boxes, e.g. `tims`/`tsro`/`snro` for RTP tracks.
    pub children: Vec<HintBox>,
}

impl HintSampleEntry {
    /// New entry advertising the version pair every current writer uses.
    pub fn new(protocol: HintProtocol) -> Self {
        let params = match protocol {
            HintProtocol::FileDelivery => ProtocolParams::FileDelivery {
                partition_entry_id: 0,
                fec_overhead: 0,
            },
            _ => ProtocolParams::Packet { max_packet_size: 0 },
        };
        HintSampleEntry {
            protocol,
            data_reference_index: 1,
            hint_track_version: 1,
            last_compatible_version: 1,
            params,
            children: vec![],
        }
    }
}

impl MarshalSize for HintSampleEntry {
    fn marshal_size(&self) -> usize {
        BOX_HEADER_LENGTH + FIXED_FIELDS_LENGTH + boxes_size(&self.children)
    }
}

impl Marshal for HintSampleEntry {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        let params_match = match self.params {
            ProtocolParams::Packet { .. } => self.protocol != HintProtocol::FileDelivery,
            ProtocolParams::FileDelivery { .. } => self.protocol == HintProtocol::FileDelivery,
        };
        if !params_match {
            return Err(Error::InvalidFormat.into());
        }
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort.into());
        }

        buf.put_u32(self.marshal_size() as u32);
        buf.put_u32(self.protocol.fourcc().0);
        buf.put_bytes(0, SAMPLE_ENTRY_RESERVED_LENGTH);
        buf.put_u16(self.data_reference_index);
        buf.put_u16(self.hint_track_version);
        buf.put_u16(self.last_compatible_version);
        match self.params {
            ProtocolParams::Packet { max_packet_size } => buf.put_u32(max_packet_size),
            ProtocolParams::FileDelivery {
                partition_entry_id,
                fec_overhead,
            } => {
                buf.put_u16(partition_entry_id);
                buf.put_u16(fec_overhead);
            }
        }
        write_boxes(&self.children, buf)?;

        Ok(self.marshal_size())
    }
}

impl Unmarshal for HintSampleEntry {
    fn unmarshal<B>(raw_entry: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_entry.remaining() < BOX_HEADER_LENGTH {
            return Err(Error::TruncatedInput.into());
        }
        let size = raw_entry.get_u32() as usize;
        let protocol = HintProtocol::try_from(FourCc(raw_entry.get_u32()))?;
        if size < BOX_HEADER_LENGTH + FIXED_FIELDS_LENGTH {
            return Err(Error::InvalidFormat.into());
        }
        let body_len = size - BOX_HEADER_LENGTH;
        if raw_entry.remaining() < body_len {
            return Err(Error::TruncatedInput.into());
        }

        raw_entry.advance(SAMPLE_ENTRY_RESERVED_LENGTH);
        let data_reference_index = raw_entry.get_u16();
        let hint_track_version = raw_entry.get_u16();
        let last_compatible_version = raw_entry.get_u16();
        let params = match protocol {
            HintProtocol::FileDelivery => ProtocolParams::FileDelivery {
                partition_entry_id: raw_entry.get_u16(),
                fec_overhead: raw_entry.get_u16(),
            },
            _ => ProtocolParams::Packet {
                max_packet_size: raw_entry.get_u32(),
            },
        };

        let mut rest = raw_entry.take(body_len - FIXED_FIELDS_LENGTH);
        let children = read_boxes(&mut rest)?;

        Ok(HintSampleEntry {
            protocol,
            data_reference_index,
            hint_track_version,
            last_compatible_version,
            params,
            children,
        })
    }
}
