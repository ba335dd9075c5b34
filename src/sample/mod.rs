
use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use util::marshal::{Marshal, MarshalSize};

use crate::boxes::{FourCc, RawBox, BOX_HEADER_LENGTH};
use crate::entry::HintProtocol;
use crate::error::Error;
use crate::packet::HintPacket;

type Result<T> = std::result::Result<T, util::Error>;

/// Top box type of a file-delivery hint sample.
pub const BOX_TYPE_FD_SAMPLE: FourCc = FourCc::new(b"fdsa");

/// Packet count plus the reserved word.
pub(crate) const SAMPLE_HEADER_LENGTH: usize = 4;

/// A packet-table hint sample: the stored packets of one access unit, in
/// transmission order, plus whatever opaque bytes the writer appended.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketSample {
    /// Protocol advertised by the track's sample entry; fixed at
    /// construction, one of the four packet protocols.
    pub protocol: HintProtocol,
    pub packets: Vec<HintPacket>,
    /// Bytes after the packet table, kept verbatim. Always empty for RTCP.
    pub trailing_data: Bytes,
    /// Read from and written back to the wire.
    pub reserved: u16,
    /// Owning track, for diagnostics only; never encoded.
    pub track_id: u32,
    /// Position in the owning track, for diagnostics only; never encoded.
    pub sample_number: u32,
}

/// One decoded hint sample.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum HintSample {
    /// RTP-family and RTCP tracks: an ordered packet table.
    Packets(PacketSample),
    /// File-delivery tracks: one opaque `fdsa` tree.
    FileDelivery(RawBox),
}

impl fmt::Display for HintSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintSample::Packets(sample) => write!(
                f,
                "{} hint sample: {} packets, {} trailing bytes",
                sample.protocol,
                sample.packets.len(),
                sample.trailing_data.len()
            ),
            HintSample::FileDelivery(fd) => {
                write!(f, "FDP hint sample: {} bytes", fd.marshal_size())
            }
        }
    }
}

impl HintSample {
    /// Builds the empty sample variant matching the track's protocol.
    pub fn new(protocol: HintProtocol) -> Self {
        match protocol {
            HintProtocol::FileDelivery => HintSample::FileDelivery(RawBox {
                box_type: BOX_TYPE_FD_SAMPLE,
                payload: Bytes::new(),
            }),
            _ => HintSample::Packets(PacketSample {
                protocol,
                packets: vec![],
                trailing_data: Bytes::new(),
                reserved: 0,
                track_id: 0,
                sample_number: 0,
            }),
        }
    }

    /// The protocol every operation of this sample dispatches on.
    pub fn protocol(&self) -> HintProtocol {
        match self {
            HintSample::Packets(sample) => sample.protocol,
            HintSample::FileDelivery(_) => HintProtocol::FileDelivery,
        }
    }

    /// Decodes one sample of `sample_size` bytes in the layout `protocol`
    /// prescribes.
    pub fn unmarshal<B>(protocol: HintProtocol, sample_size: u32, raw_sample: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        if protocol == HintProtocol::FileDelivery {
            if raw_sample.remaining() < BOX_HEADER_LENGTH {
                return Err(Error::TruncatedInput.into());
            }
            let size = raw_sample.get_u32() as usize;
            let box_type = FourCc(raw_sample.get_u32());
            if box_type != BOX_TYPE_FD_SAMPLE {
                log::error!(
                    "invalid file delivery sample, top box type {} not fdsa",
                    box_type
                );
                return Err(Error::InvalidMedia.into());
            }
            if size < BOX_HEADER_LENGTH {
                return Err(Error::InvalidFormat.into());
            }
            let payload_len = size - BOX_HEADER_LENGTH;
            if raw_sample.remaining() < payload_len {
                return Err(Error::TruncatedInput.into());
            }
            let payload = raw_sample.copy_to_bytes(payload_len);
            return Ok(HintSample::FileDelivery(RawBox { box_type, payload }));
        }

        let start = raw_sample.remaining();
        if start < SAMPLE_HEADER_LENGTH {
            return Err(Error::TruncatedInput.into());
        }
        let packet_count = raw_sample.get_u16();
        let reserved = raw_sample.get_u16();
        if u32::from(packet_count) >= sample_size {
            log::error!(
                "broken {} sample: {} packet_count indicated but only {} bytes in sample",
                protocol,
                packet_count,
                sample_size
            );
            return Err(Error::InvalidMedia.into());
        }

        let mut packets = Vec::with_capacity(packet_count as usize);
        for i in 0..packet_count {
            if !raw_sample.has_remaining() {
                log::error!(
                    "{} hint sample has no more data but still {} entries to read",
                    protocol,
                    packet_count - i
                );
                return Err(Error::InvalidMedia.into());
            }
            packets.push(HintPacket::unmarshal(protocol, raw_sample)?);
        }

        let mut trailing_data = Bytes::new();
        if protocol != HintProtocol::Rtcp {
            // whatever the declared size covers beyond the packet table is
            // an opaque blob the writer appended
            let consumed = (start - raw_sample.remaining()) as u32;
            if consumed < sample_size {
                let trailing_len = (sample_size - consumed) as usize;
                if raw_sample.remaining() < trailing_len {
                    return Err(Error::TruncatedInput.into());
                }
                let mut data = Vec::new();
                data.try_reserve_exact(trailing_len)
                    .map_err(|_| Error::OutOfMemory)?;
                data.resize(trailing_len, 0);
                raw_sample.copy_to_slice(&mut data);
                trailing_data = Bytes::from(data);
            }
        }

        Ok(HintSample::Packets(PacketSample {
            protocol,
            packets,
            trailing_data,
            reserved,
            track_id: 0,
            sample_number: 0,
        }))
    }
}

impl MarshalSize for HintSample {
    fn marshal_size(&self) -> usize {
        match self {
            HintSample::Packets(sample) => {
                let packets: usize = sample.packets.iter().map(|p| p.marshal_size()).sum();
                SAMPLE_HEADER_LENGTH + packets + sample.trailing_data.len()
            }
            HintSample::FileDelivery(fd) => fd.marshal_size(),
        }
    }
}

impl Marshal for HintSample {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort.into());
        }

        match self {
            HintSample::Packets(sample) => {
                buf.put_u16(sample.packets.len() as u16);
                buf.put_u16(sample.reserved);
                for packet in &sample.packets {
                    let n = packet.marshal_to(buf)?;
                    buf = &mut buf[n..];
                }
                buf.put(sample.trailing_data.clone());
            }
            HintSample::FileDelivery(fd) => {
                fd.marshal_to(buf)?;
            }
        }

        Ok(self.marshal_size())
    }
}
