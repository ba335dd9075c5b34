
use std::fmt;

use bytes::{Buf, BufMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::boxes::{boxes_size, write_boxes, HintBox};
use crate::data_table::{DataTableEntry, ENTRY_LENGTH};
use crate::error::Error;

type Result<T> = std::result::Result<T, util::Error>;

/// Fixed part of the stored packet: relative time, RTP header fields,
/// flags and the entry count.
pub(crate) const PACKET_PRELUDE_LENGTH: usize = 12;

/// The TLV total-size field counts itself.
const TLV_SIZE_LENGTH: usize = 4;

/// RTP header and SSRC of the rebuilt packet.
const RTP_HEADER_LENGTH: usize = 8;
const SSRC_LENGTH: usize = 4;

const RTP_VERSION: u8 = 2;
const VERSION_SHIFT: u8 = 6;
const PADDING_SHIFT: u8 = 5;
const PADDING_MASK: u8 = 0x1;
const EXTENSION_SHIFT: u8 = 4;
const EXTENSION_MASK: u8 = 0x1;
const MARKER_SHIFT: u8 = 7;
const MARKER_MASK: u8 = 0x1;
const PT_MASK: u8 = 0x7F;

const HAS_TLV_SHIFT: u8 = 2;
const HAS_TLV_MASK: u8 = 0x1;
const DISPOSABLE_SHIFT: u8 = 1;
const DISPOSABLE_MASK: u8 = 0x1;
const REPEATED_MASK: u8 = 0x1;

/// One stored RTP packet of a hint sample: the header fields to emit and
/// the data table describing where its payload bytes come from.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct RtpPacket {
    /// Offset from the hint sample's timestamp, in the hint timescale.
    pub relative_transmission_time: i32,
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    /// 7-bit RTP payload type.
    pub payload_type: u8,
    pub sequence_number: u16,
    /// The packet may be dropped when late (B-frames and co).
    pub is_disposable: bool,
    /// The same packet has been sent before.
    pub is_repeated: bool,
    /// Extension boxes, e.g. a timestamp offset.
    pub tlv: Vec<HintBox>,
    /// Payload segment descriptors; concatenation order is payload order.
    pub data_table: Vec<DataTableEntry>,
}

impl fmt::Display for RtpPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = "RTP hint packet:\n".to_string();
        out += format!("\tSequence Number: {}\n", self.sequence_number).as_str();
        out += format!("\tPayload Type: {}\n", self.payload_type).as_str();
        out += format!("\tMarker: {}\n", self.marker).as_str();
        out += format!(
            "\tRelative Transmission Time: {}\n",
            self.relative_transmission_time
        )
        .as_str();
        out += format!("\tTLV Count: {}\n", self.tlv.len()).as_str();
        out += format!("\tData Table Entries: {}\n", self.data_table.len()).as_str();

        write!(f, "{}", out)
    }
}

impl RtpPacket {
    /// Length of the packet once rebuilt for the network, SSRC included
    /// but without any CSRC fields.
    pub fn wire_length(&self) -> usize {
        let payload: usize = self
            .data_table
            .iter()
            .map(|entry| entry.payload_length())
            .sum();
        RTP_HEADER_LENGTH + SSRC_LENGTH + payload
    }

    /// Inserts a payload descriptor at the front or the back of the data
    /// table.
    pub fn append_entry(&mut self, entry: DataTableEntry, at_begin: bool) {
        if at_begin {
            self.data_table.insert(0, entry);
        } else {
            self.data_table.push(entry);
        }
    }

    /// Adjusts every reference into hint sample `hint_sample_number` of the
    /// hint track itself after that sample's data moved by `delta` bytes.
    pub fn offset_data(&mut self, delta: u32, hint_sample_number: u32) {
        for entry in &mut self.data_table {
            entry.offset(delta, hint_sample_number);
        }
    }
}

impl MarshalSize for RtpPacket {
    fn marshal_size(&self) -> usize {
        let mut size = PACKET_PRELUDE_LENGTH;
        if !self.tlv.is_empty() {
            size += TLV_SIZE_LENGTH + boxes_size(&self.tlv);
        }
        size + self.data_table.len() * ENTRY_LENGTH
    }
}

impl Marshal for RtpPacket {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort.into());
        }

        buf.put_u32(self.relative_transmission_time as u32);

        let b0 = (RTP_VERSION << VERSION_SHIFT)
            | ((self.padding as u8) << PADDING_SHIFT)
            | ((self.extension as u8) << EXTENSION_SHIFT);
        buf.put_u8(b0);
        buf.put_u8(((self.marker as u8) << MARKER_SHIFT) | (self.payload_type & PT_MASK));

        buf.put_u16(self.sequence_number);

        buf.put_u8(0);
        let mut flags = ((self.is_disposable as u8) << DISPOSABLE_SHIFT)
            | (self.is_repeated as u8 & REPEATED_MASK);
        if !self.tlv.is_empty() {
            flags |= 1 << HAS_TLV_SHIFT;
        }
        buf.put_u8(flags);

        buf.put_u16(self.data_table.len() as u16);

        if !self.tlv.is_empty() {
            buf.put_u32((TLV_SIZE_LENGTH + boxes_size(&self.tlv)) as u32);
            let n = write_boxes(&self.tlv, buf)?;
            buf = &mut buf[n..];
        }

        for entry in &self.data_table {
            let n = entry.marshal_to(buf)?;
            buf = &mut buf[n..];
        }

        Ok(self.marshal_size())
    }
}

impl Unmarshal for RtpPacket {
    /// Decodes one stored packet. Reference and immediate entries whose
    /// declared payload length is zero contribute nothing to the rebuilt
    /// packet and are dropped from the in-memory table, so re-encoding a
    /// sample that contained them is smaller than its source bytes.
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < PACKET_PRELUDE_LENGTH {
            return Err(Error::TruncatedInput.into());
        }

        let relative_transmission_time = raw_packet.get_u32() as i32;

        let b0 = raw_packet.get_u8();
        let padding = (b0 >> PADDING_SHIFT) & PADDING_MASK == 1;
        let extension = (b0 >> EXTENSION_SHIFT) & EXTENSION_MASK == 1;
        let b1 = raw_packet.get_u8();
        let marker = (b1 >> MARKER_SHIFT) & MARKER_MASK == 1;
        let payload_type = b1 & PT_MASK;

        let sequence_number = raw_packet.get_u16();

        raw_packet.advance(1);
        let b3 = raw_packet.get_u8();
        let has_tlv = (b3 >> HAS_TLV_SHIFT) & HAS_TLV_MASK == 1;
        let is_disposable = (b3 >> DISPOSABLE_SHIFT) & DISPOSABLE_MASK == 1;
        let is_repeated = b3 & REPEATED_MASK == 1;

        let entry_count = raw_packet.get_u16();

        let mut tlv = vec![];
        if has_tlv {
            if raw_packet.remaining() < TLV_SIZE_LENGTH {
                return Err(Error::TruncatedInput.into());
            }
            let tlv_size = raw_packet.get_u32() as usize;
            if tlv_size < TLV_SIZE_LENGTH {
                return Err(Error::InvalidFormat.into());
            }
            // the total includes its own size field
            let mut consumed = TLV_SIZE_LENGTH;
            while consumed < tlv_size {
                let b = HintBox::unmarshal(raw_packet)?;
                consumed += b.marshal_size();
                tlv.push(b);
            }
            if consumed != tlv_size {
                return Err(Error::InvalidFormat.into());
            }
        }

        let mut data_table = vec![];
        for _ in 0..entry_count {
            let entry = DataTableEntry::unmarshal(raw_packet)?;
            match entry {
                DataTableEntry::Empty => data_table.push(entry),
                _ if entry.payload_length() > 0 => data_table.push(entry),
                _ => {}
            }
        }

        Ok(RtpPacket {
            relative_transmission_time,
            padding,
            extension,
            marker,
            payload_type,
            sequence_number,
            is_disposable,
            is_repeated,
            tlv,
            data_table,
        })
    }
}
