#[cfg(test)]
mod data_table_test;

use bytes::{Buf, BufMut, Bytes};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;

type Result<T> = std::result::Result<T, util::Error>;

/// Every data table entry occupies exactly this many bytes on the wire,
/// its one-byte source discriminant included.
pub const ENTRY_LENGTH: usize = 16;

/// Inline capacity of an immediate entry.
pub const IMMEDIATE_DATA_LENGTH: usize = 14;

/// Filler emitted for empty entries; only its length is meaningful.
const EMPTY_FILLER: &[u8; 15] = b"empty hint DTE\0";

const SOURCE_EMPTY: u8 = 0;
const SOURCE_IMMEDIATE: u8 = 1;
const SOURCE_SAMPLE: u8 = 2;
const SOURCE_STREAM_DESC: u8 = 3;

/// Which track a reference entry points into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackRef {
    /// The hint track itself.
    This,
    /// An entry of the hint track's reference list, stored as read.
    Index(u8),
}

impl TrackRef {
    /// On the wire -1 is the hint track itself and -2 a reference that has
    /// not been resolved yet; anything else indexes the reference list.
    fn to_wire(track_ref: Option<TrackRef>) -> i8 {
        match track_ref {
            None => -2,
            Some(TrackRef::This) => -1,
            Some(TrackRef::Index(index)) => index as i8,
        }
    }

    fn from_wire(value: i8) -> Option<TrackRef> {
        match value {
            -2 => None,
            -1 => Some(TrackRef::This),
            index => Some(TrackRef::Index(index as u8)),
        }
    }
}

/// Up to 14 bytes carried inline in the packet's data table.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct ImmediateEntry {
    pub data: Bytes,
}

impl ImmediateEntry {
    /// Keeps at most the first [`IMMEDIATE_DATA_LENGTH`] bytes; callers
    /// split longer runs across several entries.
    pub fn new(data: &[u8]) -> Self {
        let n = data.len().min(IMMEDIATE_DATA_LENGTH);
        ImmediateEntry {
            data: Bytes::copy_from_slice(&data[..n]),
        }
    }
}

/// A run of bytes inside a sample of this or another track.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SampleReferenceEntry {
    pub track_ref: Option<TrackRef>,
    pub length: u16,
    pub sample_number: u32,
    pub byte_offset: u32,
    /// Expected to be 1; other values are accepted and logged.
    pub bytes_per_block: u16,
    /// Expected to be 1; other values are accepted and logged.
    pub samples_per_block: u16,
}

impl Default for SampleReferenceEntry {
    fn default() -> Self {
        SampleReferenceEntry {
            track_ref: None,
            length: 0,
            sample_number: 0,
            byte_offset: 0,
            bytes_per_block: 1,
            samples_per_block: 1,
        }
    }
}

/// A run of bytes inside a sample description record. Carried through the
/// codec but never resolved by packet rebuilders.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct StreamDescReferenceEntry {
    pub track_ref: Option<TrackRef>,
    pub length: u16,
    pub stream_desc_index: u32,
    pub byte_offset: u32,
    pub reserved: u32,
}

/// One segment-source descriptor of an RTP hint packet's payload assembly
/// list.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DataTableEntry {
    Empty,
    Immediate(ImmediateEntry),
    SampleReference(SampleReferenceEntry),
    StreamDescReference(StreamDescReferenceEntry),
}

impl DataTableEntry {
    /// The wire discriminant of this entry.
    pub fn source(&self) -> u8 {
        match self {
            DataTableEntry::Empty => SOURCE_EMPTY,
            DataTableEntry::Immediate(_) => SOURCE_IMMEDIATE,
            DataTableEntry::SampleReference(_) => SOURCE_SAMPLE,
            DataTableEntry::StreamDescReference(_) => SOURCE_STREAM_DESC,
        }
    }

    /// Bytes this entry contributes to the rebuilt network packet.
    pub fn payload_length(&self) -> usize {
        match self {
            DataTableEntry::Empty => 0,
            DataTableEntry::Immediate(entry) => entry.data.len(),
            DataTableEntry::SampleReference(entry) => entry.length as usize,
            DataTableEntry::StreamDescReference(entry) => entry.length as usize,
        }
    }

    /// Shifts a reference that points back into the rewritten hint sample
    /// itself. Cross-track and cross-sample references never move.
    pub fn offset(&mut self, delta: u32, hint_sample_number: u32) {
        if let DataTableEntry::SampleReference(entry) = self {
            if entry.track_ref == Some(TrackRef::This)
                && entry.sample_number == hint_sample_number
            {
                entry.byte_offset = entry.byte_offset.wrapping_add(delta);
            }
        }
    }
}

impl MarshalSize for DataTableEntry {
    fn marshal_size(&self) -> usize {
        ENTRY_LENGTH
    }
}

impl Marshal for DataTableEntry {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < ENTRY_LENGTH {
            return Err(Error::BufferTooShort.into());
        }

        buf.put_u8(self.source());
        match self {
            DataTableEntry::Empty => {
                buf.put_slice(EMPTY_FILLER);
            }
            DataTableEntry::Immediate(entry) => {
                if entry.data.len() > IMMEDIATE_DATA_LENGTH {
                    return Err(Error::InvalidFormat.into());
                }
                buf.put_u8(entry.data.len() as u8);
                buf.put(entry.data.clone());
                buf.put_bytes(0, IMMEDIATE_DATA_LENGTH - entry.data.len());
            }
            DataTableEntry::SampleReference(entry) => {
                buf.put_i8(TrackRef::to_wire(entry.track_ref));
                buf.put_u16(entry.length);
                buf.put_u32(entry.sample_number);
                buf.put_u32(entry.byte_offset);
                buf.put_u16(entry.bytes_per_block);
                buf.put_u16(entry.samples_per_block);
            }
            DataTableEntry::StreamDescReference(entry) => {
                buf.put_i8(TrackRef::to_wire(entry.track_ref));
                buf.put_u16(entry.length);
                buf.put_u32(entry.stream_desc_index);
                buf.put_u32(entry.byte_offset);
                buf.put_u32(entry.reserved);
            }
        }

        Ok(ENTRY_LENGTH)
    }
}

impl Unmarshal for DataTableEntry {
    fn unmarshal<B>(raw_entry: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_entry.remaining() < ENTRY_LENGTH {
            return Err(Error::TruncatedInput.into());
        }

        let source = raw_entry.get_u8();
        match source {
            SOURCE_EMPTY => {
                // empty, but always 15 bytes
                raw_entry.advance(ENTRY_LENGTH - 1);
                Ok(DataTableEntry::Empty)
            }
            SOURCE_IMMEDIATE => {
                let data_length = raw_entry.get_u8() as usize;
                if data_length > IMMEDIATE_DATA_LENGTH {
                    return Err(Error::InvalidFormat.into());
                }
                let data = raw_entry.copy_to_bytes(data_length);
                raw_entry.advance(IMMEDIATE_DATA_LENGTH - data_length);
                Ok(DataTableEntry::Immediate(ImmediateEntry { data }))
            }
            SOURCE_SAMPLE => {
                let track_ref = TrackRef::from_wire(raw_entry.get_i8());
                let length = raw_entry.get_u16();
                let sample_number = raw_entry.get_u32();
                let byte_offset = raw_entry.get_u32();
                let bytes_per_block = raw_entry.get_u16();
                let samples_per_block = raw_entry.get_u16();
                if bytes_per_block != 1 {
                    log::warn!(
                        "hint packet constructor with bytes_per_block {}, not 1",
                        bytes_per_block
                    );
                }
                if samples_per_block != 1 {
                    log::warn!(
                        "hint packet constructor with samples_per_block {}, not 1",
                        samples_per_block
                    );
                }
                Ok(DataTableEntry::SampleReference(SampleReferenceEntry {
                    track_ref,
                    length,
                    sample_number,
                    byte_offset,
                    bytes_per_block,
                    samples_per_block,
                }))
            }
            SOURCE_STREAM_DESC => {
                let track_ref = TrackRef::from_wire(raw_entry.get_i8());
                let length = raw_entry.get_u16();
                let stream_desc_index = raw_entry.get_u32();
                let byte_offset = raw_entry.get_u32();
                let reserved = raw_entry.get_u32();
                Ok(DataTableEntry::StreamDescReference(
                    StreamDescReferenceEntry {
                        track_ref,
                        length,
                        stream_desc_index,
                        byte_offset,
                        reserved,
                    },
                ))
            }
            _ => {
                log::error!("invalid data table entry source {}", source);
                Err(Error::InvalidFormat.into())
            }
        }
    }
}
