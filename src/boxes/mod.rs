
use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Error;

type Result<T> = std::result::Result<T, util::Error>;

/// Number of bytes in the size/type prefix shared by every box.
pub const BOX_HEADER_LENGTH: usize = 8;

/// `rtpo`: signed offset applied to the RTP timestamp of one packet.
pub const BOX_TYPE_TIMESTAMP_OFFSET: FourCc = FourCc::new(b"rtpo");
/// `tims`: RTP timescale advertised by a hint sample entry.
pub const BOX_TYPE_TIMESCALE: FourCc = FourCc::new(b"tims");
/// `tsro`: random offset added to every RTP timestamp of the track.
pub const BOX_TYPE_TIME_OFFSET: FourCc = FourCc::new(b"tsro");
/// `snro`: random offset added to every RTP sequence number of the track.
pub const BOX_TYPE_SEQUENCE_OFFSET: FourCc = FourCc::new(b"snro");

/// A four-character box or sample-entry type code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct FourCc(pub u32);

impl FourCc {
    pub const fn new(code: &[u8; 4]) -> Self {
        FourCc(u32::from_be_bytes(*code))
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0.to_be_bytes() {
            if c.is_ascii_graphic() || *c == b' ' {
                write!(f, "{}", *c as char)?;
            } else {
                write!(f, "\\x{:02x}", c)?;
            }
        }
        Ok(())
    }
}

/// A box this crate does not interpret: size/type header plus verbatim
/// payload.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct RawBox {
    pub box_type: FourCc,
    pub payload: Bytes,
}

impl fmt::Display for RawBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawBox({}, {} bytes)", self.box_type, self.payload.len())
    }
}

impl MarshalSize for RawBox {
    fn marshal_size(&self) -> usize {
        BOX_HEADER_LENGTH + self.payload.len()
    }
}

impl Marshal for RawBox {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < self.marshal_size() {
            return Err(Error::BufferTooShort.into());
        }

        buf.put_u32(self.marshal_size() as u32);
        buf.put_u32(self.box_type.0);
        buf.put(self.payload.clone());

        Ok(self.marshal_size())
    }
}

impl Unmarshal for RawBox {
    fn unmarshal<B>(raw_box: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let (box_type, payload_len) = read_box_header(raw_box)?;
        if raw_box.remaining() < payload_len {
            return Err(Error::TruncatedInput.into());
        }

        let payload = raw_box.copy_to_bytes(payload_len);

        Ok(RawBox { box_type, payload })
    }
}

/// The boxes that occur inside hint structures: parsed when the type is
/// known, kept verbatim otherwise.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum HintBox {
    /// `rtpo`: offset to apply to the packet's RTP timestamp.
    TimestampOffset(i32),
    /// `tims`: RTP timescale of the stream.
    Timescale(u32),
    /// `tsro`: timestamp random offset.
    TimeOffset(u32),
    /// `snro`: sequence number random offset.
    SequenceOffset(u32),
    /// Anything else, byte-preserving.
    Raw(RawBox),
}

impl HintBox {
    pub fn box_type(&self) -> FourCc {
        match self {
            HintBox::TimestampOffset(_) => BOX_TYPE_TIMESTAMP_OFFSET,
            HintBox::Timescale(_) => BOX_TYPE_TIMESCALE,
            HintBox::TimeOffset(_) => BOX_TYPE_TIME_OFFSET,
            HintBox::SequenceOffset(_) => BOX_TYPE_SEQUENCE_OFFSET,
            HintBox::Raw(raw) => raw.box_type,
        }
    }
}

impl fmt::Display for HintBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl MarshalSize for HintBox {
    fn marshal_size(&self) -> usize {
        match self {
            HintBox::Raw(raw) => raw.marshal_size(),
            // all interpreted boxes carry a single 32-bit payload
            _ => BOX_HEADER_LENGTH + 4,
        }
    }
}

impl Marshal for HintBox {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        let size = self.marshal_size();
        if buf.remaining_mut() < size {
            return Err(Error::BufferTooShort.into());
        }

        match self {
            HintBox::TimestampOffset(offset) => {
                put_box_header(&mut buf, BOX_TYPE_TIMESTAMP_OFFSET, size);
                buf.put_i32(*offset);
            }
            HintBox::Timescale(timescale) => {
                put_box_header(&mut buf, BOX_TYPE_TIMESCALE, size);
                buf.put_u32(*timescale);
            }
            HintBox::TimeOffset(offset) => {
                put_box_header(&mut buf, BOX_TYPE_TIME_OFFSET, size);
                buf.put_u32(*offset);
            }
            HintBox::SequenceOffset(offset) => {
                put_box_header(&mut buf, BOX_TYPE_SEQUENCE_OFFSET, size);
                buf.put_u32(*offset);
            }
            HintBox::Raw(raw) => {
                raw.marshal_to(buf)?;
            }
        }

        Ok(size)
    }
}

impl Unmarshal for HintBox {
    fn unmarshal<B>(raw_box: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let (box_type, payload_len) = read_box_header(raw_box)?;
        if raw_box.remaining() < payload_len {
            return Err(Error::TruncatedInput.into());
        }

        match box_type {
            BOX_TYPE_TIMESTAMP_OFFSET => {
                check_u32_payload(payload_len)?;
                Ok(HintBox::TimestampOffset(raw_box.get_i32()))
            }
            BOX_TYPE_TIMESCALE => {
                check_u32_payload(payload_len)?;
                Ok(HintBox::Timescale(raw_box.get_u32()))
            }
            BOX_TYPE_TIME_OFFSET => {
                check_u32_payload(payload_len)?;
                Ok(HintBox::TimeOffset(raw_box.get_u32()))
            }
            BOX_TYPE_SEQUENCE_OFFSET => {
                check_u32_payload(payload_len)?;
                Ok(HintBox::SequenceOffset(raw_box.get_u32()))
            }
            _ => {
                let payload = raw_box.copy_to_bytes(payload_len);
                Ok(HintBox::Raw(RawBox { box_type, payload }))
            }
        }
    }
}

fn read_box_header<B: Buf>(buf: &mut B) -> Result<(FourCc, usize)> {
    if buf.remaining() < BOX_HEADER_LENGTH {
        return Err(Error::TruncatedInput.into());
    }

    let size = buf.get_u32() as usize;
    let box_type = FourCc(buf.get_u32());
    if size < BOX_HEADER_LENGTH {
        return Err(Error::InvalidFormat.into());
    }

    Ok((box_type, size - BOX_HEADER_LENGTH))
}

fn put_box_header<B: BufMut>(buf: &mut B, box_type: FourCc, size: usize) {
    buf.put_u32(size as u32);
    buf.put_u32(box_type.0);
}

fn check_u32_payload(payload_len: usize) -> Result<()> {
    if payload_len != 4 {
        Err(Error::InvalidFormat.into())
    } else {
        Ok(())
    }
}

/// Reads boxes until the buffer is exhausted.
pub(crate) fn read_boxes<B: Buf>(buf: &mut B) -> Result<Vec<HintBox>> {
    let mut boxes = vec![];
    while buf.has_remaining() {
        boxes.push(HintBox::unmarshal(buf)?);
    }
    Ok(boxes)
}

pub(crate) fn boxes_size(boxes: &[HintBox]) -> usize {
    boxes.iter().map(|b| b.marshal_size()).sum()
}

pub(crate) fn write_boxes(boxes: &[HintBox], mut buf: &mut [u8]) -> Result<usize> {
    let mut written = 0;
    for b in boxes {
        let n = b.marshal_to(buf)?;
        buf = &mut buf[n..];
        written += n;
    }
    Ok(written)
}
