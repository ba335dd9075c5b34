use bytes::Bytes;

use super::*;

#[test]
fn test_data_table_entry_unmarshal() {
    let tests = vec![
        (
            "empty",
            Bytes::from_static(&[
                0x00, // source=0
                0x65, 0x6d, 0x70, 0x74, 0x79, 0x20, 0x68, 0x69, // filler,
                0x6e, 0x74, 0x20, 0x44, 0x54, 0x45, 0x00, // content irrelevant
            ]),
            Some(DataTableEntry::Empty),
            None,
        ),
        (
            "immediate",
            Bytes::from_static(&[
                0x01, // source=1
                0x05, // length=5
                0x68, 0x65, 0x6c, 0x6c, 0x6f, // "hello"
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // padding
            ]),
            Some(DataTableEntry::Immediate(ImmediateEntry {
                data: Bytes::from_static(b"hello"),
            })),
            None,
        ),
        (
            "sample reference, same track",
            Bytes::from_static(&[
                0x02, // source=2
                0xff, // trackRefIndex=-1
                0x00, 0x20, // length=32
                0x00, 0x00, 0x00, 0x07, // sampleNumber=7
                0x00, 0x00, 0x00, 0x64, // byteOffset=100
                0x00, 0x01, // bytesPerBlock=1
                0x00, 0x01, // samplesPerBlock=1
            ]),
            Some(DataTableEntry::SampleReference(SampleReferenceEntry {
                track_ref: Some(TrackRef::This),
                length: 32,
                sample_number: 7,
                byte_offset: 100,
                bytes_per_block: 1,
                samples_per_block: 1,
            })),
            None,
        ),
        (
            "sample reference, unresolved track",
            Bytes::from_static(&[
                0x02, // source=2
                0xfe, // trackRefIndex=-2
                0x00, 0x01, // length=1
                0x00, 0x00, 0x00, 0x01, // sampleNumber=1
                0x00, 0x00, 0x00, 0x00, // byteOffset=0
                0x00, 0x02, // bytesPerBlock=2, logged but kept
                0x00, 0x01, // samplesPerBlock=1
            ]),
            Some(DataTableEntry::SampleReference(SampleReferenceEntry {
                track_ref: None,
                length: 1,
                sample_number: 1,
                byte_offset: 0,
                bytes_per_block: 2,
                samples_per_block: 1,
            })),
            None,
        ),
        (
            "stream description reference",
            Bytes::from_static(&[
                0x03, // source=3
                0x02, // trackRefIndex=2
                0x00, 0x08, // length=8
                0x00, 0x00, 0x00, 0x01, // streamDescIndex=1
                0x00, 0x00, 0x01, 0x00, // byteOffset=256
                0x00, 0x00, 0x00, 0x00, // reserved
            ]),
            Some(DataTableEntry::StreamDescReference(
                StreamDescReferenceEntry {
                    track_ref: Some(TrackRef::Index(2)),
                    length: 8,
                    stream_desc_index: 1,
                    byte_offset: 256,
                    reserved: 0,
                },
            )),
            None,
        ),
        (
            "unknown source",
            Bytes::from_static(&[
                0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            ]),
            None,
            Some(Error::InvalidFormat),
        ),
        (
            "immediate length over capacity",
            Bytes::from_static(&[
                0x01, 0x0f, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // length=15
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            ]),
            None,
            Some(Error::InvalidFormat),
        ),
        (
            "short entry",
            Bytes::from_static(&[0x01, 0x05, 0x68, 0x65]),
            None,
            Some(Error::TruncatedInput),
        ),
    ];

    for (name, mut data, want, want_error) in tests {
        let got = DataTableEntry::unmarshal(&mut data);

        assert_eq!(
            got.is_err(),
            want_error.is_some(),
            "Unmarshal {}: err = {:?}, want {:?}",
            name,
            got,
            want_error
        );

        if let Some(err) = want_error {
            let got_err = got.err().unwrap();
            assert_eq!(
                err, got_err,
                "Unmarshal {}: err = {:?}, want {:?}",
                name, got_err, err
            );
        } else {
            let actual = got.unwrap();
            assert_eq!(Some(actual), want, "Unmarshal {}: want mismatch", name);
        }
    }
}

#[test]
fn test_data_table_entry_roundtrip() {
    let tests = vec![
        ("empty", DataTableEntry::Empty),
        (
            "immediate",
            DataTableEntry::Immediate(ImmediateEntry::new(b"hint")),
        ),
        (
            "sample reference",
            DataTableEntry::SampleReference(SampleReferenceEntry {
                track_ref: Some(TrackRef::This),
                length: 1000,
                sample_number: 42,
                byte_offset: 17,
                ..Default::default()
            }),
        ),
        (
            "stream description reference",
            DataTableEntry::StreamDescReference(StreamDescReferenceEntry {
                track_ref: Some(TrackRef::Index(1)),
                length: 9,
                stream_desc_index: 2,
                byte_offset: 3,
                reserved: 0,
            }),
        ),
    ];

    for (name, want) in tests {
        let mut data = want.marshal().expect("marshal");
        assert_eq!(data.len(), ENTRY_LENGTH, "Marshal {}: size mismatch", name);

        let got = DataTableEntry::unmarshal(&mut data).expect("unmarshal");
        assert_eq!(got, want, "Roundtrip {}: mismatch", name);
    }
}

#[test]
fn test_immediate_entry_truncates() {
    let entry = ImmediateEntry::new(b"longer than fourteen bytes");
    assert_eq!(entry.data.len(), IMMEDIATE_DATA_LENGTH);
    assert_eq!(&entry.data[..], b"longer than fo");
}

#[test]
fn test_payload_length() {
    assert_eq!(DataTableEntry::Empty.payload_length(), 0);
    assert_eq!(
        DataTableEntry::Immediate(ImmediateEntry::new(b"hello")).payload_length(),
        5
    );
    assert_eq!(
        DataTableEntry::SampleReference(SampleReferenceEntry {
            length: 1234,
            ..Default::default()
        })
        .payload_length(),
        1234
    );
}

#[test]
fn test_track_ref_wire_mapping() {
    assert_eq!(TrackRef::from_wire(-1), Some(TrackRef::This));
    assert_eq!(TrackRef::from_wire(-2), None);
    assert_eq!(TrackRef::from_wire(3), Some(TrackRef::Index(3)));

    assert_eq!(TrackRef::to_wire(Some(TrackRef::This)), -1);
    assert_eq!(TrackRef::to_wire(None), -2);
    assert_eq!(TrackRef::to_wire(Some(TrackRef::Index(3))), 3);
}

#[test]
fn test_offset_moves_only_intra_sample_references() {
    let mut entry = DataTableEntry::SampleReference(SampleReferenceEntry {
        track_ref: Some(TrackRef::This),
        length: 10,
        sample_number: 7,
        byte_offset: 100,
        ..Default::default()
    });

    // different sample number: untouched
    entry.offset(50, 8);
    if let DataTableEntry::SampleReference(e) = &entry {
        assert_eq!(e.byte_offset, 100);
    }

    // matching reference: shifted
    entry.offset(50, 7);
    if let DataTableEntry::SampleReference(e) = &entry {
        assert_eq!(e.byte_offset, 150);
    }

    // zero delta: no-op
    entry.offset(0, 7);
    if let DataTableEntry::SampleReference(e) = &entry {
        assert_eq!(e.byte_offset, 150);
    }

    // two deltas compose additively
    entry.offset(10, 7);
    entry.offset(20, 7);
    if let DataTableEntry::SampleReference(e) = &entry {
        assert_eq!(e.byte_offset, 180);
    }

    // cross-track reference: never moves
    let mut cross = DataTableEntry::SampleReference(SampleReferenceEntry {
        track_ref: Some(TrackRef::Index(0)),
        sample_number: 7,
        byte_offset: 100,
        ..Default::default()
    });
    cross.offset(50, 7);
    if let DataTableEntry::SampleReference(e) = &cross {
        assert_eq!(e.byte_offset, 100);
    }

    // non-reference entries are left alone
    let mut immediate = DataTableEntry::Immediate(ImmediateEntry::new(b"x"));
    immediate.offset(50, 7);
    assert_eq!(immediate, DataTableEntry::Immediate(ImmediateEntry::new(b"x")));
}
