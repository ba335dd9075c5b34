use bytes::Bytes;

use super::*;

#[test]
fn test_rtcp_packet_unmarshal() {
    let tests = vec![
        (
            "valid",
            Bytes::from_static(&[
                0x81, 0xc8, // v=2 p=0 count=1, pt=200
                0x00, 0x02, // length=2 words
                0x00, 0x00, 0x00, 0x01, // payload
                0x00, 0x00, 0x00, 0x02,
            ]),
            Some(RtcpPacket {
                version: 2,
                padding: false,
                report_count: 1,
                payload_type: 200,
                data: Bytes::from_static(&[0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]),
            }),
            None,
        ),
        (
            "zero length",
            Bytes::from_static(&[
                0x81, 0xc8, // header
                0x00, 0x00, // length=0 words
            ]),
            None,
            Some(Error::InvalidMedia),
        ),
        (
            "payload exceeds available bytes",
            Bytes::from_static(&[
                0x81, 0xc8, //
                0x00, 0x04, // length=4 words, only 1 present
                0x00, 0x00, 0x00, 0x01,
            ]),
            None,
            Some(Error::InvalidMedia),
        ),
        (
            "short header",
            Bytes::from_static(&[0x81, 0xc8]),
            None,
            Some(Error::TruncatedInput),
        ),
    ];

    for (name, mut data, want, want_error) in tests {
        let got = RtcpPacket::unmarshal(&mut data);

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
fn test_rtcp_packet_roundtrip() {
    let want = RtcpPacket {
        version: 2,
        padding: true,
        report_count: 3,
        payload_type: 201,
        data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
    };

    let mut data = want.marshal().expect("marshal");
    assert_eq!(data.len(), want.marshal_size());

    let got = RtcpPacket::unmarshal(&mut data).expect("unmarshal");
    assert_eq!(got, want);
}

#[test]
fn test_rtcp_packet_marshal_rejects_partial_words() {
    let tests = vec![
        ("empty payload", Bytes::new()),
        ("partial word", Bytes::from_static(&[1, 2, 3, 4, 5])),
    ];

    for (name, data) in tests {
        let packet = RtcpPacket {
            version: 2,
            data,
            ..Default::default()
        };
        let got = packet.marshal();
        assert!(got.is_err(), "Marshal {}: expected error", name);
        assert_eq!(Error::InvalidMedia, got.err().unwrap(), "Marshal {}", name);
    }
}

#[test]
fn test_rtcp_packet_lengths() {
    let packet = RtcpPacket {
        version: 2,
        data: Bytes::from_static(&[0u8; 12]),
        ..Default::default()
    };

    assert_eq!(packet.word_length(), 3);
    // header + payload, both for storage and on the rebuilt wire
    assert_eq!(packet.marshal_size(), 16);
    assert_eq!(packet.wire_length(), 16);
}
