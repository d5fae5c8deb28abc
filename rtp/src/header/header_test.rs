use super::*;

#[test]
fn test_header_unmarshal() -> Result<()> {
    let raw: Bytes = Bytes::from_static(&[
        0x90, 0xe0, 0x69, 0x8f, 0xd9, 0xc2, 0x93, 0xda, 0x1c, 0x64, 0x27, 0x82, 0x00, 0x01, 0x00,
        0x01, 0xff, 0xff, 0xff, 0xff,
    ]);

    let mut buf = raw.clone();
    let header = Header::unmarshal(&mut buf)?;

    assert_eq!(header.version, 2);
    assert!(!header.padding);
    assert!(header.extension);
    assert!(header.marker);
    assert_eq!(header.payload_type, 96);
    assert_eq!(header.sequence_number, 27023);
    assert_eq!(header.timestamp, 3653407706);
    assert_eq!(header.ssrc, 476325762);
    assert_eq!(header.extension_profile, 1);
    assert_eq!(header.extension_payload, Bytes::from_static(&[0xff; 4]));
    assert_eq!(buf.remaining(), 0);
    Ok(())
}

#[test]
fn test_header_roundtrip() -> Result<()> {
    let header = Header {
        version: 2,
        marker: true,
        payload_type: 0,
        sequence_number: 65534,
        timestamp: 0xFFFF_FFF0,
        ssrc: 0x1234_5678,
        csrc: vec![1, 2],
        ..Default::default()
    };

    let raw = header.marshal()?;
    assert_eq!(raw.len(), header.marshal_size());

    let mut buf = raw.clone();
    let parsed = Header::unmarshal(&mut buf)?;
    assert_eq!(parsed, header);
    Ok(())
}

#[test]
fn test_header_too_short() {
    let mut buf = Bytes::from_static(&[0x80, 0x00, 0x00]);
    assert_eq!(
        Header::unmarshal(&mut buf).expect_err("header must be rejected"),
        Error::ErrHeaderSizeInsufficient
    );
}

#[test]
fn test_header_wrong_version() {
    let mut buf = Bytes::from_static(&[0x00; 12]);
    assert_eq!(
        Header::unmarshal(&mut buf).expect_err("version 0 must be rejected"),
        Error::ErrBadVersion
    );
}
