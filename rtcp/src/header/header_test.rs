use super::*;

#[test]
fn test_header_roundtrip() -> Result<()> {
    let header = Header {
        padding: true,
        count: 31,
        packet_type: PacketType::SenderReport,
        length: 4,
    };

    let raw = header.marshal()?;
    assert_eq!(&raw[..], &[0xbf, 0xc8, 0x00, 0x04]);

    let mut buf = raw.clone();
    let parsed = Header::unmarshal(&mut buf)?;
    assert_eq!(parsed, header);
    Ok(())
}

#[test]
fn test_header_invalid_count() {
    let header = Header {
        count: 40,
        packet_type: PacketType::Goodbye,
        length: 0,
        ..Default::default()
    };
    assert_eq!(
        header.marshal().expect_err("count must be rejected"),
        Error::InvalidHeader
    );
}

#[test]
fn test_header_bad_version() {
    let mut buf = Bytes::from_static(&[0x00, 0xc8, 0x00, 0x04]);
    assert_eq!(
        Header::unmarshal(&mut buf).expect_err("version must be rejected"),
        Error::BadVersion
    );
}
