use super::*;

#[test]
fn test_sender_report_roundtrip() -> Result<()> {
    let sr = SenderReport {
        ssrc: 0x902f9e2e,
        ntp_time: 0xda8bd1fcdddda05a,
        rtp_time: 0xaaf4edd5,
        packet_count: 1,
        octet_count: 2,
        reports: vec![ReceptionReport {
            ssrc: 0xbc5e9a40,
            fraction_lost: 0,
            total_lost: 0,
            last_sequence_number: 0x46e1,
            jitter: 273,
            last_sender_report: 0x9f36432,
            delay: 150137,
        }],
    };

    let raw = sr.marshal()?;
    assert_eq!(raw.len(), sr.marshal_size());
    assert_eq!(raw[1], 200);
    assert_eq!(raw.len() % 4, 0);

    let parsed = SenderReport::unmarshal(&raw)?;
    assert_eq!(parsed, sr);
    Ok(())
}

#[test]
fn test_sender_report_wrong_type() {
    let rr_bytes = Bytes::from_static(&[0x80, 0xc9, 0x00, 0x01, 0x90, 0x2f, 0x9e, 0x2e]);
    assert_eq!(
        SenderReport::unmarshal(&rr_bytes).expect_err("RR must be rejected"),
        Error::WrongType
    );
}
