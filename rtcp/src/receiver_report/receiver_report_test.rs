use super::*;

#[test]
fn test_receiver_report_roundtrip() -> Result<()> {
    let rr = ReceiverReport {
        ssrc: 0x902f9e2e,
        reports: vec![ReceptionReport {
            ssrc: 0xdeadbeef,
            fraction_lost: 51,
            total_lost: 117,
            last_sequence_number: 0x46e1,
            jitter: 273,
            last_sender_report: 0x9f36432,
            delay: 150137,
        }],
    };

    let raw = rr.marshal()?;
    assert_eq!(raw.len(), rr.marshal_size());
    assert_eq!(raw[1], 201);

    let parsed = ReceiverReport::unmarshal(&raw)?;
    assert_eq!(parsed, rr);
    Ok(())
}

#[test]
fn test_receiver_report_empty() -> Result<()> {
    let rr = ReceiverReport {
        ssrc: 1,
        reports: vec![],
    };
    let raw = rr.marshal()?;
    assert_eq!(raw.len(), 8);

    let parsed = ReceiverReport::unmarshal(&raw)?;
    assert_eq!(parsed, rr);
    Ok(())
}
