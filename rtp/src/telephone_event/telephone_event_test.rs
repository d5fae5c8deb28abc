use super::*;

#[test]
fn test_telephone_event_roundtrip() -> Result<()> {
    let event = TelephoneEvent {
        event: 5,
        end_of_event: true,
        volume: 10,
        duration: 1600,
    };

    let raw = event.marshal();
    assert_eq!(raw.len(), TELEPHONE_EVENT_LENGTH);
    assert_eq!(raw[0], 5);
    assert_eq!(raw[1], 0x80 | 10);
    assert_eq!(((raw[2] as u16) << 8) | raw[3] as u16, 1600);

    let parsed = TelephoneEvent::unmarshal(&raw)?;
    assert_eq!(parsed, event);
    Ok(())
}

#[test]
fn test_telephone_event_no_end_bit() -> Result<()> {
    let raw = Bytes::from_static(&[0x09, 0x0a, 0x01, 0x90]);
    let parsed = TelephoneEvent::unmarshal(&raw)?;
    assert_eq!(parsed.event, 9);
    assert!(!parsed.end_of_event);
    assert_eq!(parsed.volume, 10);
    assert_eq!(parsed.duration, 400);
    Ok(())
}

#[test]
fn test_telephone_event_short() {
    let raw = Bytes::from_static(&[0x09, 0x0a, 0x01]);
    assert_eq!(
        TelephoneEvent::unmarshal(&raw).expect_err("short payload must be rejected"),
        Error::ErrShortPacket
    );
}
