use super::*;

#[test]
fn test_vp8_payload() -> Result<()> {
    let mut pck = Vp8Payloader;

    // Empty payload and zero mtu
    assert!(pck.payload(1400, &Bytes::new())?.is_empty());
    assert!(pck.payload(0, &Bytes::from_static(&[0x90]))?.is_empty());

    // Fits in one packet: descriptor says start of partition
    let result = pck.payload(1400, &Bytes::from_static(&[0x01, 0x02]))?;
    assert_eq!(result.len(), 1);
    assert_eq!(&result[0][..], &[0x10, 0x01, 0x02]);

    Ok(())
}

#[test]
fn test_vp8_keyframe_fragmentation() -> Result<()> {
    // A 4100 byte frame splits into 1400 + 1400 + 1300, each prefixed with
    // the one byte descriptor.
    let mut pck = Vp8Payloader;
    let frame = Bytes::from(vec![0xabu8; 4100]);

    let result = pck.payload(1400, &frame)?;
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].len(), 1 + 1400);
    assert_eq!(result[1].len(), 1 + 1400);
    assert_eq!(result[2].len(), 1 + 1300);
    assert_eq!(result[0][0], 0x10);
    assert_eq!(result[1][0], 0x00);
    assert_eq!(result[2][0], 0x00);

    Ok(())
}
