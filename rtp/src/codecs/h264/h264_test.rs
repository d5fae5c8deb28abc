use super::*;

#[test]
fn test_h264_payload() -> Result<()> {
    let mut pck = H264Payloader;

    // Empty payload and zero mtu
    assert!(pck.payload(1400, &Bytes::new())?.is_empty());
    assert!(pck.payload(0, &Bytes::from_static(&[0x90]))?.is_empty());

    // A frame that fits in one packet carries the end-of-frame FU header
    let result = pck.payload(1400, &Bytes::from_static(&[0x65, 0x01, 0x02]))?;
    assert_eq!(result.len(), 1);
    assert_eq!(&result[0][..], &[FU_INDICATOR, FU_HEADER_END, 0x65, 0x01, 0x02]);

    Ok(())
}

#[test]
fn test_h264_fragmentation() -> Result<()> {
    let mut pck = H264Payloader;
    let frame = Bytes::from(vec![0x65u8; 4100]);

    let result = pck.payload(1400, &frame)?;
    assert_eq!(result.len(), 3);

    assert_eq!(result[0][0], FU_INDICATOR);
    assert_eq!(result[0][1], FU_HEADER_START);
    assert_eq!(result[1][1], FU_HEADER_MIDDLE);
    assert_eq!(result[2][1], FU_HEADER_END);

    assert_eq!(result[0].len(), FUA_HEADER_SIZE + 1400);
    assert_eq!(result[1].len(), FUA_HEADER_SIZE + 1400);
    assert_eq!(result[2].len(), FUA_HEADER_SIZE + 1300);

    Ok(())
}
