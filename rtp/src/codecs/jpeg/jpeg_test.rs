use super::*;

#[test]
fn test_jpeg_payload_header() -> Result<()> {
    let mut pck = JpegPayloader {
        quality: 60,
        width: 640,
        height: 480,
    };

    let result = pck.payload(1400, &Bytes::from_static(&[0x01, 0x02, 0x03]))?;
    assert_eq!(result.len(), 1);
    assert_eq!(
        &result[0][..],
        &[0x00, 0x00, 0x00, 0x00, 0x00, 60, 80, 60, 0x01, 0x02, 0x03]
    );

    Ok(())
}

#[test]
fn test_jpeg_fragment_offsets() -> Result<()> {
    let mut pck = JpegPayloader {
        quality: 90,
        width: 1280,
        height: 720,
    };
    let frame = Bytes::from(vec![0x55u8; 3000]);

    let result = pck.payload(1400, &frame)?;
    assert_eq!(result.len(), 3);

    for (i, fragment) in result.iter().enumerate() {
        let offset =
            ((fragment[1] as usize) << 16) | ((fragment[2] as usize) << 8) | fragment[3] as usize;
        assert_eq!(offset, i * 1400);
        assert!(fragment.len() - JPEG_HEADER_SIZE <= 1400);
    }
    assert_eq!(result[2].len(), JPEG_HEADER_SIZE + 200);

    Ok(())
}

#[test]
fn test_jpeg_empty() -> Result<()> {
    let mut pck = JpegPayloader::default();
    assert!(pck.payload(1400, &Bytes::new())?.is_empty());
    Ok(())
}
