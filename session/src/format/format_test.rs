use super::*;

#[test]
fn test_static_formats_match_by_id() {
    assert!(MediaFormat::pcmu().matches(&MediaFormat::pcmu()));
    assert!(!MediaFormat::pcmu().matches(&MediaFormat::pcma()));
}

#[test]
fn test_dynamic_formats_match_by_encoding() {
    let local = MediaFormat::vp8(96);
    let remote = MediaFormat::vp8(102);
    assert!(local.matches(&remote));

    let wrong_clock = MediaFormat::new(102, "VP8", 8000);
    assert!(!local.matches(&wrong_clock));

    let other_codec = MediaFormat::h264(102);
    assert!(!local.matches(&other_codec));
}

#[test]
fn test_dynamic_match_is_case_insensitive() {
    let local = MediaFormat::new(96, "vp8", 90000);
    assert!(local.matches(&MediaFormat::vp8(96)));
}

#[test]
fn test_intersect_keeps_local_priority_and_remote_id() {
    let local = vec![
        MediaFormat::pcma(),
        MediaFormat::pcmu(),
        MediaFormat::telephone_event(101),
    ];
    let remote = vec![
        MediaFormat::pcmu(),
        MediaFormat::telephone_event(110),
        MediaFormat::pcma(),
    ];

    let common = intersect(&local, &remote);
    assert_eq!(common.len(), 3);
    // local ordering preserved
    assert_eq!(common[0].name, "PCMA");
    assert_eq!(common[1].name, "PCMU");
    // remote dynamic id adopted
    assert_eq!(common[2].payload_type, 110);
}

#[test]
fn test_intersect_empty() {
    let local = vec![MediaFormat::pcmu()];
    let remote = vec![MediaFormat::pcma()];
    assert!(intersect(&local, &remote).is_empty());
}

#[test]
fn test_from_media_description() -> Result<(), sdp::Error> {
    let raw = "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n\
m=audio 49170 RTP/AVP 0 101 45\r\n\
a=rtpmap:101 telephone-event/8000\r\n\
a=fmtp:101 0-16\r\n";
    let sd = sdp::session_description::SessionDescription::unmarshal(raw)?;
    let formats = from_media_description(&sd.media_descriptions[0]);

    assert_eq!(formats.len(), 3);
    // static id resolved without an rtpmap
    assert_eq!(formats[0].name, "PCMU");
    assert_eq!(formats[0].clock_rate, 8000);
    // dynamic id resolved from rtpmap + fmtp
    assert!(formats[1].is_telephone_event());
    assert_eq!(formats[1].parameters, "0-16");
    // unknown id kept by id alone
    assert_eq!(formats[2].payload_type, 45);
    assert!(formats[2].name.is_empty());
    Ok(())
}
