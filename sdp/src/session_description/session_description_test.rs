use super::*;
use crate::direction::Direction;

const CANONICAL_OFFER: &str = "v=0\r\n\
o=- 3840232462 0 IN IP4 192.168.1.10\r\n\
s=-\r\n\
c=IN IP4 192.168.1.10\r\n\
t=0 0\r\n\
m=audio 49170 RTP/AVP 0 101\r\n\
a=rtpmap:0 PCMU/8000\r\n\
a=rtpmap:101 telephone-event/8000\r\n\
a=fmtp:101 0-16\r\n\
a=sendrecv\r\n\
m=video 51372 RTP/AVP 96\r\n\
c=IN IP4 192.168.1.11\r\n\
a=rtpmap:96 VP8/90000\r\n\
a=sendonly\r\n";

#[test]
fn test_unmarshal_offer() -> Result<()> {
    let sd = SessionDescription::unmarshal(CANONICAL_OFFER)?;

    assert_eq!(sd.version, 0);
    assert_eq!(sd.origin.session_id, 3840232462);
    assert_eq!(
        sd.connection_information.map(|c| c.address.to_string()),
        Some("192.168.1.10".to_string())
    );
    assert_eq!(sd.media_descriptions.len(), 2);

    let audio = &sd.media_descriptions[0];
    assert_eq!(audio.media, "audio");
    assert_eq!(audio.port, 49170);
    assert_eq!(audio.proto, "RTP/AVP");
    assert_eq!(audio.formats, vec!["0", "101"]);
    assert_eq!(audio.rtpmap(0), Some("PCMU/8000"));
    assert_eq!(audio.rtpmap(101), Some("telephone-event/8000"));
    assert_eq!(audio.fmtp(101), Some("0-16"));
    assert_eq!(audio.direction(), Direction::SendRecv);

    let video = &sd.media_descriptions[1];
    assert_eq!(video.port, 51372);
    assert_eq!(
        video
            .connection_information
            .map(|c| c.address.to_string()),
        Some("192.168.1.11".to_string())
    );
    assert_eq!(video.direction(), Direction::SendOnly);

    Ok(())
}

#[test]
fn test_marshal_roundtrip() -> Result<()> {
    let sd = SessionDescription::unmarshal(CANONICAL_OFFER)?;
    let text = sd.marshal();
    let reparsed = SessionDescription::unmarshal(&text)?;
    assert_eq!(reparsed, sd);
    Ok(())
}

#[test]
fn test_unmarshal_rejected_section() -> Result<()> {
    let raw = "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\nm=video 0 RTP/AVP 96\r\n";
    let sd = SessionDescription::unmarshal(raw)?;
    assert_eq!(sd.media_descriptions[0].port, 0);
    Ok(())
}

#[test]
fn test_unmarshal_garbage() {
    assert!(SessionDescription::unmarshal("this is not sdp").is_err());
    assert_eq!(
        SessionDescription::unmarshal("").expect_err("empty must be rejected"),
        Error::SdpEmpty
    );
}

#[test]
fn test_media_port_range() -> Result<()> {
    let md = MediaDescription::unmarshal_media_name("audio 49170/2 RTP/AVP 0")?;
    assert_eq!(md.port, 49170);
    Ok(())
}
