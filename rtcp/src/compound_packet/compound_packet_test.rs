use super::*;
use crate::receiver_report::ReceiverReport;
use crate::sender_report::SenderReport;
use crate::source_description::{SourceDescription, SourceDescriptionChunk};

fn sample_compound() -> CompoundPacket {
    CompoundPacket(vec![
        Packet::SenderReport(SenderReport {
            ssrc: 0x902f9e2e,
            ntp_time: 0xda8bd1fcdddda05a,
            rtp_time: 0xaaf4edd5,
            packet_count: 10,
            octet_count: 1600,
            reports: vec![ReceptionReport {
                ssrc: 0xdeadbeef,
                last_sequence_number: 0x46e1,
                ..Default::default()
            }],
        }),
        Packet::SourceDescription(SourceDescription {
            chunks: vec![SourceDescriptionChunk {
                source: 0x902f9e2e,
                cname: "host@example.com".to_string(),
            }],
        }),
    ])
}

#[test]
fn test_compound_roundtrip() -> Result<()> {
    let compound = sample_compound();

    let raw = compound.marshal()?;
    let parsed = CompoundPacket::unmarshal(&raw)?;
    assert_eq!(parsed, compound);

    assert_eq!(parsed.first_ssrc(), Some(0x902f9e2e));
    assert!(!parsed.has_bye());

    let blocks = parsed.report_blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].ssrc, 0xdeadbeef);
    Ok(())
}

#[test]
fn test_compound_with_bye() -> Result<()> {
    let mut compound = sample_compound();
    compound.0.push(Packet::Goodbye(Goodbye {
        sources: vec![0x902f9e2e],
        reason: "shutdown".to_string(),
    }));

    let raw = compound.marshal()?;
    let parsed = CompoundPacket::unmarshal(&raw)?;
    assert!(parsed.has_bye());
    assert_eq!(parsed.bye().map(|b| b.reason.as_str()), Some("shutdown"));
    Ok(())
}

#[test]
fn test_compound_truncated() {
    let compound = sample_compound();
    let raw = compound.marshal().unwrap();
    let truncated = raw.slice(..raw.len() - 2);
    assert!(CompoundPacket::unmarshal(&truncated).is_err());
}

#[test]
fn test_compound_receiver_report_first() -> Result<()> {
    let compound = CompoundPacket(vec![Packet::ReceiverReport(ReceiverReport {
        ssrc: 42,
        reports: vec![],
    })]);

    let raw = compound.marshal()?;
    let parsed = CompoundPacket::unmarshal(&raw)?;
    assert_eq!(parsed.first_ssrc(), Some(42));
    Ok(())
}
