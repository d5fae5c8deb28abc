use bytes::Bytes;
use rtp::header::Header;
use rtp::packet::Packet;

use super::*;

fn audio_packet(ssrc: u32, seq: u16, timestamp: u32, len: usize) -> Packet {
    Packet {
        header: Header {
            payload_type: 0,
            sequence_number: seq,
            timestamp,
            ssrc,
            ..Default::default()
        },
        payload: Bytes::from(vec![0u8; len]),
    }
}

#[test]
fn test_receiver_report_when_nothing_sent() {
    let session = RtcpSession::new(0x1111);
    session.record_received(&audio_packet(0xdeadbeef, 100, 0, 160));
    session.record_received(&audio_packet(0xdeadbeef, 101, 160, 160));

    let report = session.build_report();
    match &report.0[0] {
        RtcpPacket::ReceiverReport(rr) => {
            assert_eq!(rr.ssrc, 0x1111);
            assert_eq!(rr.reports.len(), 1);
            assert_eq!(rr.reports[0].ssrc, 0xdeadbeef);
            assert_eq!(rr.reports[0].last_sequence_number, 101);
        }
        other => panic!("expected a receiver report, got {other:?}"),
    }
    match &report.0[1] {
        RtcpPacket::SourceDescription(sdes) => {
            assert_eq!(sdes.chunks[0].source, 0x1111);
            assert!(!sdes.chunks[0].cname.is_empty());
        }
        other => panic!("expected an SDES chunk, got {other:?}"),
    }
}

#[test]
fn test_sender_report_after_sending() {
    let session = RtcpSession::new(0x2222);
    session.record_sent(&audio_packet(0x2222, 1, 1000, 160));
    session.record_sent(&audio_packet(0x2222, 2, 1160, 160));

    let report = session.build_report();
    match &report.0[0] {
        RtcpPacket::SenderReport(sr) => {
            assert_eq!(sr.ssrc, 0x2222);
            assert_eq!(sr.packet_count, 2);
            assert_eq!(sr.octet_count, 320);
            assert_eq!(sr.rtp_time, 1160);
            assert!(sr.ntp_time > 0);
        }
        other => panic!("expected a sender report, got {other:?}"),
    }

    // the sent flag resets, the next report is an RR again
    let report = session.build_report();
    assert!(matches!(report.0[0], RtcpPacket::ReceiverReport(_)));
}

#[test]
fn test_sequence_wrap_extends_highest() {
    let session = RtcpSession::new(3);
    session.record_received(&audio_packet(7, 0xFFFE, 0, 10));
    session.record_received(&audio_packet(7, 0xFFFF, 0, 10));
    session.record_received(&audio_packet(7, 0x0001, 0, 10));

    let report = session.build_report();
    let blocks = report.report_blocks();
    assert_eq!(blocks[0].last_sequence_number, (1 << 16) | 0x0001);
}

#[tokio::test]
async fn test_close_emits_bye() {
    let session = RtcpSession::new(0x3333);
    let (tx, mut rx) = tokio::sync::mpsc::channel(1);
    session.on_report_ready(Box::new(move |compound| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(compound).await;
        })
    }));

    session.close("session closed").await;
    session.close("again").await;

    let compound = rx.recv().await.expect("BYE must be delivered");
    assert!(compound.has_bye());
    assert_eq!(
        compound.bye().map(|b| b.reason.as_str()),
        Some("session closed")
    );
    // the compound still leads with a report so on-wire classification holds
    assert!(matches!(compound.0[0], RtcpPacket::ReceiverReport(_)));
    assert!(rx.try_recv().is_err(), "close must be idempotent");
}
