use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use portable_atomic::Ordering;
use rtcp::compound_packet::CompoundPacket;
use rtp::packet::Packet;
use rtp::telephone_event::TelephoneEvent;

use crate::rtcp_session::RtcpSession;
use crate::track::MediaKind;

use super::SessionInternal;

/// First-byte range of RTP/RTCP datagrams: version 2 with any marker and
/// padding bits (RFC 7983).
const RTP_RANGE_LOW: u8 = 128;
const RTP_RANGE_HIGH: u8 = 191;

/// Second-byte values that route a datagram to the RTCP path. A compound
/// report always leads with an SR (200) or RR (201), so this single-byte
/// look-ahead is sufficient.
const RTCP_SR_BYTE: u8 = 0xC8;
const RTCP_RR_BYTE: u8 = 0xC9;

impl SessionInternal {
    /// Entry point for every datagram a channel delivers, RTP and control
    /// sockets alike.
    pub(crate) async fn on_receive(&self, local: SocketAddr, remote: SocketAddr, buffer: Bytes) {
        if self.is_closed.load(Ordering::SeqCst) {
            return;
        }

        if buffer.len() < rtp::header::HEADER_LENGTH
            || buffer[0] < RTP_RANGE_LOW
            || buffer[0] > RTP_RANGE_HIGH
        {
            log::debug!(
                "dropping {} byte datagram from {remote}: not RTP or RTCP",
                buffer.len()
            );
            return;
        }

        if self.is_secure && !self.secure_context_ready.load(Ordering::SeqCst) {
            log::warn!("dropping datagram from {remote}: security context not ready");
            return;
        }

        if buffer[1] == RTCP_SR_BYTE || buffer[1] == RTCP_RR_BYTE {
            self.handle_rtcp(remote, buffer).await;
        } else {
            self.handle_rtp(local, remote, buffer).await;
        }
    }

    async fn handle_rtcp(&self, remote: SocketAddr, buffer: Bytes) {
        let buffer = if let Some(context) = &*self.security_context.load() {
            let declared_len = buffer.len();
            let mut plain = buffer.to_vec();
            match (context.rtcp_unprotect)(&mut plain, declared_len) {
                Ok(len) => Bytes::from(plain).slice(..len.min(declared_len)),
                Err(err) => {
                    log::warn!("SRTCP unprotect failed for packet from {remote}: {err}");
                    return;
                }
            }
        } else {
            buffer
        };

        let compound = match CompoundPacket::unmarshal(&buffer) {
            Ok(compound) => compound,
            Err(err) => {
                log::debug!("dropping malformed RTCP packet from {remote}: {err}");
                return;
            }
        };

        if let Some(bye) = compound.bye() {
            self.do_rtcp_bye(bye.reason.clone()).await;
            return;
        }

        let Some((kind, rtcp_session)) = self.match_rtcp_session(&compound).await else {
            log::warn!("no reporting session matches RTCP packet from {remote}, dropping");
            return;
        };

        // the first report to arrive names the control endpoint to reply to
        {
            let mut adopted = self.rtcp_endpoint_adopted.lock().await;
            if adopted.insert(kind) {
                let mut destinations = self.destinations.lock().await;
                let entry = destinations.entry(kind).or_default();
                if entry.control != Some(remote) {
                    log::debug!("adopting {remote} as the {kind} control destination");
                    entry.control = Some(remote);
                }
            }
        }

        rtcp_session.handle_received_report(&compound);
        self.do_receive_report(kind, compound).await;
    }

    /// Picks the reporting session an inbound compound belongs to: by the
    /// reporter's SSRC against the remote tracks first, then by any reception
    /// report block naming one of the local tracks.
    async fn match_rtcp_session(
        &self,
        compound: &CompoundPacket,
    ) -> Option<(MediaKind, Arc<RtcpSession>)> {
        let kind = {
            let tracks = self.tracks.lock().await;
            let by_sender = compound.first_ssrc().and_then(|ssrc| {
                tracks
                    .iter()
                    .find(|t| t.is_remote && t.ssrc != 0 && t.ssrc == ssrc)
                    .map(|t| t.kind)
            });
            by_sender.or_else(|| {
                compound.report_blocks().iter().find_map(|block| {
                    tracks
                        .iter()
                        .find(|t| !t.is_remote && t.ssrc == block.ssrc)
                        .map(|t| t.kind)
                })
            })
        }?;

        let rtcp_session = self.rtcp_session(kind).await?;
        Some((kind, rtcp_session))
    }

    async fn handle_rtp(&self, local: SocketAddr, remote: SocketAddr, buffer: Bytes) {
        let buffer = if let Some(context) = &*self.security_context.load() {
            let declared_len = buffer.len();
            let mut plain = buffer.to_vec();
            match (context.rtp_unprotect)(&mut plain, declared_len) {
                Ok(len) => Bytes::from(plain).slice(..len.min(declared_len)),
                Err(err) => {
                    log::warn!("SRTP unprotect failed for packet from {remote}: {err}");
                    return;
                }
            }
        } else {
            buffer
        };

        let packet = match Packet::unmarshal(&buffer) {
            Ok(packet) => packet,
            Err(err) => {
                log::debug!("dropping malformed RTP packet from {remote}: {err}");
                return;
            }
        };

        let dtmf_payload_id = self.remote_dtmf_payload_id.load(Ordering::SeqCst);
        if dtmf_payload_id != 0 && packet.header.payload_type == dtmf_payload_id {
            match TelephoneEvent::unmarshal(&packet.payload) {
                Ok(event) => self.do_rtp_event(event, packet.header).await,
                Err(err) => {
                    log::debug!("dropping malformed telephone-event from {remote}: {err}")
                }
            }
            return;
        }

        let kind = self.resolve_media_kind(local, &packet).await;

        {
            let mut tracks = self.tracks.lock().await;
            if let Some(track) = tracks.iter_mut().find(|t| t.is_remote && t.kind == kind) {
                if track.ssrc == 0 {
                    log::debug!(
                        "learned remote {kind} SSRC {:#010x} from first packet",
                        packet.header.ssrc
                    );
                    track.ssrc = packet.header.ssrc;
                }
            }
        }

        // the advertised RTP endpoint loses to the one actually sending
        {
            let mut destinations = self.destinations.lock().await;
            let entry = destinations.entry(kind).or_default();
            if entry.rtp != Some(remote) {
                log::debug!("adopting {remote} as the {kind} RTP destination");
                entry.rtp = Some(remote);
            }
        }

        let rtcp_session = self.rtcp_session(kind).await;
        self.do_rtp_packet_received(kind, packet.clone()).await;
        if let Some(rtcp_session) = rtcp_session {
            rtcp_session.record_received(&packet);
        }
    }

    /// Decides which media kind an inbound packet belongs to. Media-muxed
    /// sessions resolve by SSRC, then by payload type, then fall back to
    /// audio; otherwise the receiving port decides.
    async fn resolve_media_kind(&self, local: SocketAddr, packet: &Packet) -> MediaKind {
        if self.is_media_muxed {
            let tracks = self.tracks.lock().await;
            if let Some(track) = tracks
                .iter()
                .find(|t| t.is_remote && t.ssrc != 0 && t.ssrc == packet.header.ssrc)
            {
                return track.kind;
            }
            if let Some(track) = tracks
                .iter()
                .find(|t| t.is_remote && t.has_payload_type(packet.header.payload_type))
            {
                return track.kind;
            }
            log::debug!(
                "cannot resolve media kind for SSRC {:#010x} payload type {}, defaulting to audio",
                packet.header.ssrc,
                packet.header.payload_type
            );
            MediaKind::Audio
        } else {
            let channels = self.channels.lock().await;
            channels
                .iter()
                .find(|(_, channel)| channel.rtp_port() == local.port())
                .map(|(kind, _)| *kind)
                .unwrap_or(MediaKind::Audio)
        }
    }
}
