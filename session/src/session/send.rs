use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use portable_atomic::{AtomicBool, Ordering};
use rtcp::compound_packet::CompoundPacket;
use rtp::codecs::audio::AudioPayloader;
use rtp::codecs::h264::H264Payloader;
use rtp::codecs::jpeg::JpegPayloader;
use rtp::codecs::vp8::Vp8Payloader;
use rtp::header::Header;
use rtp::packet::Packet;
use rtp::packetizer::Payloader;
use rtp::telephone_event::TelephoneEvent;

use crate::channel::SocketKind;
use crate::error::Result;
use crate::track::MediaKind;

use super::{
    SessionInternal, RtpEvent, DEFAULT_AUDIO_CLOCK_RATE, DEFAULT_DTMF_PAYLOAD_ID,
    RTP_EVENT_DEFAULT_SAMPLE_PERIOD_MS, RTP_EVENT_DUPLICATE_COUNT, RTP_MAX_PAYLOAD,
    SRTP_MAX_PREFIX_LENGTH,
};

impl SessionInternal {
    pub(crate) async fn send_audio_frame(
        &self,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
    ) -> Result<()> {
        let mut payloader = AudioPayloader;
        self.send_media_frame(MediaKind::Audio, duration, payload_type, payload, &mut payloader)
            .await
    }

    pub(crate) async fn send_vp8_frame(
        &self,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
    ) -> Result<()> {
        let mut payloader = Vp8Payloader;
        self.send_media_frame(MediaKind::Video, duration, payload_type, payload, &mut payloader)
            .await
    }

    pub(crate) async fn send_jpeg_frame(
        &self,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
        quality: u8,
        width: u16,
        height: u16,
    ) -> Result<()> {
        let mut payloader = JpegPayloader {
            quality,
            width,
            height,
        };
        self.send_media_frame(MediaKind::Video, duration, payload_type, payload, &mut payloader)
            .await
    }

    pub(crate) async fn send_h264_frame(
        &self,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
    ) -> Result<()> {
        let mut payloader = H264Payloader;
        self.send_media_frame(MediaKind::Video, duration, payload_type, payload, &mut payloader)
            .await
    }

    /// The shared frame path: fragment, reserve sequence numbers, emit the
    /// packets in order, then advance the track timestamp by the frame
    /// duration. Video frames carry the marker on their last packet; audio
    /// never sets it.
    async fn send_media_frame(
        &self,
        kind: MediaKind,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
        payloader: &mut dyn Payloader,
    ) -> Result<()> {
        if self.is_closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        if self.rtp_event_in_progress.load(Ordering::Acquire) {
            return Ok(());
        }
        let Some(dest) = self.rtp_destination(kind).await else {
            return Ok(());
        };

        let payloads = payloader.payload(RTP_MAX_PAYLOAD, payload)?;
        if payloads.is_empty() {
            return Ok(());
        }

        let (ssrc, timestamp, sequence_numbers) = {
            let mut tracks = self.tracks.lock().await;
            let Some(track) = tracks.iter_mut().find(|t| t.kind == kind && !t.is_remote) else {
                return Ok(());
            };
            let ssrc = track.ssrc;
            let timestamp = track.timestamp;
            let sequence_numbers: Vec<u16> = payloads
                .iter()
                .map(|_| track.next_sequence_number())
                .collect();
            track.timestamp = track.timestamp.wrapping_add(duration);
            (ssrc, timestamp, sequence_numbers)
        };

        let last = payloads.len() - 1;
        for (i, chunk) in payloads.iter().enumerate() {
            let header = Header {
                version: 2,
                marker: kind == MediaKind::Video && i == last,
                payload_type,
                sequence_number: sequence_numbers[i],
                timestamp,
                ssrc,
                ..Default::default()
            };
            self.write_rtp_packet(kind, dest, header, chunk).await;
        }

        Ok(())
    }

    /// The per-packet write path shared by media frames and event bursts:
    /// marshal with SRTP headroom, protect when a context is installed,
    /// transmit, account with the reporting session.
    pub(crate) async fn write_rtp_packet(
        &self,
        kind: MediaKind,
        dest: SocketAddr,
        header: Header,
        payload: &[u8],
    ) {
        if self.is_secure && !self.secure_context_ready.load(Ordering::SeqCst) {
            log::warn!("dropping outbound {kind} packet: security context not ready");
            return;
        }

        let declared_len = header.marshal_size() + payload.len();
        let mut buf = Vec::with_capacity(declared_len + SRTP_MAX_PREFIX_LENGTH);
        if let Err(err) = header.marshal_to(&mut buf) {
            log::warn!("failed to marshal outbound {kind} header: {err}");
            return;
        }
        buf.extend_from_slice(payload);
        buf.resize(declared_len + SRTP_MAX_PREFIX_LENGTH, 0);

        let send_len = if let Some(context) = &*self.security_context.load() {
            match (context.rtp_protect)(&mut buf, declared_len) {
                Ok(len) => len.min(buf.len()),
                Err(err) => {
                    log::warn!("SRTP protect failed, dropping outbound {kind} packet: {err}");
                    return;
                }
            }
        } else {
            declared_len
        };

        let Some(channel) = self.channel(kind).await else {
            return;
        };
        channel.send(SocketKind::Rtp, dest, &buf[..send_len]).await;

        let timestamp = header.timestamp;
        if let Some(rtcp_session) = self.rtcp_session(kind).await {
            let packet = Packet {
                header,
                payload: Bytes::copy_from_slice(payload),
            };
            rtcp_session.record_sent(&packet);
        }
        self.last_sent_timestamp.store(timestamp, Ordering::SeqCst);
    }

    /// Transmits a compound report for the kind, SRTCP-protected when a
    /// context is installed, then surfaces it through `on_send_report`.
    pub(crate) async fn send_rtcp_report(&self, kind: MediaKind, compound: CompoundPacket) {
        if self.is_secure && !self.secure_context_ready.load(Ordering::SeqCst) {
            log::warn!("dropping outbound {kind} report: security context not ready");
            return;
        }
        let Some(dest) = self.control_destination(kind).await else {
            return;
        };

        let raw = match compound.marshal() {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("failed to marshal {kind} report: {err}");
                return;
            }
        };

        let declared_len = raw.len();
        let mut buf = Vec::with_capacity(declared_len + SRTP_MAX_PREFIX_LENGTH);
        buf.extend_from_slice(&raw);
        buf.resize(declared_len + SRTP_MAX_PREFIX_LENGTH, 0);

        let send_len = if let Some(context) = &*self.security_context.load() {
            match (context.rtcp_protect)(&mut buf, declared_len) {
                Ok(len) => len.min(buf.len()),
                Err(err) => {
                    log::warn!("SRTCP protect failed, dropping {kind} report: {err}");
                    return;
                }
            }
        } else {
            declared_len
        };

        let Some(channel) = self.channel(kind).await else {
            return;
        };
        let socket = if self.is_rtcp_muxed {
            SocketKind::Rtp
        } else {
            SocketKind::Control
        };
        channel.send(socket, dest, &buf[..send_len]).await;

        self.do_send_report(kind, compound).await;
    }

    /// Plays an RFC 2833 event burst: duplicated start packets, paced
    /// continuations with a growing duration, duplicated end packets. All
    /// packets freeze the timestamp the media stream had when the burst
    /// began; concurrent media sends are held off for its whole extent.
    pub(crate) async fn send_dtmf_event(
        &self,
        event: RtpEvent,
        cancel: Arc<AtomicBool>,
    ) -> Result<()> {
        if self.is_closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        let Some(dest) = self.rtp_destination(MediaKind::Audio).await else {
            return Ok(());
        };
        {
            let tracks = self.tracks.lock().await;
            if !tracks
                .iter()
                .any(|t| t.kind == MediaKind::Audio && !t.is_remote)
            {
                return Ok(());
            }
        }

        if self
            .rtp_event_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // one burst at a time
            return Ok(());
        }

        let result = self.run_dtmf_burst(event, dest, cancel).await;
        self.rtp_event_in_progress.store(false, Ordering::Release);
        result
    }

    async fn run_dtmf_burst(
        &self,
        event: RtpEvent,
        dest: SocketAddr,
        cancel: Arc<AtomicBool>,
    ) -> Result<()> {
        let payload_type = match self.remote_dtmf_payload_id.load(Ordering::SeqCst) {
            0 => DEFAULT_DTMF_PAYLOAD_ID,
            id => id,
        };
        let clock_rate = {
            let tracks = self.tracks.lock().await;
            tracks
                .iter()
                .find(|t| t.kind == MediaKind::Audio && !t.is_remote)
                .and_then(|t| t.format())
                .map(|f| f.clock_rate)
                .unwrap_or(DEFAULT_AUDIO_CLOCK_RATE)
        };

        let start_timestamp = self.last_sent_timestamp.load(Ordering::SeqCst);
        let sample_period = Duration::from_millis(RTP_EVENT_DEFAULT_SAMPLE_PERIOD_MS as u64);
        let step = (clock_rate * RTP_EVENT_DEFAULT_SAMPLE_PERIOD_MS / 1000) as u16;

        let mut wire = TelephoneEvent {
            event: event.event_id,
            end_of_event: false,
            volume: event.volume,
            duration: step,
        };

        if event.total_duration <= step {
            // too short for a burst, go straight to the end packets
            wire.end_of_event = true;
            wire.duration = event.total_duration;
            for i in 0..RTP_EVENT_DUPLICATE_COUNT {
                if cancel.load(Ordering::SeqCst) {
                    return Ok(());
                }
                self.send_event_packet(dest, payload_type, i == 0, start_timestamp, &wire)
                    .await;
            }
            return Ok(());
        }

        for i in 0..RTP_EVENT_DUPLICATE_COUNT {
            if cancel.load(Ordering::SeqCst) {
                return Ok(());
            }
            self.send_event_packet(dest, payload_type, i == 0, start_timestamp, &wire)
                .await;
        }

        if cancel.load(Ordering::SeqCst) {
            return Ok(());
        }
        tokio::time::sleep(sample_period).await;

        while (wire.duration as u32) + (step as u32) < event.total_duration as u32 {
            if cancel.load(Ordering::SeqCst) {
                return Ok(());
            }
            wire.duration += step;
            self.send_event_packet(dest, payload_type, false, start_timestamp, &wire)
                .await;

            if cancel.load(Ordering::SeqCst) {
                return Ok(());
            }
            tokio::time::sleep(sample_period).await;
        }

        wire.end_of_event = true;
        wire.duration = event.total_duration;
        for _ in 0..RTP_EVENT_DUPLICATE_COUNT {
            if cancel.load(Ordering::SeqCst) {
                return Ok(());
            }
            self.send_event_packet(dest, payload_type, false, start_timestamp, &wire)
                .await;
        }

        Ok(())
    }

    async fn send_event_packet(
        &self,
        dest: SocketAddr,
        payload_type: u8,
        marker: bool,
        timestamp: u32,
        event: &TelephoneEvent,
    ) {
        let (ssrc, sequence_number) = {
            let tracks = self.tracks.lock().await;
            let Some(track) = tracks
                .iter()
                .find(|t| t.kind == MediaKind::Audio && !t.is_remote)
            else {
                return;
            };
            (track.ssrc, track.next_sequence_number())
        };

        let header = Header {
            version: 2,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            ..Default::default()
        };
        let payload = event.marshal();
        self.write_rtp_packet(MediaKind::Audio, dest, header, &payload)
            .await;
    }

    pub(crate) async fn rtp_destination(&self, kind: MediaKind) -> Option<SocketAddr> {
        self.destinations
            .lock()
            .await
            .get(&kind)
            .and_then(|d| d.rtp)
    }

    pub(crate) async fn control_destination(&self, kind: MediaKind) -> Option<SocketAddr> {
        self.destinations
            .lock()
            .await
            .get(&kind)
            .and_then(|d| d.control)
    }
}
