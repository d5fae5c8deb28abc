mod negotiation;
mod receive;
mod send;


use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use rtcp::compound_packet::CompoundPacket;
use rtp::header::Header;
use rtp::packet::Packet;
use rtp::telephone_event::TelephoneEvent;
use sdp::session_description::SessionDescription;
use tokio::sync::Mutex;

use crate::channel::RtpChannel;
use crate::error::{Error, Result};
use crate::format::MediaFormat;
use crate::rtcp_session::RtcpSession;
use crate::security::SecurityContext;
use crate::track::{MediaKind, Track};

/// Media bytes per RTP packet before payload-format headers are added.
pub const RTP_MAX_PAYLOAD: usize = 1400;

/// Headroom reserved after the payload for the SRTP authentication trailer.
pub const SRTP_MAX_PREFIX_LENGTH: usize = 148;

/// Size of the FU indicator/header pair prefixed to H264 fragments.
pub const H264_RTP_HEADER_LENGTH: usize = rtp::codecs::h264::FUA_HEADER_SIZE;

/// Pacing of the packets within a telephony event burst.
pub const RTP_EVENT_DEFAULT_SAMPLE_PERIOD_MS: u32 = 50;

/// How many copies of the start and end packets of a telephony event are
/// sent, to survive loss without retransmission (RFC 2833 section 3.6).
pub const RTP_EVENT_DUPLICATE_COUNT: usize = 3;

/// Payload type id used for telephone-event when the remote party did not
/// announce one.
pub const DEFAULT_DTMF_PAYLOAD_ID: u8 = 101;

pub const DEFAULT_AUDIO_CLOCK_RATE: u32 = 8000;

/// The transport profile offered in media announcements.
pub const SDP_MEDIA_PROFILE: &str = "RTP/AVP";

pub type OnRtpPacketHdlrFn = Box<
    dyn (FnMut(MediaKind, Packet) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

pub type OnRtpEventHdlrFn = Box<
    dyn (FnMut(TelephoneEvent, Header) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

pub type OnRtcpByeHdlrFn =
    Box<dyn (FnMut(String) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync>;

pub type OnTimeoutHdlrFn =
    Box<dyn (FnMut(MediaKind) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync>;

pub type OnReportHdlrFn = Box<
    dyn (FnMut(MediaKind, CompoundPacket) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

pub type OnSessionClosedHdlrFn =
    Box<dyn (FnMut(String) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync>;

/// A telephony event to be played into the audio stream as an RFC 2833
/// burst.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RtpEvent {
    /// The event code, 0-15 for DTMF digits.
    pub event_id: u8,
    /// Power level of the tone.
    pub volume: u8,
    /// Total duration of the event in RTP timestamp units.
    pub total_duration: u16,
}

/// Outcome of ingesting a remote description. Incompatibilities are values,
/// not errors: the session state is untouched when one is returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SetDescriptionResult {
    Ok,
    AudioIncompatible,
    VideoIncompatible,
}

/// Construction arguments of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Carry audio and video RTP on a single socket pair.
    pub is_media_muxed: bool,
    /// Carry RTCP on the RTP socket instead of a dedicated one.
    pub is_rtcp_muxed: bool,
    /// Gate every packet through SRTP/SRTCP transforms. No media flows until
    /// the security context is installed.
    pub is_secure: bool,
    /// Local address the channels bind to.
    pub bind_address: IpAddr,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            is_media_muxed: false,
            is_rtcp_muxed: false,
            is_secure: false,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

/// Per-kind remote endpoints. The RTP and control addresses start out as
/// whatever the remote description advertised and may later be rewritten by
/// address learning when traffic arrives from somewhere else.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Destination {
    pub(crate) rtp: Option<SocketAddr>,
    pub(crate) control: Option<SocketAddr>,
}

pub(crate) struct SessionInternal {
    pub(crate) is_media_muxed: bool,
    pub(crate) is_rtcp_muxed: bool,
    pub(crate) is_secure: bool,
    pub(crate) bind_address: IpAddr,

    pub(crate) is_started: AtomicBool,
    pub(crate) is_closed: AtomicBool,
    pub(crate) secure_context_ready: AtomicBool,
    pub(crate) rtp_event_in_progress: AtomicBool,
    pub(crate) remote_dtmf_payload_id: AtomicU8,
    pub(crate) last_sent_timestamp: AtomicU32,

    pub(crate) tracks: Mutex<Vec<Track>>,
    pub(crate) channels: Mutex<HashMap<MediaKind, Arc<RtpChannel>>>,
    pub(crate) rtcp_sessions: Mutex<HashMap<MediaKind, Arc<RtcpSession>>>,
    pub(crate) remote_description: Mutex<Option<SessionDescription>>,
    pub(crate) destinations: Mutex<HashMap<MediaKind, Destination>>,
    pub(crate) rtcp_endpoint_adopted: Mutex<HashSet<MediaKind>>,
    pub(crate) security_context: ArcSwapOption<SecurityContext>,

    on_rtp_packet_handler: Arc<ArcSwapOption<Mutex<OnRtpPacketHdlrFn>>>,
    on_rtp_event_handler: Arc<ArcSwapOption<Mutex<OnRtpEventHdlrFn>>>,
    on_rtcp_bye_handler: Arc<ArcSwapOption<Mutex<OnRtcpByeHdlrFn>>>,
    on_timeout_handler: Arc<ArcSwapOption<Mutex<OnTimeoutHdlrFn>>>,
    on_receive_report_handler: Arc<ArcSwapOption<Mutex<OnReportHdlrFn>>>,
    on_send_report_handler: Arc<ArcSwapOption<Mutex<OnReportHdlrFn>>>,
    on_closed_handler: Arc<ArcSwapOption<Mutex<OnSessionClosedHdlrFn>>>,
}

/// RtpSession manages the media streams of one call: it negotiates them over
/// SDP, owns their sockets and reporting sessions, demultiplexes what arrives
/// and fragments what is sent.
pub struct RtpSession {
    pub(crate) internal: Arc<SessionInternal>,
}

impl RtpSession {
    pub fn new(config: SessionConfig) -> Self {
        RtpSession {
            internal: Arc::new(SessionInternal {
                is_media_muxed: config.is_media_muxed,
                is_rtcp_muxed: config.is_rtcp_muxed,
                is_secure: config.is_secure,
                bind_address: config.bind_address,
                is_started: AtomicBool::new(false),
                is_closed: AtomicBool::new(false),
                secure_context_ready: AtomicBool::new(false),
                rtp_event_in_progress: AtomicBool::new(false),
                remote_dtmf_payload_id: AtomicU8::new(DEFAULT_DTMF_PAYLOAD_ID),
                last_sent_timestamp: AtomicU32::new(0),
                tracks: Mutex::new(vec![]),
                channels: Mutex::new(HashMap::new()),
                rtcp_sessions: Mutex::new(HashMap::new()),
                remote_description: Mutex::new(None),
                destinations: Mutex::new(HashMap::new()),
                rtcp_endpoint_adopted: Mutex::new(HashSet::new()),
                security_context: ArcSwapOption::empty(),
                on_rtp_packet_handler: Arc::new(ArcSwapOption::empty()),
                on_rtp_event_handler: Arc::new(ArcSwapOption::empty()),
                on_rtcp_bye_handler: Arc::new(ArcSwapOption::empty()),
                on_timeout_handler: Arc::new(ArcSwapOption::empty()),
                on_receive_report_handler: Arc::new(ArcSwapOption::empty()),
                on_send_report_handler: Arc::new(ArcSwapOption::empty()),
                on_closed_handler: Arc::new(ArcSwapOption::empty()),
            }),
        }
    }

    /// Adds a track, allocating the kind's channel and reporting session on
    /// first use. At most one track per kind and locality may exist.
    pub async fn add_track(&self, track: Track) -> Result<()> {
        self.internal.add_track(track).await
    }

    /// Installs the SRTP/SRTCP transforms. On a secure session this unblocks
    /// the media paths.
    pub fn set_security_context(&self, context: SecurityContext) {
        self.internal.security_context.store(Some(Arc::new(context)));
        self.internal
            .secure_context_ready
            .store(true, Ordering::SeqCst);
    }

    /// Starts periodic RTCP reporting.
    pub async fn start(&self) {
        self.internal.start().await
    }

    /// Tears down reporting (emitting BYE), unsubscribes and closes the
    /// channels, and fires `on_closed`. Idempotent.
    pub async fn close(&self, reason: &str) {
        self.internal.close(reason).await
    }

    pub fn is_started(&self) -> bool {
        self.internal.is_started.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.internal.is_closed.load(Ordering::SeqCst)
    }

    /// Builds an offer listing one media section per local track.
    pub async fn create_offer(
        &self,
        connection_address: Option<IpAddr>,
    ) -> Result<SessionDescription> {
        self.internal.create_offer(connection_address).await
    }

    /// Builds the answer to the current remote description.
    pub async fn create_answer(
        &self,
        connection_address: Option<IpAddr>,
    ) -> Result<SessionDescription> {
        self.internal.create_answer(connection_address).await
    }

    /// Ingests the remote party's description, rebuilding the remote tracks
    /// and destination endpoints. Nothing is committed when a media kind
    /// turns out incompatible.
    pub async fn set_remote_description(&self, sdp: SessionDescription) -> SetDescriptionResult {
        self.internal.set_remote_description(sdp).await
    }

    /// The preferred sending format of the kind's local track.
    pub async fn get_sending_format(&self, kind: MediaKind) -> Result<MediaFormat> {
        let tracks = self.internal.tracks.lock().await;
        tracks
            .iter()
            .find(|t| t.kind == kind && !t.is_remote)
            .and_then(|t| t.format().cloned())
            .ok_or(Error::MissingSendingFormat)
    }

    /// The local RTP port of the kind's channel, once allocated.
    pub async fn rtp_port(&self, kind: MediaKind) -> Option<u16> {
        self.internal.channel(kind).await.map(|c| c.rtp_port())
    }

    /// Sends one audio frame, split into mtu-sized packets. The track
    /// timestamp advances by `duration` once the whole frame is out.
    pub async fn send_audio_frame(
        &self,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
    ) -> Result<()> {
        self.internal
            .send_audio_frame(duration, payload_type, payload)
            .await
    }

    /// Sends one VP8 frame as a run of descriptor-prefixed packets, marker
    /// set on the last.
    pub async fn send_vp8_frame(
        &self,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
    ) -> Result<()> {
        self.internal
            .send_vp8_frame(duration, payload_type, payload)
            .await
    }

    /// Sends one JPEG frame per RFC 2435.
    pub async fn send_jpeg_frame(
        &self,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
        quality: u8,
        width: u16,
        height: u16,
    ) -> Result<()> {
        self.internal
            .send_jpeg_frame(duration, payload_type, payload, quality, width, height)
            .await
    }

    /// Sends one H264 frame as FU-A fragmentation units.
    pub async fn send_h264_frame(
        &self,
        duration: u32,
        payload_type: u8,
        payload: &Bytes,
    ) -> Result<()> {
        self.internal
            .send_h264_frame(duration, payload_type, payload)
            .await
    }

    /// Plays a telephony event into the audio stream as an RFC 2833 burst.
    /// Media sends are held back until the burst completes. Setting `cancel`
    /// stops the burst before the next packet or wait.
    pub async fn send_dtmf_event(
        &self,
        event: RtpEvent,
        cancel: Arc<AtomicBool>,
    ) -> Result<()> {
        self.internal.send_dtmf_event(event, cancel).await
    }

    pub fn on_rtp_packet_received(&self, f: OnRtpPacketHdlrFn) {
        self.internal
            .on_rtp_packet_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }

    pub fn on_rtp_event(&self, f: OnRtpEventHdlrFn) {
        self.internal
            .on_rtp_event_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }

    pub fn on_rtcp_bye(&self, f: OnRtcpByeHdlrFn) {
        self.internal
            .on_rtcp_bye_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }

    pub fn on_timeout(&self, f: OnTimeoutHdlrFn) {
        self.internal
            .on_timeout_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }

    pub fn on_receive_report(&self, f: OnReportHdlrFn) {
        self.internal
            .on_receive_report_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }

    pub fn on_send_report(&self, f: OnReportHdlrFn) {
        self.internal
            .on_send_report_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }

    pub fn on_closed(&self, f: OnSessionClosedHdlrFn) {
        self.internal
            .on_closed_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }
}

impl SessionInternal {
    /// The channel map key for a kind: media-muxed sessions keep their single
    /// channel under Audio.
    pub(crate) fn channel_key(&self, kind: MediaKind) -> MediaKind {
        if self.is_media_muxed {
            MediaKind::Audio
        } else {
            kind
        }
    }

    pub(crate) async fn channel(&self, kind: MediaKind) -> Option<Arc<RtpChannel>> {
        let key = self.channel_key(kind);
        self.channels.lock().await.get(&key).cloned()
    }

    pub(crate) async fn rtcp_session(&self, kind: MediaKind) -> Option<Arc<RtcpSession>> {
        self.rtcp_sessions.lock().await.get(&kind).cloned()
    }

    pub(crate) async fn add_track(self: &Arc<Self>, track: Track) -> Result<()> {
        if self.is_closed.load(Ordering::SeqCst) {
            return Err(Error::Other("session is closed".to_owned()));
        }

        let mut tracks = self.tracks.lock().await;
        if tracks
            .iter()
            .any(|t| t.kind == track.kind && t.is_remote == track.is_remote)
        {
            return Err(Error::DuplicateTrack);
        }

        let key = self.channel_key(track.kind);
        {
            let mut channels = self.channels.lock().await;
            if !channels.contains_key(&key) {
                let channel = RtpChannel::bind(self.bind_address, !self.is_rtcp_muxed).await?;
                self.wire_channel(&channel);
                channels.insert(key, channel);
            }
        }

        {
            let mut rtcp_sessions = self.rtcp_sessions.lock().await;
            match rtcp_sessions.get(&track.kind) {
                Some(rtcp_session) => {
                    if !track.is_remote {
                        rtcp_session.set_ssrc(track.ssrc);
                    }
                }
                None => {
                    let ssrc = if track.is_remote {
                        tracks
                            .iter()
                            .find(|t| t.kind == track.kind && !t.is_remote)
                            .map(|t| t.ssrc)
                            .unwrap_or_else(|| rand::random::<u32>() & 0x7FFF_FFFF)
                    } else {
                        track.ssrc
                    };
                    let rtcp_session = RtcpSession::new(ssrc);
                    self.wire_rtcp_session(track.kind, &rtcp_session);
                    rtcp_sessions.insert(track.kind, rtcp_session);
                }
            }
        }

        tracks.push(track);
        Ok(())
    }

    /// Routes a channel's callbacks into the demultiplexer; a channel that
    /// closes underneath us takes the whole session down.
    fn wire_channel(self: &Arc<Self>, channel: &Arc<RtpChannel>) {
        let internal = Arc::clone(self);
        channel.on_rtp_received(Box::new(move |local, remote, data| {
            let internal = Arc::clone(&internal);
            Box::pin(async move {
                internal.on_receive(local, remote, data).await;
            })
        }));

        let internal = Arc::clone(self);
        channel.on_control_received(Box::new(move |local, remote, data| {
            let internal = Arc::clone(&internal);
            Box::pin(async move {
                internal.on_receive(local, remote, data).await;
            })
        }));

        let internal = Arc::clone(self);
        channel.on_closed(Box::new(move |reason| {
            let internal = Arc::clone(&internal);
            Box::pin(async move {
                internal.close(&reason).await;
            })
        }));
    }

    fn wire_rtcp_session(self: &Arc<Self>, kind: MediaKind, rtcp_session: &Arc<RtcpSession>) {
        let internal = Arc::clone(self);
        rtcp_session.on_report_ready(Box::new(move |compound| {
            let internal = Arc::clone(&internal);
            Box::pin(async move {
                internal.send_rtcp_report(kind, compound).await;
            })
        }));

        let internal = Arc::clone(self);
        rtcp_session.on_timeout(Box::new(move || {
            let internal = Arc::clone(&internal);
            Box::pin(async move {
                internal.do_timeout(kind).await;
            })
        }));
    }

    pub(crate) async fn start(&self) {
        if self.is_started.swap(true, Ordering::SeqCst) || self.is_closed.load(Ordering::SeqCst) {
            return;
        }
        for rtcp_session in self.rtcp_sessions.lock().await.values() {
            rtcp_session.start();
        }
    }

    pub(crate) async fn close(&self, reason: &str) {
        if self.is_closed.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!("closing rtp session: {reason}");

        // BYEs flow out through the report slots before the channels go away
        let rtcp_sessions: Vec<_> = self.rtcp_sessions.lock().await.values().cloned().collect();
        for rtcp_session in rtcp_sessions {
            rtcp_session.close(reason).await;
        }

        let channels: Vec<_> = self.channels.lock().await.values().cloned().collect();
        for channel in &channels {
            channel.clear_handlers();
        }
        for channel in &channels {
            channel.close(reason).await;
        }

        if let Some(handler) = &*self.on_closed_handler.load() {
            let mut f = handler.lock().await;
            f(reason.to_owned()).await;
        }
    }

    pub(crate) async fn do_rtp_packet_received(&self, kind: MediaKind, packet: Packet) {
        if let Some(handler) = &*self.on_rtp_packet_handler.load() {
            let mut f = handler.lock().await;
            f(kind, packet).await;
        }
    }

    pub(crate) async fn do_rtp_event(&self, event: TelephoneEvent, header: Header) {
        if let Some(handler) = &*self.on_rtp_event_handler.load() {
            let mut f = handler.lock().await;
            f(event, header).await;
        }
    }

    pub(crate) async fn do_rtcp_bye(&self, reason: String) {
        if let Some(handler) = &*self.on_rtcp_bye_handler.load() {
            let mut f = handler.lock().await;
            f(reason).await;
        }
    }

    pub(crate) async fn do_timeout(&self, kind: MediaKind) {
        if let Some(handler) = &*self.on_timeout_handler.load() {
            let mut f = handler.lock().await;
            f(kind).await;
        }
    }

    pub(crate) async fn do_receive_report(&self, kind: MediaKind, compound: CompoundPacket) {
        if let Some(handler) = &*self.on_receive_report_handler.load() {
            let mut f = handler.lock().await;
            f(kind, compound).await;
        }
    }

    pub(crate) async fn do_send_report(&self, kind: MediaKind, compound: CompoundPacket) {
        if let Some(handler) = &*self.on_send_report_handler.load() {
            let mut f = handler.lock().await;
            f(kind, compound).await;
        }
    }
}
