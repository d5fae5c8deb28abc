#[cfg(test)]
mod rtcp_session_test;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use rtcp::compound_packet::CompoundPacket;
use rtcp::goodbye::Goodbye;
use rtcp::packet::Packet as RtcpPacket;
use rtcp::reception_report::ReceptionReport;
use rtcp::receiver_report::ReceiverReport;
use rtcp::sender_report::SenderReport;
use rtcp::source_description::{SourceDescription, SourceDescriptionChunk};
use tokio::sync::watch;
use tokio::sync::Mutex as AsyncMutex;

/// Interval between periodic reports.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Reporting intervals without any inbound activity before the peer is
/// declared gone. Counting starts once the peer has been heard at all.
pub const TIMEOUT_INTERVALS: u32 = 5;

/// Offset between the NTP era (1900) and the Unix era (1970), in seconds.
const NTP_EPOCH_OFFSET: u64 = 2_208_988_800;

pub type OnReportReadyHdlrFn = Box<
    dyn (FnMut(CompoundPacket) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

pub type OnRtcpTimeoutHdlrFn =
    Box<dyn (FnMut() -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync>;

#[derive(Debug, Default)]
struct Stats {
    packets_sent: u32,
    octets_sent: u32,
    last_rtp_timestamp: u32,
    sent_since_report: bool,

    packets_received: u32,
    octets_received: u32,
    remote_ssrc: u32,
    highest_seq: u16,
    seq_cycles: u16,

    last_sr_ntp: u32,
    last_sr_received_at: Option<Instant>,
    last_activity_at: Option<Instant>,
}

/// RtcpSession is the per-media reporting engine: it accounts for the RTP
/// packets flowing in both directions and periodically builds a compound
/// sender or receiver report, delivered through the `on_report_ready` slot.
/// Prolonged silence from the peer fires `on_timeout` once.
pub struct RtcpSession {
    ssrc: AtomicU32,
    cname: String,
    is_started: AtomicBool,
    is_closed: AtomicBool,
    timeout_fired: AtomicBool,
    close_tx: watch::Sender<bool>,
    stats: Mutex<Stats>,

    on_report_ready_handler: Arc<ArcSwapOption<AsyncMutex<OnReportReadyHdlrFn>>>,
    on_timeout_handler: Arc<ArcSwapOption<AsyncMutex<OnRtcpTimeoutHdlrFn>>>,
}

impl RtcpSession {
    pub fn new(ssrc: u32) -> Arc<Self> {
        let (close_tx, _) = watch::channel(false);
        Arc::new(RtcpSession {
            ssrc: AtomicU32::new(ssrc),
            cname: format!("{:08x}@rtp-session", rand::random::<u32>()),
            is_started: AtomicBool::new(false),
            is_closed: AtomicBool::new(false),
            timeout_fired: AtomicBool::new(false),
            close_tx,
            stats: Mutex::new(Stats::default()),
            on_report_ready_handler: Arc::new(ArcSwapOption::empty()),
            on_timeout_handler: Arc::new(ArcSwapOption::empty()),
        })
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc.load(Ordering::SeqCst)
    }

    pub fn set_ssrc(&self, ssrc: u32) {
        self.ssrc.store(ssrc, Ordering::SeqCst);
    }

    pub fn cname(&self) -> &str {
        &self.cname
    }

    pub fn on_report_ready(&self, f: OnReportReadyHdlrFn) {
        self.on_report_ready_handler
            .store(Some(Arc::new(AsyncMutex::new(f))));
    }

    pub fn on_timeout(&self, f: OnRtcpTimeoutHdlrFn) {
        self.on_timeout_handler
            .store(Some(Arc::new(AsyncMutex::new(f))));
    }

    /// Starts the periodic reporting loop.
    pub fn start(self: &Arc<Self>) {
        if self.is_started.swap(true, Ordering::SeqCst) || self.is_closed() {
            return;
        }

        let session = Arc::clone(self);
        let mut close_rx = self.close_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REPORT_INTERVAL);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = close_rx.changed() => break,
                    _ = ticker.tick() => {
                        if session.timed_out() {
                            session.fire_timeout().await;
                        }
                        let report = session.build_report();
                        session.deliver(report).await;
                    }
                }
            }
        });
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::SeqCst)
    }

    /// Accounts for an RTP packet this endpoint transmitted.
    pub fn record_sent(&self, packet: &rtp::packet::Packet) {
        let mut stats = self.stats.lock().unwrap();
        stats.packets_sent = stats.packets_sent.wrapping_add(1);
        stats.octets_sent = stats.octets_sent.wrapping_add(packet.payload.len() as u32);
        stats.last_rtp_timestamp = packet.header.timestamp;
        stats.sent_since_report = true;
    }

    /// Accounts for an RTP packet received from the peer.
    pub fn record_received(&self, packet: &rtp::packet::Packet) {
        let mut stats = self.stats.lock().unwrap();
        let seq = packet.header.sequence_number;

        if stats.packets_received == 0 {
            stats.highest_seq = seq;
        } else if seq < stats.highest_seq && stats.highest_seq - seq > 0x8000 {
            // sequence wrapped
            stats.seq_cycles = stats.seq_cycles.wrapping_add(1);
            stats.highest_seq = seq;
        } else if seq > stats.highest_seq || stats.highest_seq - seq > 0x8000 {
            stats.highest_seq = seq;
        }

        stats.packets_received = stats.packets_received.wrapping_add(1);
        stats.octets_received = stats
            .octets_received
            .wrapping_add(packet.payload.len() as u32);
        stats.remote_ssrc = packet.header.ssrc;
        stats.last_activity_at = Some(Instant::now());
    }

    /// Notes an inbound report from the peer, remembering SR timing for the
    /// LSR/DLSR fields of the next reception report.
    pub fn handle_received_report(&self, compound: &CompoundPacket) {
        let mut stats = self.stats.lock().unwrap();
        stats.last_activity_at = Some(Instant::now());

        for packet in &compound.0 {
            if let RtcpPacket::SenderReport(sr) = packet {
                stats.last_sr_ntp = (sr.ntp_time >> 16) as u32;
                stats.last_sr_received_at = Some(Instant::now());
            }
        }
    }

    pub fn last_activity_at(&self) -> Option<Instant> {
        self.stats.lock().unwrap().last_activity_at
    }

    /// Builds the next periodic compound report: an SR when media was sent
    /// since the previous report, an RR otherwise, followed by a CNAME SDES.
    pub fn build_report(&self) -> CompoundPacket {
        let mut stats = self.stats.lock().unwrap();
        let ssrc = self.ssrc();

        let reports = if stats.packets_received > 0 {
            let delay = stats
                .last_sr_received_at
                .map(|at| (at.elapsed().as_secs_f64() * 65536.0) as u32)
                .unwrap_or(0);
            vec![ReceptionReport {
                ssrc: stats.remote_ssrc,
                fraction_lost: 0,
                total_lost: 0,
                last_sequence_number: ((stats.seq_cycles as u32) << 16)
                    | stats.highest_seq as u32,
                jitter: 0,
                last_sender_report: stats.last_sr_ntp,
                delay,
            }]
        } else {
            vec![]
        };

        let lead = if stats.sent_since_report {
            RtcpPacket::SenderReport(SenderReport {
                ssrc,
                ntp_time: ntp_now(),
                rtp_time: stats.last_rtp_timestamp,
                packet_count: stats.packets_sent,
                octet_count: stats.octets_sent,
                reports,
            })
        } else {
            RtcpPacket::ReceiverReport(ReceiverReport { ssrc, reports })
        };
        stats.sent_since_report = false;

        CompoundPacket(vec![
            lead,
            RtcpPacket::SourceDescription(SourceDescription {
                chunks: vec![SourceDescriptionChunk {
                    source: ssrc,
                    cname: self.cname.clone(),
                }],
            }),
        ])
    }

    fn timed_out(&self) -> bool {
        if self.timeout_fired.load(Ordering::SeqCst) {
            return false;
        }
        let stats = self.stats.lock().unwrap();
        match stats.last_activity_at {
            Some(at) => at.elapsed() > REPORT_INTERVAL * TIMEOUT_INTERVALS,
            None => false,
        }
    }

    async fn fire_timeout(&self) {
        if self.timeout_fired.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handler) = &*self.on_timeout_handler.load() {
            let mut f = handler.lock().await;
            f().await;
        }
    }

    async fn deliver(&self, report: CompoundPacket) {
        if let Some(handler) = &*self.on_report_ready_handler.load() {
            let mut f = handler.lock().await;
            f(report).await;
        }
    }

    /// Stops the reporting loop and emits a BYE compound through the report
    /// slot. Idempotent.
    pub async fn close(&self, reason: &str) {
        if self.is_closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.close_tx.send(true);

        let ssrc = self.ssrc();
        let bye = CompoundPacket(vec![
            RtcpPacket::ReceiverReport(ReceiverReport {
                ssrc,
                reports: vec![],
            }),
            RtcpPacket::Goodbye(Goodbye {
                sources: vec![ssrc],
                reason: reason.to_owned(),
            }),
        ]);
        self.deliver(bye).await;
    }
}

/// The current wallclock as a 64-bit NTP timestamp.
fn ntp_now() -> u64 {
    let since_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    let seconds = since_unix.as_secs() + NTP_EPOCH_OFFSET;
    let fraction = ((since_unix.subsec_nanos() as u64) << 32) / 1_000_000_000;
    (seconds << 32) | fraction
}
