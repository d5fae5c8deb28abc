#[cfg(test)]
mod channel_test;

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use portable_atomic::{AtomicBool, Ordering};
use tokio::net::UdpSocket;
use tokio::sync::{watch, Mutex};

use crate::error::{Error, Result};

/// Room for the largest datagram a media session is expected to receive.
pub const RECEIVE_BUFFER_SIZE: usize = 2048;

const BIND_ATTEMPTS: usize = 100;

/// Which of the channel's sockets to use: media or reports.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SocketKind {
    Rtp,
    Control,
}

pub type OnDatagramHdlrFn = Box<
    dyn (FnMut(SocketAddr, SocketAddr, Bytes) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

pub type OnChannelClosedHdlrFn =
    Box<dyn (FnMut(String) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send + Sync>;

/// RtpChannel owns the UDP socket pair of one media stream: the RTP socket
/// and, unless RTCP is multiplexed, a control socket on the next higher port.
/// Datagrams are delivered through the `on_rtp_received` and
/// `on_control_received` slots from one spawned read loop per socket.
pub struct RtpChannel {
    rtp_socket: Arc<UdpSocket>,
    control_socket: Option<Arc<UdpSocket>>,
    rtp_port: u16,
    is_closed: AtomicBool,
    close_tx: watch::Sender<bool>,

    on_rtp_received_handler: Arc<ArcSwapOption<Mutex<OnDatagramHdlrFn>>>,
    on_control_received_handler: Arc<ArcSwapOption<Mutex<OnDatagramHdlrFn>>>,
    on_closed_handler: Arc<ArcSwapOption<Mutex<OnChannelClosedHdlrFn>>>,
}

impl RtpChannel {
    /// Binds the socket pair and starts the read loops. With `with_control`
    /// the RTP port is chosen even and the control socket binds RTP+1, per
    /// the RFC 3550 port convention.
    pub async fn bind(address: IpAddr, with_control: bool) -> Result<Arc<Self>> {
        let (rtp_socket, control_socket) = RtpChannel::bind_sockets(address, with_control).await?;
        let rtp_port = rtp_socket.local_addr()?.port();

        let (close_tx, _) = watch::channel(false);
        let channel = Arc::new(RtpChannel {
            rtp_socket,
            control_socket,
            rtp_port,
            is_closed: AtomicBool::new(false),
            close_tx,
            on_rtp_received_handler: Arc::new(ArcSwapOption::empty()),
            on_control_received_handler: Arc::new(ArcSwapOption::empty()),
            on_closed_handler: Arc::new(ArcSwapOption::empty()),
        });

        channel.spawn_read_loop(Arc::clone(&channel.rtp_socket), SocketKind::Rtp);
        if let Some(control_socket) = &channel.control_socket {
            channel.spawn_read_loop(Arc::clone(control_socket), SocketKind::Control);
        }

        Ok(channel)
    }

    async fn bind_sockets(
        address: IpAddr,
        with_control: bool,
    ) -> Result<(Arc<UdpSocket>, Option<Arc<UdpSocket>>)> {
        if !with_control {
            let socket = UdpSocket::bind((address, 0)).await?;
            return Ok((Arc::new(socket), None));
        }

        for _ in 0..BIND_ATTEMPTS {
            let rtp_socket = UdpSocket::bind((address, 0)).await?;
            let port = rtp_socket.local_addr()?.port();
            if port % 2 != 0 || port == u16::MAX {
                continue;
            }
            match UdpSocket::bind((address, port + 1)).await {
                Ok(control_socket) => {
                    return Ok((Arc::new(rtp_socket), Some(Arc::new(control_socket))))
                }
                Err(_) => continue,
            }
        }

        Err(Error::NoAvailablePort)
    }

    fn spawn_read_loop(self: &Arc<Self>, socket: Arc<UdpSocket>, which: SocketKind) {
        let handler = match which {
            SocketKind::Rtp => Arc::clone(&self.on_rtp_received_handler),
            SocketKind::Control => Arc::clone(&self.on_control_received_handler),
        };
        let mut close_rx = self.close_tx.subscribe();

        tokio::spawn(async move {
            let local = match socket.local_addr() {
                Ok(addr) => addr,
                Err(_) => return,
            };
            let mut buf = vec![0u8; RECEIVE_BUFFER_SIZE];

            loop {
                tokio::select! {
                    _ = close_rx.changed() => break,
                    result = socket.recv_from(&mut buf) => {
                        match result {
                            Ok((n, remote)) => {
                                let data = Bytes::copy_from_slice(&buf[..n]);
                                if let Some(handler) = &*handler.load() {
                                    let mut f = handler.lock().await;
                                    f(local, remote, data).await;
                                }
                            }
                            Err(err) => {
                                log::warn!("rtp channel on {local} receive error: {err}");
                                break;
                            }
                        }
                    }
                }
            }
        });
    }

    pub fn rtp_port(&self) -> u16 {
        self.rtp_port
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::SeqCst)
    }

    pub fn on_rtp_received(&self, f: OnDatagramHdlrFn) {
        self.on_rtp_received_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }

    pub fn on_control_received(&self, f: OnDatagramHdlrFn) {
        self.on_control_received_handler
            .store(Some(Arc::new(Mutex::new(f))));
    }

    pub fn on_closed(&self, f: OnChannelClosedHdlrFn) {
        self.on_closed_handler.store(Some(Arc::new(Mutex::new(f))));
    }

    /// Unsubscribes every registered handler. Datagrams arriving afterwards
    /// are dropped by the read loops.
    pub fn clear_handlers(&self) {
        self.on_rtp_received_handler.store(None);
        self.on_control_received_handler.store(None);
        self.on_closed_handler.store(None);
    }

    /// Sends a datagram on the selected socket. A channel without a control
    /// socket carries reports on the RTP socket (rtcp-mux). Transport errors
    /// are logged, never propagated.
    pub async fn send(&self, which: SocketKind, dest: SocketAddr, data: &[u8]) {
        if self.is_closed() {
            return;
        }

        let socket = match which {
            SocketKind::Rtp => &self.rtp_socket,
            SocketKind::Control => self.control_socket.as_ref().unwrap_or(&self.rtp_socket),
        };
        if let Err(err) = socket.send_to(data, dest).await {
            log::warn!("rtp channel send to {dest} failed: {err}");
        }
    }

    /// Stops the read loops and fires `on_closed`. Idempotent.
    pub async fn close(&self, reason: &str) {
        if self.is_closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.close_tx.send(true);

        if let Some(handler) = &*self.on_closed_handler.load() {
            let mut f = handler.lock().await;
            f(reason.to_owned()).await;
        }
    }
}
