use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::sync::mpsc;

use super::*;

#[tokio::test]
async fn test_bind_allocates_even_port_pair() -> Result<()> {
    let channel = RtpChannel::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), true).await?;
    assert_eq!(channel.rtp_port() % 2, 0, "RTP port must be even");
    assert!(channel.control_socket.is_some());
    assert_eq!(
        channel
            .control_socket
            .as_ref()
            .unwrap()
            .local_addr()?
            .port(),
        channel.rtp_port() + 1
    );
    channel.close("test done").await;
    Ok(())
}

#[tokio::test]
async fn test_receive_fires_handler() -> Result<()> {
    let channel = RtpChannel::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), false).await?;
    let (tx, mut rx) = mpsc::channel(1);
    channel.on_rtp_received(Box::new(move |_local, remote, data| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send((remote, data)).await;
        })
    }));

    let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    sender
        .send_to(b"hello", (Ipv4Addr::LOCALHOST, channel.rtp_port()))
        .await?;

    let (remote, data) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("datagram not delivered")
        .expect("handler channel closed");
    assert_eq!(remote.port(), sender.local_addr()?.port());
    assert_eq!(&data[..], b"hello");

    channel.close("test done").await;
    Ok(())
}

#[tokio::test]
async fn test_close_is_idempotent_and_fires_once() -> Result<()> {
    let channel = RtpChannel::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), false).await?;
    let (tx, mut rx) = mpsc::channel(2);
    channel.on_closed(Box::new(move |reason| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(reason).await;
        })
    }));

    channel.close("gone").await;
    channel.close("gone again").await;

    let reason = rx.recv().await.expect("close handler must fire");
    assert_eq!(reason, "gone");
    assert!(rx.try_recv().is_err(), "close handler fired twice");
    Ok(())
}
