use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use portable_atomic::Ordering;
use sdp::direction::Direction;
use sdp::media_description::{ConnectionInformation, MediaDescription};
use sdp::session_description::{Origin, SessionDescription};

use crate::error::{Error, Result};
use crate::format::{self, MediaFormat};
use crate::track::{MediaKind, StreamStatus, Track};

use super::{Destination, SessionInternal, SetDescriptionResult, SDP_MEDIA_PROFILE};

impl SessionInternal {
    /// Builds an offer with one media announcement per local track, in the
    /// order the tracks were added.
    pub(crate) async fn create_offer(
        &self,
        connection_address: Option<IpAddr>,
    ) -> Result<SessionDescription> {
        let tracks = self.tracks.lock().await;
        if !tracks.iter().any(|t| !t.is_remote) {
            return Err(Error::NoLocalTracks);
        }

        let connection_address = match connection_address {
            Some(address) => address,
            None => {
                let toward = {
                    let destinations = self.destinations.lock().await;
                    tracks
                        .iter()
                        .filter(|t| !t.is_remote)
                        .find_map(|t| destinations.get(&t.kind).and_then(|d| d.rtp))
                        .map(|d| d.ip())
                };
                local_address_toward(toward)
            }
        };

        let mut sd = base_description(connection_address);
        for track in tracks.iter().filter(|t| !t.is_remote) {
            let port = if track.capabilities.is_empty() {
                0
            } else {
                self.channel(track.kind)
                    .await
                    .map(|c| c.rtp_port())
                    .unwrap_or(0)
            };
            sd.media_descriptions
                .push(self.media_section(track, port, &track.capabilities));
        }

        Ok(sd)
    }

    /// Answers the current remote description: one section per offered
    /// announcement, in offer order, rejecting kinds this session has no
    /// local track or no compatible format for with a zero port
    /// (RFC 3264 section 6.1).
    pub(crate) async fn create_answer(
        &self,
        connection_address: Option<IpAddr>,
    ) -> Result<SessionDescription> {
        let remote = {
            let remote_description = self.remote_description.lock().await;
            remote_description
                .clone()
                .ok_or(Error::NoRemoteDescription)?
        };

        let connection_address = match connection_address {
            Some(address) => address,
            None => {
                let hint = remote
                    .connection_information
                    .map(|c| c.address)
                    .filter(|a| !a.is_unspecified());
                local_address_toward(hint)
            }
        };

        let tracks = self.tracks.lock().await;
        let mut sd = base_description(connection_address);

        for media in &remote.media_descriptions {
            let local_track = MediaKind::from_media(&media.media)
                .and_then(|kind| tracks.iter().find(|t| t.kind == kind && !t.is_remote));

            let section = match local_track {
                Some(track) => {
                    let remote_formats = format::from_media_description(media);
                    let compatible = format::intersect(&track.capabilities, &remote_formats);
                    if compatible.is_empty() {
                        rejection_section(media)
                    } else {
                        let port = self
                            .channel(track.kind)
                            .await
                            .map(|c| c.rtp_port())
                            .unwrap_or(0);
                        self.media_section(track, port, &compatible)
                    }
                }
                None => rejection_section(media),
            };
            sd.media_descriptions.push(section);
        }

        Ok(sd)
    }

    /// Ingests the remote description. Remote tracks are rebuilt from the
    /// announcements and the destination endpoints recomputed; an
    /// incompatible kind aborts before anything commits.
    pub(crate) async fn set_remote_description(
        &self,
        sdp: SessionDescription,
    ) -> SetDescriptionResult {
        let session_address = sdp.connection_information.map(|c| c.address);
        let mut staged: Vec<(MediaKind, Track, Destination)> = vec![];
        let mut dtmf_payload_id: Option<u8> = None;

        {
            let tracks = self.tracks.lock().await;
            for media in &sdp.media_descriptions {
                let Some(kind) = MediaKind::from_media(&media.media) else {
                    log::debug!("ignoring unsupported media announcement `{}`", media.media);
                    continue;
                };
                if media.port == 0 {
                    // port 0 declines the kind (RFC 3264 section 6.1), it is
                    // neither a remote track nor an incompatibility
                    continue;
                }

                let remote_formats = format::from_media_description(media);

                if let Some(local) = tracks.iter().find(|t| t.kind == kind && !t.is_remote) {
                    if format::intersect(&local.capabilities, &remote_formats).is_empty() {
                        return match kind {
                            MediaKind::Audio => SetDescriptionResult::AudioIncompatible,
                            MediaKind::Video => SetDescriptionResult::VideoIncompatible,
                        };
                    }
                }

                if dtmf_payload_id.is_none() {
                    dtmf_payload_id = remote_formats
                        .iter()
                        .find(|f| f.is_telephone_event())
                        .map(|f| f.payload_type);
                }

                let address = media
                    .connection_information
                    .map(|c| c.address)
                    .or(session_address)
                    .filter(|a| !a.is_unspecified());
                let destination = match address {
                    Some(ip) => {
                        let control_port = if self.is_rtcp_muxed {
                            media.port
                        } else {
                            media.port + 1
                        };
                        Destination {
                            rtp: Some(SocketAddr::new(ip, media.port)),
                            control: Some(SocketAddr::new(ip, control_port)),
                        }
                    }
                    None => Destination::default(),
                };

                let mut track = Track::remote(kind, remote_formats);
                track.stream_status = StreamStatus::from_direction(media.direction());
                if let Some(mid) = media.attribute("mid").filter(|m| !m.is_empty()) {
                    track.media_id = Some(mid.to_owned());
                }

                staged.push((kind, track, destination));
            }
        }

        let announced: Vec<MediaKind> = staged.iter().map(|(kind, _, _)| *kind).collect();

        {
            let mut tracks = self.tracks.lock().await;
            let mut destinations = self.destinations.lock().await;

            tracks.retain(|t| !(t.is_remote && announced.contains(&t.kind)));
            // a local kind the remote did not announce cannot flow
            for track in tracks.iter_mut() {
                if !track.is_remote && !announced.contains(&track.kind) {
                    track.stream_status = StreamStatus::Inactive;
                }
            }

            for (kind, track, destination) in staged {
                tracks.push(track);

                // endpoints that did not resolve keep their previous value
                let entry = destinations.entry(kind).or_default();
                if let Some(rtp) = destination.rtp {
                    entry.rtp = Some(rtp);
                }
                if let Some(control) = destination.control {
                    entry.control = Some(control);
                }
            }
        }

        if let Some(payload_id) = dtmf_payload_id {
            self.remote_dtmf_payload_id
                .store(payload_id, Ordering::SeqCst);
        }
        *self.remote_description.lock().await = Some(sdp);

        SetDescriptionResult::Ok
    }

    /// Renders a media section for a track with the given capability list.
    fn media_section(
        &self,
        track: &Track,
        port: u16,
        capabilities: &[MediaFormat],
    ) -> MediaDescription {
        let mut section = MediaDescription::new(&track.kind.to_string(), port, SDP_MEDIA_PROFILE);
        section.formats = capabilities
            .iter()
            .map(|f| f.payload_type.to_string())
            .collect();

        for capability in capabilities {
            if capability.name.is_empty() {
                continue;
            }
            section = section.with_value_attribute(
                "rtpmap",
                &format!("{} {}", capability.payload_type, capability.rtpmap()),
            );
            if !capability.parameters.is_empty() {
                section = section.with_value_attribute(
                    "fmtp",
                    &format!("{} {}", capability.payload_type, capability.parameters),
                );
            }
        }

        if let Some(media_id) = &track.media_id {
            section = section.with_value_attribute("mid", media_id);
        }
        if self.is_rtcp_muxed {
            section = section.with_property_attribute("rtcp-mux");
        }

        let direction = track.stream_status.to_direction();
        if direction != Direction::Unknown {
            section = section.with_property_attribute(&direction.to_string());
        }

        section
    }
}

/// A section declining an announcement: same media and proto, port zero,
/// the offered formats echoed back.
fn rejection_section(media: &MediaDescription) -> MediaDescription {
    let mut section = MediaDescription::new(&media.media, 0, &media.proto);
    section.formats = media.formats.clone();
    section
}

fn base_description(connection_address: IpAddr) -> SessionDescription {
    SessionDescription {
        origin: Origin {
            username: "-".to_owned(),
            session_id: rand::random::<u32>() as u64,
            session_version: 0,
            unicast_address: connection_address,
        },
        connection_information: Some(ConnectionInformation {
            address: connection_address,
        }),
        ..Default::default()
    }
}

/// The local address a datagram toward `dest` would leave from, resolved
/// through the routing table with a connected UDP probe. Without a
/// destination the probe aims at a public address to pick the default
/// interface; loopback is the last resort.
pub(crate) fn local_address_toward(dest: Option<IpAddr>) -> IpAddr {
    let target = dest.unwrap_or(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)));
    let bind: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let probed = std::net::UdpSocket::bind(bind).and_then(|socket| {
        socket.connect((target, 9))?;
        socket.local_addr()
    });
    match probed {
        Ok(addr) if !addr.ip().is_unspecified() => addr.ip(),
        _ => IpAddr::V4(Ipv4Addr::LOCALHOST),
    }
}
