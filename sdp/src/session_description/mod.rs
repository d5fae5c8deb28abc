#[cfg(test)]
mod session_description_test;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use crate::error::{Error, Result};
use crate::media_description::{Attribute, ConnectionInformation, MediaDescription};

/// Origin holds the "o=" field (RFC 4566 section 5.2).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Origin {
    pub username: String,
    pub session_id: u64,
    pub session_version: u64,
    pub unicast_address: IpAddr,
}

impl Default for Origin {
    fn default() -> Self {
        Origin {
            username: "-".to_owned(),
            session_id: 0,
            session_version: 0,
            unicast_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr_type = if self.unicast_address.is_ipv4() {
            "IP4"
        } else {
            "IP6"
        };
        write!(
            f,
            "{} {} {} IN {} {}",
            self.username, self.session_id, self.session_version, addr_type, self.unicast_address
        )
    }
}

impl Origin {
    pub fn unmarshal(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(Error::SdpInvalidSyntax(value.to_owned()));
        }

        let session_id = fields[1]
            .parse()
            .map_err(|_| Error::SdpInvalidValue(fields[1].to_owned()))?;
        let session_version = fields[2]
            .parse()
            .map_err(|_| Error::SdpInvalidValue(fields[2].to_owned()))?;
        let unicast_address = fields[5]
            .parse()
            .map_err(|_| Error::SdpInvalidValue(fields[5].to_owned()))?;

        Ok(Origin {
            username: fields[0].to_owned(),
            session_id,
            session_version,
            unicast_address,
        })
    }
}

/// SessionDescription is a complete SDP (RFC 4566 section 5).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SessionDescription {
    /// v=0
    pub version: u8,
    /// o=<username> <sess-id> <sess-version> <nettype> <addrtype> <unicast-address>
    pub origin: Origin,
    /// s=<session name>
    pub session_name: String,
    /// c=<nettype> <addrtype> <connection-address>
    pub connection_information: Option<ConnectionInformation>,
    /// t=<start-time> <stop-time>
    pub timing: String,
    /// Session-level attributes.
    pub attributes: Vec<Attribute>,
    pub media_descriptions: Vec<MediaDescription>,
}

impl Default for SessionDescription {
    fn default() -> Self {
        SessionDescription {
            version: 0,
            origin: Origin::default(),
            session_name: "-".to_owned(),
            connection_information: None,
            timing: "0 0".to_owned(),
            attributes: vec![],
            media_descriptions: vec![],
        }
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marshal())
    }
}

impl SessionDescription {
    /// Marshal takes a SessionDescription and converts it into raw SDP text.
    pub fn marshal(&self) -> String {
        let mut result = format!("v={}\r\n", self.version);
        result += format!("o={}\r\n", self.origin).as_str();
        result += format!("s={}\r\n", self.session_name).as_str();
        if let Some(ci) = &self.connection_information {
            result += format!("c={ci}\r\n").as_str();
        }
        result += format!("t={}\r\n", self.timing).as_str();
        for attribute in &self.attributes {
            result += format!("a={attribute}\r\n").as_str();
        }
        for media in &self.media_descriptions {
            result += media.marshal().as_str();
        }
        result
    }

    /// Unmarshal converts raw SDP text into a SessionDescription. Lines with
    /// types this crate does not model are skipped.
    pub fn unmarshal(raw: &str) -> Result<Self> {
        let mut sd = SessionDescription {
            session_name: String::new(),
            timing: String::new(),
            ..Default::default()
        };
        let mut seen_any = false;

        for line in raw.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            if line.len() < 2 || line.as_bytes()[1] != b'=' {
                return Err(Error::SdpInvalidSyntax(line.to_owned()));
            }
            seen_any = true;

            let (key, value) = (&line[..1], &line[2..]);

            match key {
                "v" => {
                    sd.version = value
                        .parse()
                        .map_err(|_| Error::SdpInvalidValue(value.to_owned()))?
                }
                "o" => sd.origin = Origin::unmarshal(value)?,
                "s" => sd.session_name = value.to_owned(),
                "t" => sd.timing = value.to_owned(),
                "c" => {
                    let ci = ConnectionInformation::unmarshal(value)?;
                    match sd.media_descriptions.last_mut() {
                        Some(media) => media.connection_information = Some(ci),
                        None => sd.connection_information = Some(ci),
                    }
                }
                "m" => {
                    sd.media_descriptions
                        .push(MediaDescription::unmarshal_media_name(value)?);
                }
                "a" => {
                    let attribute = match value.split_once(':') {
                        Some((k, v)) => Attribute::new(k, Some(v)),
                        None => Attribute::new(value, None),
                    };
                    match sd.media_descriptions.last_mut() {
                        Some(media) => media.attributes.push(attribute),
                        None => sd.attributes.push(attribute),
                    }
                }
                // i=, u=, e=, p=, b=, k=, r=, z= carry nothing this model needs
                _ => {}
            }
        }

        if !seen_any {
            return Err(Error::SdpEmpty);
        }

        Ok(sd)
    }
}
