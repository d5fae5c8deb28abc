use std::fmt;
use std::net::IpAddr;

use crate::direction::Direction;
use crate::error::{Error, Result};

/// Attributes are the primary means for extending SDP (RFC 4566 section 5.13).
/// Property attributes have no value.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Attribute {
    pub key: String,
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(key: &str, value: Option<&str>) -> Self {
        Attribute {
            key: key.to_owned(),
            value: value.map(|v| v.to_owned()),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.key, value),
            None => write!(f, "{}", self.key),
        }
    }
}

/// ConnectionInformation holds the "c=" field (RFC 4566 section 5.7).
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct ConnectionInformation {
    pub address: IpAddr,
}

impl fmt::Display for ConnectionInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr_type = if self.address.is_ipv4() { "IP4" } else { "IP6" };
        write!(f, "IN {} {}", addr_type, self.address)
    }
}

impl ConnectionInformation {
    pub fn unmarshal(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() != 3 || fields[0] != "IN" {
            return Err(Error::SdpInvalidSyntax(value.to_owned()));
        }
        let address = fields[2]
            .parse()
            .map_err(|_| Error::SdpInvalidValue(fields[2].to_owned()))?;
        Ok(ConnectionInformation { address })
    }
}

/// MediaDescription represents one media section of a session description
/// (RFC 4566 section 5.14).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MediaDescription {
    /// m=<media> <port> <proto> <fmt> ...
    pub media: String,
    pub port: u16,
    pub proto: String,
    pub formats: Vec<String>,

    /// c=<nettype> <addrtype> <connection-address>
    pub connection_information: Option<ConnectionInformation>,

    /// a=<attribute> / a=<attribute>:<value>
    pub attributes: Vec<Attribute>,
}

impl MediaDescription {
    pub fn new(media: &str, port: u16, proto: &str) -> Self {
        MediaDescription {
            media: media.to_owned(),
            port,
            proto: proto.to_owned(),
            formats: vec![],
            connection_information: None,
            attributes: vec![],
        }
    }

    /// Returns the value of the first attribute with the given key, or None.
    /// Property attributes yield an empty string.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    /// The transmission direction announced for this media, derived from the
    /// sendrecv/sendonly/recvonly/inactive property attributes.
    pub fn direction(&self) -> Direction {
        self.attributes
            .iter()
            .map(|a| Direction::new(&a.key))
            .find(|d| *d != Direction::Unknown)
            .unwrap_or(Direction::Unknown)
    }

    /// The rtpmap encoding for a payload type, e.g. "PCMU/8000".
    pub fn rtpmap(&self, payload_type: u8) -> Option<&str> {
        let prefix = format!("{payload_type} ");
        self.attributes
            .iter()
            .filter(|a| a.key == "rtpmap")
            .find_map(|a| a.value.as_deref()?.strip_prefix(&prefix))
    }

    /// The fmtp parameter string for a payload type.
    pub fn fmtp(&self, payload_type: u8) -> Option<&str> {
        let prefix = format!("{payload_type} ");
        self.attributes
            .iter()
            .filter(|a| a.key == "fmtp")
            .find_map(|a| a.value.as_deref()?.strip_prefix(&prefix))
    }

    pub fn with_value_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push(Attribute::new(key, Some(value)));
        self
    }

    pub fn with_property_attribute(mut self, key: &str) -> Self {
        self.attributes.push(Attribute::new(key, None));
        self
    }

    pub fn marshal(&self) -> String {
        let mut result = format!(
            "m={} {} {} {}\r\n",
            self.media,
            self.port,
            self.proto,
            self.formats.join(" ")
        );
        if let Some(ci) = &self.connection_information {
            result += format!("c={ci}\r\n").as_str();
        }
        for attribute in &self.attributes {
            result += format!("a={attribute}\r\n").as_str();
        }
        result
    }

    /// Parses an "m=" line value, e.g. "audio 49170 RTP/AVP 0 8 101".
    pub fn unmarshal_media_name(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(Error::SdpInvalidSyntax(value.to_owned()));
        }

        // <port>/<number of ports> is accepted, the range is ignored
        let port_str = fields[1].split('/').next().unwrap_or(fields[1]);
        let port = port_str
            .parse::<u16>()
            .map_err(|_| Error::SdpInvalidValue(fields[1].to_owned()))?;

        Ok(MediaDescription {
            media: fields[0].to_owned(),
            port,
            proto: fields[2].to_owned(),
            formats: fields[3..].iter().map(|s| (*s).to_owned()).collect(),
            connection_information: None,
            attributes: vec![],
        })
    }
}
