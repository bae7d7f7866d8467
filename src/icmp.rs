use std::{error, fmt};

pub const ICMP_HEADER_SIZE: usize = 8;
pub const IPV4_MIN_HEADER_SIZE: usize = 20;

/// Largest echo payload that still fits a 1500 byte Ethernet MTU without fragmenting.
pub const MAX_PAYLOAD: usize = 1500 - IPV4_MIN_HEADER_SIZE - ICMP_HEADER_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpType {
    EchoReply,
    DestUnreachable,
    EchoRequest,
    TimeExceeded,
    Other(u8),
}

impl From<u8> for IcmpType {
    fn from(value: u8) -> Self {
        match value {
            0 => IcmpType::EchoReply,
            3 => IcmpType::DestUnreachable,
            8 => IcmpType::EchoRequest,
            11 => IcmpType::TimeExceeded,
            other => IcmpType::Other(other),
        }
    }
}

impl From<IcmpType> for u8 {
    fn from(typ: IcmpType) -> Self {
        match typ {
            IcmpType::EchoReply => 0,
            IcmpType::DestUnreachable => 3,
            IcmpType::EchoRequest => 8,
            IcmpType::TimeExceeded => 11,
            IcmpType::Other(other) => other,
        }
    }
}

/// The first 8 bytes of an ICMP message.
///
/// For echo messages bytes 4..8 carry the identifier and sequence number. Other message types
/// reuse that space for their own purposes; it is still read into `id`/`seq` so callers can
/// compare without first matching on the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub typ: IcmpType,
    pub code: u8,
    pub checksum: u16,
    pub id: u16,
    pub seq: u16,
}

impl Header {
    pub fn echo(typ: IcmpType, id: u16, seq: u16) -> Self {
        Header {
            typ,
            code: 0,
            checksum: 0,
            id,
            seq,
        }
    }

    fn write(&self, buf: &mut [u8]) {
        buf[0] = self.typ.into();
        buf[1] = self.code;
        buf[2..4].copy_from_slice(&self.checksum.to_be_bytes());
        buf[4..6].copy_from_slice(&self.id.to_be_bytes());
        buf[6..8].copy_from_slice(&self.seq.to_be_bytes());
    }

    fn read(buf: &[u8]) -> Self {
        Header {
            typ: IcmpType::from(buf[0]),
            code: buf[1],
            checksum: u16::from_be_bytes([buf[2], buf[3]]),
            id: u16::from_be_bytes([buf[4], buf[5]]),
            seq: u16::from_be_bytes([buf[6], buf[7]]),
        }
    }
}

/// A received ICMP message. The type is not assumed to be an echo reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedMessage {
    pub header: Header,
    /// Length of the whole ICMP message, header included.
    pub len: usize,
}

impl DecodedMessage {
    pub fn is_echo_reply(&self) -> bool {
        self.header.typ == IcmpType::EchoReply && self.header.code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    PayloadTooLarge { len: usize, max: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::PayloadTooLarge { len, max } => {
                write!(f, "echo payload of {} bytes exceeds {} bytes", len, max)
            }
        }
    }
}

impl error::Error for EncodeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Truncated { len: usize },
    NotIpv4 { version: u8 },
    BadHeaderLength { ihl: usize, len: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::Truncated { len } => {
                write!(f, "truncated packet: {} bytes", len)
            }
            DecodeError::NotIpv4 { version } => {
                write!(f, "unexpected IP version {}", version)
            }
            DecodeError::BadHeaderLength { ihl, len } => write!(
                f,
                "IPv4 header length {} does not fit a {} byte packet",
                ihl, len
            ),
        }
    }
}

impl error::Error for DecodeError {}

/// Encode an ICMP echo request ready to be handed to the transport.
pub fn encode(id: u16, seq: u16, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    encode_echo(IcmpType::EchoRequest, id, seq, payload)
}

/// Encode an echo message of the given type, see
/// https://en.wikipedia.org/wiki/Ping_(networking_utility)#ECHO-REQUEST.
pub fn encode_echo(typ: IcmpType, id: u16, seq: u16, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(EncodeError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let mut buf = vec![0; ICMP_HEADER_SIZE + payload.len()];
    let mut header = Header::echo(typ, id, seq);
    header.write(&mut buf);
    buf[ICMP_HEADER_SIZE..].copy_from_slice(payload);

    header.checksum = calculate_checksum(&buf);
    header.write(&mut buf);
    Ok(buf)
}

pub fn decode(buf: &[u8]) -> Result<DecodedMessage, DecodeError> {
    if buf.len() < ICMP_HEADER_SIZE {
        return Err(DecodeError::Truncated { len: buf.len() });
    }
    Ok(DecodedMessage {
        header: Header::read(buf),
        len: buf.len(),
    })
}

/// Strip the IPv4 header a raw socket delivers in front of the ICMP message.
pub fn ipv4_payload(datagram: &[u8]) -> Result<&[u8], DecodeError> {
    if datagram.len() < IPV4_MIN_HEADER_SIZE {
        return Err(DecodeError::Truncated {
            len: datagram.len(),
        });
    }

    let version = datagram[0] >> 4;
    if version != 4 {
        return Err(DecodeError::NotIpv4 { version });
    }

    let ihl = usize::from(datagram[0] & 0x0f) * 4;
    if ihl < IPV4_MIN_HEADER_SIZE || ihl > datagram.len() {
        return Err(DecodeError::BadHeaderLength {
            ihl,
            len: datagram.len(),
        });
    }
    Ok(&datagram[ihl..])
}

/// Calculate checksum according to https://en.wikipedia.org/wiki/Internet_checksum.
pub fn calculate_checksum(buf: &[u8]) -> u16 {
    // Use 32 bits to account for carry bits.
    let mut sum: u32 = 0;

    for word in buf.chunks(2) {
        let mut val = u16::from(word[0]) << 8;
        if word.len() > 1 {
            val |= u16::from(word[1]);
        }
        sum = sum.wrapping_add(u32::from(val));
    }

    while sum > 0xffff {
        sum = (sum >> 16) + (sum & 0xffff);
    }
    !(sum as u16)
}
