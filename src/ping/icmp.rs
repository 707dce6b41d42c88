// ICMP echo codec, separated from socket I/O.

use super::PingError;

pub const ECHO_REQUEST_TYPE: u8 = 8;
pub const ECHO_REPLY_TYPE: u8 = 0;
pub const HEADER_LEN: usize = 8;

/// 16-bit one's-complement checksum over the full ICMP message. A valid
/// message (checksum field included) sums to 0x0000.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    if let Some(&last) = chunks.remainder().first() {
        sum += u32::from(last) << 8;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Builds an echo request: type 8, code 0, big-endian identifier and
/// sequence, checksum over the whole message.
pub fn encode_echo_request(ident: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER_LEN + payload.len());
    packet.extend_from_slice(&[ECHO_REQUEST_TYPE, 0, 0, 0]);
    packet.extend_from_slice(&ident.to_be_bytes());
    packet.extend_from_slice(&seq.to_be_bytes());
    packet.extend_from_slice(payload);
    let sum = checksum(&packet);
    packet[2..4].copy_from_slice(&sum.to_be_bytes());
    packet
}

/// Strips the 20-byte IPv4 header when present: raw-socket replies carry
/// it, datagram-socket replies do not.
pub fn icmp_portion(buf: &[u8]) -> &[u8] {
    if buf.len() > 20 && buf[0] >> 4 == 4 {
        let ihl = usize::from(buf[0] & 0x0f) * 4;
        if ihl >= 20 && buf.len() > ihl {
            return &buf[ihl..];
        }
    }
    buf
}

/// Validates an echo reply against the request's identifier and sequence.
/// `ident` is `None` on datagram sockets, where the kernel rewrites the
/// identifier on the wire.
pub fn parse_echo_reply(buf: &[u8], ident: Option<u16>, seq: u16) -> Result<(), PingError> {
    let icmp = icmp_portion(buf);
    if icmp.len() < HEADER_LEN {
        return Err(PingError::Malformed);
    }
    if icmp[0] != ECHO_REPLY_TYPE {
        return Err(PingError::UnexpectedType(icmp[0]));
    }
    if checksum(icmp) != 0 {
        return Err(PingError::Checksum);
    }
    if let Some(ident) = ident
        && u16::from_be_bytes([icmp[4], icmp[5]]) != ident
    {
        return Err(PingError::IdentifierMismatch);
    }
    if u16::from_be_bytes([icmp[6], icmp[7]]) != seq {
        return Err(PingError::SequenceMismatch);
    }
    Ok(())
}
