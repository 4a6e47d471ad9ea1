//! Minimal RLP encode/decode for hexary trie nodes.
//!
//! This is intentionally narrow: it encodes and decodes the flat,
//! non-nested item lists a trie node's RLP representation is built from
//! (Leaf/Extension: two byte strings; Branch: seventeen). It is not a
//! general-purpose RLP library — the wire codec for full eth/snap message
//! framing is an external collaborator, out of scope here.

use range_desc::NodeKey;
use sha3::{Digest, Keccak256};

pub fn keccak256(data: &[u8]) -> NodeKey {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    NodeKey(hasher.finalize().into())
}

/// RLP-encode a single byte string.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        vec![data[0]]
    } else if data.len() < 56 {
        let mut out = vec![0x80 + data.len() as u8];
        out.extend_from_slice(data);
        out
    } else {
        let len = encode_length(data.len());
        let mut out = vec![0xb7 + len.len() as u8];
        out.extend_from_slice(&len);
        out.extend_from_slice(data);
        out
    }
}

/// RLP-encode a flat list of byte strings.
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let encoded: Vec<Vec<u8>> = items.iter().map(|i| encode_bytes(i)).collect();
    let total_len: usize = encoded.iter().map(|e| e.len()).sum();

    let mut out = Vec::with_capacity(total_len + 9);
    if total_len < 56 {
        out.push(0xc0 + total_len as u8);
    } else {
        let len = encode_length(total_len);
        out.push(0xf7 + len.len() as u8);
        out.extend_from_slice(&len);
    }
    for e in encoded {
        out.extend(e);
    }
    out
}

fn encode_length(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

/// Decode a top-level RLP list into its flat item byte strings. Returns
/// `None` if `data` is not a well-formed list of byte strings (nested
/// lists, which never occur in a trie node's RLP, are rejected).
pub fn decode_list(data: &[u8]) -> Option<Vec<Vec<u8>>> {
    if data.is_empty() {
        return None;
    }
    let (payload, prefix_byte) = match data[0] {
        b if b < 0xc0 => return None,
        b @ 0xc0..=0xf7 => {
            let len = (b - 0xc0) as usize;
            if data.len() < 1 + len {
                return None;
            }
            (&data[1..1 + len], b)
        }
        b => {
            let len_of_len = (b - 0xf7) as usize;
            if data.len() < 1 + len_of_len {
                return None;
            }
            let len_bytes = &data[1..1 + len_of_len];
            let len = be_bytes_to_usize(len_bytes)?;
            if data.len() < 1 + len_of_len + len {
                return None;
            }
            (&data[1 + len_of_len..1 + len_of_len + len], b)
        }
    };
    let _ = prefix_byte;

    let mut items = Vec::new();
    let mut cursor = 0;
    while cursor < payload.len() {
        let (item, consumed) = decode_one_item(&payload[cursor..])?;
        items.push(item);
        cursor += consumed;
    }
    Some(items)
}

fn decode_one_item(data: &[u8]) -> Option<(Vec<u8>, usize)> {
    if data.is_empty() {
        return None;
    }
    match data[0] {
        b if b < 0x80 => Some((vec![b], 1)),
        b @ 0x80..=0xb7 => {
            let len = (b - 0x80) as usize;
            if data.len() < 1 + len {
                return None;
            }
            Some((data[1..1 + len].to_vec(), 1 + len))
        }
        b @ 0xb8..=0xbf => {
            let len_of_len = (b - 0xb7) as usize;
            if data.len() < 1 + len_of_len {
                return None;
            }
            let len = be_bytes_to_usize(&data[1..1 + len_of_len])?;
            if data.len() < 1 + len_of_len + len {
                return None;
            }
            Some((
                data[1 + len_of_len..1 + len_of_len + len].to_vec(),
                1 + len_of_len + len,
            ))
        }
        // A nested list inside a trie node's item is never produced by
        // this codec's encoder; reject rather than mis-decode.
        _ => None,
    }
}

fn be_bytes_to_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.len() > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    Some(u64::from_be_bytes(buf) as usize)
}
