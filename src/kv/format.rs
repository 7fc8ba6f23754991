//! Binary record format for journaled entries.
//!
//! ```text
//! ┌──────────┬──────────┬───────────┬─────────────┬──────────────┬───────────────┐
//! │ CRC (4B) │ Len (4B) │ Flags(1B) │ Version(8B) │ Sequence(8B) │ Timestamp(8B) │ ...
//! └──────────┴──────────┴───────────┴─────────────┴──────────────┴───────────────┘
//!   ... │ Key Len (4B) │ Key │ Tx Len (4B) │ Tx Id │ Value (rest) │
//! ```
//!
//! Integers are little-endian. `Len` counts the payload after the CRC and
//! length fields; the CRC covers the length field and the payload.

use super::error::KvError;
use super::key::Key;
use super::types::VersionedEntry;

const CRC_SIZE: usize = 4;
const LEN_SIZE: usize = 4;
const FIXED_PAYLOAD: usize = 1 + 8 + 8 + 8 + 4 + 4;

const FLAG_DELETE: u8 = 0x01;

/// Serialize an entry, including the CRC header.
pub(crate) fn encode_entry(entry: &VersionedEntry) -> Result<Vec<u8>, KvError> {
    let key = entry.key.as_bytes();
    let tx_id = entry.tx_id.as_bytes();
    let payload_len = FIXED_PAYLOAD + key.len() + tx_id.len() + entry.value.len();

    let mut buf = Vec::with_capacity(CRC_SIZE + LEN_SIZE + payload_len);
    buf.extend_from_slice(&[0u8; CRC_SIZE]);
    buf.extend_from_slice(&len_u32(payload_len, "record")?.to_le_bytes());
    buf.push(if entry.is_delete { FLAG_DELETE } else { 0 });
    buf.extend_from_slice(&entry.version.to_le_bytes());
    buf.extend_from_slice(&entry.sequence.to_le_bytes());
    buf.extend_from_slice(&entry.timestamp.to_le_bytes());
    buf.extend_from_slice(&len_u32(key.len(), "key")?.to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(&len_u32(tx_id.len(), "tx id")?.to_le_bytes());
    buf.extend_from_slice(tx_id);
    buf.extend_from_slice(&entry.value);

    let crc = crc32fast::hash(buf.get(CRC_SIZE..).unwrap_or_default());
    if let Some(header) = buf.get_mut(..CRC_SIZE) {
        header.copy_from_slice(&crc.to_le_bytes());
    }
    Ok(buf)
}

/// Deserialize an entry, verifying its checksum.
pub(crate) fn decode_entry(data: &[u8]) -> Result<VersionedEntry, KvError> {
    let mut reader = Reader::new(data);
    let stored_crc = reader.u32()?;
    let payload_len = reader.u32()? as usize;

    let total_len = CRC_SIZE + LEN_SIZE + payload_len;
    if data.len() != total_len {
        return Err(corrupt(format!(
            "record length mismatch: header says {total_len} bytes, found {}",
            data.len()
        )));
    }
    let computed_crc = crc32fast::hash(data.get(CRC_SIZE..).unwrap_or_default());
    if stored_crc != computed_crc {
        return Err(corrupt(format!(
            "CRC mismatch: stored {stored_crc:#010x}, computed {computed_crc:#010x}"
        )));
    }

    let flags = reader.u8()?;
    if flags & !FLAG_DELETE != 0 {
        return Err(corrupt(format!("unknown record flags {flags:#04x}")));
    }
    let version = reader.u64()?;
    let sequence = reader.u64()?;
    let timestamp = reader.u64()?;
    let key_len = reader.u32()? as usize;
    let key = reader.utf8(key_len, "key")?;
    let tx_len = reader.u32()? as usize;
    let tx_id = reader.utf8(tx_len, "tx id")?;
    let value = reader.rest().to_vec();

    Ok(VersionedEntry {
        key: Key::new(key),
        value,
        version,
        sequence,
        tx_id,
        is_delete: flags & FLAG_DELETE != 0,
        timestamp,
    })
}

fn corrupt(msg: String) -> KvError {
    KvError::Storage(format!("corrupted journal record: {msg}"))
}

fn len_u32(len: usize, what: &str) -> Result<u32, KvError> {
    u32::try_from(len).map_err(|_| KvError::invalid(format!("{what} too large: {len} bytes")))
}

/// Bounds-checked cursor over a record.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], KvError> {
        let end = self.offset.checked_add(len).ok_or_else(|| corrupt("length overflow".into()))?;
        let slice = self.data.get(self.offset..end).ok_or_else(|| {
            corrupt(format!(
                "record truncated: needed {end} bytes, have {}",
                self.data.len()
            ))
        })?;
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], KvError> {
        let bytes = self.take(N)?;
        bytes
            .try_into()
            .map_err(|_| corrupt(format!("expected {N} bytes")))
    }

    fn u8(&mut self) -> Result<u8, KvError> {
        Ok(u8::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, KvError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, KvError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn utf8(&mut self, len: usize, what: &str) -> Result<String, KvError> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| corrupt(format!("{what} is not UTF-8: {e}")))
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = self.data.get(self.offset..).unwrap_or_default();
        self.offset = self.data.len();
        rest
    }
}
