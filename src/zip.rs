//! Minimal ZIP writer for stored (uncompressed) entries.
//!
//! Layout: every local file header followed by its data, then one central
//! directory record per entry, then the end-of-central-directory record.
//! No extra fields, no comments, no ZIP64.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::crc32;
use crate::vec_writer::VecWriter;

const LOCAL_FILE_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_DIRECTORY_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIRECTORY_SIG: u32 = 0x0605_4b50;

/// Version made by: 6.3, MS-DOS attributes.
const VERSION_MADE_BY: u16 = 63;
/// Version needed to extract a stored entry.
const VERSION_NEEDED: u16 = 10;
const METHOD_STORED: u16 = 0;

const LOCAL_FILE_HEADER_LEN: usize = 30;
const CENTRAL_DIRECTORY_LEN: usize = 46;
const END_OF_CENTRAL_DIRECTORY_LEN: usize = 22;

/// An MS-DOS packed date and time, as stored in ZIP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    /// `(year - 1980) << 9 | month << 5 | day`.
    pub date: u16,
    /// `hour << 11 | minute << 5 | second / 2`.
    pub time: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable time.
    pub const EPOCH: Self = Self {
        date: (1 << 5) | 1,
        time: 0,
    };

    /// Pack calendar fields. Years outside 1980..=2107 are clamped.
    pub fn from_parts(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let year = year.clamp(1980, 2107) - 1980;
        Self {
            date: (year << 9) | (u16::from(month & 0x0F) << 5) | u16::from(day & 0x1F),
            time: (u16::from(hour & 0x1F) << 11)
                | (u16::from(minute & 0x3F) << 5)
                | u16::from(second / 2),
        }
    }

    /// The current local time.
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        use chrono::{Datelike, Local, Timelike};

        let now = Local::now();
        Self::from_parts(
            u16::try_from(now.year()).unwrap_or(1980),
            now.month() as u8,
            now.day() as u8,
            now.hour() as u8,
            now.minute() as u8,
            now.second() as u8,
        )
    }

    /// The combined 32-bit field: time in the low half, date in the high half.
    pub fn to_u32(self) -> u32 {
        (u32::from(self.date) << 16) | u32::from(self.time)
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

/// One file to be stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry<'a> {
    /// File name, stored as raw bytes.
    pub name: String,
    /// File contents.
    pub data: &'a [u8],
    /// CRC-32 of `data`.
    pub crc32: u32,
}

impl<'a> ZipEntry<'a> {
    /// Create an entry, computing its checksum.
    pub fn new(name: String, data: &'a [u8]) -> Self {
        let crc32 = crc32::checksum(data);
        Self { name, data, crc32 }
    }
}

/// Archive name of the `index`-th image: `00000.webp`, `00001.webp`, ...
///
/// Indices past 99999 use their plain decimal form.
pub fn entry_name(index: usize) -> String {
    if index < 100_000 {
        format!("{index:05}.webp")
    } else {
        format!("{index}.webp")
    }
}

/// Narrow `value` to a 16-bit header field, warning when it wraps.
fn u16_field(value: usize, field: &str) -> u16 {
    u16::try_from(value).unwrap_or_else(|_| {
        log::warn!("ZIP {field} {value} does not fit in 16 bits; written truncated");
        value as u16
    })
}

/// Narrow `value` to a 32-bit header field, warning when it wraps.
fn u32_field(value: usize, field: &str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        log::warn!("ZIP {field} {value} does not fit in 32 bits; written truncated");
        value as u32
    })
}

/// Serialize `entries` as a ZIP archive, stamping every entry with `timestamp`.
pub fn build_zip(entries: &[ZipEntry<'_>], timestamp: DosDateTime) -> Vec<u8> {
    let datetime = timestamp.to_u32();
    let local_len: usize = entries
        .iter()
        .map(|e| LOCAL_FILE_HEADER_LEN + e.name.len() + e.data.len())
        .sum();
    let central_len: usize = entries
        .iter()
        .map(|e| CENTRAL_DIRECTORY_LEN + e.name.len())
        .sum();

    let mut out = Vec::with_capacity(local_len + central_len + END_OF_CENTRAL_DIRECTORY_LEN);
    let mut local_offsets = Vec::with_capacity(entries.len());

    for entry in entries {
        local_offsets.push(u32_field(out.len(), "local header offset"));
        out.write_u32_le(LOCAL_FILE_HEADER_SIG);
        out.write_u16_le(VERSION_NEEDED);
        out.write_u16_le(0); // general purpose flags
        out.write_u16_le(METHOD_STORED);
        out.write_u32_le(datetime);
        out.write_u32_le(entry.crc32);
        let size = u32_field(entry.data.len(), "entry size");
        let name_len = u16_field(entry.name.len(), "file name length");
        out.write_u32_le(size); // compressed size
        out.write_u32_le(size); // uncompressed size
        out.write_u16_le(name_len);
        out.write_u16_le(0); // extra field length
        out.write_all(entry.name.as_bytes());
        out.write_all(entry.data);
    }

    let central_offset = out.len();
    for (entry, &offset) in entries.iter().zip(&local_offsets) {
        out.write_u32_le(CENTRAL_DIRECTORY_SIG);
        out.write_u16_le(VERSION_MADE_BY);
        out.write_u16_le(VERSION_NEEDED);
        out.write_u16_le(0); // general purpose flags
        out.write_u16_le(METHOD_STORED);
        out.write_u32_le(datetime);
        out.write_u32_le(entry.crc32);
        let size = entry.data.len() as u32;
        out.write_u32_le(size);
        out.write_u32_le(size);
        out.write_u16_le(entry.name.len() as u16);
        out.write_u16_le(0); // extra field length
        out.write_u16_le(0); // comment length
        out.write_u16_le(0); // disk number start
        out.write_u16_le(0); // internal attributes
        out.write_u32_le(0); // external attributes
        out.write_u32_le(offset);
        out.write_all(entry.name.as_bytes());
    }
    let central_size = out.len() - central_offset;

    out.write_u32_le(END_OF_CENTRAL_DIRECTORY_SIG);
    out.write_u16_le(0); // this disk
    out.write_u16_le(0); // disk with the central directory
    let count = u16_field(entries.len(), "entry count");
    out.write_u16_le(count);
    out.write_u16_le(count);
    out.write_u32_le(u32_field(central_size, "central directory size"));
    out.write_u32_le(u32_field(central_offset, "central directory offset"));
    out.write_u16_le(0); // comment length

    log::debug!(
        "built ZIP: {} entries, {} bytes",
        entries.len(),
        out.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn u16_at(buf: &[u8], pos: usize) -> u16 {
        u16::from_le_bytes([buf[pos], buf[pos + 1]])
    }

    fn u32_at(buf: &[u8], pos: usize) -> u32 {
        u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
    }

    #[test]
    fn test_entry_names() {
        assert_eq!(entry_name(0), "00000.webp");
        assert_eq!(entry_name(42), "00042.webp");
        assert_eq!(entry_name(99_999), "99999.webp");
        assert_eq!(entry_name(100_000), "100000.webp");
    }

    #[test]
    fn test_dos_datetime() {
        let t = DosDateTime::from_parts(2024, 3, 15, 13, 45, 31);
        assert_eq!(t.date, (44 << 9) | (3 << 5) | 15);
        assert_eq!(t.time, (13 << 11) | (45 << 5) | 15);
        assert_eq!(t.to_u32(), (u32::from(t.date) << 16) | u32::from(t.time));
        assert_eq!(DosDateTime::from_parts(1970, 1, 1, 0, 0, 0), DosDateTime::EPOCH);
    }

    #[test]
    fn test_empty_archive() {
        let zip = build_zip(&[], DosDateTime::EPOCH);
        assert_eq!(zip.len(), END_OF_CENTRAL_DIRECTORY_LEN);
        assert_eq!(u32_at(&zip, 0), END_OF_CENTRAL_DIRECTORY_SIG);
        assert_eq!(u16_at(&zip, 8), 0);
        assert_eq!(u32_at(&zip, 16), 0);
    }

    #[test]
    fn test_two_entries() {
        let a = b"first entry".to_vec();
        let b = b"second".to_vec();
        let entries = [
            ZipEntry::new(entry_name(0), &a),
            ZipEntry::new(entry_name(1), &b),
        ];
        let stamp = DosDateTime::from_parts(2001, 2, 3, 4, 5, 6);
        let zip = build_zip(&entries, stamp);

        // First local header.
        assert_eq!(u32_at(&zip, 0), LOCAL_FILE_HEADER_SIG);
        assert_eq!(u16_at(&zip, 8), METHOD_STORED);
        assert_eq!(u32_at(&zip, 10), stamp.to_u32());
        assert_eq!(u32_at(&zip, 14), crc32fast::hash(&a));
        assert_eq!(u32_at(&zip, 18) as usize, a.len());
        assert_eq!(u16_at(&zip, 26) as usize, 10);
        assert_eq!(&zip[30..40], b"00000.webp");
        assert_eq!(&zip[40..40 + a.len()], &a[..]);

        let second_local = 40 + a.len();
        assert_eq!(u32_at(&zip, second_local), LOCAL_FILE_HEADER_SIG);
        let locals_len = second_local + 30 + 10 + b.len();

        let eocd = zip.len() - END_OF_CENTRAL_DIRECTORY_LEN;
        assert_eq!(u32_at(&zip, eocd), END_OF_CENTRAL_DIRECTORY_SIG);
        assert_eq!(u16_at(&zip, eocd + 8), 2);
        assert_eq!(u16_at(&zip, eocd + 10), 2);
        assert_eq!(u32_at(&zip, eocd + 12) as usize, 2 * (46 + 10));
        assert_eq!(u32_at(&zip, eocd + 16) as usize, locals_len);

        // Second central record points back at the second local header.
        let second_central = locals_len + 46 + 10;
        assert_eq!(u32_at(&zip, second_central), CENTRAL_DIRECTORY_SIG);
        assert_eq!(u16_at(&zip, second_central + 4), VERSION_MADE_BY);
        assert_eq!(u32_at(&zip, second_central + 42) as usize, second_local);
        assert_eq!(
            &zip[second_central + 46..second_central + 56],
            "00001.webp".to_string().as_bytes()
        );
    }

    #[test]
    fn test_oversized_fields_wrap() {
        assert_eq!(u16_field(65_535, "entry count"), 0xFFFF);
        assert_eq!(u16_field(65_537, "entry count"), 1);
        assert_eq!(u32_field(1234, "entry size"), 1234);
    }

    #[test]
    fn test_entry_count_past_u16_wraps() {
        let names: Vec<String> = (0..65_537).map(entry_name).collect();
        let entries: Vec<ZipEntry<'_>> = names
            .iter()
            .map(|name| ZipEntry {
                name: name.clone(),
                data: &[],
                crc32: 0,
            })
            .collect();
        let zip = build_zip(&entries, DosDateTime::EPOCH);
        let eocd = zip.len() - END_OF_CENTRAL_DIRECTORY_LEN;
        assert_eq!(u32_at(&zip, eocd), END_OF_CENTRAL_DIRECTORY_SIG);
        assert_eq!(u16_at(&zip, eocd + 8), 1);
        assert_eq!(u16_at(&zip, eocd + 10), 1);
    }
}
