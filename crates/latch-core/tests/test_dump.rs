use std::io::Write;

use latch_core::descriptor::Descriptor;
use latch_core::error::LatchError;
use latch_core::io::dump::DUMP_HEADER_SIZE;
use latch_core::io::{read_descriptors, write_descriptors, DumpReader};
use tempfile::TempDir;

fn sample(n: u64) -> Vec<Descriptor> {
    (0..n)
        .map(|i| Descriptor([i, i << 8, u64::MAX - i, 0, 1, 2, 3, i * 31]))
        .collect()
}

#[test]
fn test_dump_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("descs.bin");
    let descs = sample(17);

    write_descriptors(&path, &descs).unwrap();
    let size = std::fs::metadata(&path).unwrap().len() as usize;
    assert_eq!(size, DUMP_HEADER_SIZE + 17 * 64);
    assert_eq!(read_descriptors(&path).unwrap(), descs);
}

#[test]
fn test_dump_layout_is_little_endian() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one.bin");
    write_descriptors(&path, &[Descriptor([0x0102_0304_0506_0708, 0, 0, 0, 0, 0, 0, 0])]).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], b"LATCHDSC");
    assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
    assert_eq!(&bytes[12..20], &1u64.to_le_bytes());
    assert_eq!(&bytes[20..28], &[8, 7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn test_empty_dump() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.bin");
    write_descriptors(&path, &[]).unwrap();
    let reader = DumpReader::open(&path).unwrap();
    assert!(reader.is_empty());
    assert_eq!(reader.descriptor(0), None);
}

#[test]
fn test_random_access() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("descs.bin");
    let descs = sample(5);
    write_descriptors(&path, &descs).unwrap();

    let reader = DumpReader::open(&path).unwrap();
    assert_eq!(reader.len(), 5);
    assert_eq!(reader.descriptor(3), Some(descs[3]));
    assert_eq!(reader.descriptor(5), None);
}

#[test]
fn test_bad_magic_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.bin");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"NOTLATCH").unwrap();
    f.write_all(&[0u8; 12]).unwrap();
    drop(f);

    assert!(matches!(
        DumpReader::open(&path),
        Err(LatchError::DumpFormat(_))
    ));
}

#[test]
fn test_truncated_dump_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("descs.bin");
    write_descriptors(&path, &sample(4)).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

    assert!(matches!(
        DumpReader::open(&path),
        Err(LatchError::DumpFormat(_))
    ));
}

#[test]
fn test_short_header_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.bin");
    std::fs::write(&path, b"LATCH").unwrap();
    assert!(matches!(
        DumpReader::open(&path),
        Err(LatchError::DumpFormat(_))
    ));
}
