use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;

use crate::consts::{DESCRIPTOR_BYTES, DESCRIPTOR_WORDS, DUMP_MAGIC, DUMP_VERSION};
use crate::descriptor::Descriptor;
use crate::error::{LatchError, Result};

/// Magic (8) + version (u32) + descriptor count (u64).
pub const DUMP_HEADER_SIZE: usize = 8 + 4 + 8;

/// Write descriptors as `LATCHDSC`, version, count, then little-endian words.
pub fn write_descriptors(path: &Path, descriptors: &[Descriptor]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(DUMP_MAGIC)?;
    writer.write_u32::<LittleEndian>(DUMP_VERSION)?;
    writer.write_u64::<LittleEndian>(descriptors.len() as u64)?;
    for desc in descriptors {
        for &word in desc.words() {
            writer.write_u64::<LittleEndian>(word)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Memory-mapped descriptor dump.
pub struct DumpReader {
    mmap: Mmap,
    count: usize,
}

impl DumpReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < DUMP_HEADER_SIZE {
            return Err(LatchError::DumpFormat("file too small for header".into()));
        }
        if &mmap[..8] != DUMP_MAGIC {
            return Err(LatchError::DumpFormat("missing LATCHDSC magic".into()));
        }

        let mut header = &mmap[8..DUMP_HEADER_SIZE];
        let version = header.read_u32::<LittleEndian>()?;
        if version != DUMP_VERSION {
            return Err(LatchError::DumpFormat(format!(
                "unsupported version {version}"
            )));
        }
        let count = header.read_u64::<LittleEndian>()? as usize;

        let expected = count
            .checked_mul(DESCRIPTOR_BYTES)
            .and_then(|n| n.checked_add(DUMP_HEADER_SIZE))
            .ok_or_else(|| LatchError::DumpFormat(format!("count {count} overflows")))?;
        if mmap.len() != expected {
            return Err(LatchError::DumpFormat(format!(
                "expected {expected} bytes for {count} descriptors, got {}",
                mmap.len()
            )));
        }

        Ok(Self { mmap, count })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn descriptor(&self, index: usize) -> Option<Descriptor> {
        if index >= self.count {
            return None;
        }
        let start = DUMP_HEADER_SIZE + index * DESCRIPTOR_BYTES;
        let mut raw = &self.mmap[start..start + DESCRIPTOR_BYTES];
        let mut words = [0u64; DESCRIPTOR_WORDS];
        raw.read_u64_into::<LittleEndian>(&mut words).ok()?;
        Some(Descriptor(words))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = Descriptor> + '_ {
        (0..self.count).filter_map(|i| self.descriptor(i))
    }
}

/// Read a whole dump into memory.
pub fn read_descriptors(path: &Path) -> Result<Vec<Descriptor>> {
    let reader = DumpReader::open(path)?;
    Ok(reader.descriptors().collect())
}
