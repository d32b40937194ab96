//! # File Block Log
//!
//! ```text
//! blocks.log    [len: u32 LE][bincode SignedBlock] [len][block] ...
//! blocks.index  [offset of block 1: u64 LE] [offset of block 2] ...
//! ```
//!
//! The index is derived data. It is checked against the log on open and
//! rebuilt by scanning the log when it is missing or stale. A torn record at
//! the end of the log (a crash during append) is cut off.

use super::lock::DirectoryLock;
use crate::domain::{BlockLogError, BlockLogResult};
use crate::ports::BlockLog;
use cc_02_protocol::SignedBlock;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const LOG_FILE: &str = "blocks.log";
pub const INDEX_FILE: &str = "blocks.index";

const LEN_PREFIX: u64 = 4;

#[derive(Debug)]
pub struct FileBlockLog {
    dir: PathBuf,
    log: File,
    index: File,
    offsets: Vec<u64>,
    end: u64,
    head: Option<SignedBlock>,
    _lock: DirectoryLock,
}

impl FileBlockLog {
    /// Open or create the log in `dir`, taking the directory lock.
    pub fn open(dir: &Path) -> BlockLogResult<Self> {
        fs::create_dir_all(dir)?;
        let lock = DirectoryLock::acquire(dir)?;

        let log = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(dir.join(LOG_FILE))?;
        let mut end = log.metadata()?.len();

        let index_path = dir.join(INDEX_FILE);
        let offsets = match read_index(&index_path, &log, end)? {
            Some(offsets) => offsets,
            None => {
                let (offsets, valid_end) = scan_log(&log, end)?;
                if valid_end < end {
                    warn!(
                        dir = %dir.display(),
                        offset = valid_end,
                        dropped = end - valid_end,
                        "Truncated torn record at the end of the block log"
                    );
                    log.set_len(valid_end)?;
                    end = valid_end;
                }
                write_index(&index_path, &offsets)?;
                info!(dir = %dir.display(), blocks = offsets.len(), "Rebuilt block log index");
                offsets
            }
        };
        let index = OpenOptions::new().append(true).create(true).open(&index_path)?;

        let head = match offsets.last() {
            Some(&offset) => Some(read_record(&log, offset)?),
            None => None,
        };
        info!(
            dir = %dir.display(),
            head_block = head.as_ref().map_or(0, SignedBlock::block_num),
            "Opened block log"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            log,
            index,
            offsets,
            end,
            head,
            _lock: lock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BlockLog for FileBlockLog {
    fn append(&mut self, block: &SignedBlock) -> BlockLogResult<()> {
        let expected = self.head_block_num() + 1;
        if block.block_num() != expected {
            return Err(BlockLogError::NonSequential {
                expected,
                actual: block.block_num(),
            });
        }
        let bytes = bincode::serialize(block)?;
        let len = u32::try_from(bytes.len()).map_err(|_| BlockLogError::Corrupt {
            offset: self.end,
            reason: format!("record of {} bytes does not fit a length prefix", bytes.len()),
        })?;

        let offset = self.end;
        let mut record = Vec::with_capacity(bytes.len() + LEN_PREFIX as usize);
        record.extend_from_slice(&len.to_le_bytes());
        record.extend_from_slice(&bytes);
        self.log.write_all(&record)?;
        self.index.write_all(&offset.to_le_bytes())?;

        self.offsets.push(offset);
        self.end += record.len() as u64;
        self.head = Some(block.clone());
        Ok(())
    }

    fn read_block_by_num(&self, block_num: u32) -> BlockLogResult<Option<SignedBlock>> {
        let Some(&offset) = block_num
            .checked_sub(1)
            .and_then(|i| self.offsets.get(i as usize))
        else {
            return Ok(None);
        };
        Ok(Some(read_record(&self.log, offset)?))
    }

    fn head(&self) -> Option<&SignedBlock> {
        self.head.as_ref()
    }

    fn flush(&mut self) -> BlockLogResult<()> {
        self.log.sync_all()?;
        self.index.sync_all()?;
        Ok(())
    }
}

fn read_record(log: &File, offset: u64) -> BlockLogResult<SignedBlock> {
    let mut reader = log;
    reader.seek(SeekFrom::Start(offset))?;
    let mut len = [0u8; 4];
    reader.read_exact(&mut len)?;
    let len = u32::from_le_bytes(len);
    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes)?;
    bincode::deserialize(&bytes).map_err(|e| BlockLogError::Corrupt {
        offset,
        reason: e.to_string(),
    })
}

/// Offsets of every complete record, and where the complete records end.
fn scan_log(log: &File, end: u64) -> BlockLogResult<(Vec<u64>, u64)> {
    let mut offsets = Vec::new();
    let mut offset = 0;
    let mut reader = log;
    while offset + LEN_PREFIX <= end {
        reader.seek(SeekFrom::Start(offset))?;
        let mut len = [0u8; 4];
        reader.read_exact(&mut len)?;
        let next = offset + LEN_PREFIX + u64::from(u32::from_le_bytes(len));
        if next > end {
            break;
        }
        offsets.push(offset);
        offset = next;
    }
    Ok((offsets, offset))
}

/// The stored index, when it describes exactly the records in the log.
fn read_index(path: &Path, log: &File, end: u64) -> BlockLogResult<Option<Vec<u64>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if bytes.len() % 8 != 0 {
        return Ok(None);
    }
    let offsets: Vec<u64> = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            u64::from_le_bytes(raw)
        })
        .collect();

    let Some(&last) = offsets.last() else {
        return Ok((end == 0).then_some(offsets));
    };
    if last + LEN_PREFIX > end {
        return Ok(None);
    }
    let mut reader = log;
    reader.seek(SeekFrom::Start(last))?;
    let mut len = [0u8; 4];
    reader.read_exact(&mut len)?;
    let consistent = last + LEN_PREFIX + u64::from(u32::from_le_bytes(len)) == end;
    Ok(consistent.then_some(offsets))
}

fn write_index(path: &Path, offsets: &[u64]) -> BlockLogResult<()> {
    let bytes: Vec<u8> = offsets.iter().flat_map(|o| o.to_le_bytes()).collect();
    let temp = path.with_extension("tmp");
    let mut file = File::create(&temp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    fs::rename(&temp, path)?;
    Ok(())
}
