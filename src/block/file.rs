//! 镜像文件块设备

use super::BlockDevice;
use crate::consts::JFS_BLOCK_SIZE;
use crate::error::{Error, ErrorKind, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// 以普通文件作为后端的块设备
#[derive(Debug)]
pub struct FileDevice {
    file: File,
    total_blocks: u64,
}

impl FileDevice {
    /// 以读写方式打开已有镜像文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::with_cause(ErrorKind::Io, "failed to open volume image", e))?;
        let len = file
            .metadata()
            .map_err(|e| Error::with_cause(ErrorKind::Io, "failed to stat volume image", e))?
            .len();

        Ok(Self {
            file,
            total_blocks: len / JFS_BLOCK_SIZE as u64,
        })
    }

    /// 创建指定块数的镜像文件（已存在则截断）
    pub fn create<P: AsRef<Path>>(path: P, total_blocks: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::with_cause(ErrorKind::Io, "failed to create volume image", e))?;
        file.set_len(total_blocks * JFS_BLOCK_SIZE as u64)
            .map_err(|e| Error::with_cause(ErrorKind::Io, "failed to size volume image", e))?;

        Ok(Self { file, total_blocks })
    }

    fn seek_to(&mut self, lba: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(lba * JFS_BLOCK_SIZE as u64))
            .map_err(|e| Error::with_cause(ErrorKind::Io, "seek failed", e))?;
        Ok(())
    }
}

impl BlockDevice for FileDevice {
    fn block_size(&self) -> u32 {
        JFS_BLOCK_SIZE as u32
    }

    fn sector_size(&self) -> u32 {
        JFS_BLOCK_SIZE as u32
    }

    fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
        let len = count as usize * JFS_BLOCK_SIZE;
        self.seek_to(lba)?;
        self.file
            .read_exact(&mut buf[..len])
            .map_err(|e| Error::with_cause(ErrorKind::Io, "read failed", e))?;
        Ok(len)
    }

    fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
        let len = count as usize * JFS_BLOCK_SIZE;
        self.seek_to(lba)?;
        self.file
            .write_all(&buf[..len])
            .map_err(|e| Error::with_cause(ErrorKind::Io, "write failed", e))?;
        Ok(len)
    }

    fn flush(&mut self) -> Result<()> {
        self.file
            .sync_data()
            .map_err(|e| Error::with_cause(ErrorKind::Io, "sync failed", e))
    }
}
