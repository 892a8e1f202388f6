//! 目录项解码与扫描
//!
//! 目录项格式（小端）：
//!
//! ```text
//! +-----------+---------+-----------+-------+------------------+
//! | entry_len | namelen | file_type | inode | name (namelen B) |
//! |   u16     |   u8    |    u8     |  u32  |                  |
//! +-----------+---------+-----------+-------+------------------+
//! ```
//!
//! 所有扫描都以目录的有效长度为界，有效长度之后的字节是压缩后残留的旧数据，
//! 不参与匹配。

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
};
use alloc::string::String;
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

/// 目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// 子 inode 编号
    pub inode: u32,
    /// 目录项类型（`DT_FILE` / `DT_DIRECTORY`）
    pub file_type: u8,
    /// 名称
    pub name: String,
    /// 目录项总长度（含头部）
    pub entry_len: u16,
    /// 在目录块中的偏移
    pub offset: usize,
}

impl DirEntry {
    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        self.file_type == DT_DIRECTORY
    }

    /// 是否为普通文件
    pub fn is_file(&self) -> bool {
        self.file_type == DT_FILE
    }
}

/// 原始目录项（名称仍指向块内字节）
struct RawEntry<'b> {
    entry_len: u16,
    file_type: u8,
    inode: u32,
    name: &'b [u8],
}

/// 解码 `offset` 处的目录项
///
/// 头部越过有效长度、`entry_len` 放不下名称、或者整个目录项越过有效长度时
/// 返回 `Corrupted`，不会读出块外。
fn parse_raw(block: &[u8], offset: usize, live_len: usize) -> Result<RawEntry<'_>> {
    if offset + DIR_ENTRY_HEADER_LEN > live_len {
        return Err(Error::new(ErrorKind::Corrupted, "Directory entry header truncated"));
    }

    let header = &block[offset..offset + DIR_ENTRY_HEADER_LEN];
    let entry_len = LittleEndian::read_u16(&header[0..2]);
    let namelen = header[2] as usize;
    let file_type = header[3];
    let inode = LittleEndian::read_u32(&header[4..8]);

    if namelen == 0 || (entry_len as usize) < DIR_ENTRY_HEADER_LEN + namelen {
        return Err(Error::new(ErrorKind::Corrupted, "Directory entry length too small"));
    }
    if offset + entry_len as usize > live_len {
        return Err(Error::new(ErrorKind::Corrupted, "Directory entry overruns directory"));
    }

    let name_start = offset + DIR_ENTRY_HEADER_LEN;
    Ok(RawEntry {
        entry_len,
        file_type,
        inode,
        name: &block[name_start..name_start + namelen],
    })
}

/// 在 `[0, live_len)` 范围内按顺序访问目录项
///
/// 回调返回 `Some` 时停止扫描并返回该值。
fn scan<'b, T>(
    block: &'b [u8],
    live_len: usize,
    mut visit: impl FnMut(usize, RawEntry<'b>) -> Result<Option<T>>,
) -> Result<Option<T>> {
    let live_len = live_len.min(block.len());
    let mut offset = 0;

    while offset < live_len {
        let raw = parse_raw(block, offset, live_len)?;
        let entry_len = raw.entry_len as usize;
        if let Some(found) = visit(offset, raw)? {
            return Ok(Some(found));
        }
        offset += entry_len;
    }

    Ok(None)
}

fn to_entry(offset: usize, raw: RawEntry<'_>) -> Result<DirEntry> {
    let name = core::str::from_utf8(raw.name)
        .map_err(|_| Error::new(ErrorKind::Corrupted, "Directory entry name is not UTF-8"))?;
    Ok(DirEntry {
        inode: raw.inode,
        file_type: raw.file_type,
        name: String::from(name),
        entry_len: raw.entry_len,
        offset,
    })
}

/// 列出目录块中的所有有效目录项
///
/// # 参数
///
/// * `block` - 目录块数据
/// * `live_len` - 目录有效长度
pub fn read_entries(block: &[u8], live_len: usize) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    let _: Option<()> = scan(block, live_len, |offset, raw| {
        entries.push(to_entry(offset, raw)?);
        Ok(None)
    })?;
    Ok(entries)
}

/// 按名称查找目录项
///
/// # 返回
///
/// 找到返回 `Some(DirEntry)`；扫描到有效长度末尾仍未找到返回 `None`
pub fn find_entry(block: &[u8], live_len: usize, name: &str) -> Result<Option<DirEntry>> {
    scan(block, live_len, |offset, raw| {
        if raw.name == name.as_bytes() {
            to_entry(offset, raw).map(Some)
        } else {
            Ok(None)
        }
    })
}

/// 在 `offset` 处写入一个目录项
pub(crate) fn write_entry(block: &mut [u8], offset: usize, entry_len: u16, name: &str, inode: u32, file_type: u8) {
    let name = name.as_bytes();
    LittleEndian::write_u16(&mut block[offset..offset + 2], entry_len);
    block[offset + 2] = name.len() as u8;
    block[offset + 3] = file_type;
    LittleEndian::write_u32(&mut block[offset + 4..offset + 8], inode);
    let name_start = offset + DIR_ENTRY_HEADER_LEN;
    block[name_start..name_start + name.len()].copy_from_slice(name);
}
