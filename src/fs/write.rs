//! 文件和目录创建
//!
//! 元数据（位图、inode、父目录块）经过 journal；新文件的数据块写入
//! 刚分配、尚未被引用的块，直接落盘，在 commit 的第一个写屏障之前完成。

use super::filesystem::JfsFileSystem;
use crate::{
    balloc::alloc_block,
    block::BlockDevice,
    consts::*,
    dir::{append_entry, find_root, lookup_entry, resolve_path, split_path},
    error::{Error, ErrorKind, Result},
    ialloc::alloc_inode,
    inode::{load_inode, store_inode, Inode, InodeType},
    journal::JournalTrans,
};
use alloc::vec;

impl<D: BlockDevice> JfsFileSystem<D> {
    /// 创建普通文件并写入全部内容
    ///
    /// # 参数
    ///
    /// * `path` - 文件路径，父目录必须存在
    /// * `data` - 文件内容，最多 14 块
    ///
    /// # 返回
    ///
    /// 新文件的 inode 编号
    ///
    /// # 错误
    ///
    /// - `AlreadyExists` - 同名目录项已存在
    /// - `IllegalOperation` - 名称与 journal 文件相同
    /// - `NoSpace` - 空闲块、空闲 inode 或父目录块空间不足
    pub fn create_file(&mut self, path: &str, data: &[u8]) -> Result<u32> {
        self.require_recovered()?;
        if data.len() > JFS_MAX_FILE_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "File content exceeds the block pointer limit"));
        }
        self.create_node(path, InodeType::File, data)
    }

    /// 创建空目录
    ///
    /// 新目录分配一个数据块，逻辑大小为 0。
    pub fn mkdir(&mut self, path: &str) -> Result<u32> {
        self.require_recovered()?;
        self.create_node(path, InodeType::Directory, &[])
    }

    fn create_node(&mut self, path: &str, itype: InodeType, data: &[u8]) -> Result<u32> {
        let (parent_path, leaf) = split_path(path);
        if leaf == JFS_JOURNAL_NAME {
            return Err(Error::new(ErrorKind::IllegalOperation, "Name is reserved for the journal"));
        }
        if leaf.is_empty() || leaf.len() > MAX_FILENAME_LEN {
            return Err(Error::new(ErrorKind::InvalidInput, "Invalid file name"));
        }

        let root = find_root(&self.sb);
        let parent_ino = resolve_path(&mut self.bdev, &self.sb, parent_path, root, InodeType::Directory)?;
        if lookup_entry(&mut self.bdev, &self.sb, parent_ino, leaf)?.is_some() {
            return Err(Error::new(ErrorKind::AlreadyExists, "Entry already exists"));
        }

        let mut trans = JournalTrans::begin(&mut self.bdev, &self.sb)?;

        let ino = alloc_inode(&mut trans)?;
        let mut inode = Inode::empty();
        inode.itype = itype;

        match itype {
            InodeType::Directory => {
                let block = alloc_block(&mut trans)?;
                trans.write_ordered(block as u64, &vec![0u8; JFS_BLOCK_SIZE])?;
                inode.blockptrs[0] = block;
            }
            _ => {
                for (i, chunk) in data.chunks(JFS_BLOCK_SIZE).enumerate() {
                    let block = alloc_block(&mut trans)?;
                    let mut buf = vec![0u8; JFS_BLOCK_SIZE];
                    buf[..chunk.len()].copy_from_slice(chunk);
                    trans.write_ordered(block as u64, &buf)?;
                    inode.blockptrs[i] = block;
                }
                inode.size = data.len() as u32;
            }
        }
        store_inode(&mut trans, ino, &inode)?;

        let mut parent = load_inode(&mut trans, parent_ino)?;
        if parent.blockptrs[0] == NO_BLOCK {
            let block = alloc_block(&mut trans)?;
            trans.write_ordered(block as u64, &vec![0u8; JFS_BLOCK_SIZE])?;
            parent.blockptrs[0] = block;
        }
        let live_len = parent.live_len();
        let added = trans.modify_block(parent.blockptrs[0] as u64, |block| {
            append_entry(block, live_len, leaf, ino, itype.dir_entry_type())
        })??;
        parent.size += added as u32;
        store_inode(&mut trans, parent_ino, &parent)?;

        trans.commit()?;
        log::debug!("[FS] created {} (inode {}, {:?})", path, ino, itype);
        Ok(ino)
    }
}
