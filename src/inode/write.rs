//! Inode 写入
//!
//! inode 的修改总是写入事务的块覆盖层，随事务一起提交。

use super::read::{inode_to_block, Inode};
use crate::{
    block::BlockDevice,
    consts::*,
    error::Result,
    journal::JournalTrans,
};
use byteorder::{ByteOrder, LittleEndian};

impl Inode {
    /// 编码为 64 字节记录
    pub fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u16(&mut buf[0..2], self.itype as u16);
        LittleEndian::write_u16(&mut buf[2..4], 0);
        LittleEndian::write_u32(&mut buf[4..8], self.size);
        LittleEndian::write_u32_into(&self.blockptrs, &mut buf[8..INODE_SIZE]);
    }
}

/// 在事务中读取 inode（能看到本事务之前的修改）
pub fn load_inode<D: BlockDevice>(trans: &mut JournalTrans<'_, D>, ino: u32) -> Result<Inode> {
    let (lba, offset) = inode_to_block(trans.superblock(), ino)?;
    let buf = trans.read_block(lba)?;
    Inode::decode(&buf[offset..offset + INODE_SIZE])
}

/// 在事务中写入 inode
///
/// 读出所在的 inode 表块，改写对应的 64 字节后放回事务。
pub fn store_inode<D: BlockDevice>(trans: &mut JournalTrans<'_, D>, ino: u32, inode: &Inode) -> Result<()> {
    let (lba, offset) = inode_to_block(trans.superblock(), ino)?;
    trans.modify_block(lba, |data| inode.encode(&mut data[offset..offset + INODE_SIZE]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inode::InodeType;

    #[test]
    fn test_encode_decode() {
        let mut inode = Inode::empty();
        inode.itype = InodeType::Directory;
        inode.size = 38;
        inode.blockptrs[0] = 17;

        let mut buf = [0u8; INODE_SIZE];
        inode.encode(&mut buf);
        assert_eq!(LittleEndian::read_u32(&buf[8..12]), 17);
        assert_eq!(LittleEndian::read_u32(&buf[12..16]), NO_BLOCK);
        assert_eq!(Inode::decode(&buf).unwrap(), inode);
    }
}
