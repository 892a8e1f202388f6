//! jfs_checklog - 检查并恢复 jfs 卷的 journal
//!
//! 用法：
//!   jfs_checklog disk.img            # 报告 pending 记录数，不修改镜像
//!   jfs_checklog --recover disk.img  # 重放 pending 事务

use clap::Parser;
use jfs_core::{FileDevice, JfsFileSystem};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "jfs_checklog")]
#[command(about = "Inspect and recover the journal of a jfs volume image")]
struct Args {
    /// Volume image file
    volume: PathBuf,

    /// Replay pending transactions
    #[arg(short, long)]
    recover: bool,

    /// Print filesystem usage
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> jfs_core::Result<usize> {
    let device = FileDevice::open(&args.volume)?;
    let mut fs = JfsFileSystem::open(device)?;

    let pending = fs.pending_records()?;
    println!("{}: {} pending journal record(s)", args.volume.display(), pending);

    if args.verbose {
        let stat = fs.statfs()?;
        println!(
            "blocks: {}/{} free, inodes: {}/{} free",
            stat.free_blocks_count, stat.blocks_count, stat.free_inodes_count, stat.inodes_count
        );
        let bdev = fs.bdev();
        print!("reads: {} ({} from device)", bdev.read_count(), bdev.physical_read_count());
        match bdev.cache_stats() {
            Some(cache) => println!(", cache hit rate {:.1}%", cache.hit_rate() * 100.0),
            None => println!(),
        }
    }

    if args.recover {
        let completed = fs.recover()?;
        fs.unmount()?;
        println!("recovered {} transaction(s)", completed);
        return Ok(0);
    }
    Ok(pending)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        // 有未恢复的事务
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            eprintln!("jfs_checklog: {}", e);
            ExitCode::FAILURE
        }
    }
}
