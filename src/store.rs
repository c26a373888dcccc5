//! 基于 LMDB 的记录存储
//!
//! 只使用 LMDB 的默认（无名）数据库，key 和 value 都是原始字节。

use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions, RoTxn, RwTxn, WithTls};
use log::{debug, warn};

use crate::error::{Error, Result};

/// 每条记录默认预留的字节数
pub const DEFAULT_BYTES_PER_ITEM: u64 = 100_000_000;

/// map size 的对齐单位，需要是系统页大小的整数倍
const MAP_ALIGN: usize = 64 * 1024;

/// 新建数据库时的容量预留策略：每条记录固定预算 × 记录数
///
/// 预留不足会在写入时报 [`Error::StoreFull`]，预留过多只会浪费地址空间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub bytes_per_item: u64,
}

impl Default for Capacity {
    fn default() -> Self {
        Self { bytes_per_item: DEFAULT_BYTES_PER_ITEM }
    }
}

impl Capacity {
    pub fn new(bytes_per_item: u64) -> Self {
        Self { bytes_per_item }
    }

    /// 计算容纳 `items` 条记录所需的 map size
    pub fn map_size(&self, items: usize) -> usize {
        let per_item = usize::try_from(self.bytes_per_item).unwrap_or(usize::MAX);
        let raw = per_item.saturating_mul(items).max(MAP_ALIGN);
        raw.checked_next_multiple_of(MAP_ALIGN).unwrap_or(usize::MAX / MAP_ALIGN * MAP_ALIGN)
    }
}

/// 新建数据库时的选项
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// 容量预留
    pub capacity: Capacity,
    /// 每写入多少条记录提交一次，None 表示全部写完后提交
    pub commit_every: Option<NonZeroUsize>,
    /// 目标已存在时删除后重建
    pub overwrite: bool,
}

/// 只读打开的数据库
pub struct StoreReader {
    env: Env<WithTls>,
    db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl StoreReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| Error::StoreOpen { path: path.clone(), source };

        let env = unsafe {
            let mut options = EnvOpenOptions::new();
            options.flags(EnvFlags::READ_ONLY);
            options.open(&path)
        }
        .map_err(open_err)?;

        let txn = env.read_txn().map_err(open_err)?;
        let db = env
            .open_database::<Bytes, Bytes>(&txn, None)
            .map_err(open_err)?
            .ok_or_else(|| open_err(heed::Error::Mdb(heed::MdbError::NotFound)))?;
        txn.commit().map_err(open_err)?;

        debug!("opened {} read-only", path.display());
        Ok(Self { env, db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_txn(&self) -> Result<RoTxn<'_, WithTls>> {
        Ok(self.env.read_txn()?)
    }

    /// 记录总数
    pub fn len(&self, txn: &RoTxn<'_, WithTls>) -> Result<u64> {
        Ok(self.db.len(txn)?)
    }

    /// 按 key 的顺序遍历所有记录
    pub fn iter<'t>(
        &self,
        txn: &'t RoTxn<'_, WithTls>,
    ) -> Result<impl Iterator<Item = Result<(&'t [u8], &'t [u8])>>> {
        Ok(self.db.iter(txn)?.map(|item| item.map_err(Error::from)))
    }
}

/// 新建的可写数据库
pub struct StoreWriter {
    env: Env<WithTls>,
    db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl StoreWriter {
    /// 新建数据库，目标已存在时只有 `overwrite` 为 true 才会删除旧数据
    pub fn create<P: AsRef<Path>>(path: P, map_size: usize, overwrite: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            if !overwrite {
                return Err(Error::StoreExists { path });
            }
            warn!("removing existing store {}", path.display());
            fs::remove_dir_all(&path)?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // 只新建最后一级目录，路径经 `..` 解析后指向已有目录时不会被当作新目录
        match fs::create_dir(&path) {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::StoreExists { path });
            }
            result => result?,
        }

        match Self::open_env(&path, map_size) {
            Ok((env, db)) => {
                debug!("created {} with map size {}", path.display(), map_size);
                Ok(Self { env, db, path })
            }
            Err(source) => {
                let _ = fs::remove_dir_all(&path);
                Err(Error::StoreOpen { path, source })
            }
        }
    }

    /// 按 `options` 新建一个能容纳 `items` 条记录的数据库
    pub fn create_for<P>(path: P, items: usize, options: &WriteOptions) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::create(path, options.capacity.map_size(items), options.overwrite)
    }

    fn open_env(
        path: &Path,
        map_size: usize,
    ) -> heed::Result<(Env<WithTls>, Database<Bytes, Bytes>)> {
        let env = unsafe { EnvOpenOptions::new().map_size(map_size).open(path)? };
        let mut txn = env.write_txn()?;
        let db = env.create_database::<Bytes, Bytes>(&mut txn, None)?;
        txn.commit()?;
        Ok((env, db))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 开始写入，`commit_every` 为 None 时只在最后提交一次
    pub fn batch(&self, commit_every: Option<NonZeroUsize>) -> Result<BatchWriter<'_>> {
        let txn = self.env.write_txn()?;
        Ok(BatchWriter {
            env: &self.env,
            db: self.db,
            txn: Some(txn),
            commit_every,
            pending: 0,
            written: 0,
        })
    }

    /// 关闭并删除整个数据库目录，用于出错后的回滚
    pub fn discard(self) {
        let Self { env, path, .. } = self;
        drop(env);
        match fs::remove_dir_all(&path) {
            Ok(()) => warn!("removed incomplete store {}", path.display()),
            Err(e) => warn!("failed to remove incomplete store {}: {}", path.display(), e),
        }
    }
}

/// 按批次提交的写入器
///
/// 未调用 [`BatchWriter::commit`] 就被 drop 时，最后一个批次会被放弃
pub struct BatchWriter<'e> {
    env: &'e Env<WithTls>,
    db: Database<Bytes, Bytes>,
    // commit 需要消耗所有权，换批次时用 Option 取出
    txn: Option<RwTxn<'e>>,
    commit_every: Option<NonZeroUsize>,
    pending: usize,
    written: usize,
}

impl BatchWriter<'_> {
    /// 已写入（包括尚未提交）的记录数
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let written = self.written;
        let txn = match &mut self.txn {
            Some(txn) => txn,
            slot => slot.insert(self.env.write_txn()?),
        };
        self.db.put(txn, key, value).map_err(|e| Error::on_write(e, written))?;
        self.pending += 1;
        self.written += 1;

        if self.commit_every.is_some_and(|n| self.pending >= n.get()) {
            self.commit_pending()?;
            self.txn = Some(self.env.write_txn()?);
        }
        Ok(())
    }

    /// 提交剩余的记录，返回写入总数
    pub fn commit(mut self) -> Result<usize> {
        self.commit_pending()?;
        Ok(self.written)
    }

    fn commit_pending(&mut self) -> Result<()> {
        if let Some(txn) = self.txn.take() {
            txn.commit().map_err(|e| Error::on_write(e, self.written))?;
            debug!("committed {} records ({} total)", self.pending, self.written);
            self.pending = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_map_size() {
        let capacity = Capacity::new(1000);
        assert_eq!(capacity.map_size(0), MAP_ALIGN);
        assert_eq!(capacity.map_size(10), MAP_ALIGN);
        assert_eq!(capacity.map_size(100), 2 * MAP_ALIGN);
        assert_eq!(Capacity::default().map_size(3) % MAP_ALIGN, 0);
        assert!(Capacity::default().map_size(3) >= 300_000_000);
        assert_eq!(Capacity::new(u64::MAX).map_size(usize::MAX) % MAP_ALIGN, 0);
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("db");

        {
            let writer = StoreWriter::create(&path, 1 << 20, false).unwrap();
            let mut batch = writer.batch(None).unwrap();
            // 写入顺序与 key 顺序不同
            for key in ["b", "c", "a"] {
                batch.put(key.as_bytes(), key.repeat(3).as_bytes()).unwrap();
            }
            assert_eq!(batch.commit().unwrap(), 3);
        }

        let reader = StoreReader::open(&path).unwrap();
        let txn = reader.read_txn().unwrap();
        assert_eq!(reader.len(&txn).unwrap(), 3);
        let items = reader
            .iter(&txn)
            .unwrap()
            .map(|item| item.map(|(k, v)| (k.to_vec(), v.to_vec())))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(items[0], (b"a".to_vec(), b"aaa".to_vec()));
        assert_eq!(items[2], (b"c".to_vec(), b"ccc".to_vec()));
    }

    #[test]
    fn test_batch_commit() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("db");

        {
            let writer = StoreWriter::create(&path, 1 << 20, false).unwrap();
            let mut batch = writer.batch(NonZeroUsize::new(2)).unwrap();
            for i in 0..5u8 {
                batch.put(&[i], &[i]).unwrap();
            }
            assert_eq!(batch.written(), 5);
            // 不提交，最后一个批次被丢弃
        }

        let reader = StoreReader::open(&path).unwrap();
        let txn = reader.read_txn().unwrap();
        assert_eq!(reader.len(&txn).unwrap(), 4);
    }

    #[test]
    fn test_create_existing() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("db");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("marker"), b"x").unwrap();

        let err = StoreWriter::create(&path, 1 << 20, false).err().unwrap();
        assert!(matches!(err, Error::StoreExists { .. }));
        assert!(path.join("marker").exists());

        let writer = StoreWriter::create(&path, 1 << 20, true).unwrap();
        assert!(!path.join("marker").exists());
        writer.discard();
        assert!(!path.exists());
    }

    #[test]
    fn test_open_missing() {
        let temp_dir = tempdir().unwrap();
        let err = StoreReader::open(temp_dir.path().join("missing")).err().unwrap();
        assert!(matches!(err, Error::StoreOpen { .. }));
    }

    #[test]
    fn test_store_full() {
        let temp_dir = tempdir().unwrap();
        let writer = StoreWriter::create(temp_dir.path().join("db"), MAP_ALIGN, false).unwrap();
        let mut batch = writer.batch(None).unwrap();
        let value = vec![0u8; 12288];
        let err = (0..32u8)
            .map(|i| batch.put(&[i], &value))
            .find_map(|r| r.err())
            .unwrap();
        assert!(matches!(err, Error::StoreFull { .. }));
    }
}
