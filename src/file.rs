//! Chunked file handle / 分片文件句柄
//!
//! Reads pull download chunks on demand into a leftover buffer. Writes are
//! buffered in memory and uploaded as one object on the first flush or
//! close that has something to commit. Append mode downloads the current
//! content first and uploads the concatenation (not an atomic append).

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use crate::error::{BackendResultExt, FsError, FsResult};
use crate::mode::OpenMode;
use crate::storage::{ChunkStream, ObjectStore};

struct ChunkReader {
    key: String,
    /// `None` once the source is drained or failed
    chunks: Option<ChunkStream>,
    leftover: BytesMut,
}

impl ChunkReader {
    fn new(key: String, chunks: ChunkStream) -> Self {
        Self {
            key,
            chunks: Some(chunks),
            leftover: BytesMut::new(),
        }
    }

    /// Pull one chunk into `leftover`; `false` when nothing more will come
    async fn pull(&mut self) -> FsResult<bool> {
        let Some(chunks) = self.chunks.as_mut() else {
            return Ok(false);
        };
        match chunks.next().await {
            Some(Ok(chunk)) => {
                self.leftover.extend_from_slice(&chunk);
                Ok(true)
            }
            Some(Err(e)) => {
                self.chunks = None;
                self.leftover.clear();
                Err(e).for_path(&self.key)
            }
            None => {
                self.chunks = None;
                Ok(false)
            }
        }
    }

    async fn read_bytes(&mut self, n: usize) -> FsResult<Bytes> {
        while self.leftover.len() < n {
            if !self.pull().await? {
                break;
            }
        }
        let take = n.min(self.leftover.len());
        Ok(self.leftover.split_to(take).freeze())
    }

    async fn read_line(&mut self, max_size: Option<usize>) -> FsResult<Bytes> {
        let mut scanned = 0;
        let end = loop {
            if let Some(pos) = self.leftover[scanned..].iter().position(|b| *b == b'\n') {
                break scanned + pos + 1;
            }
            scanned = self.leftover.len();
            if matches!(max_size, Some(max) if scanned >= max) {
                break scanned;
            }
            if !self.pull().await? {
                break self.leftover.len();
            }
        };
        let end = max_size.map_or(end, |max| end.min(max));
        Ok(self.leftover.split_to(end).freeze())
    }

    async fn read_all(&mut self) -> FsResult<Bytes> {
        let mut out = self.leftover.split();
        if let Some(mut chunks) = self.chunks.take() {
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(chunk) => out.extend_from_slice(&chunk),
                    Err(e) => return Err(e).for_path(&self.key),
                }
            }
        }
        Ok(out.freeze())
    }
}

/// File handle over one object / 单个对象的文件句柄
pub struct ChunkedFile {
    store: Arc<dyn ObjectStore>,
    key: String,
    mode: OpenMode,
    reader: Option<ChunkReader>,
    /// `Some` once `write` has been called and until the commit
    pending: Option<BytesMut>,
    committed: bool,
    closed: bool,
}

impl ChunkedFile {
    pub(crate) fn new(store: Arc<dyn ObjectStore>, key: String, mode: OpenMode) -> Self {
        Self {
            store,
            key,
            mode,
            reader: None,
            pending: None,
            committed: false,
            closed: false,
        }
    }

    /// Object key (the normalized path) / 对象键
    pub fn path(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn readable(&self) -> bool {
        self.mode.reading
    }

    pub fn writable(&self) -> bool {
        self.mode.writing
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> FsResult<()> {
        if self.closed {
            return Err(FsError::Unsupported(format!("I/O on closed file {:?}", self.key)));
        }
        Ok(())
    }

    async fn reader(&mut self) -> FsResult<&mut ChunkReader> {
        self.check_open()?;
        if !self.mode.reading {
            return Err(FsError::Unsupported(format!("file {:?} not open for reading", self.key)));
        }
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => {
                let chunks = self.store.open_download_stream(&self.key).await.for_path(&self.key)?;
                tracing::debug!("Download stream opened: {}", self.key);
                ChunkReader::new(self.key.clone(), chunks)
            }
        };
        Ok(self.reader.insert(reader))
    }

    /// Read up to `n` bytes; fewer only at end of file, empty after / 读取n字节
    pub async fn read_bytes(&mut self, n: usize) -> FsResult<Bytes> {
        self.reader().await?.read_bytes(n).await
    }

    /// Read through the next newline, or at most `max_size` bytes.
    /// Whatever is cut off stays buffered for the next read.
    ///
    /// `Some(0)` returns an empty slice and consumes nothing, so an empty
    /// result only means end of file when `max_size` is `None` or non-zero.
    pub async fn read_line(&mut self, max_size: Option<usize>) -> FsResult<Bytes> {
        self.reader().await?.read_line(max_size).await
    }

    /// Everything not yet read / 读取剩余全部内容
    pub async fn read_all(&mut self) -> FsResult<Bytes> {
        self.reader().await?.read_all().await
    }

    pub async fn next_line(&mut self) -> FsResult<Option<Bytes>> {
        let line = self.read_line(None).await?;
        Ok(if line.is_empty() { None } else { Some(line) })
    }

    /// Remaining lines as a stream; a single forward pass / 按行迭代
    pub fn lines(&mut self) -> impl Stream<Item = FsResult<Bytes>> + '_ {
        stream::try_unfold(self, |file| async move {
            Ok::<_, FsError>(file.next_line().await?.map(|line| (line, file)))
        })
    }

    fn buffer(&mut self) -> FsResult<&mut BytesMut> {
        self.check_open()?;
        if !self.mode.writing {
            return Err(FsError::Unsupported(format!("file {:?} not open for writing", self.key)));
        }
        if self.committed {
            return Err(FsError::Unsupported(format!("file {:?} already committed", self.key)));
        }
        Ok(self.pending.get_or_insert_with(BytesMut::new))
    }

    /// Buffer `data`; nothing reaches the store until flush / 写入缓冲区
    pub fn write(&mut self, data: &[u8]) -> FsResult<usize> {
        self.buffer()?.extend_from_slice(data);
        Ok(data.len())
    }

    /// Write each line followed by `\n` / 逐行写入
    pub fn write_lines<I, L>(&mut self, lines: I) -> FsResult<()>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let buf = self.buffer()?;
        for line in lines {
            buf.extend_from_slice(line.as_ref());
            buf.extend_from_slice(b"\n");
        }
        Ok(())
    }

    /// Commit buffered writes; later calls are no-ops / 提交缓冲区
    pub async fn flush(&mut self) -> FsResult<()> {
        if self.closed || self.committed {
            return Ok(());
        }
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        self.committed = true;
        self.commit(pending.freeze()).await
    }

    async fn commit(&self, data: Bytes) -> FsResult<()> {
        let key = &self.key;
        let payload = if self.mode.appending && self.store.object_exists(key).await.for_path(key)? {
            let mut chunks = self.store.open_download_stream(key).await.for_path(key)?;
            let mut merged = BytesMut::new();
            while let Some(chunk) = chunks.next().await {
                merged.extend_from_slice(&chunk.for_path(key)?);
            }
            tracing::debug!("Append merge: {} existing={} new={}", key, merged.len(), data.len());
            merged.extend_from_slice(&data);
            merged.freeze()
        } else {
            data
        };

        tracing::debug!("Commit: {} size={}", key, payload.len());
        self.store.upload_overwrite(key, payload).await.for_path(key)
    }

    /// Flush and release the handle / 关闭句柄
    pub async fn close(&mut self) -> FsResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.flush().await;
        self.closed = true;
        self.reader = None;
        result
    }
}

impl Drop for ChunkedFile {
    fn drop(&mut self) {
        if let Some(pending) = &self.pending {
            if !self.committed && !pending.is_empty() {
                tracing::warn!(
                    "File {:?} dropped without close, {} buffered bytes discarded",
                    self.key,
                    pending.len()
                );
            }
        }
    }
}

impl std::fmt::Debug for ChunkedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedFile")
            .field("key", &self.key)
            .field("mode", &self.mode.to_string())
            .field("committed", &self.committed)
            .field("closed", &self.closed)
            .finish()
    }
}
