//! Byte-counting stream decorators
//!
//! [`ProgressReader`] and [`ProgressWriter`] wrap any tokio stream, count the
//! bytes that pass through, and notify a [`ProgressObserver`] after every
//! successful read or write. The CLI renders the notifications; the core only
//! keeps the counters.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Progress of a single transfer
///
/// The counter sits behind a mutex because the transport may poll the
/// wrapped stream from more than one task.
#[derive(Debug)]
pub struct TransferProgress {
    total: Option<u64>,
    transferred: Mutex<u64>,
}

impl TransferProgress {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            transferred: Mutex::new(0),
        }
    }

    /// Expected number of bytes, if known
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Bytes transferred so far
    pub fn transferred(&self) -> u64 {
        *self.lock()
    }

    /// Add `n` bytes to the counter and return the new total
    pub fn advance(&self, n: u64) -> u64 {
        let mut transferred = self.lock();
        *transferred += n;
        *transferred
    }

    /// Completion percentage (0-100), `None` when the total is unknown
    pub fn percent(&self) -> Option<f64> {
        let total = self.total?;
        if total == 0 {
            return Some(100.0);
        }
        Some(self.transferred() as f64 / total as f64 * 100.0)
    }

    /// Render as `transferred / total (pp.pp%)`, or `transferred bytes`
    /// when the total is unknown
    pub fn describe(&self) -> String {
        let transferred = self.transferred();
        match (self.total, self.percent()) {
            (Some(total), Some(percent)) => format!("{transferred} / {total} ({percent:.2}%)"),
            _ => format!("{transferred} bytes"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.transferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receives progress notifications from the stream decorators
pub trait ProgressObserver: Send + Sync {
    /// Called after every read or write that moved at least one byte
    fn on_progress(&self, progress: &TransferProgress);

    /// A non-fatal condition worth telling the user about
    fn warn(&self, _message: &str) {}

    /// The transfer completed successfully
    fn finish(&self, _progress: &TransferProgress) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _progress: &TransferProgress) {}
}

/// Read-side decorator used for uploads
pub struct ProgressReader<R> {
    inner: R,
    progress: Arc<TransferProgress>,
    observer: Arc<dyn ProgressObserver>,
}

impl<R> ProgressReader<R> {
    pub fn new(
        inner: R,
        progress: Arc<TransferProgress>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            inner,
            progress,
            observer,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();

        let result = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = result {
            let n = buf.filled().len() - before;
            if n > 0 {
                this.progress.advance(n as u64);
                this.observer.on_progress(&this.progress);
            }
        }
        result
    }
}

/// Write-side decorator used for downloads
pub struct ProgressWriter<W> {
    inner: W,
    progress: Arc<TransferProgress>,
    observer: Arc<dyn ProgressObserver>,
}

impl<W> ProgressWriter<W> {
    pub fn new(
        inner: W,
        progress: Arc<TransferProgress>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            inner,
            progress,
            observer,
        }
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for ProgressWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        let result = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = result {
            if n > 0 {
                this.progress.advance(n as u64);
                this.observer.on_progress(&this.progress);
            }
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    impl ProgressObserver for Recorder {
        fn on_progress(&self, progress: &TransferProgress) {
            self.seen.lock().unwrap().push(progress.transferred());
        }
    }

    #[test]
    fn test_percent_and_describe() {
        let progress = TransferProgress::new(Some(1024));
        assert_eq!(progress.percent(), Some(0.0));

        progress.advance(512);
        assert_eq!(progress.percent(), Some(50.0));
        assert_eq!(progress.describe(), "512 / 1024 (50.00%)");

        progress.advance(512);
        assert_eq!(progress.describe(), "1024 / 1024 (100.00%)");
    }

    #[test]
    fn test_unknown_total_has_no_percentage() {
        let progress = TransferProgress::new(None);
        progress.advance(300);
        assert_eq!(progress.percent(), None);
        assert_eq!(progress.describe(), "300 bytes");
    }

    #[test]
    fn test_empty_transfer_is_complete() {
        let progress = TransferProgress::new(Some(0));
        assert_eq!(progress.percent(), Some(100.0));
    }

    #[test]
    fn test_counter_is_shared_across_threads() {
        let progress = Arc::new(TransferProgress::new(Some(4000)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let progress = Arc::clone(&progress);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        progress.advance(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(progress.transferred(), 4000);
    }

    #[tokio::test]
    async fn test_reader_counts_bytes() {
        let data = vec![7u8; 10_000];
        let progress = Arc::new(TransferProgress::new(Some(data.len() as u64)));
        let recorder = Arc::new(Recorder::default());
        let mut reader = ProgressReader::new(&data[..], Arc::clone(&progress), recorder.clone());

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, data);
        assert_eq!(progress.transferred(), 10_000);
        let seen = recorder.seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*seen.last().unwrap(), 10_000);
    }

    #[tokio::test]
    async fn test_writer_counts_bytes() {
        let data = b"hello progress".to_vec();
        let progress = Arc::new(TransferProgress::new(None));
        let mut writer =
            ProgressWriter::new(Vec::new(), Arc::clone(&progress), Arc::new(NoProgress));

        let copied = tokio::io::copy(&mut &data[..], &mut writer).await.unwrap();

        assert_eq!(copied, data.len() as u64);
        assert_eq!(progress.transferred(), data.len() as u64);
        assert_eq!(writer.inner, data);
    }
}
