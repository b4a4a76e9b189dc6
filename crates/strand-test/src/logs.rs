//! Log capture for assertions on emitted records.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuf {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Captures log output on the current thread until dropped.
///
/// The capture is installed as the thread's default subscriber, so use it
/// with a current-thread runtime (the `#[tokio::test]` default).
///
/// # Example
///
/// ```
/// use strand_test::LogCapture;
///
/// let logs = LogCapture::start();
/// tracing::info!(status = 204, "done");
/// assert!(logs.contains("status=204"));
/// ```
#[must_use]
pub struct LogCapture {
    buf: SharedBuf,
    _guard: DefaultGuard,
}

impl LogCapture {
    /// Starts capturing records at every level.
    pub fn start() -> Self {
        Self::with_level(LevelFilter::TRACE)
    }

    /// Starts capturing records at `level` and above.
    pub fn with_level(level: LevelFilter) -> Self {
        let buf = SharedBuf::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buf.clone())
            .with_ansi(false)
            .with_max_level(level)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        Self { buf, _guard: guard }
    }

    /// Everything captured so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.0.lock()).into_owned()
    }

    /// Returns true if the captured output contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }

    /// Captured output, one entry per line.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}
