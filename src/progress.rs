// Upload progress reporting. The transport pulls file bytes through
// `ProgressReader`, which tells an `UploadProgress` sink how far it got.
// The sink is chosen by the caller: the CLI draws an indicatif bar, tests
// record the updates.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::sync::Arc;

/// Receives byte counts while a file is streamed to the upload server.
pub trait UploadProgress: Send + Sync {
    /// `sent` bytes of `total` have been handed to the transport.
    fn update(&self, sent: u64, total: u64);

    /// Called once the upload request has returned, successful or not.
    fn finish(&self) {}
}

/// Sink that ignores every update.
pub struct NoProgress;

impl UploadProgress for NoProgress {
    fn update(&self, _sent: u64, _total: u64) {}
}

impl UploadProgress for ProgressBar {
    fn update(&self, sent: u64, total: u64) {
        self.set_length(total);
        self.set_position(sent);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }
}

/// Build the bar shown by `doodstream upload`. It draws to stderr so
/// stdout stays pure JSON; `quiet` hides it entirely.
pub fn console_bar(total: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "Upload progress: [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Reader adapter counting bytes as they are read.
pub struct ProgressReader<R> {
    inner: R,
    sent: u64,
    total: u64,
    progress: Arc<dyn UploadProgress>,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, total: u64, progress: Arc<dyn UploadProgress>) -> Self {
        ProgressReader {
            inner,
            sent: 0,
            total,
            progress,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sent += n as u64;
            self.progress.update(self.sent, self.total);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(u64, u64)>>);

    impl UploadProgress for Recorder {
        fn update(&self, sent: u64, total: u64) {
            self.0.lock().unwrap().push((sent, total));
        }
    }

    #[test]
    fn reports_running_total() {
        let recorder = Arc::new(Recorder::default());
        let data = vec![7u8; 10];
        let mut reader = ProgressReader::new(Cursor::new(data), 10, recorder.clone());

        let mut buf = [0u8; 4];
        while reader.read(&mut buf).unwrap() > 0 {}

        let seen = recorder.0.lock().unwrap().clone();
        assert_eq!(seen, vec![(4, 10), (8, 10), (10, 10)]);
    }

    #[test]
    fn empty_input_reports_nothing() {
        let recorder = Arc::new(Recorder::default());
        let mut reader = ProgressReader::new(Cursor::new(Vec::new()), 0, recorder.clone());
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn bar_tracks_position() {
        let bar = ProgressBar::hidden();
        UploadProgress::update(&bar, 3, 9);
        assert_eq!(bar.position(), 3);
    }
}
