//! Progress bars for long-running flash operations

use indicatif::{ProgressBar, ProgressStyle};
use smcflash_core::flash::FlashProgress;

fn create_bytes_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
        .progress_chars("#>-"))
}

fn create_sectors_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.yellow/blue}] {pos}/{len} sectors {msg}")?
        .progress_chars("#>-"))
}

/// Create a byte-counting progress bar
pub fn bytes_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(create_bytes_style().unwrap_or_else(|_| ProgressStyle::default_bar()));
    pb
}

/// Feeds core progress callbacks into an indicatif bar
#[derive(Default)]
pub struct IndicatifProgress {
    current: Option<ProgressBar>,
    message: &'static str,
}

impl IndicatifProgress {
    /// Progress reporter whose bars finish with `message`
    pub fn new(message: &'static str) -> Self {
        Self {
            current: None,
            message,
        }
    }

    fn start(&mut self, pb: ProgressBar) {
        if let Some(old) = self.current.replace(pb) {
            old.finish_and_clear();
        }
    }
}

impl FlashProgress for IndicatifProgress {
    fn erasing(&mut self, sectors_to_erase: usize) {
        let pb = ProgressBar::new(sectors_to_erase as u64);
        pb.set_style(create_sectors_style().unwrap_or_else(|_| ProgressStyle::default_bar()));
        self.start(pb);
    }

    fn sector_erased(&mut self, sector: usize) {
        if let Some(pb) = &self.current {
            pb.set_message(format!("(sector {})", sector));
            pb.inc(1);
        }
    }

    fn writing(&mut self, bytes_to_write: usize) {
        self.start(bytes_bar(bytes_to_write as u64));
    }

    fn write_progress(&mut self, bytes_written: usize) {
        if let Some(pb) = &self.current {
            pb.set_position(bytes_written as u64);
        }
    }

    fn complete(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_with_message(self.message);
        }
    }
}

impl Drop for IndicatifProgress {
    fn drop(&mut self) {
        // Bars left open by a failed operation
        if let Some(pb) = self.current.take() {
            pb.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_erase_then_write() {
        let mut progress = IndicatifProgress::new("done");
        progress.erasing(3);
        progress.sector_erased(0);
        progress.sector_erased(1);
        assert_eq!(progress.current.as_ref().map(|pb| pb.position()), Some(2));
        progress.complete();
        assert!(progress.current.is_none());

        progress.writing(600);
        progress.write_progress(256);
        let pb = progress.current.as_ref().map(|pb| (pb.position(), pb.length()));
        assert_eq!(pb, Some((256, Some(600))));
    }

    #[test]
    fn test_styles_parse() {
        assert!(create_bytes_style().is_ok());
        assert!(create_sectors_style().is_ok());
    }
}
