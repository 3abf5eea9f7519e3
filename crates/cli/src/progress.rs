//! Cargo-style progress output for ftpwatch
//!
//! Displays per-job status lines in the familiar cargo format:
//! ```text
//!    Watching ftp://deploy@example.com:21/www every 1.00s
//!    Uploaded /www/index.html (4.12 KiB)
//!     Deleted /www/old.css
//!   Deploying [===========>             ] 12/25 /www/img/logo.png
//!      Synced 25 uploaded, 0 deleted (1.20 MiB) in 3.21s
//! ```

use std::io::Write as _;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use ftpwatch_core::{Endpoint, Job, Result};
use ftpwatch_transport::{CycleObserver, CycleReport};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Every bar lives here so log lines can be printed above them
static MULTI: LazyLock<MultiProgress> = LazyLock::new(MultiProgress::new);

/// Status verbs for cargo-style output (right-aligned to 12 chars)
struct Status;

impl Status {
    const WATCHING: &'static str = "Watching";
    const DEPLOYING: &'static str = "Deploying";
    const UPLOADED: &'static str = "Uploaded";
    const DELETED: &'static str = "Deleted";
    const SYNCED: &'static str = "Synced";
    const FAILED: &'static str = "Failed";
    const FINISHED: &'static str = "Finished";
}

/// Print a cargo-style status line
fn print_status(status: &str, style: &console::Style, message: &str) {
    MULTI.suspend(|| {
        let mut term = console::Term::stderr();
        let _ = writeln!(term, "{:>12} {}", style.apply_to(status), message);
    });
}

fn green() -> console::Style {
    console::Style::new().green().bold()
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}

/// `tracing` writer that clears progress bars while a line is written
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressWriter;

impl std::io::Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        MULTI.suspend(|| std::io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for ProgressWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        *self
    }
}

/// Announce watch mode
pub fn watching(endpoint: &Endpoint, interval: Duration) {
    print_status(
        Status::WATCHING,
        &green(),
        &format!("{endpoint} every {}", format_elapsed(interval)),
    );
}

/// Prints job outcomes and cycle summaries; optionally drives a bar
pub struct DeployProgress {
    start: Instant,
    show_bar: bool,
    bar: Option<ProgressBar>,
}

impl DeployProgress {
    /// Status lines only (watch mode)
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            show_bar: false,
            bar: None,
        }
    }

    /// Status lines plus a bar across all jobs (one-shot runs)
    pub fn with_bar() -> Self {
        Self {
            show_bar: true,
            ..Self::new()
        }
    }

    fn job_bar(total_jobs: u64) -> ProgressBar {
        let pb = MULTI.add(ProgressBar::new(total_jobs));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:>12} [{bar:25.cyan/dim}] {pos}/{len} {prefix:.dim}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(Status::DEPLOYING);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl Default for DeployProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleObserver for DeployProgress {
    fn planned(&mut self, jobs: &[Job]) {
        self.start = Instant::now();
        if self.show_bar {
            self.bar = Some(Self::job_bar(jobs.len() as u64));
        }
    }

    fn finished(&mut self, job: &Job, outcome: &Result<u64>) {
        match (job, outcome) {
            (Job::Upload { destination, .. }, Ok(bytes)) => {
                let size = humansize::format_size(*bytes, humansize::BINARY);
                print_status(Status::UPLOADED, &green(), &format!("{destination} ({size})"));
            }
            (Job::Delete { destination }, Ok(_)) => {
                print_status(Status::DELETED, &green(), destination);
            }
            (_, Err(e)) => {
                print_status(Status::FAILED, &console::Style::new().red().bold(), &e.to_string());
            }
        }
        if let Some(bar) = &self.bar {
            bar.set_prefix(job.destination().to_string());
            bar.inc(1);
        }
    }

    fn completed(&mut self, report: &CycleReport) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        if report.is_idle() {
            return;
        }

        let elapsed = format_elapsed(self.start.elapsed());
        let size = humansize::format_size(report.bytes, humansize::BINARY);
        let counts = format!(
            "{} uploaded, {} deleted ({size})",
            report.uploaded, report.deleted
        );
        if report.is_clean() {
            print_status(Status::SYNCED, &green(), &format!("{counts} in {elapsed}"));
        } else {
            print_status(
                Status::FINISHED,
                &console::Style::new().yellow().bold(),
                &format!("{counts}, {} failed in {elapsed}", report.failures.len()),
            );
        }
    }
}
