use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the input files of one filter run
#[derive(Clone)]
pub struct FilterProgress {
    bar: ProgressBar,
    is_parallel: bool,
}

impl FilterProgress {
    /// Visible bar for `total_files` inputs
    pub fn new(total_files: usize, is_parallel: bool) -> Self {
        let style = ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} files {spinner} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        let bar = ProgressBar::new(total_files as u64);
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        Self { bar, is_parallel }
    }

    /// Bar that draws nothing, for quiet runs and non-interactive output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            is_parallel: false,
        }
    }

    /// Record one finished file
    pub fn update(&self, completed: usize, total: usize, worker_id: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        if self.is_parallel {
            self.bar.set_message(format!("worker {}", worker_id + 1));
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
