use foundation::{ImageFeature, SequenceId};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// Progress notification emitted after every processed item.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    pub current: usize,
    pub total: usize,
}

impl DownloadProgress {
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// A sequence download: the ordered items plus counters and status.
///
/// Items are ordered by capture time ascending (missing timestamps count as
/// 0), ties by image id, so the same input always yields the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadJob {
    sequence_id: SequenceId,
    items: Vec<ImageFeature>,
    current: usize,
    total: usize,
    status: JobStatus,
}

impl DownloadJob {
    pub fn new(sequence_id: SequenceId, mut items: Vec<ImageFeature>) -> Self {
        items.sort_by(|a, b| {
            a.capture_order_key()
                .cmp(&b.capture_order_key())
                .then_with(|| a.id.cmp(&b.id))
        });
        Self {
            sequence_id,
            total: items.len(),
            items,
            current: 0,
            status: JobStatus::Pending,
        }
    }

    pub fn sequence_id(&self) -> &SequenceId {
        &self.sequence_id
    }

    pub fn items(&self) -> &[ImageFeature] {
        &self.items
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    pub fn progress(&self) -> DownloadProgress {
        DownloadProgress {
            current: self.current,
            total: self.total,
        }
    }

    pub fn start(&mut self) {
        self.current = 0;
        self.total = self.items.len();
        self.status = JobStatus::Running;
    }

    /// Marks one more item as processed, successful or not.
    pub fn advance(&mut self) -> DownloadProgress {
        self.current = (self.current + 1).min(self.total);
        self.progress()
    }

    pub fn finish(&mut self) {
        self.status = JobStatus::Done;
        self.reset_counters();
    }

    pub fn fail(&mut self) {
        self.status = JobStatus::Failed;
        self.reset_counters();
    }

    fn reset_counters(&mut self) {
        self.current = 0;
        self.total = 0;
    }
}

/// Remembers how the last download ended.
///
/// Only one [`JobGuard`] can exist per slot at a time because it borrows the
/// slot mutably, which is what keeps downloads from overlapping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobSlot {
    last: Option<(SequenceId, JobStatus)>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> Option<JobStatus> {
        self.last.as_ref().map(|(_, s)| *s)
    }

    pub fn last_sequence(&self) -> Option<&SequenceId> {
        self.last.as_ref().map(|(id, _)| id)
    }

    /// Starts `job` and returns a guard that settles it.
    pub fn begin(&mut self, mut job: DownloadJob) -> JobGuard<'_> {
        job.start();
        self.last = Some((job.sequence_id.clone(), JobStatus::Running));
        JobGuard { slot: self, job }
    }
}

/// A running job. Dropping it while still running marks the job failed, so
/// an aborted task can never leave a download stuck in `Running`.
#[derive(Debug)]
pub struct JobGuard<'a> {
    slot: &'a mut JobSlot,
    job: DownloadJob,
}

impl JobGuard<'_> {
    pub fn job(&self) -> &DownloadJob {
        &self.job
    }

    pub fn job_mut(&mut self) -> &mut DownloadJob {
        &mut self.job
    }

    pub fn finish(mut self) {
        self.job.finish();
        self.record();
    }

    pub fn fail(mut self) {
        self.job.fail();
        self.record();
    }

    fn record(&mut self) {
        self.slot.last = Some((self.job.sequence_id.clone(), self.job.status));
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        if self.job.is_running() {
            self.job.fail();
            self.record();
        }
    }
}
