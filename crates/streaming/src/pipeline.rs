use std::time::Duration;

use runtime::job::{DownloadJob, DownloadProgress};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, ImageryApi};
use crate::archive::{ArchiveError, ArchiveWriter, archive_file_name, entry_name};
use crate::protocol::is_valid_key;

/// Pause between two items, keeping well under the API rate limits.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub item_delay: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            item_delay: DEFAULT_ITEM_DELAY,
        }
    }
}

/// An item left out of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// 1-based position in the download order.
    pub index: usize,
    pub image_id: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub file_name: String,
    pub archive: Vec<u8>,
    pub entries: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

/// Failures that abort the whole job. Per-item failures never end up here.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download job has not been started")]
    NotRunning,
    #[error("invalid sequence id {0:?}")]
    InvalidSequence(String),
    #[error("failed to build archive: {0}")]
    Archive(#[from] ArchiveError),
    #[error("failed to save {file_name}: {source}")]
    Save {
        file_name: String,
        source: std::io::Error,
    },
}

/// Sequential fetch-and-archive over the items of a [`DownloadJob`].
///
/// Items are processed strictly one after another in job order; the only
/// suspension points are the two API calls per item and the inter-item delay.
#[derive(Debug, Clone)]
pub struct SequenceDownloader<A> {
    api: A,
    options: DownloadOptions,
}

impl<A: ImageryApi> SequenceDownloader<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            options: DownloadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Downloads every item of a running job into an in-memory zip.
    ///
    /// `on_progress` is called once per item, after it succeeded or failed.
    /// The job's status is left to the caller.
    pub async fn run(
        &self,
        job: &mut DownloadJob,
        mut on_progress: impl FnMut(DownloadProgress),
    ) -> Result<DownloadReport, DownloadError> {
        if !job.is_running() {
            return Err(DownloadError::NotRunning);
        }

        let sequence_id = job.sequence_id().clone();
        if !is_valid_key(sequence_id.as_str()) {
            return Err(DownloadError::InvalidSequence(sequence_id.to_string()));
        }
        let items = job.items().to_vec();
        info!(
            "downloading {} images of sequence {sequence_id}",
            items.len()
        );

        let mut archive = ArchiveWriter::new();
        let mut failures: Vec<ItemFailure> = Vec::new();

        for (i, item) in items.iter().enumerate() {
            if i > 0 && !self.options.item_delay.is_zero() {
                tokio::time::sleep(self.options.item_delay).await;
            }

            let index = i + 1;
            match self.fetch_item(&item.id).await {
                Ok(bytes) => {
                    archive.add(&entry_name(&sequence_id, index, &item.id), &bytes)?;
                }
                Err(err) => {
                    warn!("skipping image {} ({index}/{}): {err}", item.id, items.len());
                    failures.push(ItemFailure {
                        index,
                        image_id: item.id.clone(),
                        reason: err.to_string(),
                    });
                }
            }

            on_progress(job.advance());
        }

        let entries = archive.entries().to_vec();
        let bytes = archive.finish()?;
        info!(
            "sequence {sequence_id}: {} archived, {} failed",
            entries.len(),
            failures.len()
        );

        Ok(DownloadReport {
            file_name: archive_file_name(&sequence_id),
            archive: bytes,
            entries,
            failures,
        })
    }

    /// Ids are checked here as well since they also name the archive entry.
    async fn fetch_item(&self, image_id: &str) -> Result<Vec<u8>, ApiError> {
        if !is_valid_key(image_id) {
            return Err(ApiError::InvalidKey(image_id.to_string()));
        }
        let url = self.api.resolve_download_url(image_id).await?;
        self.api.fetch_bytes(&url).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::{Cursor, Read};
    use std::sync::Mutex;
    use std::time::Duration;

    use foundation::{ImageFeature, SequenceId};
    use pretty_assertions::assert_eq;
    use runtime::job::{DownloadJob, DownloadProgress, JobSlot, JobStatus};

    use super::{DownloadError, DownloadOptions, SequenceDownloader};
    use crate::api::{ApiError, BoxFuture, ImageryApi};

    /// Serves `bytes-{id}` for every image unless told to fail it.
    #[derive(Default)]
    struct FakeApi {
        pub fail_lookup: HashSet<String>,
        pub fail_fetch: HashSet<String>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub fn failing_fetch(ids: &[&str]) -> Self {
            Self {
                fail_fetch: ids.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    impl ImageryApi for FakeApi {
        fn resolve_download_url<'a>(
            &'a self,
            image_id: &'a str,
        ) -> BoxFuture<'a, Result<String, ApiError>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .expect("lock")
                    .push(format!("url:{image_id}"));
                if self.fail_lookup.contains(image_id) {
                    return Err(ApiError::NoDownloadUrl(image_id.to_string()));
                }
                Ok(format!("https://cdn.test/{image_id}"))
            })
        }

        fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ApiError>> {
            Box::pin(async move {
                let id = url.trim_start_matches("https://cdn.test/");
                self.calls.lock().expect("lock").push(format!("get:{id}"));
                if self.fail_fetch.contains(id) {
                    return Err(ApiError::Status {
                        url: url.to_string(),
                        status: 500,
                    });
                }
                Ok(format!("bytes-{id}").into_bytes())
            })
        }
    }

    fn no_delay() -> DownloadOptions {
        DownloadOptions {
            item_delay: Duration::ZERO,
        }
    }

    fn archive_names(bytes: &[u8]) -> Vec<String> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).expect("open zip");
        (0..zip.len())
            .map(|i| zip.by_index(i).expect("entry").name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn entries_follow_capture_order() {
        let items = vec![
            ImageFeature::new("a", "S").with_captured_at(300),
            ImageFeature::new("b", "S").with_captured_at(100),
            ImageFeature::new("c", "S"),
            ImageFeature::new("d", "S").with_captured_at(200),
        ];
        let mut job = DownloadJob::new(SequenceId::new("S"), items);
        job.start();

        let downloader = SequenceDownloader::new(FakeApi::default()).with_options(no_delay());
        let report = downloader.run(&mut job, |_| {}).await.expect("run");

        let expected = vec![
            "S_0001_c.jpg".to_string(),
            "S_0002_b.jpg".to_string(),
            "S_0003_d.jpg".to_string(),
            "S_0004_a.jpg".to_string(),
        ];
        assert_eq!(report.entries, expected);
        assert_eq!(archive_names(&report.archive), expected);
        assert_eq!(report.file_name, "mapillary_sequence_S.zip");
    }

    #[tokio::test]
    async fn failed_item_is_skipped_and_job_completes() {
        let items = vec![
            ImageFeature::new("i1", "S").with_captured_at(1),
            ImageFeature::new("i2", "S").with_captured_at(2),
            ImageFeature::new("i3", "S").with_captured_at(3),
        ];
        let mut slot = JobSlot::new();
        let mut guard = slot.begin(DownloadJob::new(SequenceId::new("S"), items));

        let downloader =
            SequenceDownloader::new(FakeApi::failing_fetch(&["i2"])).with_options(no_delay());
        let mut progress: Vec<DownloadProgress> = Vec::new();
        let report = downloader
            .run(guard.job_mut(), |p| progress.push(p))
            .await
            .expect("run");
        guard.finish();

        assert_eq!(
            progress,
            vec![
                DownloadProgress { current: 1, total: 3 },
                DownloadProgress { current: 2, total: 3 },
                DownloadProgress { current: 3, total: 3 },
            ]
        );
        assert_eq!(
            archive_names(&report.archive),
            vec!["S_0001_i1.jpg".to_string(), "S_0003_i3.jpg".to_string()]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].image_id, "i2");
        assert_eq!(slot.last_status(), Some(JobStatus::Done));
    }

    #[tokio::test]
    async fn lookup_failure_skips_the_fetch() {
        let api = FakeApi {
            fail_lookup: ["x".to_string()].into_iter().collect(),
            ..FakeApi::default()
        };
        let mut job = DownloadJob::new(
            SequenceId::new("S"),
            vec![ImageFeature::new("x", "S"), ImageFeature::new("y", "S")],
        );
        job.start();
        let downloader = SequenceDownloader::new(api).with_options(no_delay());
        let report = downloader.run(&mut job, |_| {}).await.expect("run");

        assert_eq!(report.entries, vec!["S_0002_y.jpg".to_string()]);
        let calls = downloader.api().calls.lock().expect("lock").clone();
        assert_eq!(calls, vec!["url:x", "url:y", "get:y"]);
    }

    #[tokio::test]
    async fn unsafe_ids_are_skipped_without_requests() {
        let mut job = DownloadJob::new(
            SequenceId::new("S"),
            vec![
                ImageFeature::new("../evil", "S").with_captured_at(1),
                ImageFeature::new("ok", "S").with_captured_at(2),
            ],
        );
        job.start();
        let downloader = SequenceDownloader::new(FakeApi::default()).with_options(no_delay());
        let report = downloader.run(&mut job, |_| {}).await.expect("run");

        assert_eq!(archive_names(&report.archive), vec!["S_0002_ok.jpg".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].image_id, "../evil");
        let calls = downloader.api().calls.lock().expect("lock").clone();
        assert_eq!(calls, vec!["url:ok", "get:ok"]);
    }

    #[tokio::test]
    async fn unsafe_sequence_id_fails_the_job() {
        let mut job = DownloadJob::new(
            SequenceId::new("a/../b"),
            vec![ImageFeature::new("k", "a/../b")],
        );
        job.start();
        let downloader = SequenceDownloader::new(FakeApi::default()).with_options(no_delay());
        let err = downloader.run(&mut job, |_| {}).await.unwrap_err();
        assert!(matches!(err, DownloadError::InvalidSequence(_)));
        assert!(downloader.api().calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn archive_bytes_match_fetched_bytes() {
        let mut job = DownloadJob::new(SequenceId::new("S"), vec![ImageFeature::new("k", "S")]);
        job.start();
        let downloader = SequenceDownloader::new(FakeApi::default()).with_options(no_delay());
        let report = downloader.run(&mut job, |_| {}).await.expect("run");

        let mut zip = zip::ZipArchive::new(Cursor::new(report.archive)).expect("open");
        let mut buf = Vec::new();
        zip.by_index(0)
            .expect("entry")
            .read_to_end(&mut buf)
            .expect("read");
        assert_eq!(buf, b"bytes-k");
    }

    #[tokio::test]
    async fn job_must_be_started() {
        let mut job = DownloadJob::new(SequenceId::new("S"), vec![ImageFeature::new("k", "S")]);
        let downloader = SequenceDownloader::new(FakeApi::default());
        let err = downloader.run(&mut job, |_| {}).await.unwrap_err();
        assert!(matches!(err, DownloadError::NotRunning));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_applies_between_items_only() {
        let items = (0..3)
            .map(|i| ImageFeature::new(format!("i{i}"), "S").with_captured_at(i))
            .collect();
        let mut job = DownloadJob::new(SequenceId::new("S"), items);
        job.start();

        let downloader = SequenceDownloader::new(FakeApi::default()).with_options(DownloadOptions {
            item_delay: Duration::from_millis(100),
        });
        let started = tokio::time::Instant::now();
        downloader.run(&mut job, |_| {}).await.expect("run");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }
}
