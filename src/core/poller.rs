//! Wait-until-terminal loop shared by imports and document translations

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

use crate::core::config::DEFAULT_POLLING_INTERVAL;
use crate::core::errors::{LaraError, Result};
use crate::core::models::{Document, GlossaryImport, MemoryImport};

/// Upper bound for a document translation when the caller gives none
pub const DEFAULT_DOCUMENT_MAX_WAIT: Duration = Duration::from_secs(15 * 60);

/// Server-side job observed only through re-fetching
pub trait Pollable {
    fn id(&self) -> &str;

    /// Polling stops once this holds
    fn is_terminal(&self) -> bool;
}

impl Pollable for MemoryImport {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_terminal(&self) -> bool {
        self.progress >= 1.0
    }
}

impl Pollable for GlossaryImport {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_terminal(&self) -> bool {
        self.progress >= 1.0
    }
}

impl Pollable for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_terminal(&self) -> bool {
        self.status.is_final()
    }
}

/// Any job kind the API tracks
#[derive(Debug, Clone)]
pub enum Job {
    MemoryImport(MemoryImport),
    GlossaryImport(GlossaryImport),
    Document(Document),
}

impl Pollable for Job {
    fn id(&self) -> &str {
        match self {
            Job::MemoryImport(job) => job.id(),
            Job::GlossaryImport(job) => job.id(),
            Job::Document(job) => job.id(),
        }
    }

    fn is_terminal(&self) -> bool {
        match self {
            Job::MemoryImport(job) => job.is_terminal(),
            Job::GlossaryImport(job) => job.is_terminal(),
            Job::Document(job) => job.is_terminal(),
        }
    }
}

impl From<MemoryImport> for Job {
    fn from(job: MemoryImport) -> Self {
        Job::MemoryImport(job)
    }
}

impl From<GlossaryImport> for Job {
    fn from(job: GlossaryImport) -> Self {
        Job::GlossaryImport(job)
    }
}

impl From<Document> for Job {
    fn from(job: Document) -> Self {
        Job::Document(job)
    }
}

/// Timing of a poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// `None` or zero waits forever
    pub max_wait: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLLING_INTERVAL,
            max_wait: None,
        }
    }
}

impl PollOptions {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_wait: None,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    fn deadline_exceeded(&self, elapsed: Duration) -> bool {
        match self.max_wait {
            Some(max_wait) if !max_wait.is_zero() => elapsed > max_wait,
            _ => false,
        }
    }
}

/// Poll until the job's own terminal predicate holds
pub async fn poll_until_done<J, F, Fut, U>(
    initial: J,
    fetch: F,
    on_update: Option<U>,
    options: PollOptions,
) -> Result<J>
where
    J: Pollable,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<J>>,
    U: FnMut(&J),
{
    poll_until(initial, fetch, J::is_terminal, on_update, options).await
}

/// Re-fetch `initial` every `options.interval` until `is_terminal` holds
///
/// Fails with [`LaraError::TimeoutError`] once `options.max_wait` has elapsed.
pub async fn poll_until<J, F, Fut, P, U>(
    initial: J,
    mut fetch: F,
    is_terminal: P,
    mut on_update: Option<U>,
    options: PollOptions,
) -> Result<J>
where
    J: Pollable,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<J>>,
    P: Fn(&J) -> bool,
    U: FnMut(&J),
{
    let start = Instant::now();
    let mut current = initial;

    while !is_terminal(&current) {
        if options.deadline_exceeded(start.elapsed()) {
            return Err(LaraError::TimeoutError {
                message: format!(
                    "Job {} did not complete within {:?}",
                    current.id(),
                    options.max_wait.unwrap_or_default()
                ),
            });
        }

        sleep(options.interval).await;

        let id = current.id().to_string();
        current = fetch(id).await?;
        debug!(job_id = %current.id(), terminal = is_terminal(&current), "Fetched job status");

        if let Some(callback) = on_update.as_mut() {
            callback(&current);
        }
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::DocumentStatus;
    use chrono::Utc;
    use std::collections::VecDeque;

    fn memory_import(progress: f64) -> MemoryImport {
        MemoryImport {
            id: "imp-1".to_string(),
            progress,
            status: None,
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn document(status: DocumentStatus) -> Document {
        Document {
            id: "doc-1".to_string(),
            status,
            translated_chars: 0,
            total_chars: 0,
            filename: "a.docx".to_string(),
            source: None,
            target: "it-IT".to_string(),
            options: None,
            error_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn scripted<J>(snapshots: Vec<J>) -> impl FnMut(String) -> std::future::Ready<Result<J>> {
        let mut queue = VecDeque::from(snapshots);
        move |_id: String| {
            let next = queue.pop_front().expect("fetched past the script");
            std::future::ready(Ok(next))
        }
    }

    #[tokio::test]
    async fn test_progress_job_completes() {
        let fetch = scripted(vec![
            memory_import(0.0),
            memory_import(0.3),
            memory_import(0.7),
            memory_import(1.0),
        ]);
        let mut updates = Vec::new();

        let done = poll_until_done(
            memory_import(0.0),
            fetch,
            Some(|job: &MemoryImport| updates.push(job.progress)),
            PollOptions::new(Duration::ZERO),
        )
        .await
        .unwrap();

        assert_eq!(done.progress, 1.0);
        assert_eq!(updates, vec![0.0, 0.3, 0.7, 1.0]);
    }

    #[tokio::test]
    async fn test_progress_job_times_out() {
        let fetch = |_id: String| async { Ok(memory_import(0.5)) };

        let err = poll_until_done(
            memory_import(0.0),
            fetch,
            None::<fn(&MemoryImport)>,
            PollOptions::new(Duration::from_millis(10))
                .with_max_wait(Some(Duration::from_millis(50))),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LaraError::TimeoutError { .. }));
    }

    #[tokio::test]
    async fn test_terminal_initial_snapshot_is_not_fetched() {
        let mut calls = 0;
        let fetch = |_id: String| {
            calls += 1;
            std::future::ready(Ok(memory_import(1.0)))
        };

        let done = poll_until_done(
            memory_import(1.0),
            fetch,
            None::<fn(&MemoryImport)>,
            PollOptions::new(Duration::ZERO),
        )
        .await
        .unwrap();

        assert_eq!(done.progress, 1.0);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_document_error_is_terminal() {
        let fetch = scripted(vec![
            document(DocumentStatus::Analyzing),
            document(DocumentStatus::Translating),
            document(DocumentStatus::Error),
        ]);

        let done = poll_until_done(
            document(DocumentStatus::Initialized),
            fetch,
            None::<fn(&Document)>,
            PollOptions::new(Duration::ZERO),
        )
        .await
        .unwrap();

        assert_eq!(done.status, DocumentStatus::Error);
    }

    #[tokio::test]
    async fn test_job_sum_type_polls() {
        let fetch = scripted(vec![
            Job::from(document(DocumentStatus::Ready)),
            Job::from(document(DocumentStatus::Translated)),
        ]);

        let done = poll_until_done(
            Job::from(document(DocumentStatus::Initialized)),
            fetch,
            None::<fn(&Job)>,
            PollOptions::new(Duration::ZERO),
        )
        .await
        .unwrap();

        assert!(matches!(done, Job::Document(ref d) if d.status == DocumentStatus::Translated));
        assert_eq!(done.id(), "doc-1");
    }

    #[tokio::test]
    async fn test_custom_terminal_predicate() {
        let fetch = scripted(vec![memory_import(0.2), memory_import(0.6)]);

        let done = poll_until(
            memory_import(0.0),
            fetch,
            |job: &MemoryImport| job.progress >= 0.5,
            None::<fn(&MemoryImport)>,
            PollOptions::new(Duration::ZERO),
        )
        .await
        .unwrap();

        assert_eq!(done.progress, 0.6);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let fetch = |_id: String| async {
            Err::<MemoryImport, _>(LaraError::api(404, "NotFound", "gone"))
        };

        let err = poll_until_done(
            memory_import(0.0),
            fetch,
            None::<fn(&MemoryImport)>,
            PollOptions::new(Duration::ZERO),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_zero_max_wait_is_unbounded() {
        let options = PollOptions::new(Duration::ZERO).with_max_wait(Some(Duration::ZERO));
        assert!(!options.deadline_exceeded(Duration::from_secs(3600)));
        assert!(!PollOptions::default().deadline_exceeded(Duration::from_secs(3600)));
    }
}
