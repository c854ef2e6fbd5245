#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

mod current;
mod entity;
pub mod error;
mod traits;

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use tokio::sync::Semaphore;
use tracing::instrument;

pub use current::CurrentJob;
pub use entity::{Job, JobId, JobRunRecord, JobRunState, JobSchedule, JobType};
use error::JobError;
pub use traits::{JobCompletion, JobConfig, JobInitializer, JobRunner, RetrySettings};

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_poll_interval")]
    pub poll_interval: std::time::Duration,
}

impl Default for JobsConfig {
    fn default() -> Self {
        JobsConfig {
            node_id: default_node_id(),
            max_concurrency: default_max_concurrency(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_node_id() -> String {
    "node-0".to_string()
}

fn default_max_concurrency() -> usize {
    8
}

fn default_poll_interval() -> std::time::Duration {
    std::time::Duration::from_secs(5)
}

struct Registration {
    initializer: Arc<dyn JobInitializer>,
    retry: RetrySettings,
}

struct ScheduledJob {
    job: Job,
    next_run_at: Option<DateTime<Utc>>,
    state: JobRunState,
    attempt: u32,
}

struct LaunchedRun {
    job_id: JobId,
    job_type: JobType,
    attempt: u32,
    retry: RetrySettings,
    started_at: DateTime<Utc>,
    handle: tokio::task::JoinHandle<Result<JobCompletion, String>>,
}

struct JobsInner {
    config: JobsConfig,
    registry: RwLock<HashMap<JobType, Registration>>,
    scheduled: Mutex<Vec<ScheduledJob>>,
    runs: Mutex<Vec<JobRunRecord>>,
    exec_state: Arc<Mutex<HashMap<JobId, serde_json::Value>>>,
    running: Mutex<HashSet<JobType>>,
    semaphore: Arc<Semaphore>,
}

/// Registry plus executor for scheduled jobs. A fixed-size pool runs jobs of
/// different types concurrently; runs of one type never overlap.
pub struct Jobs {
    inner: Arc<JobsInner>,
}

impl Clone for Jobs {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Jobs {
    pub fn new(config: JobsConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
        Self {
            inner: Arc::new(JobsInner {
                config,
                registry: RwLock::new(HashMap::new()),
                scheduled: Mutex::new(Vec::new()),
                runs: Mutex::new(Vec::new()),
                exec_state: Arc::new(Mutex::new(HashMap::new())),
                running: Mutex::new(HashSet::new()),
                semaphore,
            }),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.inner.config.node_id
    }

    pub fn add_initializer<I: JobInitializer>(&self, initializer: I) {
        let mut registry = self.inner.registry.write().expect("poisoned");
        registry.insert(
            I::job_type(),
            Registration {
                initializer: Arc::new(initializer),
                retry: I::retry_on_error_settings(),
            },
        );
    }

    /// Registers the initializer and makes sure exactly one job of its type
    /// is scheduled. Idempotent: an already-scheduled job is returned as-is.
    pub fn add_initializer_and_spawn_unique<C: JobConfig>(
        &self,
        initializer: C::Initializer,
        config: C,
    ) -> Result<Job, JobError> {
        self.add_initializer(initializer);
        let job_type = <C::Initializer as JobInitializer>::job_type();
        if let Some(existing) = self.find_by_type(job_type) {
            return Ok(existing);
        }
        self.spawn(config, JobSchedule::Once, None)
    }

    pub fn create_and_spawn<C: JobConfig>(&self, config: C) -> Result<Job, JobError> {
        self.spawn(config, JobSchedule::Once, None)
    }

    pub fn create_and_spawn_with_schedule<C: JobConfig>(
        &self,
        config: C,
        schedule: JobSchedule,
    ) -> Result<Job, JobError> {
        self.spawn(config, schedule, None)
    }

    /// Spawns a job pinned to one cluster node; other nodes silently skip it.
    pub fn create_and_spawn_pinned<C: JobConfig>(
        &self,
        config: C,
        node_id: impl Into<String>,
        schedule: JobSchedule,
    ) -> Result<Job, JobError> {
        self.spawn(config, schedule, Some(node_id.into()))
    }

    fn spawn<C: JobConfig>(
        &self,
        config: C,
        schedule: JobSchedule,
        node_affinity: Option<String>,
    ) -> Result<Job, JobError> {
        let job_type = <C::Initializer as JobInitializer>::job_type();
        if !self
            .inner
            .registry
            .read()
            .expect("poisoned")
            .contains_key(&job_type)
        {
            return Err(JobError::NoInitializerPresent(job_type));
        }
        let job = Job::new(
            JobId::new(),
            job_type,
            schedule,
            node_affinity,
            serde_json::to_value(config)?,
        );
        self.inner
            .scheduled
            .lock()
            .expect("poisoned")
            .push(ScheduledJob {
                job: job.clone(),
                next_run_at: Some(Utc::now()),
                state: JobRunState::Scheduled,
                attempt: 0,
            });
        Ok(job)
    }

    pub fn find_by_type(&self, job_type: JobType) -> Option<Job> {
        self.inner
            .scheduled
            .lock()
            .expect("poisoned")
            .iter()
            .find(|s| s.job.job_type == job_type)
            .map(|s| s.job.clone())
    }

    pub fn state_of(&self, id: JobId) -> Result<JobRunState, JobError> {
        self.inner
            .scheduled
            .lock()
            .expect("poisoned")
            .iter()
            .find(|s| s.job.id == id)
            .map(|s| s.state)
            .ok_or(JobError::JobNotFound(id))
    }

    pub fn next_run_at(&self, id: JobId) -> Result<Option<DateTime<Utc>>, JobError> {
        self.inner
            .scheduled
            .lock()
            .expect("poisoned")
            .iter()
            .find(|s| s.job.id == id)
            .map(|s| s.next_run_at)
            .ok_or(JobError::JobNotFound(id))
    }

    pub fn last_run_for(&self, job_type: JobType) -> Option<JobRunRecord> {
        self.inner
            .runs
            .lock()
            .expect("poisoned")
            .iter()
            .rev()
            .find(|r| r.job_type == job_type)
            .cloned()
    }

    /// Background polling loop; each tick also catches up jobs whose run
    /// time is already past.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let jobs = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(jobs.inner.config.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = jobs.run_due_jobs(Utc::now()).await {
                    tracing::error!(error = %e, "job poll tick failed");
                }
            }
        })
    }

    /// One poll pass: launches every due, runnable job and waits for the
    /// whole batch. Exposed so tests and operational tooling can drive the
    /// executor deterministically.
    #[instrument(name = "job.run_due_jobs", skip(self), fields(launched))]
    pub async fn run_due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<JobRunRecord>, JobError> {
        let mut launched: Vec<LaunchedRun> = Vec::new();
        let mut records: Vec<JobRunRecord> = Vec::new();
        {
            let registry = self.inner.registry.read().expect("poisoned");
            let mut running = self.inner.running.lock().expect("poisoned");
            let mut scheduled = self.inner.scheduled.lock().expect("poisoned");

            for entry in scheduled.iter_mut() {
                let due = matches!(entry.next_run_at, Some(t) if t <= now);
                if !due {
                    continue;
                }
                if let Some(node) = &entry.job.node_affinity {
                    if node != &self.inner.config.node_id {
                        tracing::debug!(job_type = %entry.job.job_type, pinned_to = %node, "job not owned by this node");
                        continue;
                    }
                }
                if running.contains(&entry.job.job_type) {
                    continue;
                }
                let Some(registration) = registry.get(&entry.job.job_type) else {
                    entry.state = JobRunState::Failed;
                    entry.next_run_at = None;
                    records.push(JobRunRecord {
                        job_id: entry.job.id,
                        job_type: entry.job.job_type,
                        state: JobRunState::Failed,
                        started_at: now,
                        finished_at: now,
                        error: Some(
                            JobError::NoInitializerPresent(entry.job.job_type).to_string(),
                        ),
                    });
                    continue;
                };

                let attempt = entry.attempt + 1;
                let handle = match registration.initializer.init(&entry.job) {
                    Ok(runner) => {
                        let current = CurrentJob::new(
                            entry.job.id,
                            attempt,
                            self.inner.exec_state.clone(),
                        );
                        let semaphore = self.inner.semaphore.clone();
                        tokio::spawn(async move {
                            let _permit =
                                semaphore.acquire_owned().await.expect("semaphore closed");
                            runner.run(current).await.map_err(|e| e.to_string())
                        })
                    }
                    Err(e) => {
                        let message = e.to_string();
                        tokio::spawn(async move { Err::<JobCompletion, _>(message) })
                    }
                };

                running.insert(entry.job.job_type);
                entry.state = JobRunState::Running;
                launched.push(LaunchedRun {
                    job_id: entry.job.id,
                    job_type: entry.job.job_type,
                    attempt,
                    retry: registration.retry,
                    started_at: now,
                    handle,
                });
            }
        }

        tracing::Span::current().record("launched", launched.len());

        for run in launched {
            let result = run
                .handle
                .await
                .unwrap_or_else(|e| Err(format!("job panicked: {e}")));
            records.push(self.conclude_run(run.job_id, run.job_type, run.attempt, run.retry, run.started_at, result)?);
        }

        self.inner
            .runs
            .lock()
            .expect("poisoned")
            .extend(records.iter().cloned());
        Ok(records)
    }

    fn conclude_run(
        &self,
        job_id: JobId,
        job_type: JobType,
        attempt: u32,
        retry: RetrySettings,
        started_at: DateTime<Utc>,
        result: Result<JobCompletion, String>,
    ) -> Result<JobRunRecord, JobError> {
        let now = Utc::now();
        self.inner
            .running
            .lock()
            .expect("poisoned")
            .remove(&job_type);
        let mut scheduled = self.inner.scheduled.lock().expect("poisoned");
        let entry = scheduled
            .iter_mut()
            .find(|s| s.job.id == job_id)
            .ok_or(JobError::JobNotFound(job_id))?;

        let (state, error) = match result {
            Ok(completion) => {
                entry.attempt = 0;
                let state = match completion {
                    JobCompletion::Noop => JobRunState::Noop,
                    _ => JobRunState::Completed,
                };
                entry.next_run_at = match completion {
                    JobCompletion::RescheduleNow => Some(now),
                    JobCompletion::RescheduleIn(d) => {
                        Some(now + chrono::Duration::from_std(d).expect("duration out of range"))
                    }
                    JobCompletion::RescheduleAt(t) => Some(t),
                    JobCompletion::Complete | JobCompletion::Noop => {
                        entry.job.schedule.next_run_after(now)?
                    }
                };
                entry.state = state;
                (state, None)
            }
            Err(message) => {
                entry.attempt = attempt;
                let exhausted = retry.max_attempts.is_some_and(|max| attempt >= max);
                if exhausted {
                    entry.state = JobRunState::Failed;
                    entry.next_run_at = None;
                    tracing::error!(job_type = %job_type, attempt, error = %message, "job failed, retries exhausted");
                } else {
                    entry.state = JobRunState::Scheduled;
                    entry.next_run_at = Some(
                        now + chrono::Duration::from_std(retry.backoff)
                            .expect("backoff out of range"),
                    );
                    tracing::warn!(job_type = %job_type, attempt, error = %message, "job failed, will retry");
                }
                (JobRunState::Failed, Some(message))
            }
        };

        Ok(JobRunRecord {
            job_id,
            job_type,
            state,
            started_at,
            finished_at: now,
            error,
        })
    }
}
