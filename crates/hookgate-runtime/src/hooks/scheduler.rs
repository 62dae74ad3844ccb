use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::definition::HookConfig;
use super::events::EventPayload;
use super::executor::ExecutorSet;
use super::resolver::ResolvedGroup;
use super::result::HookResult;

/// Runs every matching group of one event concurrently; hooks inside a
/// group run one after another in declared order. Hooks share the payload
/// read-only and never see each other's output.
#[derive(Clone)]
pub struct Scheduler {
    executors: ExecutorSet,
    permits: Option<Arc<Semaphore>>,
}

impl Scheduler {
    pub fn new(executors: ExecutorSet) -> Self {
        Self {
            executors,
            permits: None,
        }
    }

    /// Bound the number of groups executing at once (0 = unbounded)
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.permits = (max_parallel > 0).then(|| Arc::new(Semaphore::new(max_parallel)));
        self
    }

    /// Run all groups to completion (or timeout, or cancellation) and return
    /// every result in declared order. Never returns early on a first result.
    pub async fn run(
        &self,
        groups: Vec<ResolvedGroup>,
        payload: Arc<EventPayload>,
        cancel: CancellationToken,
    ) -> Vec<HookResult> {
        let tasks = groups.into_iter().map(|group| {
            let hooks = group.hooks.clone();
            let handle = tokio::spawn(run_group(
                self.executors.clone(),
                self.permits.clone(),
                group,
                payload.clone(),
                cancel.clone(),
            ));
            async move { (hooks, handle.await) }
        });

        let mut results = Vec::new();
        for (hooks, joined) in join_all(tasks).await {
            match joined {
                Ok(group_results) => results.extend(group_results),
                Err(e) => {
                    warn!(error = %e, "Hook group task failed");
                    results.extend(hooks.iter().map(|hook| {
                        HookResult::failed(hook, format!("hook task aborted: {}", e), Duration::ZERO)
                    }));
                }
            }
        }

        results.sort_by_key(|r| r.hook.order());
        results
    }
}

async fn run_group(
    executors: ExecutorSet,
    permits: Option<Arc<Semaphore>>,
    group: ResolvedGroup,
    payload: Arc<EventPayload>,
    cancel: CancellationToken,
) -> Vec<HookResult> {
    let _permit = match permits {
        Some(semaphore) => tokio::select! {
            permit = semaphore.acquire_owned() => permit.ok(),
            _ = cancel.cancelled() => None,
        },
        None => None,
    };

    let mut results = Vec::with_capacity(group.hooks.len());
    for hook in &group.hooks {
        results.push(run_hook(&executors, hook, &payload, &cancel).await);
    }
    results
}

async fn run_hook(
    executors: &ExecutorSet,
    hook: &HookConfig,
    payload: &EventPayload,
    cancel: &CancellationToken,
) -> HookResult {
    let started = Instant::now();
    if cancel.is_cancelled() {
        return HookResult::cancelled(hook, started.elapsed());
    }

    let Some(executor) = executors.for_kind(hook.kind.tag()) else {
        warn!(hook = %hook.id, kind = %hook.kind.tag(), "No executor configured for hook kind");
        return HookResult::failed(
            hook,
            format!("no {} executor configured", hook.kind.tag()),
            started.elapsed(),
        );
    };

    let result = match executor.execute(hook, payload, cancel).await {
        Ok(result) => result,
        Err(e) => {
            warn!(hook = %hook.id, executor = executor.name(), error = %e, "Hook failed");
            HookResult::failed(hook, format!("{:#}", e), started.elapsed())
        }
    };

    if result.timed_out {
        warn!(
            hook = %hook.id,
            timeout_ms = hook.timeout.as_millis() as u64,
            "Hook timed out"
        );
    } else {
        debug!(
            hook = %hook.id,
            exit_code = ?result.exit_code,
            duration_ms = result.duration_ms,
            "Hook finished"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsLayer;
    use crate::hooks::definition::{HookKind, HookRef};
    use crate::hooks::events::HookEventName;
    use crate::hooks::executor::HookExecutor;
    use crate::hooks::matcher::FilePatterns;
    use crate::hooks::payload::PayloadBuilder;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Sleeps for the number of milliseconds in the command body, records start/finish
    struct SleepExecutor {
        log: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HookExecutor for SleepExecutor {
        fn name(&self) -> &str {
            "sleep"
        }

        async fn execute(
            &self,
            hook: &HookConfig,
            _payload: &EventPayload,
            cancel: &CancellationToken,
        ) -> Result<HookResult> {
            let body = hook.kind.body().to_string();
            if body == "fail" {
                return Err(anyhow!("spawn failed"));
            }
            if body == "panic" {
                panic!("executor bug");
            }
            let ms: u64 = body.parse()?;
            self.log.lock().unwrap().push(format!("start {}", hook.id.index));
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
                _ = cancel.cancelled() => return Ok(HookResult::cancelled(hook, Duration::from_millis(0))),
            }
            self.log.lock().unwrap().push(format!("end {}", hook.id.index));
            Ok(HookResult {
                exit_code: Some(0),
                ..HookResult::new(hook, Duration::from_millis(ms))
            })
        }
    }

    fn hook(group: usize, index: usize, body: &str) -> HookConfig {
        HookConfig {
            id: HookRef {
                event: HookEventName::Stop,
                layer: SettingsLayer::Project,
                group,
                index,
            },
            kind: HookKind::Command {
                command: body.to_string(),
            },
            timeout: Duration::from_secs(60),
            file_patterns: FilePatterns::default(),
        }
    }

    fn payload() -> Arc<EventPayload> {
        Arc::new(
            PayloadBuilder::new(HookEventName::Stop)
                .session_id("s")
                .transcript_path("/t")
                .cwd("/repo")
                .build()
                .unwrap(),
        )
    }

    fn scheduler() -> (Scheduler, Arc<SleepExecutor>) {
        let executor = Arc::new(SleepExecutor {
            log: Mutex::new(Vec::new()),
        });
        let set = ExecutorSet::new().with_command(executor.clone());
        (Scheduler::new(set), executor)
    }

    #[tokio::test]
    async fn test_groups_run_in_parallel() {
        let (scheduler, _) = scheduler();
        let groups = vec![
            ResolvedGroup { order: 0, hooks: vec![hook(0, 0, "300")] },
            ResolvedGroup { order: 1, hooks: vec![hook(1, 0, "300")] },
            ResolvedGroup { order: 2, hooks: vec![hook(2, 0, "300")] },
        ];
        let started = Instant::now();
        let results = scheduler.run(groups, payload(), CancellationToken::new()).await;
        assert_eq!(results.len(), 3);
        assert!(started.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_hooks_in_group_run_sequentially() {
        let (scheduler, executor) = scheduler();
        let groups = vec![ResolvedGroup {
            order: 0,
            hooks: vec![hook(0, 0, "50"), hook(0, 1, "10")],
        }];
        scheduler.run(groups, payload(), CancellationToken::new()).await;
        let log = executor.log.lock().unwrap().clone();
        assert_eq!(log, vec!["start 0", "end 0", "start 1", "end 1"]);
    }

    #[tokio::test]
    async fn test_results_in_declared_order() {
        let (scheduler, _) = scheduler();
        let groups = vec![
            ResolvedGroup { order: 0, hooks: vec![hook(0, 0, "200")] },
            ResolvedGroup { order: 1, hooks: vec![hook(1, 0, "0")] },
        ];
        let results = scheduler.run(groups, payload(), CancellationToken::new()).await;
        let order: Vec<usize> = results.iter().map(|r| r.hook.group).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_errors_and_panics_are_isolated() {
        let (scheduler, _) = scheduler();
        let groups = vec![
            ResolvedGroup { order: 0, hooks: vec![hook(0, 0, "fail")] },
            ResolvedGroup { order: 1, hooks: vec![hook(1, 0, "panic")] },
            ResolvedGroup { order: 2, hooks: vec![hook(2, 0, "10")] },
        ];
        let results = scheduler.run(groups, payload(), CancellationToken::new()).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].error.as_deref().unwrap().contains("spawn failed"));
        assert!(results[1].error.is_some());
        assert!(results[2].is_usable());
    }

    #[tokio::test]
    async fn test_cancellation_stops_in_flight_hooks() {
        let (scheduler, _) = scheduler();
        let groups = vec![ResolvedGroup {
            order: 0,
            hooks: vec![hook(0, 0, "10000"), hook(0, 1, "10000")],
        }];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let results = scheduler.run(groups, payload(), cancel).await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.is_usable()));
    }

    #[tokio::test]
    async fn test_missing_executor_fails_open() {
        let scheduler = Scheduler::new(ExecutorSet::new());
        let groups = vec![ResolvedGroup { order: 0, hooks: vec![hook(0, 0, "10")] }];
        let results = scheduler.run(groups, payload(), CancellationToken::new()).await;
        assert!(results[0].error.as_deref().unwrap().contains("no command executor"));
    }

    #[tokio::test]
    async fn test_bounded_parallelism_still_completes() {
        let (scheduler, _) = scheduler();
        let scheduler = scheduler.with_max_parallel(1);
        let groups = (0..3)
            .map(|i| ResolvedGroup { order: i, hooks: vec![hook(i, 0, "20")] })
            .collect();
        let results = scheduler.run(groups, payload(), CancellationToken::new()).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(HookResult::is_usable));
    }
}
