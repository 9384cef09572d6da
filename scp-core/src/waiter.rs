//! State waiter - poll a remote object until it converges
//!
//! Every asynchronous mutation hands a probe to [`wait_for_status`]. The
//! probe reports the object and its lifecycle state; the waiter decides
//! whether to stop, keep polling or fail, based on the caller's pending and
//! target sets.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::context::OperationContext;
use crate::provider::{ProviderError, ProviderResult};

/// Synthesised state for an object that answers 404/403
pub const DELETED: &str = "DELETED";

/// Errors a probe may return; the waiter only needs the HTTP status
pub trait StatusError: Display {
    fn status_code(&self) -> Option<u16>;

    /// Worth another poll: server errors and transport failures
    fn is_transient(&self) -> bool {
        matches!(self.status_code(), Some(s) if s >= 500)
    }

    fn is_not_found(&self) -> bool {
        matches!(self.status_code(), Some(404) | Some(403))
    }
}

/// Poll cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Sleep after the first non-terminal observation
    pub delay: Duration,
    /// Sleep between later polls
    pub interval: Duration,
    /// Consecutive not-found observations tolerated while the object appears
    pub not_found_checks: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(20),
            interval: Duration::from_secs(10),
            not_found_checks: 5,
        }
    }
}

impl WaitConfig {
    /// Millisecond cadence for tests against mock servers
    pub fn fast() -> Self {
        Self {
            delay: Duration::from_millis(5),
            interval: Duration::from_millis(5),
            not_found_checks: 5,
        }
    }
}

/// Wait until the probed object reaches a state in `target`
///
/// Returns the last observed object, or `None` when completion was signalled
/// by the object disappearing (404/403 with `error_on_not_found == false`).
pub async fn wait_for_status<T, E, F, Fut>(
    ctx: &OperationContext,
    config: &WaitConfig,
    pending: &[&str],
    target: &[&str],
    error_on_not_found: bool,
    mut probe: F,
) -> ProviderResult<Option<T>>
where
    E: StatusError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, String), E>>,
{
    let mut not_found = 0u32;
    let mut polls = 0u32;

    loop {
        if ctx.is_cancelled() {
            return Err(ProviderError::cancelled());
        }
        polls += 1;
        let observed = ctx.run(probe()).await?;

        let (object, state) = match observed {
            Ok((object, state)) => {
                not_found = 0;
                (Some(object), state)
            }
            Err(err) if err.is_not_found() && !error_on_not_found => (None, DELETED.to_string()),
            Err(err) if err.is_not_found() => {
                not_found += 1;
                if not_found > config.not_found_checks {
                    return Err(ProviderError::gone(format!(
                        "couldn't find resource ({} retries): {}",
                        config.not_found_checks, err
                    ))
                    .with_status(err.status_code()));
                }
                log::debug!(
                    "resource not found yet ({}/{})",
                    not_found,
                    config.not_found_checks
                );
                sleep_before_next(ctx, config, polls).await?;
                continue;
            }
            Err(err) if err.is_transient() => {
                log::warn!("transient error while waiting, retrying: {}", err);
                sleep_before_next(ctx, config, polls).await?;
                continue;
            }
            Err(err) => {
                return Err(ProviderError::api(err.status_code(), err.to_string())
                    .context("error while waiting for state change"));
            }
        };

        if target.contains(&state.as_str()) {
            log::debug!("reached target state {}", state);
            return Ok(object);
        }

        if !pending.contains(&state.as_str()) {
            return Err(ProviderError::convergence(format!(
                "unexpected state '{}', wanted target '{}'",
                state,
                target.join(", ")
            )));
        }

        log::debug!("waiting for {:?}, current state {}", target, state);
        sleep_before_next(ctx, config, polls).await?;
    }
}

async fn sleep_before_next(
    ctx: &OperationContext,
    config: &WaitConfig,
    polls: u32,
) -> ProviderResult<()> {
    let pause = if polls == 1 {
        config.delay
    } else {
        config.interval
    };
    ctx.sleep(pause).await
}

/// Combined state of a group of children (e.g. database cluster members)
///
/// Reports the common state when every child agrees. Otherwise reports the
/// first child state not in `target`, so the caller keeps waiting on a
/// pending child and fails on a broken one.
pub fn aggregate_state<'a, I>(states: I, target: &[&str]) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let states: Vec<&str> = states.into_iter().collect();
    let first = *states.first()?;
    if states.iter().all(|s| *s == first) {
        return Some(first.to_string());
    }
    states
        .iter()
        .find(|s| !target.contains(*s))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ErrorKind;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct ProbeError(u16);

    impl Display for ProbeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "HTTP {}", self.0)
        }
    }

    impl StatusError for ProbeError {
        fn status_code(&self) -> Option<u16> {
            Some(self.0)
        }
    }

    type Step = Result<&'static str, u16>;

    /// Probe replaying a fixed sequence and counting its calls
    fn scripted(
        steps: Vec<Step>,
    ) -> (
        Arc<AtomicUsize>,
        impl FnMut() -> std::future::Ready<Result<((), String), ProbeError>>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let steps = Arc::new(Mutex::new(VecDeque::from(steps)));
        let probe = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let step = steps
                .lock()
                .unwrap()
                .pop_front()
                .expect("probe called after the scripted sequence ended");
            std::future::ready(match step {
                Ok(state) => Ok(((), state.to_string())),
                Err(status) => Err(ProbeError(status)),
            })
        };
        (calls, probe)
    }

    fn ctx() -> OperationContext {
        OperationContext::background()
    }

    #[tokio::test]
    async fn terminates_on_target_without_extra_polls() {
        let (calls, probe) = scripted(vec![Ok("CREATING"), Ok("CREATING"), Ok("ACTIVE")]);
        let result = wait_for_status(
            &ctx(),
            &WaitConfig::fast(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await;

        assert!(result.unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fails_on_unknown_state_and_stops_polling() {
        let (calls, probe) = scripted(vec![Ok("CREATING"), Ok("FAILED")]);
        let err = wait_for_status(
            &ctx(),
            &WaitConfig::fast(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Convergence);
        assert!(err.message.contains("FAILED"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn already_converged_returns_without_delay() {
        let (calls, probe) = scripted(vec![Ok("ACTIVE")]);
        let start = tokio::time::Instant::now();
        wait_for_status(
            &ctx(),
            &WaitConfig::default(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cadence_is_delay_then_interval() {
        let (_calls, probe) = scripted(vec![Ok("CREATING"), Ok("CREATING"), Ok("ACTIVE")]);
        let start = tokio::time::Instant::now();
        wait_for_status(
            &ctx(),
            &WaitConfig::default(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn not_found_synthesises_deleted() {
        let (calls, probe) = scripted(vec![Ok("DELETING"), Err(404)]);
        let result = wait_for_status(
            &ctx(),
            &WaitConfig::fast(),
            &["DELETING"],
            &[DELETED],
            false,
            probe,
        )
        .await
        .unwrap();

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn forbidden_counts_as_deleted() {
        let (_calls, probe) = scripted(vec![Err(403)]);
        let result = wait_for_status(
            &ctx(),
            &WaitConfig::fast(),
            &["DELETING"],
            &[DELETED],
            false,
            probe,
        )
        .await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn tolerates_startup_race_up_to_limit() {
        let mut steps: Vec<Step> = vec![Err(404); 5];
        steps.extend([Ok("CREATING"), Ok("ACTIVE")]);
        let (calls, probe) = scripted(steps);

        wait_for_status(
            &ctx(),
            &WaitConfig::fast(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn fails_after_too_many_not_found() {
        let (calls, probe) = scripted(vec![Err(404); 6]);
        let err = wait_for_status(
            &ctx(),
            &WaitConfig::fast(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Gone);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn server_errors_keep_polling() {
        let (calls, probe) = scripted(vec![Err(502), Ok("CREATING"), Err(500), Ok("ACTIVE")]);
        wait_for_status(
            &ctx(),
            &WaitConfig::fast(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn client_errors_are_fatal() {
        let (calls, probe) = scripted(vec![Err(400)]);
        let err = wait_for_status(
            &ctx(),
            &WaitConfig::fast(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert_eq!(err.status, Some(400));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_without_final_probe() {
        let (ctx, handle) = OperationContext::with_cancel();
        let (calls, probe) = scripted(vec![Ok("CREATING")]);
        handle.cancel();

        let err = wait_for_status(
            &ctx,
            &WaitConfig::fast(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_wait() {
        let ctx = ctx().with_timeout(Duration::from_secs(25));
        let (_calls, probe) = scripted(vec![Ok("CREATING"), Ok("CREATING")]);
        let err = wait_for_status(
            &ctx,
            &WaitConfig::default(),
            &["CREATING"],
            &["ACTIVE"],
            true,
            probe,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[test]
    fn aggregate_requires_agreement() {
        let target = ["RUNNING"];
        assert_eq!(
            aggregate_state(["RUNNING", "RUNNING"], &target).as_deref(),
            Some("RUNNING")
        );
        assert_eq!(
            aggregate_state(["RUNNING", "CREATING"], &target).as_deref(),
            Some("CREATING")
        );
        assert_eq!(
            aggregate_state(["ERROR", "RUNNING"], &target).as_deref(),
            Some("ERROR")
        );
        assert_eq!(aggregate_state(Vec::<&str>::new(), &target), None);
    }
}
