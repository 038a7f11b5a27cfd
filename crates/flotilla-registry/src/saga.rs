//!
//! # Saga
//!
//! Multi-step operation across stores that share no transaction. Each forward
//! step that commits pushes its compensation; on a later failure the saga is
//! aborted and the compensations run newest first. Compensation failures are
//! logged and skipped.
//!
//! A saga dropped before [`Saga::commit`] or [`Saga::abort`] runs nothing. The
//! compensations still pending are logged so an operator can repair by hand.
//!
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, error, warn};

type Compensation<'a> = Box<dyn FnOnce() -> BoxFuture<'a, anyhow::Result<()>> + Send + 'a>;

pub struct Saga<'a> {
    name: &'static str,
    compensations: Vec<(String, Compensation<'a>)>,
    finished: bool,
}

impl<'a> Saga<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            compensations: vec![],
            finished: false,
        }
    }

    /// Register the undo of a step that has just committed
    pub fn push<F, Fut>(&mut self, label: impl Into<String>, compensation: F)
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'a,
    {
        let label = label.into();
        debug!(saga = self.name, step = %label, "step committed");
        self.compensations
            .push((label, Box::new(move || compensation().boxed())));
    }

    /// labels of registered compensations, oldest first
    pub fn pending(&self) -> Vec<&str> {
        self.compensations
            .iter()
            .map(|(label, _)| label.as_str())
            .collect()
    }

    /// All steps succeeded; drop the compensations unrun
    pub fn commit(mut self) {
        self.finished = true;
        debug!(saga = self.name, steps = self.compensations.len(), "committed");
        self.compensations.clear();
    }

    /// Run every registered compensation, newest first
    pub async fn abort(mut self) {
        self.finished = true;
        while let Some((label, compensation)) = self.compensations.pop() {
            debug!(saga = self.name, step = %label, "compensating");
            if let Err(err) = compensation().await {
                error!(saga = self.name, step = %label, "compensation failed: {err:#}");
            }
        }
    }
}

impl Drop for Saga<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.compensations.is_empty() {
            warn!(
                saga = self.name,
                pending = ?self.pending(),
                "saga abandoned, compensations not run"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;

    use super::*;

    fn record<'a>(log: &'a Mutex<Vec<String>>, entry: &'static str) -> impl Future<Output = anyhow::Result<()>> + Send + 'a {
        async move {
            log.lock().expect("log lock").push(entry.to_owned());
            Ok(())
        }
    }

    #[fluvio_future::test]
    async fn test_abort_runs_in_reverse() {
        //given
        let log = Mutex::new(vec![]);
        let mut saga = Saga::new("test");
        saga.push("first", || record(&log, "undo first"));
        saga.push("second", || record(&log, "undo second"));
        saga.push("third", || record(&log, "undo third"));
        assert_eq!(saga.pending(), vec!["first", "second", "third"]);

        //when
        saga.abort().await;

        //then
        assert_eq!(
            *log.lock().expect("log lock"),
            vec!["undo third", "undo second", "undo first"]
        );
    }

    #[fluvio_future::test]
    async fn test_failed_compensation_does_not_stop_unwind() {
        let log = Mutex::new(vec![]);
        let mut saga = Saga::new("test");
        saga.push("first", || record(&log, "undo first"));
        saga.push("second", || async { Err(anyhow!("boom")) });

        saga.abort().await;

        assert_eq!(*log.lock().expect("log lock"), vec!["undo first"]);
    }

    #[fluvio_future::test]
    async fn test_commit_and_drop_run_nothing() {
        let log = Mutex::new(vec![]);

        let mut committed = Saga::new("committed");
        committed.push("first", || record(&log, "undo first"));
        committed.commit();

        let mut abandoned = Saga::new("abandoned");
        abandoned.push("first", || record(&log, "undo first"));
        drop(abandoned);

        assert!(log.lock().expect("log lock").is_empty());
    }
}
