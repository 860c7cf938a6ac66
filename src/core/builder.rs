use std::sync::Arc;
use std::time::Duration;

use crate::{
    core::{Config, orchestrator::Orchestrator},
    events::Bus,
    jobs::{ExecutorRef, TaskRef},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Orchestrator`] with optional features.
pub struct OrchestratorBuilder {
    cfg: Config,
    exec: ExecutorRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
    trigger: Option<(Duration, TaskRef)>,
}

impl OrchestratorBuilder {
    /// Creates a new builder running jobs with `exec`.
    pub fn new(cfg: Config, exec: ExecutorRef) -> Self {
        Self {
            cfg,
            exec,
            subscribers: Vec::new(),
            trigger: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (job lifecycle, failures, drain)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Runs `task` every `interval` while a submission is in progress.
    ///
    /// A failing invocation stops the submission the same way a failing job does.
    pub fn with_trigger(mut self, interval: Duration, task: TaskRef) -> Self {
        self.trigger = Some((interval, task));
        self
    }

    /// Builds the orchestrator.
    ///
    /// Initializes the event bus, the subscriber workers and the cancellation state.
    /// Must be called within a Tokio runtime when subscribers are set.
    pub fn build(self) -> Orchestrator {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        Orchestrator::new_internal(self.cfg, self.exec, bus, subs, self.trigger)
    }
}

impl Orchestrator {
    /// Starts building an orchestrator.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use jobvisor::{Config, Orchestrator, SumTo};
    ///
    /// let orch = Orchestrator::builder(Config::default(), SumTo::arc(Duration::ZERO)).build();
    /// assert_eq!(orch.state(), jobvisor::State::Idle);
    /// ```
    pub fn builder(cfg: Config, exec: ExecutorRef) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg, exec)
    }
}
