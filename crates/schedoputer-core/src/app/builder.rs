//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! 設定と ports の実装から `JobService` / `Scheduler` / `Boundary` を組み立てます。
//! 起動時に設定を検証し、足りない部品があれば `BuildError` で止めます（fail-fast）。
//!
//! ```ignore
//! let app = AppBuilder::new(config)
//!     .invoker(Arc::new(EchoResourceInvoker))
//!     .build()?;
//! let handle = app.scheduler.clone().spawn();
//! ```

use std::sync::Arc;

use crate::app::boundary::Boundary;
use crate::app::scheduler::Scheduler;
use crate::app::service::JobService;
use crate::config::{ConfigError, EngineConfig};
use crate::domain::TaskGraph;
use crate::impls::InMemoryJobStore;
use crate::payment::PaymentGate;
use crate::ports::{
    Clock, IdGenerator, JobStore, PresenceVerifier, ProofVerifier, ResourceInvoker, SystemClock,
    UlidGenerator,
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no resource invoker configured")]
    MissingInvoker,
}

pub struct AppBuilder {
    config: EngineConfig,
    graph: TaskGraph,
    store: Option<Arc<dyn JobStore>>,
    invoker: Option<Arc<dyn ResourceInvoker>>,
    verifier: Option<Arc<dyn ProofVerifier>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl AppBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            graph: TaskGraph::content_pipeline(),
            store: None,
            invoker: None,
            verifier: None,
            clock: None,
            ids: None,
        }
    }

    pub fn graph(mut self, graph: TaskGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn invoker(mut self, invoker: Arc<dyn ResourceInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn ProofVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Defaults: in-memory store, system clock, presence verifier, ULID ids
    /// driven by the chosen clock.
    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;
        let invoker = self.invoker.ok_or(BuildError::MissingInvoker)?;

        let store = self.store.unwrap_or_else(|| Arc::new(InMemoryJobStore::new()));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let verifier = self.verifier.unwrap_or_else(|| Arc::new(PresenceVerifier));

        let origin = self.config.origin().to_string();
        let gate = PaymentGate::new(&self.config.payment, &origin);
        let service = Arc::new(JobService::new(
            Arc::clone(&store),
            gate,
            verifier,
            Arc::clone(&clock),
            ids,
            self.graph,
            origin,
            self.config.scheduler.cancel_propagation,
        ));
        let scheduler = Arc::new(Scheduler::new(
            store,
            invoker,
            clock,
            self.config.scheduler.clone(),
        ));
        let boundary = Boundary::new(Arc::clone(&service), self.config.domain_verification.clone());

        Ok(App {
            config: self.config,
            service,
            scheduler,
            boundary,
        })
    }
}

/// Wired application: one store shared by the service and the scheduler.
pub struct App {
    pub config: EngineConfig,
    pub service: Arc<JobService>,
    pub scheduler: Arc<Scheduler>,
    pub boundary: Boundary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::EchoResourceInvoker;
    use crate::payment::RequestHeaders;

    #[test]
    fn build_without_invoker_fails() {
        let result = AppBuilder::new(EngineConfig::default()).build();
        assert!(matches!(result, Err(BuildError::MissingInvoker)));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.scheduler.tick_interval_secs = 0;
        let result = AppBuilder::new(config)
            .invoker(Arc::new(EchoResourceInvoker))
            .build();
        assert!(matches!(
            result,
            Err(BuildError::Config(ConfigError::ZeroTickInterval))
        ));
    }

    #[tokio::test]
    async fn service_and_scheduler_share_the_store() {
        let app = AppBuilder::new(EngineConfig::default())
            .invoker(Arc::new(EchoResourceInvoker))
            .build()
            .unwrap();

        let headers = RequestHeaders::new().with("x-payment", "p");
        let body = br#"{"prompt":"hi","schedule_hhmm":"0:00"}"#.to_vec();
        assert_eq!(app.boundary.create(headers, body).await.status, 200);

        let (report, dispatches) = app.scheduler.tick().await;
        assert_eq!(report.jobs_visited, 1);
        assert_eq!(report.tasks_dispatched, 1);
        dispatches.join().await;
    }
}
