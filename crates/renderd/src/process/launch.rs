//! Serve-until-signalled orchestration.

use std::sync::Arc;

use render_config::Config;
use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::renderer::Renderer;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to run the service.
pub struct ServicePlan<L, S> {
    /// Source of the service configuration.
    pub loader: L,
    /// Observer for lifecycle events.
    pub reporter: Arc<dyn HealthReporter>,
    /// Blocks until the service should stop.
    pub shutdown: S,
}

/// Runs the service with the production collaborators.
///
/// `build` receives the resolved configuration and returns the renderer to
/// serve; the renderer's components may be registered there or later.
pub fn run_service<T, F>(build: F) -> Result<(), LaunchError>
where
    T: Send + Sync + 'static,
    F: FnOnce(&Config) -> Renderer<T>,
{
    let plan = ServicePlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
    };
    run_service_with(plan, build)
}

/// Runs the service with injected collaborators.
///
/// Boots, binds the configured endpoint, serves until `plan.shutdown`
/// returns, then stops accepting and waits for the accept loop to exit.
pub fn run_service_with<T, L, S, F>(plan: ServicePlan<L, S>, build: F) -> Result<(), LaunchError>
where
    T: Send + Sync + 'static,
    L: ConfigLoader,
    S: ShutdownSignal,
    F: FnOnce(&Config) -> Renderer<T>,
{
    let ServicePlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    let service = bootstrap_with(&loader, Arc::clone(&reporter))?;
    let config = service.config();
    info!(
        target: PROCESS_TARGET,
        endpoint = %config.listen_socket(),
        "starting render service"
    );
    let renderer = build(config);
    let server = renderer.start(config.listen_socket())?;
    let endpoint = server.endpoint().clone();
    reporter.listener_started(&endpoint);

    let waited = shutdown.wait();
    server.shutdown();
    let joined = server.join();
    reporter.listener_stopped(&endpoint);
    waited?;
    joined?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
