//! ListingServer for fluent API to build listing HTTP servers

use super::listing::{ListedResource, ListingState, build_listing_routes};
use crate::config::{ListingConfig, ResourceConfig};
use crate::core::RecordStore;
use anyhow::Result;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for creating listing servers
///
/// # Example
///
/// ```ignore
/// let config = ListingConfig::default_config();
/// let app = ListingServer::new()
///     .register(config.resource("courses").cloned().unwrap(), InMemoryStore::new("courses"))
///     .build()?;
/// ```
pub struct ListingServer {
    resources: HashMap<String, ListedResource>,
    custom_routes: Vec<Router>,
}

impl ListingServer {
    /// Create a new ListingServer
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Expose `store` under the resource's name
    ///
    /// Registering the same name twice replaces the earlier store.
    pub fn register(mut self, config: ResourceConfig, store: impl RecordStore + 'static) -> Self {
        self.register_arc(config, Arc::new(store));
        self
    }

    /// Same as [`register`](Self::register) for an already shared store
    pub fn register_shared(mut self, config: ResourceConfig, store: Arc<dyn RecordStore>) -> Self {
        self.register_arc(config, store);
        self
    }

    /// Register every resource of `config` whose store `stores` provides
    ///
    /// Fails when a configured resource has no store.
    pub fn with_config(
        mut self,
        config: &ListingConfig,
        stores: &HashMap<String, Arc<dyn RecordStore>>,
    ) -> Result<Self> {
        for resource in &config.resources {
            let store = stores.get(&resource.name).cloned().ok_or_else(|| {
                anyhow::anyhow!("No store registered for resource '{}'", resource.name)
            })?;
            self.register_arc(resource.clone(), store);
        }
        Ok(self)
    }

    /// Add custom routes to the server
    ///
    /// Custom routes take precedence over the generic listing routes.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    fn register_arc(&mut self, config: ResourceConfig, store: Arc<dyn RecordStore>) {
        tracing::debug!(resource = %config.name, collection = store.collection(), "Registering resource");
        self.resources
            .insert(config.name.clone(), ListedResource { config, store });
    }

    /// Names of the registered resources, sorted
    pub fn resource_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        if self.resources.is_empty() {
            return Err(anyhow::anyhow!(
                "No resource registered. Call .register() at least once"
            ));
        }

        let state = ListingState {
            resources: Arc::new(self.resources),
        };

        let mut app = Router::new();
        for routes in self.custom_routes {
            app = app.merge(routes);
        }

        Ok(app
            .merge(build_listing_routes(state))
            .layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ListingServer::new()
    ///     .register(courses_config, courses_store)
    ///     .serve("127.0.0.1:3000").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> Result<()> {
        let resources = self.resource_names().join(", ");
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {} (resources: {})", addr, resources);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ListingServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGTERM or Ctrl+C
///
/// When a handler cannot be installed, that signal is simply never awaited.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
