use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guestbook_topology::{
    api::AppState,
    config::Config,
    create_router, dashboard,
    helm::HelmClient,
    k8s::{watch_address, K8sClient},
    topology::GuestbookTopology,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting guestbook topology");

    // Load configuration
    let config = Config::load()?;
    tracing::info!(is_minikube = config.is_minikube, namespace = %config.namespace, "Configuration loaded");

    // A missing dashboard is fatal
    let dashboard_json = dashboard::load(&config.dashboard_path)?;
    let topology = GuestbookTopology::build(&config, &dashboard_json)?;

    if config.render_only {
        print!("{}", topology.render()?);
        return Ok(());
    }

    let helm = HelmClient::new(config.namespace.clone());

    if config.teardown {
        let k8s = K8sClient::connect(config.kubeconfig.as_deref(), &config.namespace).await?;
        topology.destroy(&k8s, &helm).await?;
        tracing::info!("Guestbook torn down");
        return Ok(());
    }

    let metrics = PrometheusBuilder::new().install_recorder()?;

    let state = AppState::new(config.clone(), topology)
        .with_helm(helm)
        .with_metrics(metrics);

    // Spawn K8s Connection Manager (Automatic Reconnection)
    let mgr_state = state.clone();
    tokio::spawn(async move {
        let mut deployed = false;

        tracing::info!("K8s connection manager started");

        loop {
            let needs_connect = mgr_state.k8s.read().await.is_none();

            if needs_connect {
                match K8sClient::connect(
                    mgr_state.config.kubeconfig.as_deref(),
                    &mgr_state.config.namespace,
                )
                .await
                {
                    Ok(k8s) => match k8s.health_check().await {
                        Ok(_) => {
                            tracing::info!("Connected to Kubernetes cluster");
                            mgr_state.set_k8s(k8s).await;
                        }
                        Err(e) => {
                            tracing::warn!("K8s client created but unhealthy: {}", e);
                        }
                    },
                    Err(e) => {
                        tracing::debug!("K8s connection attempt failed: {}", e);
                    }
                }
            } else {
                // Clone to verify without holding the lock during the request
                let k8s_opt = mgr_state.k8s.read().await.clone();
                if let Some(k8s) = k8s_opt {
                    if let Err(e) = k8s.health_check().await {
                        tracing::error!("Lost K8s connection: {}. Reconnecting...", e);
                        let mut guard = mgr_state.k8s.write().await;
                        *guard = None;
                    }
                }
            }

            // Deploy once, on the first healthy connection
            let k8s_opt = mgr_state.k8s.read().await.clone();
            if let (false, Some(k8s)) = (deployed, k8s_opt) {
                let Some(helm) = mgr_state.helm.as_ref() else {
                    tracing::error!("Helm client not configured");
                    return;
                };

                match mgr_state.topology.deploy(&k8s, helm).await {
                    Ok(address) => {
                        tracing::info!(frontend = %address, "Guestbook deployed");
                        mgr_state.frontend_address.offer(&address);

                        let frontend = mgr_state.topology.frontend();
                        tokio::spawn(watch_address(
                            k8s.services(),
                            frontend.name().to_string(),
                            frontend.address_policy(),
                            mgr_state.frontend_address.clone(),
                        ));
                        deployed = true;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to deploy guestbook");
                    }
                }
            }

            // Poll interval
            tokio::time::sleep(tokio::time::Duration::from_secs(10)).await;
        }
    });

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
