//! Drives a [`ModuleRegistry`] through init → db → rest → start → wait → stop.
//!
//! One base [`ModuleCtx`](crate::ModuleCtx) is built up front and reused by
//! every phase. Shutdown is triggered by OS signals, an external
//! `CancellationToken`, or an arbitrary future.

use crate::context::{ConfigProvider, ModuleCtxBuilder};
use crate::registry::ModuleRegistry;
use crate::runtime::shutdown;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

pub enum ShutdownOptions {
    /// Ctrl+C / SIGTERM.
    Signals,
    /// The caller cancels the token.
    Token(CancellationToken),
    /// Shutdown starts when the future completes.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    pub registry: ModuleRegistry,
    pub modules_cfg: Arc<dyn ConfigProvider>,
    /// `None` skips the migration phase and leaves `ModuleCtx::db()` empty.
    pub db: Option<Arc<modkit_db::DbHandle>>,
    pub shutdown: ShutdownOptions,
}

pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        registry,
        modules_cfg,
        db,
        shutdown,
    } = opts;

    let cancel = match &shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };

    match shutdown {
        ShutdownOptions::Signals => {
            let c = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = shutdown::wait_for_shutdown().await {
                    tracing::warn!(error = %e, "signal listener failed; falling back to ctrl_c()");
                    let _ = tokio::signal::ctrl_c().await;
                }
                tracing::info!("shutdown: signal received");
                c.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            let c = cancel.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                c.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::debug!("shutdown: external token controls lifecycle");
        }
    }

    let mut builder = ModuleCtxBuilder::new(cancel.clone()).with_config_provider(modules_cfg);
    if let Some(db) = &db {
        builder = builder.with_db(db.clone());
    }
    let base_ctx = builder.build();

    tracing::info!("Phase: init");
    registry.run_init_phase(&base_ctx).await?;

    if let Some(db) = &db {
        tracing::info!(dsn = db.dsn(), "Phase: db");
        registry.run_db_phase(db).await?;
    }

    tracing::info!("Phase: rest");
    let _ = registry.run_rest_phase(&base_ctx, axum::Router::new())?;

    tracing::info!("Phase: start");
    if let Err(e) = registry.run_start_phase(cancel.clone()).await {
        // Modules that did start still get a chance to release resources.
        cancel.cancel();
        registry.run_stop_phase(cancel).await;
        return Err(e.into());
    }

    cancel.cancelled().await;

    tracing::info!("Phase: stop");
    registry.run_stop_phase(cancel).await;
    Ok(())
}
