//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT, SIGTERM or SIGQUIT
//! - Report which signal arrived so startup can trigger shutdown
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A handler that fails to install is logged and never fires

/// Resolve when the process is asked to stop. Returns the signal name.
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let terminate = unix_signal(signal(SignalKind::terminate()), "SIGTERM");
        let quit = unix_signal(signal(SignalKind::quit()), "SIGQUIT");

        tokio::select! {
            _ = ctrl_c => "SIGINT",
            _ = terminate => "SIGTERM",
            _ = quit => "SIGQUIT",
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        "SIGINT"
    }
}

#[cfg(unix)]
async fn unix_signal(
    installed: std::io::Result<tokio::signal::unix::Signal>,
    name: &'static str,
) {
    match installed {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::error!(error = %e, signal = name, "Failed to install signal handler");
            std::future::pending::<()>().await;
        }
    }
}
