pub mod config;
pub mod models;
pub mod db;
pub mod llm;
pub mod estimation; // recovery-duration sizing from deficiencies
pub mod analysis; // report text -> deficiency list
pub mod generator; // deficiencies + day window -> recovery plan
pub mod rescheduler; // miss-adjustment state machine
pub mod tracking; // completion updates + per-plan transactions
pub mod reminders; // time-of-day notification jobs

use tracing_subscriber::EnvFilter;

/// Initialize tracing for embedding applications.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("Vitaplan engine v{}", config::APP_VERSION);
}
