//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. The deposit context carries every storage
//! adapter, so cloning the state is cheap.

use deposit_core::DepositConfig;
use deposit_state::DepositContext;

/// Server configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub deposits: DepositContext,
    pub config: AppConfig,
}

impl AppState {
    /// In-memory adapters with default configuration and auth disabled.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), DepositConfig::default())
    }

    /// In-memory adapters with the given server and deposit configuration.
    pub fn with_config(config: AppConfig, deposit_config: DepositConfig) -> Self {
        Self::from_context(DepositContext::in_memory(deposit_config), config)
    }

    /// Serve an existing deposit context.
    pub fn from_context(deposits: DepositContext, config: AppConfig) -> Self {
        Self { deposits, config }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
