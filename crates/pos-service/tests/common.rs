//! Common test utilities for pos-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use tempfile::TempDir;

use pos_core::SessionUser;
use pos_service::{AppConfig, AppState};

/// Iterations for test password hashes; low to keep tests fast.
pub const TEST_ITERATIONS: u32 = 1_000;

/// Test harness containing a bootstrapped service over a fresh database.
pub struct TestHarness {
    /// The service under test.
    pub state: AppState,
    /// Temporary directory for the database (kept alive for test duration).
    pub temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with seeded default data.
    pub async fn new() -> Self {
        Self::with_seed(true).await
    }

    /// Create a new harness, seeding default data only when asked.
    pub async fn with_seed(seed_defaults: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let state = AppState::start(test_config(&temp_dir, seed_defaults))
            .await
            .expect("Failed to start service");
        Self { state, temp_dir }
    }

    /// Shut the service down and start it again over the same database.
    pub async fn restart(self) -> Self {
        let Self { state, temp_dir } = self;
        let seed_defaults = state.config.seed_defaults;
        state.store.flush().await;
        drop(state);

        let state = AppState::start(test_config(&temp_dir, seed_defaults))
            .await
            .expect("Failed to restart service");
        Self { state, temp_dir }
    }

    /// Log in as one of the seeded accounts.
    pub fn login(&self, username: &str) -> SessionUser {
        let password = match username {
            "admin" | "admin2" => "admin123",
            "manager" => "manager123",
            "kasir" => "kasir123",
            other => panic!("no seeded account {other}"),
        };
        self.state
            .login(username, password)
            .expect("Seeded login failed")
    }
}

/// Service configuration over `temp_dir`.
pub fn test_config(temp_dir: &TempDir, seed_defaults: bool) -> AppConfig {
    AppConfig {
        data_dir: temp_dir.path().to_string_lossy().to_string(),
        seed_defaults,
        password_iterations: TEST_ITERATIONS,
        ..AppConfig::default()
    }
}

impl TestHarness {
    /// Id of the seeded product with `sku`.
    pub fn product_id(&self, sku: &str) -> String {
        let found = self.state.store.find_by_field(
            pos_core::keys::PRODUCTS,
            "sku",
            &serde_json::Value::from(sku),
        );
        found
            .first()
            .and_then(|record| record.get("id"))
            .and_then(serde_json::Value::as_str)
            .expect("Seeded product missing")
            .to_string()
    }
}
