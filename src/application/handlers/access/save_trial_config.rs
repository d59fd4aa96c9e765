//! SaveTrialConfigHandler - Validates and stores a scope's trial config.

use std::sync::Arc;

use crate::domain::access::{AccessError, TrialPeriodsConfig};
use crate::domain::foundation::ScopeId;
use crate::ports::TrialConfigStore;

#[derive(Debug, Clone)]
pub struct SaveTrialConfigCommand {
    pub scope_id: ScopeId,
    pub config: TrialPeriodsConfig,
}

pub struct SaveTrialConfigHandler {
    configs: Arc<dyn TrialConfigStore>,
}

impl SaveTrialConfigHandler {
    pub fn new(configs: Arc<dyn TrialConfigStore>) -> Self {
        Self { configs }
    }

    pub async fn handle(&self, cmd: SaveTrialConfigCommand) -> Result<(), AccessError> {
        cmd.config.validate()?;
        self.configs.save(&cmd.scope_id, &cmd.config).await?;

        tracing::info!(
            scope = %cmd.scope_id,
            enable_trials = cmd.config.enable_trials,
            definitions = cmd.config.trial_periods.len(),
            "trial config saved"
        );
        Ok(())
    }
}
