use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub success: u64,
    pub failed: u64,
}

impl RunStats {
    pub fn record(&mut self, success: bool) {
        if success {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn merge(&mut self, other: RunStats) {
        self.success += other.success;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
    pub tx_hash: Option<String>,
}

impl TaskResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            tx_hash: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            tx_hash: None,
        }
    }
}

#[async_trait]
pub trait Task<Ctx: Send>: Send + Sync {
    /// Returns the name of the task
    fn name(&self) -> &str;

    /// One-shot tasks are skipped once they have succeeded for a wallet
    fn is_one_shot(&self) -> bool {
        false
    }

    /// Executes the task against a per-wallet context
    async fn run(&self, ctx: &mut Ctx) -> Result<TaskResult>;
}
