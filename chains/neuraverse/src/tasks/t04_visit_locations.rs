use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::Result;
use async_trait::async_trait;

pub struct VisitLocationsTask;

#[async_trait]
impl Task<WalletContext> for VisitLocationsTask {
    fn name(&self) -> &str {
        "visit_locations"
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        let locations = ctx.config.locations.clone();
        let mut visited = 0;
        for location in &locations {
            if ctx.neuraverse.visit_location(location).await {
                visited += 1;
            }
        }

        let message = format!("Visited {}/{} locations", visited, locations.len());
        Ok(if visited == locations.len() {
            TaskResult::ok(message)
        } else {
            TaskResult::failed(message)
        })
    }
}
