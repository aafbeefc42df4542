mod cli;
mod infra;
mod queue;
mod routes;
mod server;

use civic_queue::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
