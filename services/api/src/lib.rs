mod cli;
mod infra;
mod offline;
mod routes;
mod server;

use campus_nest::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
