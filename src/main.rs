use benchplot::{
    batch::{Batch, DEFAULT_CONFIG},
    file_logger, stdout_logger,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let batch = Batch::value_parse(&config)?;
    let _guard = match &batch.log_file {
        Some(name) => Some(file_logger(name)),
        None => {
            stdout_logger();
            None
        }
    };
    info!("start: {} charts from {}", batch.charts.len(), config);

    let reports = batch.run();
    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} charts failed", reports.len());
    }
    info!("done");
    Ok(())
}
