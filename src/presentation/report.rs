// JSON report rendering for the batch front end
use crate::domain::dashboard::WindDashboard;
use crate::error::AnalysisResult;
use std::io::Write;

/// Serialize the dashboard as JSON. Non-finite numbers (a degenerate rose)
/// are written as `null`.
pub fn write_dashboard_json<W: Write>(writer: W, dashboard: &WindDashboard, pretty: bool) -> AnalysisResult<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, dashboard)?;
    } else {
        serde_json::to_writer(writer, dashboard)?;
    }
    Ok(())
}
