use crate::report::SummaryData;

/// Pretty-printed summary. Field order follows `SummaryData`, so identical
/// runs produce identical bytes.
pub fn render_summary_json(data: &SummaryData) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(data)?;
    out.push('\n');
    Ok(out)
}
