use anyhow::Result;
use std::io::Write;

use crate::config::OutputFormat;
use crate::insights::{BuildInsights, LabeledStats};

/// Exports build insights in a machine-readable format.
///
/// - JSON: the full report, for programmatic access
/// - CSV: one row per reported job, step, focus step and workflow series
pub fn export_insights(
    insights: &BuildInsights,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            anyhow::bail!("summary output is rendered to the terminal, not exported")
        }
        OutputFormat::Json => export_json(insights, pretty, output),
        OutputFormat::Csv => export_csv(insights, output),
    }
}

fn export_json(insights: &BuildInsights, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(insights)?
    } else {
        serde_json::to_string(insights)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn csv_escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn write_csv_rows(output: &mut dyn Write, kind: &str, rows: &[LabeledStats]) -> Result<()> {
    for row in rows {
        let stats = &row.stats;
        writeln!(
            output,
            "{},{},{},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1}",
            kind,
            csv_escape(&row.label),
            stats.count,
            stats.mean,
            stats.median,
            stats.min,
            stats.max,
            stats.std_dev,
            stats.coefficient_of_variation
        )?;
    }
    Ok(())
}

fn export_csv(insights: &BuildInsights, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "kind,label,count,mean,median,min,max,std_dev,cv")?;

    if let Some(workflow) = &insights.workflow_duration {
        write_csv_rows(
            output,
            "workflow",
            &[LabeledStats {
                label: insights.workflow.clone(),
                stats: workflow.stats.clone(),
            }],
        )?;
    }

    write_csv_rows(output, "job", &insights.jobs)?;
    write_csv_rows(output, "step", &insights.steps)?;

    if let Some(focus) = &insights.focus_step {
        write_csv_rows(
            output,
            "focus",
            &[LabeledStats {
                label: focus.keyword.clone(),
                stats: focus.stats.clone(),
            }],
        )?;
    }

    Ok(())
}
