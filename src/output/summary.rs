use std::fmt::Write;

use comfy_table::Cell;

use crate::config::AnalysisSettings;
use crate::insights::{BuildInsights, Consistency, DurationStats, LabeledStats, TrendDirection};
use crate::metrics::cmp_f64;

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim};
use super::tables::{
    color_coded_duration_cell, color_coded_variability_cell, create_cyan_header, create_table,
    seconds_cell,
};

/// Prints a human-readable timing report to stdout.
///
/// Sections:
/// - Overview: workflow, run counts, sample warning
/// - Overall Workflow Performance: longest-job duration per run
/// - Job and Build Step duration tables (labels meeting the sample threshold)
/// - Focus step performance
/// - Performance trend: most recent runs against the oldest runs
/// - Key Insights
pub fn print_summary(insights: &BuildInsights, settings: &AnalysisSettings) {
    println!("{}", render_summary(insights, settings));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn minutes(seconds: f64) -> String {
    format!("{seconds:.1}s ({:.1}m)", seconds / 60.0)
}

fn render_stats_block(output: &mut String, label: &str, stats: &DurationStats) {
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}",
        dim(format!("{label}:")),
        bright_yellow(stats.count),
        dim("Mean:"),
        cyan(minutes(stats.mean)),
        dim("Median:"),
        cyan(minutes(stats.median)),
        dim("Min:"),
        cyan(minutes(stats.min)),
        dim("Max:"),
        cyan(minutes(stats.max)),
        dim("Std Dev:"),
        cyan(format!("{:.1}s", stats.std_dev)),
    );
}

/// Orders rows for display: slowest first when only the top entries are
/// shown, otherwise alphabetically.
fn select_rows(stats: &[LabeledStats], top: Option<usize>) -> Vec<&LabeledStats> {
    let mut rows: Vec<&LabeledStats> = stats.iter().collect();
    if let Some(top) = top {
        rows.sort_by(|a, b| cmp_f64(b.stats.mean, a.stats.mean));
        rows.truncate(top);
    }
    rows
}

fn render_stats_table(
    output: &mut String,
    first_column: &str,
    rows: &[&LabeledStats],
    variability_threshold: f64,
) {
    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        first_column,
        "Count",
        "Mean",
        "Median",
        "Min",
        "Max",
        "Std Dev",
        "CV",
    ]));

    for row in rows {
        let stats = &row.stats;
        table.add_row(vec![
            Cell::new(&row.label),
            Cell::new(stats.count),
            color_coded_duration_cell(stats.mean),
            seconds_cell(stats.median),
            seconds_cell(stats.min),
            seconds_cell(stats.max),
            seconds_cell(stats.std_dev),
            color_coded_variability_cell(stats.coefficient_of_variation, variability_threshold),
        ]);
    }

    let _ = writeln!(output, "{table}\n");
}

#[allow(clippy::too_many_lines)]
fn render_summary(insights: &BuildInsights, settings: &AnalysisSettings) -> String {
    let mut output = String::new();

    // Overview
    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}",
        dim("Workflow:"),
        cyan(&insights.workflow),
        dim("Repository:"),
        cyan(insights.repository.as_deref().unwrap_or("(current)")),
        dim("Runs listed:"),
        bright_yellow(insights.total_runs),
        dim("Successful runs:"),
        bright_yellow(insights.successful_runs),
        dim("Runs analyzed:"),
        bright_yellow(insights.runs_analyzed),
        dim("Analysis date:"),
        dim(insights.collected_at.format("%Y-%m-%d %H:%M UTC")),
    );
    if insights.failed_fetches > 0 {
        let _ = writeln!(
            output,
            "  {} {}",
            dim("Runs skipped (fetch failed):"),
            bright_red(insights.failed_fetches)
        );
    }
    if insights.low_sample_warning {
        let _ = writeln!(
            output,
            "  {}",
            bright_red(format!(
                "⚠️  Only {} runs analyzed (fewer than {}); results may be unreliable",
                insights.runs_analyzed, insights.min_samples
            ))
        );
    }
    output.push('\n');

    if insights.runs_analyzed == 0 {
        let _ = writeln!(output, "{}", bright_yellow("No timing data found."));
        return output;
    }

    // Overall workflow performance
    if let Some(workflow) = &insights.workflow_duration {
        add_section_header(&mut output, "🎯", "Overall Workflow Performance");
        render_stats_block(&mut output, "Analyzed runs", &workflow.stats);
        if let Some(slowest) = insights
            .runs
            .iter()
            .max_by(|a, b| cmp_f64(a.workflow_duration, b.workflow_duration))
        {
            let _ = writeln!(
                output,
                "  {} {}",
                dim("Slowest run:"),
                cyan(
                    slowest
                        .url
                        .clone()
                        .unwrap_or_else(|| format!("#{}", slowest.id))
                )
            );
        }
        output.push('\n');
    }

    // Jobs
    let job_title = match settings.top_jobs {
        Some(top) => format!("Top {top} Jobs by Average Duration"),
        None => "Job Duration Statistics".to_string(),
    };
    add_section_header(&mut output, "🏗️", &job_title);
    if insights.jobs.is_empty() {
        let _ = writeln!(
            output,
            "  {}\n",
            dim(format!("No jobs with at least {} samples.", insights.min_samples))
        );
    } else {
        let rows = select_rows(&insights.jobs, settings.top_jobs);
        render_stats_table(&mut output, "Job", &rows, settings.variability_threshold);
    }

    // Build steps
    add_section_header(&mut output, "🔧", "Build Step Duration Statistics");
    if insights.steps.is_empty() {
        let _ = writeln!(
            output,
            "  {}\n",
            dim(format!(
                "No steps matching [{}] with at least {} samples.",
                settings.step_keywords.join(", "),
                insights.min_samples
            ))
        );
    } else {
        let rows = select_rows(&insights.steps, None);
        render_stats_table(&mut output, "Job - Step", &rows, settings.variability_threshold);
    }

    // Focus step
    if let Some(focus) = &insights.focus_step {
        add_section_header(
            &mut output,
            "🔍",
            &format!("'{}' Step Performance", focus.keyword),
        );
        render_stats_block(&mut output, "Samples", &focus.stats);
        output.push('\n');
    }

    // Trend
    add_section_header(&mut output, "📈", "Performance Trends");
    match &insights.trend {
        Some(trend) => {
            let verdict = match trend.direction {
                TrendDirection::Regression => bright_red("regression"),
                TrendDirection::Improvement => bright_green("improvement"),
                TrendDirection::Stable => cyan("stable"),
            };
            let _ = writeln!(
                output,
                "  {} {}\n  {} {}\n  {} {} ({})\n",
                dim(format!("Recent {} runs avg:", trend.window)),
                cyan(format!("{:.1}s", trend.recent_mean)),
                dim(format!("Oldest {} runs avg:", trend.window)),
                cyan(format!("{:.1}s", trend.oldest_mean)),
                dim("Trend:"),
                bright(format!("{:+.1}%", trend.delta_percent)),
                verdict,
            );
        }
        None => {
            let _ = writeln!(
                output,
                "  {}\n",
                dim(format!(
                    "Not enough runs for a trend (need {}).",
                    settings.min_trend_runs
                ))
            );
        }
    }

    // Key insights
    add_section_header(&mut output, "💡", "Key Insights");

    if let Some(focus) = &insights.focus_step {
        let _ = writeln!(
            output,
            "  {} Average '{}' time: {}",
            cyan("•"),
            focus.keyword,
            bright_yellow(minutes(focus.stats.mean))
        );
        if let Some(share) = focus.share_of_workflow {
            let _ = writeln!(
                output,
                "  {} '{}' accounts for ~{} of total build time",
                cyan("•"),
                focus.keyword,
                bright_yellow(format!("{share:.1}%"))
            );
        }
    }

    if !insights.high_variability_jobs.is_empty() {
        let _ = writeln!(
            output,
            "  {} Jobs with high timing variability (>{:.0}%):",
            cyan("•"),
            settings.variability_threshold
        );
        for flag in &insights.high_variability_jobs {
            let _ = writeln!(
                output,
                "    - {}: {}",
                flag.label,
                bright_red(format!("{:.1}% variability", flag.coefficient_of_variation))
            );
        }
    }

    if let Some(workflow) = &insights.workflow_duration {
        let cv = workflow.stats.coefficient_of_variation;
        let verdict = match workflow.variability {
            Consistency::High => bright_red("high variability suggests inconsistent performance"),
            Consistency::Low => bright_green("low variability indicates consistent performance"),
            Consistency::Moderate => bright_yellow("moderate variability"),
        };
        let _ = writeln!(
            output,
            "  {} Build time variability: {} ({})",
            cyan("•"),
            bright(format!("{cv:.1}%")),
            verdict
        );
    }

    let _ = writeln!(
        output,
        "\n{} Processed {} successful workflow runs.",
        bright_green("🎉 Analysis complete!"),
        insights.runs_analyzed
    );

    output
}
