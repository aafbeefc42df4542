use crate::infra::{parse_now, InMemoryRequestRepository};
use chrono::{DateTime, Utc};
use clap::Args;
use civic_queue::config::AppConfig;
use civic_queue::error::AppError;
use civic_queue::workflows::intake::SnapshotImporter;
use civic_queue::workflows::prioritization::{
    Diagnostic, PriorityRefreshService, PriorityResult, QueueView, RefreshError, RefreshOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct QueueRankArgs {
    /// CSV export of the requests table
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Evaluation time (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_now)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Only list requests due within this many days (overdue included)
    #[arg(long)]
    pub(crate) urgent_days: Option<i64>,
    /// Rank every row, not just pending_validation / in_review
    #[arg(long)]
    pub(crate) all_statuses: bool,
    /// Emit the queue as JSON instead of a text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct QueueRefreshArgs {
    /// CSV export of the requests table
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Evaluation time (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_now)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn run_queue_rank(args: QueueRankArgs) -> Result<(), AppError> {
    let QueueRankArgs {
        snapshot,
        now,
        urgent_days,
        all_statuses,
        json,
    } = args;

    let settings = AppConfig::load()?.prioritization;
    let now = now.unwrap_or_else(Utc::now);
    let snapshot = SnapshotImporter::from_path(snapshot)?;
    let requests = if all_statuses {
        snapshot.records.clone()
    } else {
        snapshot.pending()
    };

    let batch = settings.engine().rank(&requests, now)?;
    let threshold = urgent_days.unwrap_or(settings.urgent_threshold_days);
    let view = batch.view(threshold, urgent_days.is_some());

    if json {
        let rendered = serde_json::to_string_pretty(&view)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        render_queue(&view, snapshot.len(), snapshot.skipped_rows);
    }

    Ok(())
}

pub(crate) fn run_queue_refresh(args: QueueRefreshArgs) -> Result<(), AppError> {
    let QueueRefreshArgs { snapshot, now } = args;

    let settings = AppConfig::load()?.prioritization;
    let now = now.unwrap_or_else(Utc::now);
    let snapshot = SnapshotImporter::from_path(snapshot)?;

    let repository = Arc::new(InMemoryRequestRepository::seeded(snapshot.records));
    let service = PriorityRefreshService::new(repository.clone(), settings.engine())
        .with_urgent_threshold(settings.urgent_threshold_days);
    let outcome = service.refresh(now)?;

    render_refresh(&outcome);
    println!("\nStored priorities");
    for row in repository.priorities().map_err(RefreshError::from)? {
        println!(
            "- {}: priority {} | {} days left",
            row.id, row.priority, row.days_left
        );
    }

    Ok(())
}

fn render_queue(view: &QueueView, imported: usize, skipped: usize) {
    println!("Clerk queue");
    println!(
        "Evaluated {} | {} rows imported, {} skipped",
        view.evaluated_at.to_rfc3339(),
        imported,
        skipped
    );

    let summary = &view.summary;
    println!(
        "{} ranked | {} overdue | {} due within {} days | {} degraded | {} without id",
        summary.total,
        summary.overdue,
        summary.urgent,
        summary.urgent_threshold_days,
        summary.degraded,
        summary.skipped
    );

    println!("\nCategory load");
    for entry in &summary.categories {
        println!(
            "- {}: {} pending, {} overdue, {} urgent",
            entry.label, entry.pending, entry.overdue, entry.urgent
        );
    }

    if view.results.is_empty() {
        println!("\nQueue: empty");
    } else {
        println!("\nQueue");
        for result in &view.results {
            println!("{}", queue_line(result));
        }
    }

    render_diagnostics(&view.diagnostics);
}

fn queue_line(result: &PriorityResult) -> String {
    format!(
        "{:>3}. {} [{}, {}] due {} ({} days left) | score {} | backlog {}",
        result.rank + 1,
        result.id,
        result.category.label(),
        result.status.label(),
        result.due_date.format("%Y-%m-%d"),
        result.days_left,
        result.priority_score,
        result.backlog_in_category
    )
}

fn render_refresh(outcome: &RefreshOutcome) {
    println!("Priority refresh");
    println!(
        "Evaluated {} | {} pending fetched | {} rows updated",
        outcome.evaluated_at.to_rfc3339(),
        outcome.fetched,
        outcome.updated
    );
    render_diagnostics(&outcome.diagnostics);
}

fn render_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        println!("\nDiagnostics: none");
        return;
    }

    println!("\nDiagnostics");
    for diagnostic in diagnostics {
        println!(
            "- [{}] {}: {}",
            diagnostic.severity.label(),
            diagnostic.request_id,
            diagnostic.message()
        );
    }
}
