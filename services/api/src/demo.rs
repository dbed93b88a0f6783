use crate::infra::{InMemoryAcceptanceRepository, InMemoryDirectory};
use clap::Args;
use masar::auth::Requester;
use masar::config::{AdminConfig, AppConfig};
use masar::directory::{ensure_admin, DirectorySeed, SeedError};
use masar::error::AppError;
use masar::notifications::{
    NotificationDispatcher, NotificationError, NotificationSink, OutboundMessage,
};
use masar::selection::{
    AcceptanceQuery, AcceptanceRequest, ReconciliationReport, SelectionEngine, SelectionRequest,
    StatusUpdate,
};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the shortlist/acceptance reconciliation report to this CSV file.
    #[arg(long)]
    pub(crate) report_csv: Option<PathBuf>,
}

/// Prints admin alerts instead of sending them.
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), NotificationError> {
        println!("  [whatsapp -> {}]", message.to);
        for line in message.body.lines() {
            println!("    {line}");
        }
        Ok(())
    }
}

type DemoEngine = SelectionEngine<InMemoryDirectory, InMemoryAcceptanceRepository>;

/// Admin channel from the environment, or the built-in defaults when the
/// configuration does not load (e.g. production without a JWT secret).
fn demo_admin_config() -> AdminConfig {
    match AppConfig::load() {
        Ok(config) => config.admin,
        Err(err) => {
            println!("Configuration unavailable ({err}); using default admin channel");
            AdminConfig::default()
        }
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let admin_config = demo_admin_config();

    let directory = Arc::new(InMemoryDirectory::default());
    let summary = DirectorySeed::demo().apply(directory.as_ref())?;
    let admin_account =
        ensure_admin(directory.as_ref(), &admin_config).map_err(SeedError::from)?;

    let notifier = NotificationDispatcher::spawn(Arc::new(ConsoleSink));
    let engine: DemoEngine = SelectionEngine::new(
        directory,
        Arc::new(InMemoryAcceptanceRepository::default()),
        notifier.clone(),
        admin_config,
    );

    let admin = Requester::admin(admin_account.id.0.clone());
    let muscat = Requester::school("s1");

    println!("Masar selection demo");
    println!(
        "Directory: {} records registered, {} skipped; admin {}",
        summary.registered, summary.skipped, admin_account.email
    );

    println!("\nShortlist");
    shortlist(&engine, &muscat, "s1", "t1");
    notifier.flush().await;
    shortlist(&engine, &muscat, "s1", "t1");
    shortlist(&engine, &admin, "s2", "t2");
    notifier.flush().await;
    shortlist(&engine, &muscat, "s2", "t1");

    println!("\nAcceptances");
    let mut created = Vec::new();
    for teacher in ["t1", "t2", "t1"] {
        let request = AcceptanceRequest {
            teacher_id: Some(teacher.to_string()),
            notes: None,
        };
        match engine.accept(&muscat, request) {
            Ok(view) => {
                println!("  s1 accepted {teacher}: {} ({})", view.id, view.status);
                created.push(view.id);
            }
            Err(err) => println!("  s1 accepting {teacher} rejected: {err}"),
        }
    }

    for (id, status) in created.iter().zip(["approved", "rejected"]) {
        let update = StatusUpdate {
            status: Some(status.to_string()),
            notes: Some(format!("marked {status} during demo")),
        };
        match engine.update_status(&admin, id, update) {
            Ok(view) => println!("  admin set {} to {}", view.id, view.status),
            Err(err) => println!("  status update failed: {err}"),
        }
    }

    match engine.all_acceptances(&admin, AcceptanceQuery::default()) {
        Ok(page) => {
            println!(
                "  Admin listing: {} of {} (page {}/{})",
                page.acceptances.len(),
                page.pagination.total_items,
                page.pagination.current_page,
                page.pagination.total_pages
            );
            for view in &page.acceptances {
                let teacher = view
                    .teacher
                    .as_ref()
                    .map(|teacher| teacher.full_name.as_str())
                    .unwrap_or("<removed teacher>");
                println!("    {} -> {}", teacher, view.status);
            }
        }
        Err(err) => println!("  Admin listing unavailable: {err}"),
    }

    println!("\nReconciliation");
    match engine.reconciliation_report(&admin) {
        Ok(report) => {
            render_report(&report);
            if let Some(path) = args.report_csv {
                report.write_csv(File::create(&path)?)?;
                println!("  Report written to {}", path.display());
            }
        }
        Err(err) => println!("  Report unavailable: {err}"),
    }

    notifier.flush().await;
    Ok(())
}

fn shortlist(engine: &DemoEngine, requester: &Requester, school: &str, teacher: &str) {
    let request = SelectionRequest {
        school_id: Some(school.to_string()),
        teacher_id: Some(teacher.to_string()),
        video_id: None,
    };
    match engine.select(requester, request) {
        Ok(receipt) => println!(
            "  {} shortlisted {}",
            receipt.school.name, receipt.teacher.name
        ),
        Err(err) => println!("  {school} shortlisting {teacher} rejected: {err}"),
    }
}

fn render_report(report: &ReconciliationReport) {
    println!(
        "  {} schools, {} shortlist entries, {} acceptances, {} consistent pairs",
        report.schools_scanned,
        report.shortlist_entries,
        report.acceptance_records,
        report.consistent_pairs
    );
    if report.is_consistent() {
        println!("  No divergence found");
        return;
    }
    for entry in &report.entries {
        let status = entry
            .acceptance_status
            .map(|status| status.label())
            .unwrap_or("-");
        println!(
            "  {} / {}: {} (acceptance {})",
            entry.school,
            entry.teacher,
            entry.divergence.label(),
            status
        );
    }
}
