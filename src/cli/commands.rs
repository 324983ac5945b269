use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};

use crate::config::AppConfig;
use crate::error::{RepricerError, RepricerResult};
use crate::job::{HttpPriceSearchClient, PriceSearchCoordinator};
use crate::patch::ReconcileClient;
use crate::sample::write_sample_workbook;
use crate::session::UploadSession;
use crate::tracker::{MergeReport, SortOrder};
use crate::types::{format_amount, JobStatus, ProductRecord};

/// Execute the extract command: upload a file and print its records.
pub fn extract(file: PathBuf, config: &AppConfig, verbose: bool) -> RepricerResult<()> {
    println!("{}", "📦 Repricer - Extracting inventory".bold().green());
    println!("   File: {}", file.display());
    println!();

    let mut session = UploadSession::new(config.extraction.clone());
    let count = session.upload_path(&file)?;

    if count == 0 {
        print_no_data_guidance(config);
        return Ok(());
    }

    print_record_table(session.tracker().sorted_view(SortOrder::Original), verbose);
    println!();
    println!("{}", format!("✅ {} products extracted", count).bold().green());
    Ok(())
}

/// Execute the search command: one-shot price search, print the deltas.
pub async fn search(file: PathBuf, config: &AppConfig, verbose: bool) -> RepricerResult<()> {
    println!("{}", "🔎 Repricer - Price search".bold().green());
    println!("   File: {}", file.display());
    println!("   API:  {}", config.api.base_url);
    println!();

    let mut session = UploadSession::new(config.extraction.clone());
    let count = session.upload_path(&file)?;
    if count == 0 {
        print_no_data_guidance(config);
        return Ok(());
    }

    let client = HttpPriceSearchClient::new(config.api.base_url.clone())
        .with_sync_timeout(Duration::from_secs(config.api.timeout_secs));
    let coordinator = PriceSearchCoordinator::new(client, session.job_slot());
    let report = coordinator.run_once(session.tracker_mut()).await?;

    print_price_changes(session.tracker().records(), verbose);
    print_merge_summary(&report);
    Ok(())
}

/// Execute the reprice command: extract, run the bulk job, reconcile, and
/// write the patched workbook.
pub async fn reprice(
    file: PathBuf,
    out: Option<PathBuf>,
    sync: bool,
    config: &AppConfig,
    verbose: bool,
) -> RepricerResult<()> {
    println!("{}", "💰 Repricer - Bulk reprice".bold().green());
    println!("   File: {}", file.display());
    println!("   API:  {}", config.api.base_url);
    if sync {
        println!("   Mode: {}", "one-shot (degraded)".yellow());
    }
    println!();

    let mut session = UploadSession::new(config.extraction.clone());
    let count = session.upload_path(&file)?;
    if count == 0 {
        print_no_data_guidance(config);
        return Ok(());
    }
    println!("   {} products found", count.to_string().bold());

    let client = HttpPriceSearchClient::new(config.api.base_url.clone())
        .with_sync_timeout(Duration::from_secs(config.api.timeout_secs));
    let coordinator = PriceSearchCoordinator::new(client, session.job_slot());

    let report = if sync {
        coordinator.run_once(session.tracker_mut()).await?
    } else {
        coordinator
            .run(session.tracker_mut(), print_progress_line)
            .await?
    };
    println!();

    print_price_changes(session.tracker().records(), verbose);
    print_merge_summary(&report);

    if session.tracker().modified_count() == 0 {
        println!("{}", "No price changes; nothing to reconcile".yellow());
        return Ok(());
    }

    let changes = session.change_set()?;
    let original = session
        .original_file()
        .ok_or_else(|| RepricerError::Validation("no uploaded file in session".to_string()))?;

    println!(
        "{}",
        format!("📤 Reconciling {} modified rows...", changes.len()).cyan()
    );
    let reconcile = ReconcileClient::new(config.api.base_url.clone())
        .with_timeout(Duration::from_secs(config.api.timeout_secs));
    let patched = reconcile.reconcile(original, &changes).await?;

    let out_path = out.unwrap_or_else(|| PathBuf::from(&patched.file_name));
    std::fs::write(&out_path, &patched.bytes)?;
    println!(
        "{}",
        format!(
            "✅ Wrote {} ({} bytes)",
            out_path.display(),
            patched.bytes.len()
        )
        .bold()
        .green()
    );
    Ok(())
}

/// Execute the sample command: write a demo inventory workbook.
pub fn sample(file: PathBuf, config: &AppConfig) -> RepricerResult<()> {
    println!("{}", "🧪 Repricer - Sample workbook".bold().green());
    write_sample_workbook(&file, &config.extraction)?;
    println!("   Wrote {}", file.display());
    Ok(())
}

/// Execute the watch command: re-extract whenever the file changes.
pub fn watch(file: PathBuf, config: &AppConfig, verbose: bool) -> RepricerResult<()> {
    println!("{}", "👁️  Repricer - Watch Mode".bold().green());
    println!("   Watching: {}", file.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !file.exists() {
        return Err(RepricerError::Validation(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let canonical_path = file.canonicalize().map_err(RepricerError::Io)?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| RepricerError::Validation("Cannot determine parent directory".to_string()))?;

    let (tx, rx) = channel();

    // Debounce rapid-fire events during file saves
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| RepricerError::Validation(format!("Failed to create file watcher: {}", e)))?;
    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| RepricerError::Validation(format!("Failed to watch directory: {}", e)))?;

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_extraction(&canonical_path, config, verbose);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any && event.path == canonical_path
                });
                if relevant {
                    println!("{}", "🔄 File changed, re-extracting...".cyan());
                    run_watch_extraction(&canonical_path, config, verbose);
                    println!();
                }
            }
            Ok(Err(e)) => {
                eprintln!("{} {}", "Watch error:".red(), e);
            }
            Err(e) => {
                return Err(RepricerError::Validation(format!(
                    "Watch channel closed: {}",
                    e
                )));
            }
        }
    }
}

fn run_watch_extraction(file: &Path, config: &AppConfig, verbose: bool) {
    let mut session = UploadSession::new(config.extraction.clone());
    match session.upload_path(file) {
        Ok(0) => println!("{}", "   No product rows found".yellow()),
        Ok(count) => {
            if verbose {
                print_record_table(session.tracker().sorted_view(SortOrder::Original), true);
            }
            println!("{}", format!("   ✅ {} products", count).green());
        }
        Err(e) => eprintln!("{} {}", "   ❌ Extraction failed:".red(), e),
    }
}

fn print_progress_line(status: &JobStatus) {
    let item = status.current_item.as_deref().unwrap_or("-");
    let eta = status
        .estimated_time
        .map(|secs| format!("{}s", secs.round() as i64))
        .unwrap_or_else(|| "?".to_string());
    print!(
        "\r   {} {:>5.1}%  {}/{}  eta {}  {:<40}",
        "⏳".cyan(),
        status.progress,
        status.processed_items,
        status.total_items,
        eta,
        item
    );
    let _ = std::io::stdout().flush();
}

fn print_record_table(records: Vec<&ProductRecord>, verbose: bool) {
    println!(
        "   {:<5} {:<40} {:>12} {:>8}",
        "Row".bold(),
        "Product".bold(),
        "Price".bold(),
        "Stock".bold()
    );
    for record in records {
        let marker = if record.is_modified { "*" } else { " " };
        println!(
            "   {:<5} {:<40} {:>12} {:>8}{}",
            record.excel_row(),
            truncate(&record.product_name, 40),
            format_amount(record.price),
            format_amount(record.stock),
            marker
        );
        if verbose {
            if let Some(keyword) = &record.search_keyword {
                println!("         keyword: {}", keyword.dimmed());
            }
        }
    }
}

fn print_price_changes(records: &[ProductRecord], verbose: bool) {
    for record in records.iter().filter(|r| r.original_price.is_some()) {
        let label = record.price_change_label.as_deref().unwrap_or("");
        let colored_label = if record.price_delta().unwrap_or(0.0) > 0.0 {
            label.green()
        } else {
            label.red()
        };
        println!(
            "   {} {} → {} ({})",
            truncate(&record.product_name, 40).bold(),
            record
                .original_price
                .map(format_amount)
                .unwrap_or_default()
                .dimmed(),
            format_amount(record.price),
            colored_label
        );
        if verbose {
            if let Some(info) = &record.filter_info {
                println!("      filter: {}", info.dimmed());
            }
        }
    }
}

fn print_merge_summary(report: &MergeReport) {
    println!();
    println!(
        "{}",
        format!(
            "✅ {} updated, {} unchanged",
            report.updated_count(),
            report.noops
        )
        .bold()
        .green()
    );
    if !report.conflicts.is_empty() {
        println!(
            "{}",
            format!(
                "⚠️  {} kept manual edits: {}",
                report.conflicts.len(),
                report.conflicts.join(", ")
            )
            .yellow()
        );
    }
    if !report.unmatched.is_empty() {
        println!(
            "{}",
            format!(
                "⚠️  {} results matched no record: {}",
                report.unmatched.len(),
                report.unmatched.join(", ")
            )
            .yellow()
        );
    }
}

fn print_no_data_guidance(config: &AppConfig) {
    println!("{}", "No product rows found".yellow().bold());
    println!(
        "   Product names are expected in column {} from row {} on,",
        column_letter(config.extraction.name_column),
        config.extraction.start_row + 1
    );
    println!(
        "   with price in column {} and stock in column {}.",
        column_letter(config.extraction.price_column),
        column_letter(config.extraction.stock_column)
    );
}

/// Convert a column index to its letter (0→A, 1→B, 26→AA, ...)
fn column_letter(n: u32) -> String {
    let mut result = String::new();
    let mut num = n;
    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }
    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
