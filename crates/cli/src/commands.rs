//! Command implementations

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::PathBuf;

use talefetch_core::Chapter;
use talefetch_download_engine::{
    format_rate, DownloadOrchestrator, JobEvent, JobRequest, OrchestratorConfig,
};
use talefetch_network::{Client, SiteProbe, TransferExecutor};
use talefetch_sources::{SourceCatalog, SourceId};
use talefetch_store::{FileStore, PersistedJobStore};
use tokio::sync::broadcast::error::RecvError;

use crate::manifest::BookManifest;

const COMPLETED_FILE: &str = "completed-downloads.json";

pub async fn download(manifest_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let manifest = BookManifest::load(&manifest_path)?;
    let source = manifest
        .page_url
        .as_deref()
        .and_then(SourceCatalog::match_url);
    match source {
        Some(source) => log::info!("matched source {}", source),
        None => log::info!("no source matched; only absolute chapter URLs will work"),
    }

    let root = match output {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolving current directory")?,
    };

    let client = Client::new()?;
    let executor = TransferExecutor::new(client, &root);
    let files = FileStore::new(&root);
    let completed = PersistedJobStore::load(root.join(COMPLETED_FILE))?;
    let orchestrator = DownloadOrchestrator::new(
        executor,
        files,
        completed,
        OrchestratorConfig::default(),
    );

    let chapters: Vec<Chapter> = manifest
        .chapters
        .iter()
        .map(|c| Chapter::new(&c.name, &c.url, &c.duration))
        .collect();

    let mut events = orchestrator.subscribe();
    let job_id = orchestrator
        .start_job(JobRequest {
            title: manifest.title.clone(),
            cover_url: manifest.cover_url.clone(),
            chapters,
            source,
        })
        .await?;

    // Filler chapters are dropped at start, so read the count back
    let total = orchestrator
        .job(job_id)
        .await
        .map(|job| job.total_chapters())
        .unwrap_or(manifest.chapters.len());

    println!("Downloading \"{}\" ({} chapters)", manifest.title, total);
    loop {
        match events.recv().await {
            Ok(JobEvent::Progress {
                job_id: id,
                current_chapter,
                chapter_progress,
                overall_progress,
                overall_rate,
                ..
            }) if id == job_id => {
                print!(
                    "\rchapter {}/{}  {:>3.0}%  overall {:>3.0}%  {}   ",
                    current_chapter.min(total),
                    total,
                    chapter_progress * 100.0,
                    overall_progress * 100.0,
                    format_rate(overall_rate),
                );
                let _ = std::io::stdout().flush();
            }
            Ok(JobEvent::Completed { job_id: id }) if id == job_id => {
                println!("\nDone.");
                break;
            }
            Ok(JobEvent::Failed { job_id: id, reason }) if id == job_id => {
                println!();
                bail!(reason);
            }
            Ok(JobEvent::Cancelled { job_id: id }) if id == job_id => {
                println!("\nCancelled.");
                break;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }

    Ok(())
}

pub fn sources() -> Result<()> {
    for source in SourceId::ALL {
        println!("{}", source);
        println!("  media:    {}", source.media_base());
        println!("  fallback: {}", source.media_fallback_base());
    }
    Ok(())
}

pub async fn probe(url: &str) -> Result<()> {
    let client = Client::new()?;
    let status = SiteProbe::new(client).check(url).await;
    if status.reachable {
        println!("{} is reachable ({} ms)", url, status.latency.as_millis());
    } else {
        println!("{} is unreachable", url);
    }
    Ok(())
}
