use std::time::Duration;

use dex_catalog::NormalizeOptions;
use dex_sync::{BatchOrchestrator, SyncOptions};
use dex_testkit::ScriptedUpstream;

/// Three pages → two pauses; no pause after the last page.
#[tokio::test(start_paused = true)]
async fn pauses_between_batches_but_not_after_the_last() -> anyhow::Result<()> {
    let delay = Duration::from_millis(500);
    let upstream = ScriptedUpstream::with_catalog(150);
    let opts = SyncOptions::new(50, delay, NormalizeOptions::default());

    let started = tokio::time::Instant::now();
    let run = BatchOrchestrator::new(&upstream, &opts).run(150).await?;
    let elapsed = started.elapsed();

    assert_eq!(run.report.pages, 3);
    assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
    assert!(elapsed < delay * 3, "elapsed {elapsed:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn single_page_run_does_not_pause() -> anyhow::Result<()> {
    let upstream = ScriptedUpstream::with_catalog(10);
    let opts = SyncOptions::default();

    let started = tokio::time::Instant::now();
    BatchOrchestrator::new(&upstream, &opts).run(10).await?;

    assert!(started.elapsed() < opts.batch_delay);
    Ok(())
}
