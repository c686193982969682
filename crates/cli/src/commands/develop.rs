use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use pagegen_core::SynthesisMode;
use pagegen_core::config::SiteConfig;
use pagegen_generator::{FRAGMENT_EXTENSION, refresh_fragments};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::build::{build_once, print_stats};
use super::load_config;

/// Quiet period after a change before acting on it; editors save in bursts
const DEBOUNCE: Duration = Duration::from_millis(150);

/// What a file change means for the generated artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum WatchEvent {
    /// A component fragment file, or the set of component folders, changed
    Fragments,
    /// The renderer skeleton changed
    Skeleton,
}

/// Files the develop watcher reacts to
struct WatchTargets {
    components_dir: PathBuf,
    skeleton: PathBuf,
    fragment_globs: GlobSet,
}

impl WatchTargets {
    /// One glob per component folder, plus the skeleton
    fn new<'a>(config: &SiteConfig, components: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let components_dir = config.components_dir();
        let base = globset::escape(&components_dir.to_string_lossy());

        let mut builder = GlobSetBuilder::new();
        for name in components {
            let name = globset::escape(name);
            let pattern = format!("{}/{}/{}.{}", base, name, name, FRAGMENT_EXTENSION);
            builder.add(GlobBuilder::new(&pattern).literal_separator(true).build()?);
        }

        Ok(Self {
            components_dir,
            skeleton: config.skeleton_file(),
            fragment_globs: builder.build()?,
        })
    }

    fn classify(&self, path: &Path) -> Option<WatchEvent> {
        // Filter out temporary files and hidden files
        let filename = path.file_name().unwrap_or_default().to_string_lossy();
        if filename.starts_with('.') || filename.ends_with('~') {
            return None;
        }

        if path == self.skeleton.as_path() {
            Some(WatchEvent::Skeleton)
        } else if self.fragment_globs.is_match(path) || path.parent() == Some(self.components_dir.as_path()) {
            // A folder appearing or vanishing directly below the components
            // dir changes the set of known components
            Some(WatchEvent::Fragments)
        } else {
            None
        }
    }
}

/// Tells the dev server to drop its cached pages
struct RefreshSignal {
    client: reqwest::Client,
    url: String,
}

impl RefreshSignal {
    fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    async fn send(&self) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.url))?;
        if !response.status().is_success() {
            anyhow::bail!("{} answered with status {}", self.url, response.status());
        }
        Ok(())
    }
}

/// Build every page with all components imported, then keep fragments and
/// renderers in sync with the sources until interrupted.
///
/// # Arguments
///
/// * `path` - Path to the site directory containing pagegen.toml
pub async fn run(path: PathBuf) -> Result<()> {
    println!("🚀 Starting develop mode...");
    println!("   Site: {}", path.display());

    let config = load_config(&path)?;
    // notify reports absolute paths
    let root = std::fs::canonicalize(&config.root)
        .with_context(|| format!("Failed to resolve {}", config.root.display()))?;
    let config = SiteConfig { root, ..config };

    let stats = build_once(&config, SynthesisMode::AllComponents).await?;
    print_stats(&config, &stats);

    let refresh = RefreshSignal::new(&config.develop.refresh_url)?;

    println!("👀 Watching for changes");
    println!("   Components: {}", config.components_dir().display());
    println!("   Skeleton: {}", config.skeleton_file().display());
    println!("   Press Ctrl+C to stop\n");

    watch_files(config, refresh).await
}

/// Watch fragment files and the skeleton, regenerating what depends on them
async fn watch_files(config: SiteConfig, refresh: RefreshSignal) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| match res {
            Ok(event) => {
                let _ = tx.blocking_send(event);
            }
            Err(e) => warn!(error = %e, "file watcher error"),
        })?;

    watcher.watch(&config.components_dir(), RecursiveMode::Recursive)?;
    let skeleton_dir = config
        .skeleton_file()
        .parent()
        .map(Path::to_path_buf)
        .context("Skeleton has no parent directory")?;
    watcher.watch(&skeleton_dir, RecursiveMode::NonRecursive)?;

    let (registry, _) = refresh_fragments(&config)?;
    let mut targets = WatchTargets::new(&config, registry.names())?;

    while let Some(event) = rx.recv().await {
        let mut changes = BTreeSet::new();
        collect_changes(&targets, &event, &mut changes);

        // Let a burst of saves settle into one rebuild
        tokio::time::sleep(DEBOUNCE).await;
        while let Ok(event) = rx.try_recv() {
            collect_changes(&targets, &event, &mut changes);
        }

        for change in changes {
            match apply_change(&config, change, &refresh).await {
                Ok(Some(updated)) => targets = updated,
                Ok(None) => {}
                Err(e) => eprintln!("   ⚠ {:?} update failed: {:#}", change, e),
            }
        }
    }

    Ok(())
}

/// Regenerate what depends on one kind of change.
///
/// Returns the new watch targets when the set of components may have changed.
/// A refresh signal that cannot be delivered is logged, not returned.
async fn apply_change(
    config: &SiteConfig,
    change: WatchEvent,
    refresh: &RefreshSignal,
) -> Result<Option<WatchTargets>> {
    match change {
        WatchEvent::Fragments => {
            let (registry, written) =
                refresh_fragments(config).context("Fragment reload failed")?;
            if written {
                println!(
                    "   📝 Fragments changed, regenerated {}",
                    config.fragments_file().display()
                );
            }
            Ok(Some(WatchTargets::new(config, registry.names())?))
        }
        WatchEvent::Skeleton => {
            println!("   📝 Skeleton changed, rebuilding pages...");
            let stats = build_once(config, SynthesisMode::AllComponents)
                .await
                .context("Rebuild failed")?;
            println!("   ✓ Regenerated {} renderer(s)", stats.dynamic_pages);
            if let Err(e) = refresh.send().await {
                warn!(error = %e, "refresh signal failed");
            }
            Ok(None)
        }
    }
}

fn collect_changes(targets: &WatchTargets, event: &NotifyEvent, changes: &mut BTreeSet<WatchEvent>) {
    if !matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) {
        return;
    }
    for path in &event.paths {
        if let Some(change) = targets.classify(path) {
            debug!(path = %path.display(), ?change, "watched file changed");
            changes.insert(change);
        }
    }
}
