/// Diagnostic tool: stream one scan session's events to stdout.
use std::path::{Path, PathBuf};

use canopy::channel::{SessionHandler, SyncChannel};
use canopy::scanner::types::ScanEvent;
use canopy::stats::ATTR_MTIME;

struct PrintingHandler {
    id: u64,
    root: PathBuf,
    depth: u32,
    entered: usize,
    stats: usize,
}

impl SessionHandler for PrintingHandler {
    fn id(&self) -> u64 {
        self.id
    }
    fn path(&self) -> &Path {
        &self.root
    }
    fn depth(&self) -> u32 {
        self.depth
    }
    fn on_event(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::FolderEntered { path, .. } => {
                self.entered += 1;
                println!("entered  {}", path.display());
            }
            ScanEvent::FolderStats { path, stats, .. } => {
                self.stats += 1;
                println!(
                    "stats    {}  size={:.0} B  mtime={:.0}",
                    path.display(),
                    stats.size(),
                    stats.value(ATTR_MTIME).unwrap_or(0.0)
                );
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("canopy=info".parse().unwrap()),
        )
        .init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let max_depth: u32 = std::env::args()
        .nth(2)
        .and_then(|d| d.parse().ok())
        .unwrap_or(0);

    println!("=== DIAGNOSTIC: Scan session ===");
    println!("Scanning: {} (max_depth={})", root.display(), max_depth);

    let mut channel = SyncChannel::new();
    let handler = PrintingHandler {
        id: 1,
        root: root.clone(),
        depth: max_depth,
        entered: 0,
        stats: 0,
    };
    let request = canopy::scanner::types::ScanRequest {
        session_id: handler.id,
        root_path: root,
        max_depth,
    };
    channel.subscribe(handler);

    let start = std::time::Instant::now();
    channel.request(request)?;
    while channel.has_live_sessions() {
        channel.pump();
        std::thread::sleep(std::time::Duration::from_millis(16));
    }
    channel.pump();
    let elapsed = start.elapsed();

    let handler = channel.unsubscribe(1).expect("handler registered above");
    println!(
        "\nDone in {:.2}s: {} folders entered, {} stats events",
        elapsed.as_secs_f64(),
        handler.entered,
        handler.stats
    );

    Ok(())
}
