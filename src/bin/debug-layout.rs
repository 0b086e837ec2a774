/// Diagnostic tool: scan a path into an overview entry, run the layout
/// simulation headless, and audit the resulting column placement.
use std::collections::HashMap;
use std::path::PathBuf;

use canopy::channel::SyncChannel;
use canopy::overview::OverviewEntry;
use canopy::tree::arena::CanvasTree;

fn overlap_count(tree: &CanvasTree, spacing: f32) -> usize {
    let mut columns: HashMap<u16, Vec<f32>> = HashMap::new();
    for id in tree.descendants(tree.root, true) {
        columns.entry(tree.get(id).depth).or_default().push(tree.get(id).y);
    }
    let mut overlapping = 0;
    for ys in columns.values_mut() {
        ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
        overlapping += ys.windows(2).filter(|w| w[1] - w[0] < spacing).count();
    }
    overlapping
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
    let ticks: usize = std::env::args()
        .nth(2)
        .and_then(|t| t.parse().ok())
        .unwrap_or(300);

    println!("=== DIAGNOSTIC: Scan → Tree → Layout pipeline ===");
    println!("Scanning: {}", root.display());

    // Scan with a shallow depth bound so the overview stays readable.
    let entry = OverviewEntry::new(&root, 3);
    let id = entry.session_id();
    let request = entry.scan_request();

    let mut channel = SyncChannel::new();
    channel.subscribe(entry);
    channel.request(request)?;
    while channel.has_live_sessions() {
        channel.pump();
        std::thread::sleep(std::time::Duration::from_millis(16));
    }
    channel.pump();

    let mut entry = channel.unsubscribe(id).expect("entry registered above");
    println!("\n[1] Tree built: {} nodes", entry.tree.len());

    entry.set_coordinates(0.0, 0.0);
    let spacing = entry.engine.simulation().config.node_spacing;
    let before = overlap_count(&entry.tree, spacing);

    entry.start();
    let mut active_ticks = 0;
    for _ in 0..ticks {
        if !entry.tick() {
            break;
        }
        active_ticks += 1;
    }
    entry.stop();

    let after = overlap_count(&entry.tree, spacing);
    println!("[2] Simulation ran {active_ticks} ticks");
    println!("[3] Overlapping column pairs: {before} before → {after} after");

    // Per-column summary, shallowest first.
    let mut columns: HashMap<u16, Vec<(String, f32)>> = HashMap::new();
    for node_id in entry.tree.descendants(entry.tree.root, true) {
        let node = entry.tree.get(node_id);
        columns
            .entry(node.depth)
            .or_default()
            .push((node.name.to_string(), node.y));
    }
    let mut depths: Vec<u16> = columns.keys().copied().collect();
    depths.sort();

    println!("\n[4] Columns:");
    for depth in depths {
        let mut nodes = columns.remove(&depth).unwrap();
        nodes.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        println!("    depth {} ({} nodes):", depth, nodes.len());
        for (name, y) in nodes.iter().take(8) {
            println!("        y={y:8.1}  {name}");
        }
        if nodes.len() > 8 {
            println!("        ... {} more", nodes.len() - 8);
        }
    }

    Ok(())
}
