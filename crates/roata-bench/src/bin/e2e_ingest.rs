//! End-to-end ingestion benchmark for Roata.
//!
//! Publishes a synthetic fleet through the in-process bus and measures how
//! fast a single worker drains it into the store.

use roata_bench::encoded_fleet;
use roata_core::{on_message, StateStore};
use roata_protocol::DEFAULT_TOPICS;
use roata_transport::{memory, Transport};
use std::time::Instant;

const ROUTES: usize = 50;
const ROUNDS: usize = 20;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let trackers = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(1_000);

    println!("Roata ingestion benchmark: {trackers} trackers, {ROUTES} routes, {ROUNDS} rounds");

    let (publisher, mut transport) = memory::channel();
    for pattern in DEFAULT_TOPICS {
        if let Err(e) = transport.subscribe(pattern).await {
            eprintln!("Subscribe to {pattern} failed: {e}");
            return;
        }
    }

    let fleet = encoded_fleet(trackers, ROUTES);
    for _ in 0..ROUNDS {
        for (topic, payload) in &fleet {
            if let Err(e) = publisher.publish(topic.clone(), payload.clone()) {
                eprintln!("Publish failed: {e}");
                return;
            }
        }
    }
    drop(publisher);

    let store = StateStore::new();
    let mut count = 0u64;
    let start = Instant::now();
    while let Ok(Some(message)) = transport.recv().await {
        on_message(&store, &message.topic, &message.payload);
        count += 1;
    }
    let elapsed = start.elapsed();

    let stats = store.stats();
    println!("Messages:    {count}");
    println!("Elapsed:     {:.3}s", elapsed.as_secs_f64());
    println!(
        "Throughput:  {:.0} msg/s",
        count as f64 / elapsed.as_secs_f64()
    );
    println!(
        "Store:       {} trackers, {} routes, {} memberships",
        stats.tracker_count, stats.route_count, stats.membership_count
    );
}
