//! Submit a file and poll until the service has a verdict.
//!
//! With `METASCAN_API_KEY` set this talks to the real service:
//!
//!     METASCAN_API_KEY=... cargo run --example submit_and_poll -- ./suspicious.exe
//!
//! Without it, a scripted mock transport stands in for the service.

use metascan::prelude::*;
use metascan::transport::MockTransport;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let path = std::env::args().nth(1);

    let (client, poll) = match ClientConfig::from_env() {
        Ok(config) => (Client::new(config)?, PollConfig::default()),
        Err(_) => {
            println!("METASCAN_API_KEY not set, using a mock service\n");
            let transport = MockTransport::new()
                .with_json(json!({"data_id": "61dffeaa728844adbf49eb090e4ece0e"}))
                .with_json(json!({"scan_results": {"progress_percentage": 35}}))
                .with_json(json!({"scan_results": {"progress_percentage": 90}}))
                .with_json(json!({
                    "scan_results": {
                        "progress_percentage": 100,
                        "scan_all_result_i": 0,
                        "scan_all_result_a": "No threat detected",
                        "total_avs": 42,
                        "total_detected_avs": 0
                    }
                }));
            let client = Client::with_transport(ClientConfig::new("demo-key"), Arc::new(transport))?;
            let poll = PollConfig::new().with_poll_interval(Duration::from_millis(200));
            (client, poll)
        }
    };

    let input = match path {
        Some(path) => FileInput::from_path(path),
        None => FileInput::from_bytes(b"This is the content of a clean file.".to_vec())
            .with_filename("document.txt"),
    };

    let mut job = client.scan(input);
    println!("Submitting: {:?}", job.target().display_name());
    let data_id = job.submit().await?.to_string();
    println!("Tracking id: {}", data_id);

    let snapshot = job.wait_for_completion(&poll).await?;
    let summary = snapshot.summary()?;

    println!("\n=== Scan Results ===");
    println!("Engines: {:?}", summary.total_avs);
    println!("Detections: {:?}", summary.total_detected_avs);
    println!("Result: {:?}", summary.scan_all_result_a);

    match job.verdict(false).await? {
        Verdict::Clean => println!("\nFile is CLEAN"),
        Verdict::Infected { threat_count } => {
            println!("\nFile is INFECTED (scan_all_result_i = {})", threat_count)
        }
        other => println!("\nNo usable verdict: {}", other),
    }

    Ok(())
}
