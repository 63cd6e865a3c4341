//! Pipeline statistics and summary printing.

use std::time::Duration;

use collector::StatsSnapshot;
use storage::BufferStats;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total messages processed
    pub messages_processed: u64,

    /// Messages with a non-empty decoded field map
    pub decode_successes: u64,

    /// Messages with no handler or empty decode
    pub decode_failures: u64,

    /// Decode success percentage
    pub success_rate_pct: f64,

    /// Average throughput over the run
    pub messages_per_sec: f64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Per-PGN counts, descending
    pub top_pgns: Vec<(u32, u64)>,

    /// Ring buffer occupancy at shutdown
    pub buffer: BufferStats,
}

impl PipelineStats {
    pub fn from_run(snapshot: StatsSnapshot, buffer: BufferStats, duration: Duration) -> Self {
        let mut top_pgns: Vec<(u32, u64)> = snapshot.pgn_counts.into_iter().collect();
        top_pgns.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        top_pgns.truncate(10);

        Self {
            messages_processed: snapshot.messages_processed,
            decode_successes: snapshot.decode_successes,
            decode_failures: snapshot.decode_failures,
            success_rate_pct: snapshot.success_rate_pct,
            messages_per_sec: snapshot.messages_per_sec,
            duration,
            top_pgns,
            buffer,
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   |- Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   |- Messages processed: {}", self.messages_processed);
        println!(
            "   |- Decode: {} ok / {} failed ({:.1}%)",
            self.decode_successes, self.decode_failures, self.success_rate_pct
        );
        println!("   `- Throughput: {:.1} msg/s", self.messages_per_sec);

        println!("\nRing buffer");
        println!(
            "   |- Occupancy: {}/{} ({:.1}%)",
            self.buffer.size, self.buffer.capacity, self.buffer.utilization_pct
        );
        println!("   `- Span: {:.1}s", self.buffer.time_span_seconds);

        if !self.top_pgns.is_empty() {
            println!("\nTop PGNs");
            for (i, (pgn, count)) in self.top_pgns.iter().enumerate() {
                let branch = if i + 1 == self.top_pgns.len() { "`-" } else { "|-" };
                println!("   {} {} ({}): {}", branch, pgn, n2k::pgn_name(*pgn), count);
            }
        }

        println!();
    }
}
