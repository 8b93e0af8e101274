use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use todo_failover::demo::{DemoApi, FailoverDemo, HttpDemoClient, StressOutcome};
use todo_failover::resilience::RetryPolicy;

#[derive(Parser)]
#[command(name = "failover-demo")]
#[command(about = "Drive the high-availability failover demo through the load balancer", long_about = None)]
struct Cli {
    /// API root behind the load balancer.
    #[arg(short, long, env = "FAILOVER_API_URL", default_value = "http://localhost:8080/api")]
    url: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Stress attempts before giving up on the target instance.
    #[arg(long, default_value_t = 5)]
    attempts: u32,

    /// Log filter for the demo's own tracing output.
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which instance answers the health check
    Health,
    /// Send one stress request through the balancer
    Stress,
    /// Send one clear request through the balancer
    Clear,
    /// Run the full wizard: detect, stress the same instance, verify failover
    Run {
        /// Health polls while waiting for the balancer to reroute.
        #[arg(long, default_value_t = 5)]
        verify_polls: u32,

        /// Pause between health polls in milliseconds.
        #[arg(long, default_value_t = 2000)]
        verify_interval_ms: u64,
    },
    /// Clear stress on both instances
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&cli.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let timeout = Duration::from_millis(cli.timeout_ms);
    let client = HttpDemoClient::new(&cli.url, timeout)?;
    let policy = RetryPolicy {
        max_attempts: cli.attempts,
        attempt_timeout: timeout,
        ..RetryPolicy::default()
    };

    match cli.command {
        Commands::Health => {
            let health = client.health().await?;
            print_json(json!({
                "status": health.status,
                "instance": health.instance,
                "error": health.error,
            }))?;
        }
        Commands::Stress => {
            let receipt = client.stress().await?;
            print_json(json!({
                "instance": receipt.instance,
                "chunksAllocated": receipt.chunks_allocated,
                "allocatedMB": receipt.allocated_mb,
                "rssMB": receipt.rss_mb,
            }))?;
        }
        Commands::Clear => {
            let receipt = client.clear_stress().await?;
            print_json(json!({
                "instance": receipt.instance,
                "previousChunks": receipt.previous_chunks,
                "rssMB": receipt.rss_mb,
            }))?;
        }
        Commands::Run {
            verify_polls,
            verify_interval_ms,
        } => {
            let mut demo = FailoverDemo::new(client, policy);
            let canceller = demo.canceller();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Cancelling...");
                    canceller.cancel();
                }
            });

            println!("Step 1: detecting instance via {}", demo.api().base_url());
            let instance = demo.detect_instance().await?;
            println!("  connected to instance {}", instance);

            println!("Step 2: stressing instance {}", instance);
            let outcome = demo.stress_target_instance().await?;
            println!("  {}", outcome);
            if !matches!(outcome, StressOutcome::Hit { .. }) {
                std::process::exit(1);
            }

            println!("Step 3: verifying failover");
            let check = demo
                .await_failover(verify_polls, Duration::from_millis(verify_interval_ms))
                .await?;
            println!("  {}", check);
            if !check.is_confirmed() {
                std::process::exit(1);
            }
        }
        Commands::Reset => {
            let mut demo = FailoverDemo::new(client, policy);
            let acknowledged = demo.reset().await;
            println!("Reset: {} of 2 clear requests acknowledged", acknowledged);
        }
    }

    Ok(())
}

fn print_json(value: serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
