//! Query a task once, or wait for it with `--wait`.
//!
//! ```sh
//! KIE_API_KEY=... cargo run --example check_task -- <task-id> [--wait]
//! ```

use kieai_rs::{KieClient, KieConfig, TaskStatus};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(task_id) = args.next() else {
        eprintln!("usage: check_task <task-id> [--wait]");
        return Ok(());
    };
    let wait = args.any(|a| a == "--wait");

    let client = KieClient::new(KieConfig::from_env());

    if wait {
        let url = client
            .wait_for_completion(&task_id, |status| println!("  {}", status))
            .await?;
        println!("Done: {}", url);
        return Ok(());
    }

    match client.check_status(&task_id).await? {
        TaskStatus::Pending { state } => println!("Pending ({})", state),
        TaskStatus::Succeeded { urls } => {
            for url in urls {
                println!("{}", url);
            }
        }
        TaskStatus::Failed { message } => eprintln!("Failed: {}", message),
    }

    Ok(())
}
