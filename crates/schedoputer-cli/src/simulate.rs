//! Local simulation: one job, driven tick by tick on a virtual clock.
//!
//! Each tick advances the clock by the configured tick interval, so a
//! delayed job starts after the matching number of ticks without waiting
//! in real time.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Duration as ChronoDuration;
use serde_json::{Value, json};
use tracing::info;

use schedoputer_core::app::{ApiBody, ApiResponse, AppBuilder};
use schedoputer_core::domain::{JobState, TaskStatus};
use schedoputer_core::impls::{EchoResourceInvoker, HttpResourceInvoker};
use schedoputer_core::payment::RequestHeaders;
use schedoputer_core::ports::{Clock, FixedClock, ResourceInvoker, SystemClock};
use schedoputer_core::{Boundary, EngineConfig};

use crate::cli::RunArgs;

pub async fn challenge(config: EngineConfig) -> Result<()> {
    let app = AppBuilder::new(config)
        .invoker(Arc::new(EchoResourceInvoker))
        .build()?;
    print_response(&app.boundary.discover().await)
}

pub async fn run(config: EngineConfig, args: RunArgs) -> Result<()> {
    let invoker: Arc<dyn ResourceInvoker> = if args.live {
        Arc::new(
            HttpResourceInvoker::new(&config.resources, config.scheduler.invoke_timeout())
                .context("building HTTP client")?,
        )
    } else {
        Arc::new(EchoResourceInvoker)
    };
    let step = ChronoDuration::from_std(config.scheduler.tick_interval())
        .context("tick interval out of range")?;
    let clock = Arc::new(FixedClock::new(SystemClock.now()));
    let app = AppBuilder::new(config)
        .clock(clock.clone())
        .invoker(invoker)
        .build()?;

    let mut headers = RequestHeaders::new();
    if let Some(proof) = &args.payment {
        headers.insert("X-PAYMENT", proof.clone());
    }
    let body = serde_json::to_vec(&json!({ "prompt": args.prompt, "schedule_hhmm": args.schedule }))?;
    let created = app.boundary.create(headers, body).await;
    print_response(&created)?;
    match created.status {
        200 => {}
        402 => {
            info!("job refused: payment required");
            return Ok(());
        }
        status => bail!("job creation failed with status {status}"),
    }
    let job_id = created
        .json_body()
        .get("jobId")
        .and_then(Value::as_str)
        .context("creation response has no jobId")?
        .to_string();

    let mut waiting_ticks = 0;
    for n in 1..=args.ticks {
        let (report, dispatches) = app.scheduler.tick().await;
        dispatches.join().await;
        info!(tick = n, dispatched = report.tasks_dispatched, "tick");

        let status = app.boundary.status(job_id.clone()).await;
        println!("-- tick {n}");
        print_response(&status)?;

        let view = app.service.status(&job_id).await?;
        if view.state.is_terminal() {
            info!(job_id = %job_id, state = %view.state, "job finished");
            return Ok(());
        }
        if view.state == JobState::WaitingOnExternal {
            waiting_ticks += 1;
            if waiting_ticks >= args.approve_after {
                approve_waiting(&app.boundary, &job_id, &view.tasks).await?;
                waiting_ticks = 0;
            }
        }

        clock.advance(step);
        if args.tick_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.tick_ms)).await;
        }
    }

    info!(ticks = args.ticks, "tick budget exhausted");
    Ok(())
}

async fn approve_waiting(
    boundary: &Boundary,
    job_id: &str,
    tasks: &[schedoputer_core::domain::TaskStatusView],
) -> Result<()> {
    for task in tasks.iter().filter(|t| t.status == TaskStatus::WaitingHuman) {
        let response = boundary
            .complete_human(
                job_id.to_string(),
                task.id.to_string(),
                json!({ "text": format!("{} approved", task.name) }),
            )
            .await;
        if response.status != 200 {
            bail!("approving {} failed: {:?}", task.id, response.body);
        }
        info!(job_id = %job_id, task = %task.id, "approved human task");
    }
    Ok(())
}

fn print_response(response: &ApiResponse) -> Result<()> {
    println!("status: {}", response.status);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    match &response.body {
        ApiBody::Json(body) => println!("{}", serde_json::to_string_pretty(body)?),
        ApiBody::Text(body) => println!("{body}"),
    }
    Ok(())
}
