use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use orgscope_config::MAX_INTERVAL_SECONDS;
use orgscope_service::{NotifyCycle, OrgService};

#[derive(Clone, Copy, Debug)]
pub struct Schedule {
	pub rebuild_every: Duration,
	pub notify_every: Duration,
	pub poll: StdDuration,
}
impl Schedule {
	pub fn from_config(cfg: &orgscope_config::Worker) -> Self {
		Self {
			rebuild_every: interval(cfg.rebuild_interval_seconds),
			notify_every: interval(cfg.notify_interval_seconds),
			poll: StdDuration::from_millis(cfg.poll_interval_ms),
		}
	}
}

/// Clamped to the validated maximum so due-time arithmetic cannot overflow.
fn interval(seconds: u64) -> Duration {
	let seconds = seconds.min(MAX_INTERVAL_SECONDS);

	Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX))
}

/// Due times for the periodic jobs. A failed job stays due and is retried on the next poll.
#[derive(Clone, Copy, Debug)]
struct Ticker {
	next_rebuild: OffsetDateTime,
	next_notify: OffsetDateTime,
}
impl Ticker {
	fn new(schedule: &Schedule, now: OffsetDateTime) -> Self {
		Self { next_rebuild: now, next_notify: now + schedule.notify_every }
	}
}

pub async fn run_worker(service: &OrgService, schedule: Schedule) -> color_eyre::Result<()> {
	let mut ticker = Ticker::new(&schedule, OffsetDateTime::now_utc());

	tracing::info!(
		rebuild_every_seconds = schedule.rebuild_every.whole_seconds(),
		notify_every_seconds = schedule.notify_every.whole_seconds(),
		"Worker started."
	);

	loop {
		tick(service, &schedule, &mut ticker, OffsetDateTime::now_utc()).await;

		tokio_time::sleep(schedule.poll).await;
	}
}

async fn tick(
	service: &OrgService,
	schedule: &Schedule,
	ticker: &mut Ticker,
	now: OffsetDateTime,
) {
	if now >= ticker.next_rebuild {
		match service.rebuild().await {
			Ok(_) => ticker.next_rebuild = now + schedule.rebuild_every,
			Err(err) => tracing::error!(error = %err, "Directory rebuild failed."),
		}
	}
	if now >= ticker.next_notify {
		match service.run_notify_cycle().await {
			Ok(NotifyCycle::Completed(report)) => {
				if report.messages_failed > 0 {
					tracing::warn!(
						messages_failed = report.messages_failed,
						"Some notifications will be retried next cycle."
					);
				}

				ticker.next_notify = now + schedule.notify_every;
			},
			Ok(NotifyCycle::Skipped) => ticker.next_notify = now + schedule.notify_every,
			Err(err) => tracing::error!(error = %err, "Notify cycle failed."),
		}
	}
}
