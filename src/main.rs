use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use birthday_reminder::{
    agenda,
    appsettings::AppSettings,
    display_name::PlainNameFormatter,
    models::{MethodKind, PersonId},
    service::ReminderService,
    scheduling::{LoggingDeliveryChannel, TimerDeliverySink},
    storage::{BirthdayStorage, InMemoryBirthdayStorage},
    timezone::ResolvedZone,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();

    let settings = AppSettings::load()?;
    log::info!("Starting birthday reminder");

    let storage = Arc::new(InMemoryBirthdayStorage::new(settings.account.account()));
    let sink = Arc::new(TimerDeliverySink::new(
        Arc::new(LoggingDeliveryChannel),
        settings.scheduler.nag_policy(),
    ));
    let service = ReminderService::new(
        storage.clone(),
        sink,
        Arc::new(PlainNameFormatter),
        settings.scheduler.year_policy(),
    );

    for seed in &settings.people {
        match seed.to_new_person() {
            Ok(person) => {
                service.add_person(person, Utc::now()).await?;
            }
            Err(error) => log::warn!(
                "Skipping seed person. [first_name = {}, error = {error}]",
                seed.first_name
            ),
        }
    }

    log_upcoming(storage.as_ref(), &settings).await;

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C received, shutting down");
        }
        ctrl_c_token.cancel();
    });

    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = tokio::time::interval(settings.scheduler.refresh_interval());
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                service.refresh(Utc::now()).await;
            }
            Ok(Some(line)) = commands.next_line() => {
                handle_command(&service, &line).await;
            }
        }
    }

    service.shutdown().await;
    Ok(())
}

/// `ack <person_id> <method>` stops a nagging delivery.
async fn handle_command(service: &ReminderService, line: &str) {
    let Some((person_id, method)) = parse_acknowledge(line) else {
        log::warn!("Unknown command. Expected `ack <person_id> <method>`. [line = {line}]");
        return;
    };

    if let Err(error) = service.acknowledge(person_id, method).await {
        log::warn!(
            "Acknowledge failed. [person_id = {person_id}, method = {method}, error = {error}]"
        );
    }
}

fn parse_acknowledge(line: &str) -> Option<(PersonId, MethodKind)> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "ack" {
        return None;
    }
    let person_id = parts.next()?.parse().ok()?;
    let name = parts.next()?;
    let method = MethodKind::ALL
        .into_iter()
        .find(|method| method.to_string().eq_ignore_ascii_case(name))?;
    Some((person_id, method))
}

async fn log_upcoming(storage: &dyn BirthdayStorage, settings: &AppSettings) {
    let persons = storage.get_all_persons().await;
    let today = ResolvedZone::resolve(&settings.account.timezone).today(Utc::now());
    let policy = settings.scheduler.year_policy();

    for entry in agenda::upcoming(&persons, today, 30, &policy) {
        log::info!(
            "Upcoming birthday. [person_id = {}, date = {}, days_until = {}, age = {:?}]",
            entry.person_id,
            entry.date,
            entry.days_until,
            entry.age
        );
    }
}
