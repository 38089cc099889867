//! Expands reminder slots into per-method delivery requests.

use chrono::NaiveDate;

use crate::{
    display_name::{DisplayNameFormatter, TextDirection},
    models::{Account, MethodConfig, MethodKind, Person, ReminderSlot, SlotPosition},
    recurrence::{YearDisplayPolicy, next_occurrence},
    scheduling::{
        delivery::{DeliveryPayload, DeliveryRequest, GenerationToken, PlannedDelivery},
        trigger::{ScheduleClock, resolve_trigger},
    },
};

/// Everything besides the person that shapes a delivery request.
pub struct DispatchContext<'a> {
    pub clock: ScheduleClock,
    pub timezone_id: &'a str,
    pub direction: TextDirection,
    pub formatter: &'a dyn DisplayNameFormatter,
    pub year_policy: &'a YearDisplayPolicy,
}

impl<'a> DispatchContext<'a> {
    /// Uses the account's timezone and text direction.
    pub fn for_account(
        account: &'a Account,
        clock: ScheduleClock,
        formatter: &'a dyn DisplayNameFormatter,
        year_policy: &'a YearDisplayPolicy,
    ) -> Self {
        Self {
            clock,
            timezone_id: &account.timezone,
            direction: account.text_direction,
            formatter,
            year_policy,
        }
    }
}

/// Requests for the enabled methods of one slot whose trigger is still ahead, local methods
/// first and each group in declared order.
pub fn expand<'a>(
    person: &'a Person,
    position: SlotPosition,
    slot: &'a ReminderSlot,
    ctx: &'a DispatchContext<'a>,
) -> impl Iterator<Item = DeliveryRequest> + 'a {
    let occurrence = next_occurrence(&person.birthday, ctx.clock.today);

    slot.methods()
        .filter(|(_, config)| config.enabled())
        .filter_map(move |(method, config)| {
            let fire_at = resolve_trigger(&person.birthday, slot, method, &ctx.clock)?;
            Some(DeliveryRequest {
                person_id: person.id,
                method,
                slot: position,
                fire_at,
                payload: build_payload(person, slot, method, config, occurrence, ctx),
                local_options: match config {
                    MethodConfig::Local(options) => Some(options.clone()),
                    MethodConfig::External(_) => None,
                },
                remind_until_approved: person.remind_until_approved,
            })
        })
}

/// Every slot of the person expanded and tagged with its generation token, in slot
/// position order.
pub fn plan_person(person: &Person, ctx: &DispatchContext<'_>) -> Vec<PlannedDelivery> {
    person
        .slots
        .iter()
        .flat_map(|(position, slot)| {
            expand(person, position, slot, ctx).map(move |request| PlannedDelivery {
                generation: GenerationToken::compute(person, slot, ctx.timezone_id, &request),
                request,
            })
        })
        .collect()
}

fn build_payload(
    person: &Person,
    slot: &ReminderSlot,
    method: MethodKind,
    config: MethodConfig<'_>,
    occurrence: NaiveDate,
    ctx: &DispatchContext<'_>,
) -> DeliveryPayload {
    let title = ctx
        .formatter
        .format(&person.first_name, &person.last_name, ctx.direction);

    let when = match slot.days_before.get() {
        0 => "Birthday today".to_string(),
        1 => "Birthday tomorrow".to_string(),
        days => format!("Birthday in {days} days"),
    };

    let age = if method.is_local() || !config.include_age() {
        None
    } else {
        ctx.year_policy.age_reached(&person.birthday, occurrence)
    };

    let body = match age {
        Some(age) => format!("{when} (turns {age})"),
        None => when,
    };

    DeliveryPayload { title, body }
}
