//! Input validation for event and profile creation.
//!
//! Validators collect every problem into a [`FieldErrors`] map instead of
//! stopping at the first one.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::contract::model::{NewEvent, NewProfile};
use crate::domain::error::{merge_field_errors, push_field_error, DomainError, FieldErrors};
use crate::domain::repo::{EventRecord, ProfileRecord};
use crate::domain::tags::{normalize_tag_names, EmptyTagPolicy};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_TOWN_LEN: usize = 100;
pub const MAX_VENUE_LEN: usize = 200;
pub const MAX_CITY_LEN: usize = 100;
pub const MAX_USER_REF_LEN: usize = 150;
pub const MAX_PHOTO_LEN: usize = 255;

/// decimal(10, 2)
pub const PRICE_MAX_DIGITS: u32 = 10;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const INVALID_NUMBER: &str = "A valid number is required.";
const INVALID_DATE: &str =
    "Date has wrong format. Use ISO-8601, e.g. 2026-05-20T19:00:00Z or 2026-05-20.";

/// Key used for town comparisons. Folded here rather than with SQL `LOWER`,
/// which leaves non-ASCII letters alone on SQLite.
pub fn town_key(town: &str) -> String {
    town.trim().to_lowercase()
}

// Naive forms are read as UTC. `%.f` also accepts a missing fraction.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 date or date-time into UTC.
///
/// Accepts RFC 3339 with an offset, naive date-times (UTC assumed), and
/// plain dates (midnight UTC).
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse and range-check a price. The result always carries two decimal places.
pub fn parse_price(raw: &str) -> Result<Decimal, String> {
    let s = raw.trim();
    let parsed = if s.contains(['e', 'E']) {
        Decimal::from_scientific(s)
    } else {
        Decimal::from_str(s)
    };
    let value = parsed.map_err(|_| INVALID_NUMBER.to_string())?;

    if value < Decimal::ZERO {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }

    let value = value.normalize();
    let places = value.scale();
    if places > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."
        ));
    }

    let whole = value.trunc();
    let whole_digits = if whole.is_zero() {
        0
    } else {
        whole.to_string().len() as u32
    };
    if whole_digits + places > PRICE_MAX_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."
        ));
    }
    if whole_digits > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
        ));
    }

    let mut value = value;
    value.rescale(PRICE_DECIMAL_PLACES);
    Ok(value)
}

fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: Option<usize>,
) -> String {
    match value.map(str::trim) {
        None => {
            push_field_error(errors, field, REQUIRED);
            String::new()
        }
        Some("") => {
            push_field_error(errors, field, BLANK);
            String::new()
        }
        Some(v) => {
            if let Some(max) = max_len {
                if v.chars().count() > max {
                    push_field_error(
                        errors,
                        field,
                        format!("Ensure this field has no more than {max} characters."),
                    );
                }
            }
            v.to_string()
        }
    }
}

fn collect_tags(errors: &mut FieldErrors, raw: &[String], policy: EmptyTagPolicy) -> Vec<String> {
    match normalize_tag_names(raw, policy) {
        Ok(names) => names,
        Err(DomainError::Validation { errors: tag_errors }) => {
            merge_field_errors(errors, tag_errors);
            Vec::new()
        }
        Err(other) => {
            push_field_error(errors, "tags", other.to_string());
            Vec::new()
        }
    }
}

/// Validate a create request and produce the row to insert plus the
/// normalized tag names to link.
pub fn validate_new_event(
    id: Uuid,
    input: &NewEvent,
    default_price: Option<Decimal>,
    policy: EmptyTagPolicy,
) -> Result<(EventRecord, Vec<String>), DomainError> {
    let mut errors = FieldErrors::new();

    let title = required_text(
        &mut errors,
        "title",
        input.title.as_deref(),
        Some(MAX_TITLE_LEN),
    );
    let town = required_text(&mut errors, "town", input.town.as_deref(), Some(MAX_TOWN_LEN));
    let venue = required_text(
        &mut errors,
        "venue",
        input.venue.as_deref(),
        Some(MAX_VENUE_LEN),
    );
    let description = required_text(&mut errors, "description", input.description.as_deref(), None);

    let date = match input.date.as_deref() {
        None => {
            push_field_error(&mut errors, "date", REQUIRED);
            None
        }
        Some(raw) if raw.trim().is_empty() => {
            push_field_error(&mut errors, "date", BLANK);
            None
        }
        Some(raw) => {
            let parsed = parse_event_date(raw);
            if parsed.is_none() {
                push_field_error(&mut errors, "date", INVALID_DATE);
            }
            parsed
        }
    };

    let price = match input.price.as_deref() {
        Some(raw) => match parse_price(raw) {
            Ok(p) => Some(p),
            Err(msg) => {
                push_field_error(&mut errors, "price", msg);
                None
            }
        },
        None => default_price.map(|mut p| {
            p.rescale(PRICE_DECIMAL_PLACES);
            p
        }),
    };

    let photo = match input.photo.as_deref().map(str::trim) {
        Some("") => {
            push_field_error(&mut errors, "photo", BLANK);
            None
        }
        Some(p) if p.chars().count() > MAX_PHOTO_LEN => {
            push_field_error(
                &mut errors,
                "photo",
                format!("Ensure this field has no more than {MAX_PHOTO_LEN} characters."),
            );
            None
        }
        Some(p) => Some(p.to_string()),
        None => None,
    };

    let tag_names = collect_tags(&mut errors, &input.tags, policy);

    match date {
        Some(date) if errors.is_empty() => Ok((
            EventRecord {
                id,
                title,
                town,
                date,
                venue,
                description,
                price,
                photo,
            },
            tag_names,
        )),
        _ => Err(DomainError::validation(errors)),
    }
}

/// Validate the profile-creation hook input.
pub fn validate_new_profile(
    id: Uuid,
    input: &NewProfile,
    policy: EmptyTagPolicy,
) -> Result<(ProfileRecord, Vec<String>), DomainError> {
    let mut errors = FieldErrors::new();

    let user_ref = required_text(
        &mut errors,
        "user_ref",
        Some(input.user_ref.as_str()),
        Some(MAX_USER_REF_LEN),
    );

    let primary_city = input
        .primary_city
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if primary_city.chars().count() > MAX_CITY_LEN {
        push_field_error(
            &mut errors,
            "primary_city",
            format!("Ensure this field has no more than {MAX_CITY_LEN} characters."),
        );
    }

    let tag_names = collect_tags(&mut errors, &input.tags, policy);

    if !errors.is_empty() {
        return Err(DomainError::validation(errors));
    }

    Ok((
        ProfileRecord {
            id,
            user_ref,
            user_type: input.user_type.unwrap_or_default(),
            primary_city,
            email_preference: input.email_preference.unwrap_or_default(),
        },
        tag_names,
    ))
}
