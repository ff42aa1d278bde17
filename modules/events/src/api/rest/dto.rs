use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::contract::model::{Event, EventFilter, NewEvent};
use crate::domain::service::Service;

/// Serialized event: the read view exposed over HTTP
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDto {
    pub id: Uuid,
    pub title: String,
    pub town: String,
    pub date: DateTime<Utc>,
    pub venue: String,
    pub description: String,
    /// Two-decimal string such as "10.00", or null
    #[schema(value_type = Option<String>, example = "10.00")]
    pub price: Option<Decimal>,
    /// Retrievable URL of the event photo
    pub photo: Option<String>,
    #[serde(rename = "tagNames")]
    pub tag_names: Vec<String>,
}

impl EventDto {
    /// Photo references become URLs through the service's resolver.
    pub fn from_event(event: Event, svc: &Service) -> Self {
        Self {
            photo: event.photo.as_deref().map(|p| svc.photo_url(p)),
            id: event.id,
            title: event.title,
            town: event.town,
            date: event.date,
            venue: event.venue,
            description: event.description,
            price: event.price,
            tag_names: event.tag_names,
        }
    }
}

/// REST DTO for creating an event. Unknown fields are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateEventReq {
    #[schema(example = "Open mic night")]
    pub title: Option<String>,
    #[schema(example = "Hebden Bridge")]
    pub town: Option<String>,
    /// ISO-8601 date or date-time
    #[schema(example = "2026-05-20T19:00:00Z")]
    pub date: Option<String>,
    pub venue: Option<String>,
    pub description: Option<String>,
    /// Number or numeric string, at most two decimal places
    #[schema(value_type = Option<String>, example = "10.00")]
    pub price: Option<Value>,
    /// Storage reference or absolute URL
    pub photo: Option<String>,
    /// Raw tag names; normalized server-side
    pub tags: Option<Vec<String>>,
}

impl From<CreateEventReq> for NewEvent {
    fn from(req: CreateEventReq) -> Self {
        let price = match req.price {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            // Booleans, arrays and objects fail number parsing downstream
            Some(other) => Some(other.to_string()),
        };
        Self {
            title: req.title,
            town: req.town,
            date: req.date,
            venue: req.venue,
            description: req.description,
            price,
            photo: req.photo,
            tags: req.tags.unwrap_or_default(),
        }
    }
}

/// Listing filters; each accepts a comma-separated list
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEventsQuery {
    /// Towns to include (case-insensitive), e.g. `Leeds,York`
    pub town: Option<String>,
    /// Tags to include; an event matches when it has any of them
    pub tag: Option<String>,
}

fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl From<ListEventsQuery> for EventFilter {
    fn from(q: ListEventsQuery) -> Self {
        Self {
            towns: split_csv(q.town.as_deref()),
            tags: split_csv(q.tag.as_deref()),
        }
    }
}

/// Error body shared by every failure response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// Field name -> problems; present for validation failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_maps_price_shapes() {
        let req: CreateEventReq = serde_json::from_value(json!({ "price": 10.5 })).unwrap();
        assert_eq!(NewEvent::from(req).price.as_deref(), Some("10.5"));

        let req: CreateEventReq = serde_json::from_value(json!({ "price": "7" })).unwrap();
        assert_eq!(NewEvent::from(req).price.as_deref(), Some("7"));

        let req: CreateEventReq = serde_json::from_value(json!({ "price": null })).unwrap();
        assert_eq!(NewEvent::from(req).price, None);

        let req: CreateEventReq = serde_json::from_value(json!({ "price": true })).unwrap();
        assert_eq!(NewEvent::from(req).price.as_deref(), Some("true"));
    }

    #[test]
    fn create_request_rejects_unknown_fields() {
        let res: Result<CreateEventReq, _> =
            serde_json::from_value(json!({ "title": "x", "organizer": "me" }));
        assert!(res.is_err());
    }

    #[test]
    fn query_splits_comma_lists() {
        let filter: EventFilter = ListEventsQuery {
            town: Some("Leeds, York,,".into()),
            tag: None,
        }
        .into();
        assert_eq!(filter.towns, vec!["Leeds", "York"]);
        assert!(filter.tags.is_empty());
    }

    #[test]
    fn event_dto_uses_camel_case_tag_names() {
        let dto = EventDto {
            id: Uuid::nil(),
            title: "t".into(),
            town: "x".into(),
            date: chrono::DateTime::parse_from_rfc3339("2026-05-20T19:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            venue: "v".into(),
            description: "d".into(),
            price: Some(Decimal::new(1000, 2)),
            photo: None,
            tag_names: vec!["music".into()],
        };
        let v = serde_json::to_value(&dto).unwrap();
        assert_eq!(v["tagNames"], json!(["music"]));
        assert_eq!(v["price"], json!("10.00"));
        assert_eq!(v["date"], json!("2026-05-20T19:00:00Z"));
        assert!(v.get("tag_names").is_none());
    }
}
