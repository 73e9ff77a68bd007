//! Cal.com webhook plumbing: signature verification over the raw request
//! body and decoding of the `{triggerEvent, payload}` envelope into typed
//! events. Handlers dispatch on the decoded event; nothing downstream
//! touches raw JSON.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Deserializer};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{
    domain::CreateBookingRequest,
    error::{AppError, Result},
};

type HmacSha256 = Hmac<Sha256>;

/// Header Cal.com sends the hex HMAC-SHA256 digest in.
pub const SIGNATURE_HEADER: &str = "x-cal-signature-256";

/// Check the hex HMAC-SHA256 signature of a raw webhook body against the
/// shared secret. Comparison is constant time.
pub fn verify_signature(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    let digest = hex::encode(mac.finalize().into_bytes());

    digest.as_bytes().ct_eq(signature_hex.as_bytes()).into()
}

/// Compute the signature a sender would attach for `payload`.
pub fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookEnvelope {
    trigger_event: String,
    payload: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalParticipant {
    pub name: String,
    pub email: String,
    pub time_zone: Option<String>,
}

/// Payload shape shared by BOOKING_CREATED and BOOKING_RESCHEDULED.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub booking_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_title: String,
    pub organizer: CalParticipant,
    pub attendees: Vec<CalParticipant>,
    #[serde(default)]
    pub billing_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelledPayload {
    #[serde(deserialize_with = "string_or_number")]
    booking_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RescheduledPayload {
    #[serde(deserialize_with = "string_or_number")]
    reschedule_id: String,
    #[serde(flatten)]
    booking: BookingPayload,
}

#[derive(Debug, Clone)]
pub enum CalEvent {
    BookingCreated(BookingPayload),
    BookingCancelled { booking_id: String },
    /// Cal.com reschedules under a fresh booking id; the superseded
    /// booking is identified by `reschedule_id`.
    BookingRescheduled {
        reschedule_id: String,
        booking: BookingPayload,
    },
    Unrecognized(String),
}

/// Decode a verified webhook body. Malformed envelopes or payloads are
/// rejected here, before any dispatch; an unknown trigger tag is not an
/// error.
pub fn parse_event(body: &[u8]) -> Result<CalEvent> {
    let envelope: WebhookEnvelope = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Malformed webhook body: {}", e)))?;

    let event = match envelope.trigger_event.as_str() {
        "BOOKING_CREATED" => {
            let payload: BookingPayload = decode_payload(envelope.payload)?;
            validate_booking(&payload)?;
            CalEvent::BookingCreated(payload)
        }
        "BOOKING_CANCELLED" => {
            let payload: CancelledPayload = decode_payload(envelope.payload)?;
            CalEvent::BookingCancelled {
                booking_id: payload.booking_id,
            }
        }
        "BOOKING_RESCHEDULED" => {
            let payload: RescheduledPayload = decode_payload(envelope.payload)?;
            validate_booking(&payload.booking)?;
            CalEvent::BookingRescheduled {
                reschedule_id: payload.reschedule_id,
                booking: payload.booking,
            }
        }
        _ => CalEvent::Unrecognized(envelope.trigger_event),
    };

    Ok(event)
}

fn decode_payload<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Malformed event payload: {}", e)))
}

fn validate_booking(payload: &BookingPayload) -> Result<()> {
    if payload.attendees.is_empty() {
        return Err(AppError::BadRequest(
            "Booking payload has no attendees".to_string(),
        ));
    }
    if payload.end_time <= payload.start_time {
        return Err(AppError::BadRequest(
            "Booking end time precedes start time".to_string(),
        ));
    }
    Ok(())
}

impl BookingPayload {
    /// Translate the payload into a ledger insert, recomputing the
    /// duration from the booked interval.
    pub fn into_create_request(self) -> Result<CreateBookingRequest> {
        let duration_minutes = (self.end_time - self.start_time).num_minutes();
        let attendee = self.attendees.into_iter().next().ok_or_else(|| {
            AppError::BadRequest("Booking payload has no attendees".to_string())
        })?;

        Ok(CreateBookingRequest {
            cal_booking_id: self.booking_id,
            start_time: self.start_time,
            duration_minutes,
            event_type: self.event_title,
            organizer_name: self.organizer.name,
            organizer_email: self.organizer.email,
            organizer_timezone: self.organizer.time_zone,
            attendee_name: attendee.name,
            attendee_email: attendee.email,
            attendee_timezone: attendee.time_zone,
            billing_email: self.billing_email,
        })
    }
}

// Cal.com sends booking ids as JSON numbers; reschedule uids arrive as
// strings. Accept both.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec-test";

    #[test]
    fn signature_roundtrip() {
        let body = br#"{"triggerEvent":"BOOKING_CANCELLED","payload":{"bookingId":1}}"#;
        let sig = sign(SECRET, body);
        assert!(verify_signature(SECRET, body, &sig));
    }

    #[test]
    fn signature_rejects_tampered_body() {
        let body = br#"{"triggerEvent":"BOOKING_CANCELLED","payload":{"bookingId":1}}"#;
        let sig = sign(SECRET, body);
        assert!(!verify_signature(SECRET, b"{}", &sig));
        assert!(!verify_signature("other-secret", body, &sig));
        assert!(!verify_signature(SECRET, body, "deadbeef"));
    }

    #[test]
    fn parses_cancellation_with_numeric_id() {
        let body = br#"{"triggerEvent":"BOOKING_CANCELLED","payload":{"bookingId":4217}}"#;
        match parse_event(body).unwrap() {
            CalEvent::BookingCancelled { booking_id } => assert_eq!(booking_id, "4217"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn parses_reschedule() {
        let body = br#"{
            "triggerEvent": "BOOKING_RESCHEDULED",
            "payload": {
                "bookingId": "r2",
                "rescheduleId": "r1",
                "startTime": "2026-03-01T15:00:00Z",
                "endTime": "2026-03-01T16:30:00Z",
                "eventTitle": "Regular Tutoring",
                "organizer": {"name": "Pat Tutor", "email": "pat@tutelage.test", "timeZone": "America/New_York"},
                "attendees": [{"name": "Ana", "email": "ana@example.com", "timeZone": "America/Chicago"}]
            }
        }"#;

        match parse_event(body).unwrap() {
            CalEvent::BookingRescheduled { reschedule_id, booking } => {
                assert_eq!(reschedule_id, "r1");
                assert_eq!(booking.booking_id, "r2");
                let request = booking.into_create_request().unwrap();
                assert_eq!(request.duration_minutes, 90);
                assert_eq!(request.attendee_email, "ana@example.com");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unknown_trigger_is_not_an_error() {
        let body = br#"{"triggerEvent":"MEETING_STARTED","payload":{}}"#;
        match parse_event(body).unwrap() {
            CalEvent::Unrecognized(tag) => assert_eq!(tag, "MEETING_STARTED"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn rejects_booking_without_attendees() {
        let body = br#"{
            "triggerEvent": "BOOKING_CREATED",
            "payload": {
                "bookingId": 9,
                "startTime": "2026-03-01T15:00:00Z",
                "endTime": "2026-03-01T16:00:00Z",
                "eventTitle": "Regular Tutoring",
                "organizer": {"name": "Pat", "email": "pat@tutelage.test", "timeZone": null},
                "attendees": []
            }
        }"#;
        assert!(parse_event(body).is_err());
    }

    #[test]
    fn rejects_malformed_envelope() {
        assert!(parse_event(b"not json").is_err());
        assert!(parse_event(br#"{"payload":{}}"#).is_err());
    }
}
