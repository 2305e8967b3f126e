use time::macros::datetime;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::activity::{Activity, NewActivity};
use crate::models::schedule_request::NewScheduleRequest;
use crate::models::DateTime;

pub fn mock_activity(title: &str, start: OffsetDateTime, end: OffsetDateTime) -> Activity {
    let added = datetime!(2025-01-01 0:00 UTC);

    Activity {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        description: String::from("Bring water and sunscreen."),
        r#type: Some(String::from("Community")),
        location: String::from("Riverside Park"),
        is_public: true,
        participant: None,
        district: Some(String::from("North")),
        start_date: start,
        end_date: end,
        created_at: added,
        updated_at: added,
    }
}

pub fn mock_new_activity(title: &str, start: OffsetDateTime, end: OffsetDateTime) -> NewActivity {
    NewActivity {
        title: title.to_owned(),
        description: String::new(),
        r#type: Some(String::from("Community")),
        start_date: DateTime(start),
        end_date: DateTime(end),
        location: String::from("Riverside Park"),
        is_public: true,
        participant: None,
        district: None,
    }
}

pub fn mock_schedule_request(title: &str) -> NewScheduleRequest {
    NewScheduleRequest {
        title: title.to_owned(),
        description: Some(String::from("A morning of swapping books.")),
        r#type: Some(String::from("Fair")),
        start_date: DateTime(datetime!(2025-05-10 9:00 UTC)),
        end_date: DateTime(datetime!(2025-05-10 13:00 UTC)),
        location: Some(String::from("Town Hall")),
        requester_name: String::from("Pat Visitor"),
        requester_email: Some(String::from("visitor@example.org")),
        requester_phone: Some(String::from("555-0100")),
    }
}
