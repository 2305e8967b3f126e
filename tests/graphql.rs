use async_graphql::{Request, Response, Variables};
use futures_util::StreamExt;
use serde_json::{json, Value};

use agenda::config::Config;
use agenda::graphql::{authorize, build_schema, AgendaSchema};
use agenda::models::session::Sessions;
use agenda::store::Store;

struct TestApp {
    schema: AgendaSchema,
    sessions: Sessions,
}

impl TestApp {
    fn new() -> Self {
        let config = Config::default();
        let sessions = Sessions::new(config.admin.clone());

        Self {
            schema: build_schema(Store::in_memory(), config, sessions.clone()),
            sessions,
        }
    }

    async fn login(&self) -> String {
        let response = self
            .run(
                None,
                r#"mutation { login(email: "admin@activities.com", password: "admin123") }"#,
                json!({}),
            )
            .await;

        data(response)["login"].as_str().unwrap().to_owned()
    }

    async fn run(&self, token: Option<&str>, query: &str, variables: Value) -> Response {
        let request = Request::new(query).variables(Variables::from_json(variables));
        let request = authorize(request, token, &self.sessions).unwrap();

        self.schema.execute(request).await
    }
}

fn data(response: Response) -> Value {
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

fn error_message(response: Response) -> String {
    assert_eq!(response.errors.len(), 1, "{:?}", response.errors);
    response.errors[0].message.clone()
}

const CREATE_ACTIVITY: &str = r#"
    mutation ($activity: NewActivity!) {
        createActivity(newActivity: $activity) { id title isPublic }
    }
"#;

const SUBMIT_REQUEST: &str = r#"
    mutation ($request: NewScheduleRequest!) {
        submitScheduleRequest(request: $request) { id status }
    }
"#;

fn activity(title: &str, is_public: bool) -> Value {
    json!({
        "activity": {
            "title": title,
            "type": "Workshop",
            "startDate": "2025-04-05T09:00:00Z",
            "endDate": "2025-04-05T12:00:00Z",
            "location": "Library",
            "isPublic": is_public,
        }
    })
}

fn schedule_request() -> Value {
    json!({
        "request": {
            "title": "Book swap",
            "type": "Fair",
            "startDate": "2025-05-10T09:00:00Z",
            "endDate": "2025-05-10T13:00:00Z",
            "requesterName": "Pat Visitor",
            "requesterEmail": "visitor@example.org",
        }
    })
}

#[tokio::test]
async fn admin_operations_need_a_login() {
    let app = TestApp::new();

    let response = app.run(None, CREATE_ACTIVITY, activity("Workshop", true)).await;
    assert_eq!(error_message(response), "Admin login required");

    let token = app.login().await;
    let created = data(app.run(Some(&token), CREATE_ACTIVITY, activity("Workshop", true)).await);
    assert_eq!(created["createActivity"]["title"], "Workshop");
}

#[tokio::test]
async fn wrong_passwords_and_unknown_tokens_are_rejected() {
    let app = TestApp::new();

    let response = app
        .run(
            None,
            r#"mutation { login(email: "admin@activities.com", password: "nope") }"#,
            json!({}),
        )
        .await;
    assert_eq!(error_message(response), "login required");

    let request = Request::new("{ admin }");
    assert!(authorize(request, Some("not-a-session"), &app.sessions).is_err());
}

#[tokio::test]
async fn visitors_only_see_public_activities() {
    let app = TestApp::new();
    let token = app.login().await;
    app.run(Some(&token), CREATE_ACTIVITY, activity("Open day", true))
        .await;
    app.run(Some(&token), CREATE_ACTIVITY, activity("Board meeting", false))
        .await;

    let query = r#"{ activitiesOnDate(date: "2025-04-05") { title } }"#;
    let public = data(app.run(None, query, json!({})).await);
    assert_eq!(public["activitiesOnDate"], json!([{ "title": "Open day" }]));

    let everything = data(app.run(Some(&token), query, json!({})).await);
    assert_eq!(everything["activitiesOnDate"].as_array().unwrap().len(), 2);

    let calendar = data(
        app.run(
            None,
            r#"{ monthCalendar(year: 2025, month: 4) { leadingBlankDays days { date activities { title } } } }"#,
            json!({}),
        )
        .await,
    );
    // April 1st 2025 is a Tuesday
    assert_eq!(calendar["monthCalendar"]["leadingBlankDays"], 2);
    assert_eq!(
        calendar["monthCalendar"]["days"][4],
        json!({ "date": "2025-04-05", "activities": [{ "title": "Open day" }] })
    );
}

#[tokio::test]
async fn approving_a_request_schedules_it() {
    let app = TestApp::new();
    let submitted = data(app.run(None, SUBMIT_REQUEST, schedule_request()).await);
    let id = submitted["submitScheduleRequest"]["id"].clone();
    assert_eq!(submitted["submitScheduleRequest"]["status"], "PENDING");

    let token = app.login().await;
    let approve = r#"
        mutation ($id: UUID!) {
            approveScheduleRequest(id: $id) {
                status
                activity { title type startDate endDate location isPublic participant }
            }
        }
    "#;
    let approved = data(app.run(Some(&token), approve, json!({ "id": id })).await);
    assert_eq!(
        approved["approveScheduleRequest"],
        json!({
            "status": "APPROVED",
            "activity": {
                "title": "Book swap",
                "type": "Fair",
                "startDate": "2025-05-10T09:00:00Z",
                "endDate": "2025-05-10T13:00:00Z",
                "location": "",
                "isPublic": true,
                "participant": "Pat Visitor",
            }
        })
    );

    let reject = r#"mutation ($id: UUID!) { rejectScheduleRequest(id: $id) { status } }"#;
    let response = app.run(Some(&token), reject, json!({ "id": id })).await;
    assert_eq!(
        error_message(response),
        "Cannot change the status of a schedule request from approved to rejected"
    );

    let pending = data(
        app.run(None, "{ pendingScheduleRequests { id } }", json!({}))
            .await,
    );
    assert_eq!(pending["pendingScheduleRequests"], json!([]));
}

#[tokio::test]
async fn requester_contact_details_are_admin_only() {
    let app = TestApp::new();
    app.run(None, SUBMIT_REQUEST, schedule_request()).await;
    let query = "{ pendingScheduleRequests { requesterName requesterEmail } }";

    let response = app.run(None, query, json!({})).await;
    assert_eq!(error_message(response), "Admin login required");

    let token = app.login().await;
    let requests = data(app.run(Some(&token), query, json!({})).await);
    assert_eq!(
        requests["pendingScheduleRequests"],
        json!([{ "requesterName": "Pat Visitor", "requesterEmail": "visitor@example.org" }])
    );
}

#[tokio::test]
async fn reference_lists_reject_duplicate_names() {
    let app = TestApp::new();
    let token = app.login().await;
    let add = r#"mutation ($name: String!) { addDistrict(name: $name) { name } }"#;

    data(app.run(Some(&token), add, json!({ "name": "Riverside" })).await);
    let response = app
        .run(Some(&token), add, json!({ "name": " riverside " }))
        .await;
    assert_eq!(
        error_message(response),
        "districts already contains \"riverside\""
    );

    let districts = data(app.run(None, "{ districts { name } }", json!({})).await);
    assert_eq!(districts["districts"], json!([{ "name": "Riverside" }]));
}

#[tokio::test]
async fn subscriptions_send_the_list_on_start_and_after_changes() {
    let app = TestApp::new();
    let token = app.login().await;
    let mut updates = app
        .schema
        .execute_stream(Request::new("subscription { activityTypes { name } }"));

    let initial = data(updates.next().await.unwrap());
    assert_eq!(initial["activityTypes"], json!([]));

    app.run(
        Some(&token),
        r#"mutation { addActivityType(name: "Cleanup") { name } }"#,
        json!({}),
    )
    .await;

    let changed = data(updates.next().await.unwrap());
    assert_eq!(changed["activityTypes"], json!([{ "name": "Cleanup" }]));
}

#[tokio::test]
async fn schedule_span_follows_the_date_picker() {
    let app = TestApp::new();

    let span = data(
        app.run(
            None,
            r#"{ scheduleSpan(dates: ["2025-08-03", "2025-08-01"], startTime: "18:00", endTime: "20:30") {
                startDate endDate dayCount
            } }"#,
            json!({}),
        )
        .await,
    );

    assert_eq!(
        span["scheduleSpan"],
        json!({
            "startDate": "2025-08-01T18:00:00Z",
            "endDate": "2025-08-03T20:30:00Z",
            "dayCount": 3,
        })
    );
}

#[tokio::test]
async fn visitors_never_receive_private_activities_live() {
    let app = TestApp::new();
    let token = app.login().await;
    let query = r#"subscription { activities { title } }"#;
    let by_date = r#"subscription { activitiesOnDate(date: "2025-04-05") { title } }"#;

    let mut visitor = app.schema.execute_stream(Request::new(query));
    let mut visitor_by_date = app.schema.execute_stream(Request::new(by_date));
    let mut admin = app
        .schema
        .execute_stream(authorize(Request::new(query), Some(&token), &app.sessions).unwrap());
    assert_eq!(data(visitor.next().await.unwrap())["activities"], json!([]));
    assert_eq!(
        data(visitor_by_date.next().await.unwrap())["activitiesOnDate"],
        json!([])
    );
    assert_eq!(data(admin.next().await.unwrap())["activities"], json!([]));

    app.run(Some(&token), CREATE_ACTIVITY, activity("Board meeting", false))
        .await;
    assert_eq!(
        data(admin.next().await.unwrap())["activities"],
        json!([{ "title": "Board meeting" }])
    );
    assert_eq!(data(visitor.next().await.unwrap())["activities"], json!([]));
    assert_eq!(
        data(visitor_by_date.next().await.unwrap())["activitiesOnDate"],
        json!([])
    );

    app.run(Some(&token), CREATE_ACTIVITY, activity("Open day", true))
        .await;
    assert_eq!(
        data(visitor.next().await.unwrap())["activities"],
        json!([{ "title": "Open day" }])
    );
    assert_eq!(
        data(visitor_by_date.next().await.unwrap())["activitiesOnDate"],
        json!([{ "title": "Open day" }])
    );
}

#[tokio::test]
async fn schedule_request_feeds_split_by_role() {
    let app = TestApp::new();
    let token = app.login().await;
    let all_requests = "subscription { scheduleRequests { title status } }";

    let mut denied = app.schema.execute_stream(Request::new(all_requests));
    assert_eq!(
        error_message(denied.next().await.unwrap()),
        "Admin login required"
    );

    let mut admin = app.schema.execute_stream(
        authorize(Request::new(all_requests), Some(&token), &app.sessions).unwrap(),
    );
    let mut pending = app
        .schema
        .execute_stream(Request::new("subscription { pendingScheduleRequests { id title } }"));
    assert_eq!(data(admin.next().await.unwrap())["scheduleRequests"], json!([]));
    assert_eq!(
        data(pending.next().await.unwrap())["pendingScheduleRequests"],
        json!([])
    );

    let submitted = data(app.run(None, SUBMIT_REQUEST, schedule_request()).await);
    let id = submitted["submitScheduleRequest"]["id"].clone();
    assert_eq!(
        data(pending.next().await.unwrap())["pendingScheduleRequests"],
        json!([{ "id": id, "title": "Book swap" }])
    );
    assert_eq!(
        data(admin.next().await.unwrap())["scheduleRequests"],
        json!([{ "title": "Book swap", "status": "PENDING" }])
    );

    let approve = r#"mutation ($id: UUID!) { approveScheduleRequest(id: $id) { status } }"#;
    data(app.run(Some(&token), approve, json!({ "id": id })).await);
    assert_eq!(
        data(pending.next().await.unwrap())["pendingScheduleRequests"],
        json!([])
    );
    assert_eq!(
        data(admin.next().await.unwrap())["scheduleRequests"],
        json!([{ "title": "Book swap", "status": "APPROVED" }])
    );
}
