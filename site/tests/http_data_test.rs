//! Remote data service against a mock of the organization's API

#![allow(clippy::unwrap_used)]

use bashi_site::data::{seed_events, DataError, DataService, HttpDataService};
use bashi_site::types::{Money, TicketId, TicketStatus};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn events_are_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "e2",
            "title": "OBSS Annual Cricket Cup",
            "description": "Join us for the most exciting cricket tournament in the heart of Oklahoma City.",
            "date": "2024-06-20T08:00:00Z",
            "location": "Wheeler Park Sports Grounds",
            "price": 15,
            "capacity": 200,
            "sold": 45,
            "image": "https://picsum.photos/seed/cricket/800/400",
            "category": "SPORTS",
            "department": "OBSS"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let events = HttpDataService::new(format!("{}/", server.uri()))
        .get_events()
        .await
        .unwrap();

    assert_eq!(events, vec![seed_events()[1].clone()]);
    assert_eq!(events[0].price, Money::from_dollars(15));
}

#[tokio::test]
async fn missing_ticket_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets/TKT-NOPE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let ticket = HttpDataService::new(server.uri())
        .verify_ticket(&TicketId::new("TKT-NOPE"))
        .await
        .unwrap();
    assert!(ticket.is_none());
}

#[tokio::test]
async fn ticket_lookup_decodes_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tickets/TKT-4F9Q2K7ZX"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "TKT-4F9Q2K7ZX",
            "eventId": "e1",
            "userId": "user1",
            "purchaseDate": "2024-04-01T12:00:00Z",
            "status": "USED",
            "qrCode": "OKL-e1-user1-1711972800000"
        })))
        .mount(&server)
        .await;

    let ticket = HttpDataService::new(server.uri())
        .verify_ticket(&TicketId::new("TKT-4F9Q2K7ZX"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Used);
    assert_eq!(ticket.event_id.as_str(), "e1");
}

#[tokio::test]
async fn server_errors_and_bad_bodies_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let service = HttpDataService::new(server.uri());
    assert!(matches!(service.get_events().await, Err(DataError::Unavailable(_))));
    assert!(matches!(
        service.get_posts().await,
        Err(DataError::Decode { resource: "posts", .. })
    ));
}
