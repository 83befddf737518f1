//! Proxy directory client.
//!
//! Lists the proxies other peers advertise and registers or withdraws this
//! node's own offering. The latest listing is cached so readers never wait on
//! the network; [`DirectoryPoller`] keeps it fresh.

mod client;
mod error;
mod poller;
mod types;

pub use client::DirectoryClient;
pub use error::DirectoryError;
pub use poller::DirectoryPoller;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> DirectoryClient {
        DirectoryClient::new(mock_server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn offering_json(name: &str, ip: &str) -> serde_json::Value {
        serde_json::json!({
            "peerID": format!("peer-{}", name),
            "name": name,
            "ipAddress": ip,
            "port": 50000,
            "location": "New York, USA",
            "initialFee": "5",
            "price": "2.5"
        })
    }

    async fn mount_list(mock_server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/fetchProxyList"))
            .respond_with(template)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_offerings() {
        let mock_server = MockServer::start().await;
        let body = serde_json::json!([offering_json("A", "192.0.2.146"), offering_json("B", "1.2.3.4")]);
        mount_list(&mock_server, ResponseTemplate::new(200).set_body_json(&body)).await;

        let client = create_test_client(&mock_server);
        let offerings = client.fetch_offerings().await.unwrap();

        assert_eq!(offerings.len(), 2);
        assert_eq!(offerings[0].name, "A");
        assert_eq!(offerings[0].peer_id.as_deref(), Some("peer-A"));
        assert_eq!(offerings[0].endpoint(), "192.0.2.146:50000");
        assert_eq!(offerings[0].initial_fee, 5.0);
        assert_eq!(offerings[0].rate, 2.5);
        // Fetching alone does not touch the cache.
        assert!(client.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_offerings_null_is_empty() {
        let mock_server = MockServer::start().await;
        mount_list(&mock_server, ResponseTemplate::new(200).set_body_string("null")).await;

        let client = create_test_client(&mock_server);
        let offerings = client.fetch_offerings().await.unwrap();
        assert!(offerings.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_offerings_non_success() {
        let mock_server = MockServer::start().await;
        mount_list(&mock_server, ResponseTemplate::new(500).set_body_string("boom")).await;

        let client = create_test_client(&mock_server);
        let result = client.fetch_offerings().await;
        assert!(matches!(result, Err(DirectoryError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_fetch_offerings_rejects_negative_fee() {
        let mock_server = MockServer::start().await;
        let body = serde_json::json!([{
            "name": "A",
            "ipAddress": "1.2.3.4",
            "port": 1,
            "initialFee": -1,
            "price": 1
        }]);
        mount_list(&mock_server, ResponseTemplate::new(200).set_body_json(&body)).await;

        let client = create_test_client(&mock_server);
        let result = client.fetch_offerings().await;
        assert!(matches!(result, Err(DirectoryError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_list_offerings_keeps_snapshot_on_failure() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server);

        let a = offering_json("A", "192.0.2.146");
        let b = offering_json("B", "1.2.3.4");

        mount_list(
            &mock_server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!([a.clone(), b])),
        )
        .await;
        let listing = client.list_offerings().await;
        assert!(!listing.is_stale());
        assert_eq!(listing.snapshot.len(), 2);

        mock_server.reset().await;
        mount_list(&mock_server, ResponseTemplate::new(503)).await;
        let listing = client.list_offerings().await;
        assert!(listing.is_stale());
        assert_eq!(listing.snapshot.len(), 2);
        assert_eq!(client.snapshot().len(), 2);

        mock_server.reset().await;
        mount_list(
            &mock_server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!([a])),
        )
        .await;
        let listing = client.list_offerings().await;
        assert!(!listing.is_stale());
        let names: Vec<_> = client.snapshot().offerings.iter().map(|o| o.name.clone()).collect();
        assert_eq!(names, vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn test_list_offerings_transport_failure() {
        // Nothing listens on the discard port.
        let client = DirectoryClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let listing = client.list_offerings().await;

        assert!(listing.is_stale());
        assert!(listing.snapshot.is_empty());
        assert!(listing.snapshot.refreshed_at.is_none());
    }

    #[tokio::test]
    async fn test_register_sends_offering() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/registerProxy"))
            .and(body_json(serde_json::json!({
                "action": "register",
                "name": "P1",
                "initialFee": "5",
                "price": "2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Registered as a proxy"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.register(&SelfOffering::new("P1", 5.0, 2.0)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_register_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/registerProxy"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid request body"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.register(&SelfOffering::new("P1", 5.0, 2.0)).await;
        assert!(matches!(result, Err(DirectoryError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_deregister() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/registerProxy"))
            .and(body_json(serde_json::json!({ "action": "deregister" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.deregister().await.is_ok());
    }

    #[tokio::test]
    async fn test_is_registered() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/isProxy"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "isProxy": true })),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.is_registered().await.unwrap());
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_poller_keeps_last_good_snapshot() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server);
        let mut updates = client.subscribe();

        mount_list(
            &mock_server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!([
                offering_json("A", "192.0.2.146"),
                offering_json("B", "1.2.3.4")
            ])),
        )
        .await;

        let poller = DirectoryPoller::start(client.clone(), Duration::from_millis(20));
        assert!(poller.is_running());

        tokio::time::timeout(Duration::from_secs(5), updates.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(client.snapshot().len(), 2);

        mock_server.reset().await;
        mount_list(&mock_server, ResponseTemplate::new(500)).await;

        // Several failing ticks.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.snapshot().len(), 2);
        assert!(poller.is_running());

        mock_server.reset().await;
        mount_list(
            &mock_server,
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([offering_json("A", "192.0.2.146")])),
        )
        .await;

        let _ = updates.borrow_and_update();
        tokio::time::timeout(Duration::from_secs(5), updates.changed())
            .await
            .unwrap()
            .unwrap();
        let snapshot = client.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.offerings[0].name, "A");

        poller.stop().await;
    }

    #[tokio::test]
    async fn test_poller_stop_ends_refresh() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server);
        mount_list(&mock_server, ResponseTemplate::new(200).set_body_string("[]")).await;

        let poller = DirectoryPoller::start(client, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        poller.stop().await;

        let seen = mock_server.received_requests().await.unwrap().len();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(mock_server.received_requests().await.unwrap().len(), seen);
    }

    #[test]
    fn test_self_offering_validation() {
        assert!(SelfOffering::new("P1", 0.0, 2.0).validate().is_ok());
        assert!(SelfOffering::new("  ", 1.0, 2.0).validate().is_err());
        assert!(SelfOffering::new("P1", -1.0, 2.0).validate().is_err());
        assert!(SelfOffering::new("P1", 1.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_offering_accepts_numeric_and_aliased_fields() {
        let json = r#"{"name":"C","ip":"01.102.103.104","location":"Taipei","initialFee":"","rate":20}"#;
        let offering: ProxyOffering = serde_json::from_str(json).unwrap();

        assert_eq!(offering.address, "01.102.103.104");
        assert_eq!(offering.port, 0);
        assert_eq!(offering.initial_fee, 0.0);
        assert_eq!(offering.rate, 20.0);
        assert!(offering.peer_id.is_none());
    }
}
