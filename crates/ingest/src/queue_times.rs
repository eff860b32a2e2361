use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use waitwatch_core::config::PollerConfig;
use waitwatch_core::{ParkListing, RideReading};

use crate::flatten::{flatten_readings, parks_in_group};
use crate::traits::{SourceError, TelemetrySource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`TelemetrySource`] backed by the queue-times.com JSON API.
pub struct QueueTimesClient {
    client: Client,
    base_url: String,
    group_name: String,
}

impl QueueTimesClient {
    pub fn new(base_url: &str, group_name: &str, user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            group_name: group_name.to_string(),
        })
    }

    pub fn from_config(config: &PollerConfig) -> Result<Self, SourceError> {
        Self::new(&config.base_url, &config.group_name, &config.user_agent)
    }

    fn parks_url(&self) -> String {
        format!("{}/parks.json", self.base_url)
    }

    fn readings_url(&self, park_id: &str) -> String {
        format!("{}/parks/{}/queue_times.json", self.base_url, park_id)
    }

    async fn get_json(&self, url: String) -> Result<Value, SourceError> {
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TelemetrySource for QueueTimesClient {
    async fn list_parks(&self) -> Result<Vec<ParkListing>, SourceError> {
        let payload = self.get_json(self.parks_url()).await?;
        let parks = parks_in_group(&payload, &self.group_name)?;
        if parks.is_empty() {
            warn!(group = %self.group_name, "no parks listed for group");
        }
        Ok(parks)
    }

    async fn list_readings(&self, park_id: &str) -> Result<Vec<RideReading>, SourceError> {
        let payload = self.get_json(self.readings_url(park_id)).await?;
        let readings = flatten_readings(&payload)?;
        debug!(park_id, readings = readings.len(), "fetched readings");
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GROUP: &str = "Walt Disney Attractions";
    const AGENT: &str = "DisneyWaits/1.0";

    /// Mount a JSON body at `route`, answered only for the expected user agent.
    async fn mount(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("user-agent", AGENT))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn urls_are_built_from_base() {
        let client = QueueTimesClient::new("https://queue-times.com/", GROUP, AGENT).unwrap();
        assert_eq!(client.parks_url(), "https://queue-times.com/parks.json");
        assert_eq!(
            client.readings_url("6"),
            "https://queue-times.com/parks/6/queue_times.json"
        );
    }

    #[tokio::test]
    async fn lists_parks_and_readings() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/parks.json",
            r#"[{"name":"Walt Disney Attractions","parks":[{"id":6,"name":"Magic Kingdom"}]}]"#,
        )
        .await;
        mount(
            &server,
            "/parks/6/queue_times.json",
            r#"{"lands":[{"id":1,"name":"Tomorrowland","rides":[{"id":284,"name":"Space Mountain","wait_time":45,"is_open":true}]},{"id":2,"name":"Closed Land"}],"rides":[]}"#,
        )
        .await;
        let client = QueueTimesClient::new(&server.uri(), GROUP, AGENT).unwrap();

        let parks = client.list_parks().await.unwrap();
        assert_eq!(parks, vec![ParkListing { id: "6".into(), name: "Magic Kingdom".into() }]);

        let readings = client.list_readings("6").await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].id.as_deref(), Some("284"));
        assert_eq!(readings[0].wait_time, Some(45));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        let client = QueueTimesClient::new(&server.uri(), GROUP, AGENT).unwrap();
        match client.list_readings("6").await {
            Err(SourceError::Status { status, url }) => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/parks/6/queue_times.json"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn configured_user_agent_is_sent() {
        let server = MockServer::start().await;
        mount(&server, "/parks.json", "[]").await;

        let wrong = QueueTimesClient::new(&server.uri(), GROUP, "SomethingElse/2.0").unwrap();
        assert!(matches!(
            wrong.list_parks().await,
            Err(SourceError::Status { status: 404, .. })
        ));
        let right = QueueTimesClient::new(&server.uri(), GROUP, AGENT).unwrap();
        assert!(right.list_parks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_an_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/parks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let client = QueueTimesClient::new(&server.uri(), GROUP, AGENT).unwrap();
        assert!(matches!(client.list_parks().await, Err(SourceError::Http(_))));
    }
}
