//! HTTP-based node client.
//!
//! This implementation of [`NodeQuery`] talks to the REST gateway that
//! Cosmos SDK nodes expose next to their gRPC endpoint (the "LCD", usually
//! on port 1317). The routes used are:
//!
//! ```text
//! GET /cosmos/gov/v1/proposals?pagination.limit=N&pagination.reverse=true
//! GET /cosmos/upgrade/v1beta1/current_plan
//! GET /cosmos/base/tendermint/v1beta1/blocks/latest
//! GET /cosmos/base/tendermint/v1beta1/blocks/{height}
//! ```
//!
//! The gateway encodes 64-bit integers as JSON strings, so the wire DTOs
//! below keep them as `String` and the conversion into domain types parses
//! them explicitly.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{NodeQuery, QueryError};
use crate::config::NodeClientConfig;
use crate::types::{BlockHeader, Proposal, ProposalStatus, UpgradePlan};

/// HTTP node client.
///
/// Cheap to share behind an `Arc`: the underlying `reqwest::Client` pools
/// connections and is safe to use from many tasks at once.
pub struct HttpNodeClient {
    base_url: String,
    client: Client,
}

impl HttpNodeClient {
    /// Constructs a client pointing at `base_url`, e.g.
    /// `"http://127.0.0.1:1317"`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn from_config(cfg: &NodeClientConfig) -> Result<Self, QueryError> {
        Self::new(cfg.base_url.clone(), cfg.timeout)
    }

    fn endpoint(&self, path: &str) -> String {
        // Avoid accidental double slashes.
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, QueryError> {
        let url = self.endpoint(path);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| QueryError::Transport(format!("HTTP GET {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QueryError::Service(format!(
                "GET {url} returned HTTP status {status}: {}",
                body.trim()
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| QueryError::Protocol(format!("failed to parse JSON from {url}: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct ProposalsResponse {
    #[serde(default)]
    proposals: Vec<ProposalDto>,
}

#[derive(Debug, Deserialize)]
struct ProposalDto {
    id: String,
    /// Only present from SDK v0.47 on; older proposals carry it in
    /// their messages instead.
    #[serde(default)]
    title: String,
    status: String,
    #[serde(default)]
    voting_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    voting_end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CurrentPlanResponse {
    #[serde(default)]
    plan: Option<PlanDto>,
}

#[derive(Debug, Deserialize)]
struct PlanDto {
    name: String,
    #[serde(default)]
    info: String,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    height: String,
}

#[derive(Debug, Deserialize)]
struct BlockResponse {
    #[serde(default)]
    block: Option<BlockDto>,
    /// Newer nodes return the decoded block under `sdk_block`.
    #[serde(default)]
    sdk_block: Option<BlockDto>,
}

#[derive(Debug, Deserialize)]
struct BlockDto {
    header: HeaderDto,
}

#[derive(Debug, Deserialize)]
struct HeaderDto {
    height: String,
    time: DateTime<Utc>,
}

fn parse_int<T: FromStr>(field: &str, raw: &str) -> Result<T, QueryError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| QueryError::Protocol(format!("invalid {field} {raw:?}: {e}")))
}

impl TryFrom<ProposalDto> for Proposal {
    type Error = QueryError;

    fn try_from(dto: ProposalDto) -> Result<Self, Self::Error> {
        Ok(Proposal {
            id: parse_int("proposal id", &dto.id)?,
            title: dto.title,
            status: ProposalStatus::from_wire(&dto.status),
            voting_start_time: dto.voting_start_time,
            voting_end_time: dto.voting_end_time,
        })
    }
}

impl TryFrom<PlanDto> for UpgradePlan {
    type Error = QueryError;

    fn try_from(dto: PlanDto) -> Result<Self, Self::Error> {
        Ok(UpgradePlan {
            name: dto.name,
            info: dto.info,
            time: dto.time,
            height: parse_int("plan height", &dto.height)?,
        })
    }
}

impl TryFrom<BlockResponse> for BlockHeader {
    type Error = QueryError;

    fn try_from(resp: BlockResponse) -> Result<Self, Self::Error> {
        let block = resp
            .sdk_block
            .or(resp.block)
            .ok_or_else(|| QueryError::Protocol("block response carries no block".to_string()))?;

        Ok(BlockHeader {
            height: parse_int("block height", &block.header.height)?,
            time: block.header.time,
        })
    }
}

#[async_trait]
impl NodeQuery for HttpNodeClient {
    async fn proposals(&self, limit: u64) -> Result<Vec<Proposal>, QueryError> {
        let resp: ProposalsResponse = self
            .get_json(
                "/cosmos/gov/v1/proposals",
                &[
                    ("pagination.limit", limit.to_string()),
                    ("pagination.reverse", "true".to_string()),
                ],
            )
            .await?;

        resp.proposals.into_iter().map(Proposal::try_from).collect()
    }

    async fn current_plan(&self) -> Result<Option<UpgradePlan>, QueryError> {
        let resp: CurrentPlanResponse = self
            .get_json("/cosmos/upgrade/v1beta1/current_plan", &[])
            .await?;

        resp.plan.map(UpgradePlan::try_from).transpose()
    }

    async fn latest_block(&self) -> Result<BlockHeader, QueryError> {
        let resp: BlockResponse = self
            .get_json("/cosmos/base/tendermint/v1beta1/blocks/latest", &[])
            .await?;
        BlockHeader::try_from(resp)
    }

    async fn block_at(&self, height: i64) -> Result<BlockHeader, QueryError> {
        let path = format!("/cosmos/base/tendermint/v1beta1/blocks/{height}");
        let resp: BlockResponse = self.get_json(&path, &[]).await?;
        BlockHeader::try_from(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> HttpNodeClient {
        HttpNodeClient::new(server.url(), Duration::from_secs(2)).expect("build client")
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = HttpNodeClient::new("http://node:1317/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("/cosmos/upgrade/v1beta1/current_plan"),
            "http://node:1317/cosmos/upgrade/v1beta1/current_plan"
        );
    }

    #[tokio::test]
    async fn proposals_are_requested_newest_first_and_mapped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/cosmos/gov/v1/proposals")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("pagination.limit".into(), "20".into()),
                Matcher::UrlEncoded("pagination.reverse".into(), "true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                  "proposals": [
                    {
                      "id": "42",
                      "title": "Enable IBC hooks",
                      "status": "PROPOSAL_STATUS_VOTING_PERIOD",
                      "voting_start_time": "2024-05-01T12:00:00Z",
                      "voting_end_time": "2024-05-03T12:00:00Z"
                    },
                    {
                      "id": "41",
                      "title": "Community spend",
                      "status": "PROPOSAL_STATUS_DEPOSIT_PERIOD",
                      "voting_start_time": null,
                      "voting_end_time": null
                    }
                  ],
                  "pagination": { "next_key": null, "total": "0" }
                }"#,
            )
            .create_async()
            .await;

        let proposals = client_for(&server).proposals(20).await.expect("proposals");
        mock.assert_async().await;

        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].id, 42);
        assert_eq!(proposals[0].title, "Enable IBC hooks");
        assert_eq!(proposals[0].status, ProposalStatus::VotingPeriod);
        assert_eq!(
            proposals[0].voting_start_time,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(proposals[1].status, ProposalStatus::DepositPeriod);
        assert_eq!(proposals[1].voting_end_time, None);
    }

    #[tokio::test]
    async fn empty_plan_decodes_as_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/cosmos/upgrade/v1beta1/current_plan")
            .with_status(200)
            .with_body(r#"{"plan": null}"#)
            .create_async()
            .await;

        let plan = client_for(&server).current_plan().await.expect("plan");
        assert!(plan.is_none());
    }

    #[tokio::test]
    async fn scheduled_plan_parses_string_height() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/cosmos/upgrade/v1beta1/current_plan")
            .with_status(200)
            .with_body(
                r#"{"plan": {
                    "name": "v15",
                    "time": "0001-01-01T00:00:00Z",
                    "height": "18500000",
                    "info": "{\"binaries\":{}}",
                    "upgraded_client_state": null
                }}"#,
            )
            .create_async()
            .await;

        let plan = client_for(&server)
            .current_plan()
            .await
            .expect("plan")
            .expect("scheduled");
        assert_eq!(plan.name, "v15");
        assert_eq!(plan.height, 18_500_000);
        assert_eq!(plan.info, r#"{"binaries":{}}"#);
    }

    #[tokio::test]
    async fn malformed_height_is_a_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/cosmos/upgrade/v1beta1/current_plan")
            .with_status(200)
            .with_body(r#"{"plan": {"name": "v15", "height": "soon"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).current_plan().await.unwrap_err();
        assert!(matches!(err, QueryError::Protocol(_)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn non_success_status_is_a_service_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/cosmos/gov/v1/proposals")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("node is syncing")
            .create_async()
            .await;

        let err = client_for(&server).proposals(20).await.unwrap_err();
        match err {
            QueryError::Service(msg) => {
                assert!(msg.contains("503"), "unexpected message: {msg}");
                assert!(msg.contains("node is syncing"), "unexpected message: {msg}");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn block_headers_prefer_sdk_block() {
        let mut server = mockito::Server::new_async().await;
        let _latest = server
            .mock("GET", "/cosmos/base/tendermint/v1beta1/blocks/latest")
            .with_status(200)
            .with_body(
                r#"{
                  "block": {"header": {"height": "1000", "time": "2024-05-01T12:00:00Z"}},
                  "sdk_block": {"header": {"height": "1000", "time": "2024-05-01T12:00:00Z"}}
                }"#,
            )
            .create_async()
            .await;
        let _older = server
            .mock("GET", "/cosmos/base/tendermint/v1beta1/blocks/900")
            .with_status(200)
            .with_body(r#"{"block": {"header": {"height": "900", "time": "2024-05-01T11:50:00Z"}}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let latest = client.latest_block().await.expect("latest");
        let older = client.block_at(900).await.expect("older");

        assert_eq!(latest.height, 1_000);
        assert_eq!(older.height, 900);
        assert_eq!(
            older.time,
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 50, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        // Port 9 (discard) is closed on test hosts; the connect fails fast.
        let client = HttpNodeClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.latest_block().await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)), "unexpected error: {err:?}");
    }
}
