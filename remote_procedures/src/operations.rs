use crate::gateway::{OperationError, OperationName, RemoteProcedureGateway};
use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const ASSIGN_ROLE: &str = "assignRole";
pub const VACATE_ROLE: &str = "vacateRole";
pub const SET_ROLE_ACTIVE: &str = "toggleRoleActivation";
pub const DASHBOARD_STATISTICS: &str = "getDashboardStats";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub user_id: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precinct_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub assignment_id: String,
    pub user_id: String,
    pub role: String,
    pub active: bool,
}

/// Filter for dashboard statistics. Area and precinct take normalized values.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precinct: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStatistics {
    pub total_voters: u64,
    pub contacted_voters: u64,
    pub doors_knocked: u64,
    pub messages_sent: u64,
    pub active_volunteers: u64,
}

/// Typed calls for the backend operations used around the selector.
pub struct CampaignOperations {
    gateway: Arc<dyn RemoteProcedureGateway>,
}

impl CampaignOperations {
    pub fn new(gateway: Arc<dyn RemoteProcedureGateway>) -> Self {
        Self { gateway }
    }

    pub async fn assign_role(
        &self,
        request: AssignRoleRequest,
    ) -> Result<RoleAssignment, OperationError> {
        self.call(ASSIGN_ROLE, request).await
    }

    pub async fn vacate_role(&self, assignment_id: &str) -> Result<(), OperationError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Request<'a> {
            assignment_id: &'a str,
        }
        let _: Value = self.call(VACATE_ROLE, Request { assignment_id }).await?;
        Ok(())
    }

    pub async fn set_role_active(
        &self,
        assignment_id: &str,
        active: bool,
    ) -> Result<RoleAssignment, OperationError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Request<'a> {
            assignment_id: &'a str,
            active: bool,
        }
        self.call(
            SET_ROLE_ACTIVE,
            Request {
                assignment_id,
                active,
            },
        )
        .await
    }

    pub async fn dashboard_statistics(
        &self,
        query: DashboardQuery,
    ) -> Result<DashboardStatistics, OperationError> {
        self.call(DASHBOARD_STATISTICS, query).await
    }

    async fn call<Request: Serialize, Response: DeserializeOwned>(
        &self,
        name: &'static str,
        request: Request,
    ) -> Result<Response, OperationError> {
        let operation = OperationName::try_from(name).map_err(|err| anyhow!(err))?;
        let payload = serde_json::to_value(request)
            .map_err(|err| anyhow!("Failed to serialize {name} request: {err}"))?;
        let result = self.gateway.invoke(&operation, payload).await?;
        serde_json::from_value(result.clone())
            .map_err(|err| anyhow!("Unexpected {name} result {result}: {err}").into())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AssignRoleRequest, CampaignOperations, DashboardQuery, DashboardStatistics,
        RoleAssignment, ASSIGN_ROLE, DASHBOARD_STATISTICS, VACATE_ROLE,
    };
    use crate::gateway::{MockRemoteProcedureGateway, OperationError};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_assign_role_sends_camel_case_payload() {
        let mut gateway = MockRemoteProcedureGateway::new();
        gateway
            .expect_invoke()
            .withf(|operation, payload| {
                operation.inner() == ASSIGN_ROLE
                    && payload == &json!({ "userId": "u-1", "role": "area_chair", "areaId": "PA15-A-15" })
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "assignmentId": "r-1",
                    "userId": "u-1",
                    "role": "area_chair",
                    "active": true
                }))
            });
        let operations = CampaignOperations::new(Arc::new(gateway));

        let assignment = operations
            .assign_role(AssignRoleRequest {
                user_id: "u-1".to_string(),
                role: "area_chair".to_string(),
                county_id: None,
                area_id: Some("PA15-A-15".to_string()),
                precinct_id: None,
            })
            .await
            .unwrap();

        assert_eq!(
            assignment,
            RoleAssignment {
                assignment_id: "r-1".to_string(),
                user_id: "u-1".to_string(),
                role: "area_chair".to_string(),
                active: true,
            }
        );
    }

    #[tokio::test]
    async fn test_vacate_role_ignores_the_result_body() {
        let mut gateway = MockRemoteProcedureGateway::new();
        gateway
            .expect_invoke()
            .withf(|operation, payload| {
                operation.inner() == VACATE_ROLE && payload == &json!({ "assignmentId": "r-1" })
            })
            .returning(|_, _| Ok(json!({ "success": true })));

        let result = CampaignOperations::new(Arc::new(gateway))
            .vacate_role("r-1")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_dashboard_statistics_fill_missing_counters_with_zero() {
        let mut gateway = MockRemoteProcedureGateway::new();
        gateway
            .expect_invoke()
            .withf(|operation, payload| {
                operation.inner() == DASHBOARD_STATISTICS
                    && payload == &json!({ "area": "15", "precinct": "240" })
            })
            .returning(|_, _| Ok(json!({ "totalVoters": 1200, "doorsKnocked": 87 })));

        let statistics = CampaignOperations::new(Arc::new(gateway))
            .dashboard_statistics(DashboardQuery {
                county: None,
                area: Some("15".to_string()),
                precinct: Some("240".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(
            statistics,
            DashboardStatistics {
                total_voters: 1200,
                doors_knocked: 87,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_backend_errors_pass_through_untouched() {
        let mut gateway = MockRemoteProcedureGateway::new();
        gateway
            .expect_invoke()
            .times(1)
            .returning(|_, _| Err(OperationError::Unauthorized("not a chair".to_string())));

        let error = CampaignOperations::new(Arc::new(gateway))
            .set_role_active("r-1", false)
            .await
            .unwrap_err();

        assert!(matches!(error, OperationError::Unauthorized(message) if message == "not a chair"));
    }

    #[tokio::test]
    async fn test_unexpected_result_shape_is_an_internal_error() {
        let mut gateway = MockRemoteProcedureGateway::new();
        gateway
            .expect_invoke()
            .returning(|_, _| Ok(json!("not an assignment")));

        let error = CampaignOperations::new(Arc::new(gateway))
            .set_role_active("r-1", true)
            .await
            .unwrap_err();

        assert!(matches!(error, OperationError::Internal(_)));
    }
}
