pub mod config;
pub mod gateway;
pub mod operations;

pub use gateway::{HttpGateway, OperationError, OperationName, RemoteProcedureGateway};
pub use operations::{
    AssignRoleRequest, CampaignOperations, DashboardQuery, DashboardStatistics, RoleAssignment,
};
