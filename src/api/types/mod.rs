//! API request, response and error types

pub mod error;
pub mod json;
pub mod registry;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use registry::{
    CreateConfigGroupRequest, CreateConfigRequest, DeletedMembersResponse, MemberRequest,
    MembersResponse, MessageResponse,
};
