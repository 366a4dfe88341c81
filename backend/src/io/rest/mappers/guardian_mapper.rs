use crate::domain::commands::identity::{RegisterGuardianCommand, SignInCommand, SignInResult};
use crate::domain::models::guardian::Guardian as DomainGuardian;
use shared::{Guardian as SharedGuardian, RegisterGuardianRequest, SessionResponse, SignInRequest};

/// Mapper between guardian DTOs and domain types. The password hash never
/// leaves the domain.
pub struct GuardianMapper;

impl GuardianMapper {
    pub fn to_dto(domain: DomainGuardian) -> SharedGuardian {
        SharedGuardian {
            id: domain.id,
            email: domain.email,
            display_name: domain.display_name,
            created_at: domain.created_at.to_rfc3339(),
        }
    }

    pub fn to_register_command(request: RegisterGuardianRequest) -> RegisterGuardianCommand {
        RegisterGuardianCommand {
            email: request.email,
            password: request.password,
            display_name: request.display_name,
        }
    }

    pub fn to_sign_in_command(request: SignInRequest) -> SignInCommand {
        SignInCommand {
            email: request.email,
            password: request.password,
        }
    }

    pub fn to_session_response(result: SignInResult) -> SessionResponse {
        SessionResponse {
            token: result.session.token,
            expires_at: result.session.expires_at.to_rfc3339(),
            guardian: Self::to_dto(result.guardian),
        }
    }
}
