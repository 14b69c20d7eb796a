use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};
use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::models::organization::{is_admin, ROLE_ADMIN, ROLE_MEMBER, ROLE_OWNER};
use crate::proto::auth::AuthResponse;
use crate::proto::common::Empty;
use crate::proto::organization::member_service_server::MemberService;
use crate::proto::organization::{
    AcceptInvitationRequest, InviteUserRequest, InviteUserResponse, ListMembersResponse, Member,
    MemberResponse, RemoveMemberRequest, TransferOwnershipRequest, UpdateMemberRoleRequest,
};
use crate::services::auth_service::{hash_password, issue_session, verify_password};

/// Invitations are valid for a week.
const INVITATION_DAYS: i64 = 7;

pub struct MemberServiceImpl {
    pool: PgPool,
    jwt_secret: String,
}

impl MemberServiceImpl {
    pub fn new(pool: PgPool, jwt_secret: String) -> Self {
        Self { pool, jwt_secret }
    }

    fn get_authenticated_user<T>(request: &Request<T>) -> Result<AuthenticatedUser, Status> {
        request
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| Status::unauthenticated("Authentication required"))
    }

    async fn role_in(&self, user_id: &str, org_id: &str) -> Result<String, Status> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM organization_members WHERE user_id = $1::uuid AND organization_id = $2::uuid",
        )
        .bind(user_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        role.ok_or_else(|| Status::permission_denied("Not a member of this organization"))
    }

    async fn verify_admin(&self, user_id: &str, org_id: &str) -> Result<String, Status> {
        let role = self.role_in(user_id, org_id).await?;
        if !is_admin(&role) {
            return Err(Status::permission_denied("Admin role required"));
        }
        Ok(role)
    }

    async fn count_owners(&self, org_id: &str) -> Result<i64, Status> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM organization_members WHERE organization_id = $1::uuid AND role = 'owner'",
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        Ok(count)
    }

    async fn fetch_member(&self, user_id: &str, org_id: &str) -> Result<Member, Status> {
        let row: (String, String, String, String, chrono::DateTime<chrono::Utc>) = sqlx::query_as(
            "SELECT u.id::text, u.email, u.display_name, om.role, om.created_at
             FROM organization_members om
             JOIN users u ON u.id = om.user_id
             WHERE om.user_id = $1::uuid AND om.organization_id = $2::uuid",
        )
        .bind(user_id)
        .bind(org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        Ok(Member {
            user_id: row.0,
            email: row.1,
            display_name: row.2,
            role: row.3,
            joined_at: row.4.to_rfc3339(),
        })
    }
}

fn generate_invite_token() -> Result<String, Status> {
    let mut buf = [0u8; 24];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| Status::internal("Random generator failure"))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

#[derive(Debug)]
enum InviteeAction {
    UseExisting { user_id: String },
    CreateAccount { password_hash: String, display_name: String },
}

/// Maps an invitation acceptance onto an account. The invite token alone
/// never grants a login: an existing account must prove its password, and
/// only a freshly created account is signed in on the invite credentials
/// it just set.
fn resolve_invitee(
    existing: Option<(String, String)>,
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<InviteeAction, Status> {
    match existing {
        Some((user_id, password_hash)) => {
            if password.is_empty() {
                return Err(Status::unauthenticated(
                    "This email already has an account; its password is required",
                ));
            }
            verify_password(password, &password_hash)?;
            Ok(InviteeAction::UseExisting { user_id })
        }
        None => {
            if password.len() < 8 {
                return Err(Status::invalid_argument(
                    "Password must be at least 8 characters",
                ));
            }
            let password_hash = hash_password(password)?;
            let display_name = if display_name.is_empty() {
                email.to_string()
            } else {
                display_name.to_string()
            };
            Ok(InviteeAction::CreateAccount {
                password_hash,
                display_name,
            })
        }
    }
}

#[tonic::async_trait]
impl MemberService for MemberServiceImpl {
    async fn invite_user(
        &self,
        request: Request<InviteUserRequest>,
    ) -> Result<Response<InviteUserResponse>, Status> {
        let user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        self.verify_admin(&user.user_id, &user.org_id).await?;

        if req.email.is_empty() || !req.email.contains('@') {
            return Err(Status::invalid_argument("A valid email is required"));
        }

        let role = if req.role.is_empty() {
            ROLE_MEMBER
        } else {
            req.role.as_str()
        };
        if role != ROLE_ADMIN && role != ROLE_MEMBER {
            return Err(Status::invalid_argument(
                "role must be 'admin' or 'member'",
            ));
        }

        // Already a member?
        let existing: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM organization_members om
                JOIN users u ON u.id = om.user_id
                WHERE om.organization_id = $1::uuid AND LOWER(u.email) = LOWER($2)
                  AND u.deleted_at IS NULL)",
        )
        .bind(&user.org_id)
        .bind(&req.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        if existing {
            return Err(Status::already_exists(
                "This email is already a member of the organization",
            ));
        }

        let token = generate_invite_token()?;
        let expires_at = Utc::now() + chrono::Duration::days(INVITATION_DAYS);

        let (invitation_id,): (String,) = sqlx::query_as(
            "INSERT INTO invitations (organization_id, email, role, token, invited_by, expires_at)
             VALUES ($1::uuid, $2, $3, $4, $5::uuid, $6)
             RETURNING id::text",
        )
        .bind(&user.org_id)
        .bind(&req.email)
        .bind(role)
        .bind(&token)
        .bind(&user.user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Failed to create invitation: {}", e)))?;

        record_audit(
            &self.pool,
            &user.org_id,
            &user.user_id,
            "member.invite",
            "invitation",
            &invitation_id,
            serde_json::json!({ "email": req.email, "role": role }),
        )
        .await;

        Ok(Response::new(InviteUserResponse {
            invitation_id,
            token,
            expires_at: expires_at.to_rfc3339(),
        }))
    }

    async fn accept_invitation(
        &self,
        request: Request<AcceptInvitationRequest>,
    ) -> Result<Response<AuthResponse>, Status> {
        let user_agent = request
            .metadata()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let req = request.into_inner();

        if req.token.is_empty() {
            return Err(Status::invalid_argument("token is required"));
        }

        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT i.id::text, i.organization_id::text, i.email, i.role
             FROM invitations i
             JOIN organizations o ON o.id = i.organization_id
             WHERE i.token = $1 AND i.accepted_at IS NULL AND i.expires_at > NOW()
               AND o.deleted_at IS NULL",
        )
        .bind(&req.token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let (invitation_id, org_id, email, role) =
            row.ok_or_else(|| Status::not_found("Invitation not found or expired"))?;

        let existing: Option<(String, String)> = sqlx::query_as(
            "SELECT id::text, password_hash FROM users
             WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let action = resolve_invitee(existing, &email, &req.password, &req.display_name)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Status::internal(format!("Transaction error: {}", e)))?;

        let user_id = match action {
            InviteeAction::UseExisting { user_id } => user_id,
            InviteeAction::CreateAccount {
                password_hash,
                display_name,
            } => {
                let (id,): (String,) = sqlx::query_as(
                    "INSERT INTO users (email, display_name, password_hash) VALUES ($1, $2, $3) RETURNING id::text",
                )
                .bind(&email)
                .bind(&display_name)
                .bind(&password_hash)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| Status::internal(format!("Failed to create user: {}", e)))?;
                id
            }
        };

        sqlx::query(
            "INSERT INTO organization_members (user_id, organization_id, role, is_default)
             VALUES ($1::uuid, $2::uuid, $3, false)
             ON CONFLICT (user_id, organization_id) DO NOTHING",
        )
        .bind(&user_id)
        .bind(&org_id)
        .bind(&role)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Failed to create membership: {}", e)))?;

        sqlx::query("UPDATE invitations SET accepted_at = NOW() WHERE id = $1::uuid")
            .bind(&invitation_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Status::internal(format!("Failed to mark invitation accepted: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Status::internal(format!("Transaction commit error: {}", e)))?;

        tracing::info!("Invitation {} accepted by {}", invitation_id, email);
        record_audit(
            &self.pool,
            &org_id,
            &user_id,
            "member.join",
            "organization",
            &org_id,
            serde_json::json!({ "role": role }),
        )
        .await;

        let response = issue_session(
            &self.pool,
            &self.jwt_secret,
            &user_id,
            &org_id,
            &email,
            &user_agent,
        )
        .await?;
        Ok(Response::new(response))
    }

    async fn list_members(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<ListMembersResponse>, Status> {
        let user = Self::get_authenticated_user(&request)?;

        let rows: Vec<(String, String, String, String, chrono::DateTime<chrono::Utc>)> =
            sqlx::query_as(
                "SELECT u.id::text, u.email, u.display_name, om.role, om.created_at
                 FROM organization_members om
                 JOIN users u ON u.id = om.user_id
                 WHERE om.organization_id = $1::uuid AND u.deleted_at IS NULL
                 ORDER BY om.created_at",
            )
            .bind(&user.org_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let members = rows
            .into_iter()
            .map(|(user_id, email, display_name, role, joined_at)| Member {
                user_id,
                email,
                display_name,
                role,
                joined_at: joined_at.to_rfc3339(),
            })
            .collect();

        Ok(Response::new(ListMembersResponse { members }))
    }

    async fn update_member_role(
        &self,
        request: Request<UpdateMemberRoleRequest>,
    ) -> Result<Response<MemberResponse>, Status> {
        let user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.user_id.is_empty() {
            return Err(Status::invalid_argument("user_id is required"));
        }
        if req.role != ROLE_OWNER && req.role != ROLE_ADMIN && req.role != ROLE_MEMBER {
            return Err(Status::invalid_argument(
                "role must be 'owner', 'admin' or 'member'",
            ));
        }

        let caller_role = self.verify_admin(&user.user_id, &user.org_id).await?;
        let target_role = self.role_in(&req.user_id, &user.org_id).await.map_err(|_| {
            Status::not_found("Member not found")
        })?;

        // Only an owner may grant or revoke owner/admin standing
        let touches_privileged = req.role != ROLE_MEMBER || target_role != ROLE_MEMBER;
        if touches_privileged && caller_role != ROLE_OWNER {
            return Err(Status::permission_denied("Owner role required"));
        }

        if target_role == ROLE_OWNER && req.role != ROLE_OWNER {
            let owners = self.count_owners(&user.org_id).await?;
            if owners <= 1 {
                return Err(Status::failed_precondition(
                    "Cannot demote the last owner",
                ));
            }
        }

        sqlx::query(
            "UPDATE organization_members SET role = $1
             WHERE user_id = $2::uuid AND organization_id = $3::uuid",
        )
        .bind(&req.role)
        .bind(&req.user_id)
        .bind(&user.org_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        record_audit(
            &self.pool,
            &user.org_id,
            &user.user_id,
            "member.update_role",
            "user",
            &req.user_id,
            serde_json::json!({ "from": target_role, "to": req.role }),
        )
        .await;

        let member = self.fetch_member(&req.user_id, &user.org_id).await?;
        Ok(Response::new(MemberResponse {
            member: Some(member),
        }))
    }

    async fn remove_member(
        &self,
        request: Request<RemoveMemberRequest>,
    ) -> Result<Response<Empty>, Status> {
        let user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.user_id.is_empty() {
            return Err(Status::invalid_argument("user_id is required"));
        }

        let caller_role = self.verify_admin(&user.user_id, &user.org_id).await?;
        let target_role = self.role_in(&req.user_id, &user.org_id).await.map_err(|_| {
            Status::not_found("Member not found")
        })?;

        if target_role == ROLE_OWNER {
            if caller_role != ROLE_OWNER {
                return Err(Status::permission_denied("Owner role required"));
            }
            let owners = self.count_owners(&user.org_id).await?;
            if owners <= 1 {
                return Err(Status::failed_precondition(
                    "Cannot remove the last owner",
                ));
            }
        }

        sqlx::query(
            "DELETE FROM organization_members
             WHERE user_id = $1::uuid AND organization_id = $2::uuid",
        )
        .bind(&req.user_id)
        .bind(&user.org_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        record_audit(
            &self.pool,
            &user.org_id,
            &user.user_id,
            "member.remove",
            "user",
            &req.user_id,
            serde_json::json!({ "role": target_role }),
        )
        .await;

        Ok(Response::new(Empty {}))
    }

    async fn transfer_ownership(
        &self,
        request: Request<TransferOwnershipRequest>,
    ) -> Result<Response<Empty>, Status> {
        let user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.user_id.is_empty() {
            return Err(Status::invalid_argument("user_id is required"));
        }
        if req.user_id == user.user_id {
            return Err(Status::invalid_argument(
                "Cannot transfer ownership to yourself",
            ));
        }

        let caller_role = self.role_in(&user.user_id, &user.org_id).await?;
        if caller_role != ROLE_OWNER {
            return Err(Status::permission_denied("Owner role required"));
        }
        // Target must already be a member
        self.role_in(&req.user_id, &user.org_id).await.map_err(|_| {
            Status::not_found("Member not found")
        })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Status::internal(format!("Transaction error: {}", e)))?;

        sqlx::query(
            "UPDATE organization_members SET role = 'owner'
             WHERE user_id = $1::uuid AND organization_id = $2::uuid",
        )
        .bind(&req.user_id)
        .bind(&user.org_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        sqlx::query(
            "UPDATE organization_members SET role = 'admin'
             WHERE user_id = $1::uuid AND organization_id = $2::uuid",
        )
        .bind(&user.user_id)
        .bind(&user.org_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Status::internal(format!("Transaction commit error: {}", e)))?;

        record_audit(
            &self.pool,
            &user.org_id,
            &user.user_id,
            "member.transfer_ownership",
            "user",
            &req.user_id,
            serde_json::json!({}),
        )
        .await;

        Ok(Response::new(Empty {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing(user_id: &str, password: &str) -> Option<(String, String)> {
        Some((user_id.to_string(), hash_password(password).unwrap()))
    }

    #[test]
    fn test_existing_account_requires_its_password() {
        // Holding the invite token must not be enough to log in as the
        // invited account
        let err = resolve_invitee(existing("u1", "hunter2hunter2"), "a@b.com", "", "")
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);

        let err = resolve_invitee(existing("u1", "hunter2hunter2"), "a@b.com", "wrong", "")
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn test_existing_account_with_correct_password() {
        let action =
            resolve_invitee(existing("u1", "hunter2hunter2"), "a@b.com", "hunter2hunter2", "")
                .unwrap();
        match action {
            InviteeAction::UseExisting { user_id } => assert_eq!(user_id, "u1"),
            other => panic!("expected UseExisting, got {:?}", other),
        }
    }

    #[test]
    fn test_new_account_sets_password() {
        let action = resolve_invitee(None, "new@b.com", "longenough", "").unwrap();
        match action {
            InviteeAction::CreateAccount {
                password_hash,
                display_name,
            } => {
                assert!(verify_password("longenough", &password_hash).is_ok());
                // display name falls back to the invited email
                assert_eq!(display_name, "new@b.com");
            }
            other => panic!("expected CreateAccount, got {:?}", other),
        }
    }

    #[test]
    fn test_new_account_rejects_short_password() {
        let err = resolve_invitee(None, "new@b.com", "short", "").unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }
}
