//! Member API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use chrono::Datelike;

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Member, MemberCreate, MemberStatus, MemberUpdate};
use crate::db::repository::{MemberRepository, RepoError, SettingsRepository};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, time};

#[derive(serde::Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(serde::Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// POST /api/members/register - 注册会员
///
/// 会员令牌只能为自己注册 (uid 以令牌为准)；馆员/管理员可代录。
pub async fn register(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(mut payload): Json<MemberCreate>,
) -> AppResult<Json<Member>> {
    if !user.is_staff() {
        payload.uid = user.id.clone();
    }

    validate_required_text(&payload.full_name, "full_name", MAX_NAME_LEN)?;
    validate_required_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_required_text(&payload.uid, "uid", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.nic, "nic", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&payload.occupation, "occupation", MAX_NAME_LEN)?;
    validate_optional_text(&payload.organization, "organization", MAX_NAME_LEN)?;

    let repo = MemberRepository::new(state.get_db());

    if repo.find_by_uid(&payload.uid).await?.is_some() {
        return Err(AppError::conflict("A membership already exists for this account"));
    }

    let settings = SettingsRepository::new(state.get_db()).get().await?;
    let now = shared::util::now_millis();
    let year = chrono::Utc::now()
        .with_timezone(&state.business_timezone())
        .year();

    // member_no 撞号时重试几次（唯一索引兜底）
    let mut created = None;
    for _ in 0..5 {
        let member = Member {
            id: None,
            member_no: shared::util::member_number(year),
            uid: payload.uid.clone(),
            email: payload.email.clone(),
            full_name: payload.full_name.clone(),
            nic: payload.nic.clone(),
            phone: payload.phone.clone(),
            address: payload.address.clone(),
            occupation: payload.occupation.clone(),
            organization: payload.organization.clone(),
            member_type: payload.member_type,
            status: MemberStatus::Active,
            membership_date: now,
            membership_expiry: now + settings.membership_validity_days.max(1) * time::DAY_MS,
            max_books_allowed: settings.default_max_books,
            current_books_borrowed: 0,
            total_books_borrowed_lifetime: 0,
            overdue_count: 0,
            fine_balance: 0.0,
            photo_path: None,
            created_at: Some(now),
            updated_at: Some(now),
        };

        match repo.create(member).await {
            Ok(m) => {
                created = Some(m);
                break;
            }
            Err(RepoError::Duplicate(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    let member =
        created.ok_or_else(|| AppError::internal("Failed to allocate a member number"))?;

    state
        .audit
        .log(
            AuditAction::MemberRegistered,
            "member",
            member.member_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({
                "full_name": member.full_name,
                "member_type": member.member_type,
            }),
        )
        .await;

    Ok(Json(member))
}

/// GET /api/members/me - 会员查看自己的档案
pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Member>> {
    let member = MemberRepository::new(state.get_db())
        .find_by_uid(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("No membership for this account"))?;
    Ok(Json(member))
}

/// GET /api/members - 会员列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Member>>> {
    let members = MemberRepository::new(state.get_db())
        .find_all(query.limit.min(200), query.offset)
        .await?;
    Ok(Json(members))
}

/// GET /api/members/search?q=xxx - 搜索会员
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Member>>> {
    let members = MemberRepository::new(state.get_db()).search(&query.q).await?;
    Ok(Json(members))
}

/// GET /api/members/:id - 按记录 ID 或会员编号查询
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Member>> {
    let member = MemberRepository::new(state.get_db())
        .resolve(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;
    Ok(Json(member))
}

/// PUT /api/members/:id - 更新会员档案
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<MemberUpdate>,
) -> AppResult<Json<Member>> {
    validate_optional_text(&payload.full_name, "full_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.address, "address", MAX_ADDRESS_LEN)?;

    let repo = MemberRepository::new(state.get_db());
    let existing = repo
        .resolve(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;
    let record_id = existing
        .id
        .as_ref()
        .map(|r| r.to_string())
        .ok_or_else(|| AppError::internal("member record without id"))?;

    let member = repo.update(&record_id, payload).await?;

    state
        .audit
        .log(
            AuditAction::MemberUpdated,
            "member",
            member.member_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({}),
        )
        .await;

    Ok(Json(member))
}

/// PUT /api/members/:id/suspend - 暂停会员资格
pub async fn suspend(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Member>> {
    set_status(state, user, id, MemberStatus::Suspended).await
}

/// PUT /api/members/:id/reactivate - 恢复会员资格
pub async fn reactivate(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Member>> {
    set_status(state, user, id, MemberStatus::Active).await
}

async fn set_status(
    state: ServerState,
    user: CurrentUser,
    id: String,
    status: MemberStatus,
) -> AppResult<Json<Member>> {
    let repo = MemberRepository::new(state.get_db());
    let existing = repo
        .resolve(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;
    let record_id = existing
        .id
        .as_ref()
        .map(|r| r.to_string())
        .ok_or_else(|| AppError::internal("member record without id"))?;

    let member = repo.set_status(&record_id, status).await?;

    state
        .audit
        .log(
            AuditAction::MemberUpdated,
            "member",
            member.member_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({ "status": status }),
        )
        .await;

    Ok(Json(member))
}
