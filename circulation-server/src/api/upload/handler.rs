//! Upload API Handlers
//!
//! 会员照片存放在 work_dir/uploads/member_photos/ 下，
//! 记录里只保存相对路径。

use axum::{
    Json,
    extract::{Extension, Multipart, Path, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Member;
use crate::db::repository::MemberRepository;
use crate::utils::{AppError, AppResult};

/// 照片大小上限 (5 MB)
const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// POST /api/upload/member-photo/:id - 上传会员照片
///
/// 本人或持 members:manage 权限的馆员可上传。
pub async fn member_photo(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<Member>> {
    let repo = MemberRepository::new(state.get_db());
    let member = repo
        .resolve(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;

    if !user.has_permission("members:manage") && member.uid != user.id {
        return Err(AppError::forbidden("Photo belongs to another member"));
    }

    let Some(field) = multipart.next_field().await? else {
        return Err(AppError::validation("Missing photo field"));
    };

    let extension = field
        .content_type()
        .and_then(|ct| mime_guess::get_mime_extensions_str(ct))
        .and_then(|exts| exts.first())
        .copied()
        .or_else(|| {
            field
                .file_name()
                .and_then(|name| name.rsplit('.').next())
        })
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "jpg".to_string());

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::validation(format!(
            "Unsupported photo type: {extension}"
        )));
    }

    let data = field.bytes().await?;
    if data.is_empty() {
        return Err(AppError::validation("Photo is empty"));
    }
    if data.len() > MAX_PHOTO_BYTES {
        return Err(AppError::validation("Photo exceeds the 5 MB limit"));
    }

    let photo_dir = state.config.uploads_dir().join("member_photos");
    std::fs::create_dir_all(&photo_dir)
        .map_err(|e| AppError::internal(format!("Failed to create photo directory: {e}")))?;

    let relative_path = format!("member_photos/{}.{}", member.member_no, extension);
    let target = state.config.uploads_dir().join(&relative_path);
    tokio::fs::write(&target, &data)
        .await
        .map_err(|e| AppError::internal(format!("Failed to store photo: {e}")))?;

    let record_id = member
        .id
        .as_ref()
        .map(|r| r.to_string())
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let member = repo.set_photo_path(&record_id, &relative_path).await?;

    state
        .audit
        .log(
            AuditAction::MemberPhotoUploaded,
            "member",
            member.member_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({ "path": relative_path, "bytes": data.len() }),
        )
        .await;

    Ok(Json(member))
}
