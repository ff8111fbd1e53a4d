//! Member Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Member, MemberStatus, MemberUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const MEMBER_TABLE: &str = "library_member";

#[derive(Clone)]
pub struct MemberRepository {
    base: BaseRepository,
}

impl MemberRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all members, newest first
    pub async fn find_all(&self, limit: usize, offset: usize) -> RepoResult<Vec<Member>> {
        let sql = format!(
            "SELECT * FROM library_member ORDER BY created_at DESC LIMIT {} START {}",
            limit, offset
        );
        let members: Vec<Member> = self.base.db().query(&sql).await?.take(0)?;
        Ok(members)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Member>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let member: Option<Member> = self.base.db().select(thing).await?;
        Ok(member)
    }

    /// Lookup by library card number (member_no)
    pub async fn find_by_member_no(&self, member_no: &str) -> RepoResult<Option<Member>> {
        let member_no = member_no.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM library_member WHERE member_no = $member_no LIMIT 1")
            .bind(("member_no", member_no))
            .await?;
        let members: Vec<Member> = result.take(0)?;
        Ok(members.into_iter().next())
    }

    /// Lookup by external auth subject
    pub async fn find_by_uid(&self, uid: &str) -> RepoResult<Option<Member>> {
        let uid = uid.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM library_member WHERE uid = $uid LIMIT 1")
            .bind(("uid", uid))
            .await?;
        let members: Vec<Member> = result.take(0)?;
        Ok(members.into_iter().next())
    }

    /// Resolve a desk search term: member_no first, then record id
    pub async fn resolve(&self, term: &str) -> RepoResult<Option<Member>> {
        if let Some(m) = self.find_by_member_no(term).await? {
            return Ok(Some(m));
        }
        if term.contains(':') {
            return self.find_by_id(term).await;
        }
        Ok(None)
    }

    /// Substring search over member_no, name and email
    pub async fn search(&self, query: &str) -> RepoResult<Vec<Member>> {
        let pattern = query.to_lowercase();
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM library_member WHERE \
                 string::lowercase(member_no) CONTAINS $q \
                 OR string::lowercase(full_name) CONTAINS $q \
                 OR string::lowercase(email) CONTAINS $q \
                 ORDER BY created_at DESC LIMIT 50",
            )
            .bind(("q", pattern))
            .await?;
        let members: Vec<Member> = result.take(0)?;
        Ok(members)
    }

    /// Create a member record (uniqueness of member_no / uid enforced by index)
    pub async fn create(&self, member: Member) -> RepoResult<Member> {
        let created: Option<Member> = self.base.db().create(MEMBER_TABLE).content(member).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create member".to_string()))
    }

    /// Update profile fields (counters are owned by circulation transactions)
    pub async fn update(&self, id: &str, data: MemberUpdate) -> RepoResult<Member> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;

        let mut set_parts: Vec<&str> = Vec::new();
        if data.email.is_some() {
            set_parts.push("email = $email");
        }
        if data.full_name.is_some() {
            set_parts.push("full_name = $full_name");
        }
        if data.phone.is_some() {
            set_parts.push("phone = $phone");
        }
        if data.address.is_some() {
            set_parts.push("address = $address");
        }
        if data.occupation.is_some() {
            set_parts.push("occupation = $occupation");
        }
        if data.organization.is_some() {
            set_parts.push("organization = $organization");
        }
        if data.status.is_some() {
            set_parts.push("status = $status");
        }
        if data.max_books_allowed.is_some() {
            set_parts.push("max_books_allowed = $max_books_allowed");
        }
        if data.membership_expiry.is_some() {
            set_parts.push("membership_expiry = $membership_expiry");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Member {} not found", id)));
        }
        set_parts.push("updated_at = $now");

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));

        let mut query = self
            .base
            .db()
            .query(&query_str)
            .bind(("thing", thing))
            .bind(("now", shared::util::now_millis()));

        if let Some(v) = data.email {
            query = query.bind(("email", v));
        }
        if let Some(v) = data.full_name {
            query = query.bind(("full_name", v));
        }
        if let Some(v) = data.phone {
            query = query.bind(("phone", v));
        }
        if let Some(v) = data.address {
            query = query.bind(("address", v));
        }
        if let Some(v) = data.occupation {
            query = query.bind(("occupation", v));
        }
        if let Some(v) = data.organization {
            query = query.bind(("organization", v));
        }
        if let Some(v) = data.status {
            query = query.bind(("status", v));
        }
        if let Some(v) = data.max_books_allowed {
            query = query.bind(("max_books_allowed", v));
        }
        if let Some(v) = data.membership_expiry {
            query = query.bind(("membership_expiry", v));
        }

        let mut result = query.await?;
        let members: Vec<Member> = result.take(0)?;
        members
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Member {} not found", id)))
    }

    /// Record the uploaded photo path
    pub async fn set_photo_path(&self, id: &str, photo_path: &str) -> RepoResult<Member> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET photo_path = $photo_path, updated_at = $now RETURN AFTER")
            .bind(("thing", thing))
            .bind(("photo_path", photo_path.to_string()))
            .bind(("now", shared::util::now_millis()))
            .await?;
        let members: Vec<Member> = result.take(0)?;
        members
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Member {} not found", id)))
    }

    /// Suspend / reactivate
    pub async fn set_status(&self, id: &str, status: MemberStatus) -> RepoResult<Member> {
        self.update(
            id,
            MemberUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }
}
