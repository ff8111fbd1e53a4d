//! Permission Definitions
//!
//! 集中的 RBAC 策略表 —— 角色到权限的唯一来源，middleware 统一执行。
//!
//! ## 设计原则
//! - 会员操作 (查自己的借阅/预约/罚款、对自己下预约) 不走权限表，
//!   由 handler 校验资源归属
//! - 馆员按模块授权；settings 仅 admin
//! - `all` 为系统级权限，不出现在可配置列表中

/// 可配置权限列表
pub const ALL_PERMISSIONS: &[&str] = &[
    "circulation:desk",    // 借出/归还/续借 (流通台)
    "reservations:manage", // 预约到书/取书/代取消
    "members:manage",      // 会员档案管理
    "inventory:manage",    // 馆藏管理
    "fines:manage",        // 罚款缴纳/减免
    "reports:view",        // 报表查看
    "settings:manage",     // 借阅策略设置
    "audit:view",          // 审计台账查看
];

/// Admin 专属权限（不在可配置列表中；馆员账户管理走 require_admin）
pub const ADMIN_ONLY_PERMISSIONS: &[&str] = &["all"];

/// Default role permissions
pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &["all"];

/// 馆员默认权限（除策略设置和账户管理外的全部）
pub const DEFAULT_LIBRARIAN_PERMISSIONS: &[&str] = &[
    "circulation:desk",
    "reservations:manage",
    "members:manage",
    "inventory:manage",
    "fines:manage",
    "reports:view",
    "audit:view",
];

/// 会员无桌面权限；自助操作由 handler 按归属校验
pub const DEFAULT_MEMBER_PERMISSIONS: &[&str] = &[];

/// Get permissions for a role name
pub fn get_default_permissions(role_name: &str) -> Vec<String> {
    let perms: &[&str] = match role_name {
        "admin" => DEFAULT_ADMIN_PERMISSIONS,
        "librarian" => DEFAULT_LIBRARIAN_PERMISSIONS,
        "member" => DEFAULT_MEMBER_PERMISSIONS,
        _ => &[],
    };
    perms.iter().map(|s| s.to_string()).collect()
}

/// Validate if a permission string is valid
pub fn is_valid_permission(permission: &str) -> bool {
    ALL_PERMISSIONS.contains(&permission)
        || ADMIN_ONLY_PERMISSIONS.contains(&permission)
        || permission.ends_with(":*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn librarian_cannot_touch_settings() {
        let perms = get_default_permissions("librarian");
        assert!(perms.contains(&"circulation:desk".to_string()));
        assert!(!perms.contains(&"settings:manage".to_string()));
        assert!(!perms.contains(&"all".to_string()));
    }

    #[test]
    fn unknown_role_gets_nothing() {
        assert!(get_default_permissions("researcher").is_empty());
    }

    #[test]
    fn permission_validity() {
        assert!(is_valid_permission("fines:manage"));
        assert!(is_valid_permission("fines:*"));
        assert!(is_valid_permission("all"));
        assert!(!is_valid_permission("fines:launder"));
    }
}
