/// Roles treated as staff ("collaborator") accounts.
pub const COLLABORATOR_ROLES: [&str; 3] = ["SUPER_ADMIN", "ADMIN", "COLABORADOR"];

/// Case-insensitive substring match in either direction against [`COLLABORATOR_ROLES`].
/// `"ADMIN_REGIONAL"` and `"min"` both match; a blank role never does.
pub fn is_collaborator(role: &str) -> bool {
    let role = role.trim().to_uppercase();
    if role.is_empty() {
        return false;
    }
    COLLABORATOR_ROLES
        .iter()
        .any(|allowed| role.contains(allowed) || allowed.contains(role.as_str()))
}
