/// Identity resolution is out of scope: the hosting runtime always knows
/// who the caller is and forwards a stable id plus display name in the
/// `authorization` header as `userId:username`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub user_id: String,
    pub username: String,
}

pub fn parse_identity_header(header: Option<String>) -> Option<UserContext> {
    let header = header?;
    let token = header.strip_prefix("Bearer ").unwrap_or(&header);
    let (user_id, username) = token.split_once(':')?;
    if user_id.is_empty() || username.is_empty() {
        return None;
    }
    Some(UserContext {
        user_id: user_id.to_string(),
        username: username.to_string(),
    })
}
