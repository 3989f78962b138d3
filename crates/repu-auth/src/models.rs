use serde::{Deserialize, Serialize};

/// 路由描述 - 启动时定义，之后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
    pub is_public: bool,
    /// 为空表示任意已登录角色均可访问
    pub required_roles: Vec<String>,
}

impl RouteDescriptor {
    pub fn public(path: &str) -> Self {
        Self {
            path: path.to_string(),
            is_public: true,
            required_roles: Vec::new(),
        }
    }

    pub fn protected(path: &str) -> Self {
        Self {
            path: path.to_string(),
            is_public: false,
            required_roles: Vec::new(),
        }
    }

    pub fn with_roles(path: &str, roles: &[&str]) -> Self {
        Self {
            path: path.to_string(),
            is_public: false,
            required_roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// 角色是否满足本路由的要求（不区分大小写）
    pub fn permits_role(&self, role: &str) -> bool {
        self.required_roles.is_empty()
            || self
                .required_roles
                .iter()
                .any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// 路由守卫的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(Redirect),
}

impl NavigationDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, NavigationDecision::Allow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    /// 登录后返回的原始路径
    pub return_to: Option<String>,
}

impl Redirect {
    pub fn to(path: &str) -> Self {
        Self {
            path: path.to_string(),
            return_to: None,
        }
    }

    pub fn to_login(login_path: &str, return_to: &str) -> Self {
        Self {
            path: login_path.to_string(),
            return_to: Some(return_to.to_string()),
        }
    }

    /// 完整跳转地址，例如 `/login?redirect=%2Freviews`
    pub fn location(&self) -> String {
        match &self.return_to {
            Some(back) => format!("{}?redirect={}", self.path, urlencoding::encode(back)),
            None => self.path.clone(),
        }
    }
}

/// 客户端发出的认证事件，由应用外壳订阅
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// 服务端返回 401，本地会话已清除
    SessionExpired { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permits_role_case_insensitive() {
        let route = RouteDescriptor::with_roles("/compare", &["PM", "MARKET"]);
        assert!(route.permits_role("market"));
        assert!(route.permits_role("PM"));
        assert!(!route.permits_role("OPS"));

        assert!(RouteDescriptor::protected("/overview").permits_role("anything"));
    }

    #[test]
    fn test_redirect_location() {
        assert_eq!(Redirect::to("/overview").location(), "/overview");
        assert_eq!(
            Redirect::to_login("/login", "/reviews?keyword=a b").location(),
            "/login?redirect=%2Freviews%3Fkeyword%3Da%20b"
        );
    }
}
