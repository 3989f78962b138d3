use repu_core::Session;

use crate::models::{NavigationDecision, Redirect, RouteDescriptor};
use crate::roles::{RoutePath, SystemRole};

/// 路由守卫判定 - 纯函数，不修改会话
///
/// 顺序：
/// 1. 公开路由：已登录则跳转角色首页，否则放行
/// 2. 受保护路由且未登录：跳转登录页并带上原始路径
/// 3. 角色不在要求列表中：跳转角色首页
/// 4. 其余放行
pub fn evaluate(
    route: &RouteDescriptor,
    session: &Session,
    intended: &str,
    login_path: &str,
) -> NavigationDecision {
    if route.is_public {
        if session.is_authenticated() {
            return NavigationDecision::Redirect(Redirect::to(SystemRole::home_route(
                session.role(),
            )));
        }
        return NavigationDecision::Allow;
    }

    if !session.is_authenticated() {
        return NavigationDecision::Redirect(Redirect::to_login(login_path, intended));
    }

    if !route.permits_role(session.role()) {
        return NavigationDecision::Redirect(Redirect::to(SystemRole::home_route(
            session.role(),
        )));
    }

    NavigationDecision::Allow
}

/// 路由表
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    default_path: String,
    login_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::dashboard()
    }
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>, default_path: &str, login_path: &str) -> Self {
        Self {
            routes,
            default_path: default_path.to_string(),
            login_path: login_path.to_string(),
        }
    }

    /// 看板应用的路由表
    pub fn dashboard() -> Self {
        Self::new(
            vec![
                RouteDescriptor::public(RoutePath::LOGIN),
                RouteDescriptor::protected(RoutePath::OVERVIEW),
                RouteDescriptor::protected(RoutePath::ANALYSIS),
                RouteDescriptor::protected(RoutePath::REVIEWS),
                RouteDescriptor::with_roles(
                    RoutePath::COMPARE,
                    &[SystemRole::PM, SystemRole::MARKET],
                ),
                RouteDescriptor::with_roles(RoutePath::DECISION, &[SystemRole::PM]),
                RouteDescriptor::with_roles(RoutePath::ALERTS, &[SystemRole::PM, SystemRole::OPS]),
                RouteDescriptor::with_roles(
                    RoutePath::EVENTS,
                    &[SystemRole::MARKET, SystemRole::OPS],
                ),
                RouteDescriptor::with_roles(
                    RoutePath::EVALUATE,
                    &[SystemRole::MARKET, SystemRole::OPS],
                ),
            ],
            RoutePath::DEFAULT,
            RoutePath::LOGIN,
        )
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// 查找路由；忽略查询串和结尾斜杠，未匹配时返回 None
    pub fn find(&self, path: &str) -> Option<&RouteDescriptor> {
        let key = route_key(path);
        self.routes.iter().find(|r| r.path == key)
    }

    pub fn is_login(&self, path: &str) -> bool {
        route_key(path) == self.login_path
    }

    /// 导航判定：未匹配路径（包括 `/`）先回落到默认路由
    pub fn guard(&self, path: &str, session: &Session) -> NavigationDecision {
        let Some(route) = self.find(path) else {
            let fallback = Redirect::to(&self.default_path);
            let Some(default) = self.find(&self.default_path) else {
                return NavigationDecision::Redirect(fallback);
            };
            return match evaluate(default, session, &self.default_path, &self.login_path) {
                NavigationDecision::Allow => NavigationDecision::Redirect(fallback),
                redirect => redirect,
            };
        };
        evaluate(route, session, path, &self.login_path)
    }

    /// 登录成功后的落点：跳转提示可访问时前往提示路径，否则前往角色首页
    pub fn post_login_target(&self, return_to: Option<&str>, session: &Session) -> String {
        if let Some(back) = return_to.map(str::trim).filter(|p| !p.is_empty()) {
            if self.find(back).is_some() && self.guard(back, session).is_allow() {
                return back.to_string();
            }
        }
        SystemRole::home_route(session.role()).to_string()
    }
}

/// 去掉查询串、片段和结尾斜杠
fn route_key(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        RoutePath::ROOT
    } else {
        trimmed
    }
}
