//! 角色与路由常量定义

/// 页面路径常量
pub struct RoutePath;

impl RoutePath {
    pub const ROOT: &'static str = "/";
    pub const LOGIN: &'static str = "/login";
    pub const OVERVIEW: &'static str = "/overview";
    pub const ANALYSIS: &'static str = "/analysis";
    pub const REVIEWS: &'static str = "/reviews";
    pub const COMPARE: &'static str = "/compare";
    pub const DECISION: &'static str = "/decision";
    pub const ALERTS: &'static str = "/alerts";
    pub const EVENTS: &'static str = "/events";
    pub const EVALUATE: &'static str = "/evaluate";

    /// 未匹配路径的默认落点
    pub const DEFAULT: &'static str = Self::OVERVIEW;
}

/// 系统角色定义
pub struct SystemRole;

impl SystemRole {
    pub const PM: &'static str = "PM";
    pub const MARKET: &'static str = "MARKET";
    pub const OPS: &'static str = "OPS";

    /// 角色默认首页，未知角色回落到默认路由
    pub fn home_route(role: &str) -> &'static str {
        if role.eq_ignore_ascii_case(Self::PM) {
            RoutePath::OVERVIEW
        } else if role.eq_ignore_ascii_case(Self::MARKET) {
            RoutePath::COMPARE
        } else if role.eq_ignore_ascii_case(Self::OPS) {
            RoutePath::ALERTS
        } else {
            RoutePath::DEFAULT
        }
    }
}
