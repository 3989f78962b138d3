use repu_error::{RepuError, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::guard::RouteTable;
use crate::models::{AuthEvent, NavigationDecision};
use crate::roles::RoutePath;
use crate::session::SessionStore;

/// 单次导航最多跟随的跳转次数
const MAX_REDIRECTS: usize = 4;

/// 应用外壳的导航状态：当前地址 + 路由表 + 会话
pub struct Navigator {
    table: RouteTable,
    session: Arc<SessionStore>,
    current: String,
}

impl Navigator {
    pub fn new(table: RouteTable, session: Arc<SessionStore>) -> Self {
        Self {
            table,
            session,
            current: RoutePath::ROOT.to_string(),
        }
    }

    /// 当前地址（可能带查询串）
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// 经路由守卫导航到 `path`，跟随跳转，返回最终地址
    pub fn navigate(&mut self, path: &str) -> Result<String> {
        let mut target = path.to_string();
        for _ in 0..=MAX_REDIRECTS {
            let session = self.session.current_session();
            match self.table.guard(&target, &session) {
                NavigationDecision::Allow => {
                    debug!(from = %self.current, to = %target, "navigation allowed");
                    self.current = target.clone();
                    return Ok(target);
                }
                NavigationDecision::Redirect(redirect) => {
                    let next = redirect.location();
                    debug!(from = %target, to = %next, "navigation redirected");
                    target = next;
                }
            }
        }
        Err(RepuError::Navigation {
            path: path.to_string(),
            reason: format!("more than {MAX_REDIRECTS} redirects"),
        })
    }

    /// 处理认证事件；已在登录页时不做跳转，返回新地址
    pub fn handle_auth_event(&mut self, event: &AuthEvent) -> Result<Option<String>> {
        match event {
            AuthEvent::SessionExpired { message } => {
                if self.table.is_login(&self.current) {
                    debug!(%message, "session expired while on login page");
                    return Ok(None);
                }
                info!(%message, from = %self.current, "session expired, back to login");
                let login = self.table.login_path().to_string();
                self.navigate(&login).map(Some)
            }
        }
    }

    /// 登录成功后离开登录页
    ///
    /// 显式传入的 `hint` 优先，其次是当前地址中的 `redirect` 参数；
    /// 都不可访问时前往角色首页。
    pub fn after_login(&mut self, hint: Option<&str>) -> Result<String> {
        let hint = match hint {
            Some(hint) => Some(hint.to_string()),
            None if self.table.is_login(&self.current) => redirect_hint(&self.current),
            None => None,
        };
        let session = self.session.current_session();
        let target = self.table.post_login_target(hint.as_deref(), &session);
        self.navigate(&target)
    }
}

/// 取出第一个 `redirect` 查询参数（已解码）
fn redirect_hint(location: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "redirect")
        .map(|(_, value)| value.into_owned())
}
