pub mod guard;
pub mod models;
pub mod navigator;
pub mod roles;
pub mod session;
pub mod storage;

// 重新导出核心类型
pub use guard::{evaluate, RouteTable};
pub use models::{AuthEvent, NavigationDecision, Redirect, RouteDescriptor};
pub use navigator::Navigator;
pub use roles::{RoutePath, SystemRole};
pub use session::{SessionStore, ROLE_KEY, TOKEN_KEY};
pub use storage::{MemoryStorage, SledStorage, Storage};

pub use repu_core::Session;

// 错误类型
pub use repu_error::{RepuError, Result};
