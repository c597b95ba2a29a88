pub mod admin_user_repo;
pub mod attendance_repo;
pub mod local_store_repo;
pub mod member_repo;
pub mod session_repo;
pub mod subscription_repo;

pub use admin_user_repo::AdminUserRepository;
pub use attendance_repo::{AttendanceRepository, RosterEntry};
pub use local_store_repo::LocalStoreRepository;
pub use member_repo::MemberRepository;
pub use session_repo::{SessionRepository, SessionScope};
pub use subscription_repo::SubscriptionRepository;
