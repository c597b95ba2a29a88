pub mod admin_user;
pub mod admin_workout;
pub mod attendance;
pub mod from_row;
pub mod member;
pub mod settings;
pub mod subscription;

pub use admin_user::{AdminAccount, AdminCredentials, AdminRole};
pub use admin_workout::{AdminWorkout, WorkoutForm};
pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use from_row::FromSqliteRow;
pub use member::{
    CreateMember, Member, MemberDetail, MemberProfile, MemberWithStatus, ProfileMetadata,
    UpdateProfile,
};
pub use settings::{GymSettings, SettingsForm};
pub use subscription::{
    CreateSubscription, Subscription, SubscriptionStatus, SubscriptionSummary,
    SubscriptionWithMember,
};
