mod format;
mod policy;

pub use format::format_fire_time;
pub use policy::{
    NotificationConfiguration, NotificationMode, TimingPolicy, DEFAULT_STALE_FIRE_GRACE_MS,
};
