use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::schedule::{
    ScheduleItemClasspassGroupEntity, ScheduleItemSubscriptionGroupEntity,
};

/// What a plan's groups allow on one schedule item. A plan can sit in
/// several groups; a flag is granted as soon as any one of them grants it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPermissions {
    pub enroll: bool,
    pub shop_book: bool,
    pub attend: bool,
}

impl ClassPermissions {
    fn grant(&mut self, enroll: bool, shop_book: bool, attend: bool) {
        self.enroll |= enroll;
        self.shop_book |= shop_book;
        self.attend |= attend;
    }
}

/// Folds subscription group rows into per-schedule-item permissions.
pub fn merge_subscription_permissions(
    rows: &[ScheduleItemSubscriptionGroupEntity],
) -> HashMap<Uuid, ClassPermissions> {
    let mut permissions: HashMap<Uuid, ClassPermissions> = HashMap::new();
    for row in rows {
        permissions
            .entry(row.schedule_item_id)
            .or_default()
            .grant(row.enroll, row.shop_book, row.attend);
    }
    permissions
}

/// Folds classpass group rows into per-schedule-item permissions. Class
/// passes never enroll.
pub fn merge_classpass_permissions(
    rows: &[ScheduleItemClasspassGroupEntity],
) -> HashMap<Uuid, ClassPermissions> {
    let mut permissions: HashMap<Uuid, ClassPermissions> = HashMap::new();
    for row in rows {
        permissions
            .entry(row.schedule_item_id)
            .or_default()
            .grant(false, row.shop_book, row.attend);
    }
    permissions
}
