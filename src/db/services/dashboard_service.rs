use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::db::entities::dashboard;
use crate::db::services::source_service;
use crate::web::error::AppError;

// Wire messages. The owner-scoped CRUD routes and the public share routes
// historically used different phrasings; both are load-bearing.
const SELECTED_NOT_FOUND: &str = "The selected dashboard has not been found.";
const SPECIFIED_NOT_FOUND: &str = "The specified dashboard has not been found.";
const NAME_TAKEN: &str = "A dashboard with that name already exists.";

/// Row shape for the owner's dashboard listing.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub id: i32,
    pub name: String,
    pub views: i32,
}

/// Full contents returned to the owner through the authenticated fetch.
#[derive(Debug, Serialize)]
pub struct DashboardContents {
    pub id: i32,
    pub name: String,
    pub layout: JsonValue,
    pub items: JsonValue,
    #[serde(rename = "nextId")]
    pub next_id: i32,
}

/// Contents exposed on the public share path: no id, no widget-id allocator.
#[derive(Debug, Serialize)]
pub struct SharedContents {
    pub name: String,
    pub layout: JsonValue,
    pub items: JsonValue,
}

/// Outcome of the public share resolution. The branch order in
/// [`check_password_needed`] is load-bearing: the owner check takes
/// precedence over the sharing state, and the sharing state over the
/// password state.
#[derive(Debug)]
pub enum ShareView {
    Owner { shared: bool, has_password: bool, dashboard: SharedContents },
    NotShared,
    Open { owner_id: i32, dashboard: SharedContents },
    PasswordRequired,
}

/// Outcome of the public password check.
#[derive(Debug)]
pub enum PasswordCheck {
    Correct { owner_id: i32, dashboard: SharedContents },
    Incorrect,
}

fn shared_contents(model: &dashboard::Model) -> SharedContents {
    SharedContents {
        name: model.name.clone(),
        layout: model.layout.clone(),
        items: model.items.clone(),
    }
}

async fn find_owned(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
) -> Result<Option<dashboard::Model>, AppError> {
    Ok(dashboard::Entity::find()
        .filter(dashboard::Column::Id.eq(id))
        .filter(dashboard::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?)
}

async fn find_by_name(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
) -> Result<Option<dashboard::Model>, AppError> {
    Ok(dashboard::Entity::find()
        .filter(dashboard::Column::OwnerId.eq(owner_id))
        .filter(dashboard::Column::Name.eq(name))
        .one(db)
        .await?)
}

async fn bump_views(db: &DatabaseConnection, model: dashboard::Model) -> Result<(), AppError> {
    let views = model.views + 1;
    let mut active: dashboard::ActiveModel = model.into();
    active.views = Set(views);
    active.update(db).await?;
    Ok(())
}

/// All dashboards belonging to `owner_id`, in store order.
pub async fn list_dashboards(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<Vec<DashboardSummary>, AppError> {
    let found = dashboard::Entity::find()
        .filter(dashboard::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?;
    Ok(found
        .into_iter()
        .map(|d| DashboardSummary { id: d.id, name: d.name, views: d.views })
        .collect())
}

/// Create an empty dashboard unless the owner already has one by that name.
pub async fn create_dashboard(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
) -> Result<i32, AppError> {
    if find_by_name(db, owner_id, name).await?.is_some() {
        return Err(AppError::Conflict(NAME_TAKEN.to_string()));
    }
    let now = Utc::now();
    let created = dashboard::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name.to_string()),
        layout: Set(json!([])),
        items: Set(json!({})),
        next_id: Set(1),
        shared: Set(false),
        password: Set(None),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(created.id)
}

pub async fn delete_dashboard(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
) -> Result<(), AppError> {
    let result = dashboard::Entity::delete_many()
        .filter(dashboard::Column::Id.eq(id))
        .filter(dashboard::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(SELECTED_NOT_FOUND.to_string()));
    }
    Ok(())
}

/// Fetch one dashboard plus the names of every source the requester owns.
/// The source list is requester-scoped, not dashboard-scoped.
pub async fn get_dashboard(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
) -> Result<(DashboardContents, Vec<String>), AppError> {
    let found = find_owned(db, owner_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(SELECTED_NOT_FOUND.to_string()))?;
    let sources = source_service::source_names(db, owner_id).await?;
    let contents = DashboardContents {
        id: found.id,
        name: found.name,
        layout: found.layout,
        items: found.items,
        next_id: found.next_id,
    };
    Ok((contents, sources))
}

/// Full replace of layout/items/nextId. Last writer wins; there is no
/// optimistic-concurrency check and `next_id` is written as provided.
pub async fn save_dashboard(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
    layout: JsonValue,
    items: JsonValue,
    next_id: i32,
) -> Result<(), AppError> {
    let found = find_owned(db, owner_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(SELECTED_NOT_FOUND.to_string()))?;
    let mut active: dashboard::ActiveModel = found.into();
    active.layout = Set(layout);
    active.items = Set(items);
    active.next_id = Set(next_id);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

/// Copy layout/items/nextId from one of the owner's dashboards into a new
/// one under `new_name`. Sharing state and views start from scratch.
pub async fn clone_dashboard(
    db: &DatabaseConnection,
    owner_id: i32,
    source_dashboard_id: i32,
    new_name: &str,
) -> Result<(), AppError> {
    if find_by_name(db, owner_id, new_name).await?.is_some() {
        return Err(AppError::Conflict(NAME_TAKEN.to_string()));
    }
    let original = find_owned(db, owner_id, source_dashboard_id)
        .await?
        .ok_or_else(|| AppError::NotFound(SELECTED_NOT_FOUND.to_string()))?;
    let now = Utc::now();
    dashboard::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(new_name.to_string()),
        layout: Set(original.layout),
        items: Set(original.items),
        next_id: Set(original.next_id),
        shared: Set(false),
        password: Set(None),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Public share resolution. `requester_id` is the identity the client
/// claims to hold; it only ever grants the owner view when it matches the
/// stored owner.
pub async fn check_password_needed(
    db: &DatabaseConnection,
    requester_id: Option<i32>,
    dashboard_id: i32,
) -> Result<ShareView, AppError> {
    let found = dashboard::Entity::find_by_id(dashboard_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(SPECIFIED_NOT_FOUND.to_string()))?;

    let contents = shared_contents(&found);

    if requester_id == Some(found.owner_id) {
        let shared = found.shared;
        let has_password = found.password.is_some();
        bump_views(db, found).await?;
        return Ok(ShareView::Owner { shared, has_password, dashboard: contents });
    }
    if !found.shared {
        return Ok(ShareView::NotShared);
    }
    if found.password.is_none() {
        let owner_id = found.owner_id;
        bump_views(db, found).await?;
        return Ok(ShareView::Open { owner_id, dashboard: contents });
    }
    Ok(ShareView::PasswordRequired)
}

/// Public password check against the verbatim stored share password.
/// A mismatch is a successful response, not an error, and leaves the view
/// counter untouched.
pub async fn check_password(
    db: &DatabaseConnection,
    dashboard_id: i32,
    password: &str,
) -> Result<PasswordCheck, AppError> {
    let found = dashboard::Entity::find_by_id(dashboard_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(SPECIFIED_NOT_FOUND.to_string()))?;

    if found.password.as_deref() != Some(password) {
        return Ok(PasswordCheck::Incorrect);
    }

    let contents = shared_contents(&found);
    let owner_id = found.owner_id;
    bump_views(db, found).await?;
    Ok(PasswordCheck::Correct { owner_id, dashboard: contents })
}

/// Flip the shared flag and return the new value.
pub async fn toggle_share(
    db: &DatabaseConnection,
    owner_id: i32,
    dashboard_id: i32,
) -> Result<bool, AppError> {
    let found = find_owned(db, owner_id, dashboard_id)
        .await?
        .ok_or_else(|| AppError::NotFound(SPECIFIED_NOT_FOUND.to_string()))?;
    let shared = !found.shared;
    let mut active: dashboard::ActiveModel = found.into();
    active.shared = Set(shared);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(shared)
}

/// Set (or clear) the share password. Stored verbatim.
pub async fn change_share_password(
    db: &DatabaseConnection,
    owner_id: i32,
    dashboard_id: i32,
    password: Option<String>,
) -> Result<(), AppError> {
    let found = find_owned(db, owner_id, dashboard_id)
        .await?
        .ok_or_else(|| AppError::NotFound(SPECIFIED_NOT_FOUND.to_string()))?;
    let mut active: dashboard::ActiveModel = found.into();
    active.password = Set(password);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}
