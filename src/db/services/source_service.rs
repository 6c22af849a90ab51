use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::db::entities::source;
use crate::web::error::AppError;

const SELECTED_NOT_FOUND: &str = "The selected source has not been found.";
const NAME_TAKEN: &str = "A source with that name already exists.";

/// Connection attributes for a message-queue endpoint, as accepted from
/// the client.
#[derive(Debug)]
pub struct SourceAttrs {
    pub name: String,
    pub source_type: String,
    pub login: String,
    pub passcode: String,
    pub url: String,
    pub vhost: String,
}

async fn find_by_name(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
) -> Result<Option<source::Model>, AppError> {
    Ok(source::Entity::find()
        .filter(source::Column::OwnerId.eq(owner_id))
        .filter(source::Column::Name.eq(name))
        .one(db)
        .await?)
}

/// All sources belonging to `owner_id`.
pub async fn list_sources(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<Vec<source::Model>, AppError> {
    Ok(source::Entity::find()
        .filter(source::Column::OwnerId.eq(owner_id))
        .all(db)
        .await?)
}

/// Just the names, for the dashboard fetch payload.
pub async fn source_names(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<Vec<String>, AppError> {
    Ok(list_sources(db, owner_id).await?.into_iter().map(|s| s.name).collect())
}

pub async fn create_source(
    db: &DatabaseConnection,
    owner_id: i32,
    attrs: SourceAttrs,
) -> Result<i32, AppError> {
    if find_by_name(db, owner_id, &attrs.name).await?.is_some() {
        return Err(AppError::Conflict(NAME_TAKEN.to_string()));
    }
    let now = Utc::now();
    let created = source::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(attrs.name),
        source_type: Set(attrs.source_type),
        login: Set(attrs.login),
        passcode: Set(attrs.passcode),
        url: Set(attrs.url),
        vhost: Set(attrs.vhost),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(created.id)
}

/// One source by name, for widget data fetching.
pub async fn get_source(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
) -> Result<source::Model, AppError> {
    find_by_name(db, owner_id, name)
        .await?
        .ok_or_else(|| AppError::NotFound(SELECTED_NOT_FOUND.to_string()))
}

/// Full attribute replace. Renaming onto another source's name is a
/// conflict.
pub async fn change_source(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
    attrs: SourceAttrs,
) -> Result<(), AppError> {
    if let Some(existing) = find_by_name(db, owner_id, &attrs.name).await? {
        if existing.id != id {
            return Err(AppError::Conflict(NAME_TAKEN.to_string()));
        }
    }
    let found = source::Entity::find()
        .filter(source::Column::Id.eq(id))
        .filter(source::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(SELECTED_NOT_FOUND.to_string()))?;
    let mut active: source::ActiveModel = found.into();
    active.name = Set(attrs.name);
    active.source_type = Set(attrs.source_type);
    active.login = Set(attrs.login);
    active.passcode = Set(attrs.passcode);
    active.url = Set(attrs.url);
    active.vhost = Set(attrs.vhost);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

pub async fn delete_source(
    db: &DatabaseConnection,
    owner_id: i32,
    id: i32,
) -> Result<(), AppError> {
    let result = source::Entity::delete_many()
        .filter(source::Column::Id.eq(id))
        .filter(source::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(SELECTED_NOT_FOUND.to_string()));
    }
    Ok(())
}

/// Which of `wanted` the owner does not have yet, in input order. Used when
/// a dashboard cloned from another account references sources the new
/// owner still has to create.
pub async fn check_sources(
    db: &DatabaseConnection,
    owner_id: i32,
    wanted: &[String],
) -> Result<Vec<String>, AppError> {
    let owned = source_names(db, owner_id).await?;
    Ok(wanted
        .iter()
        .filter(|name| !owned.contains(name))
        .cloned()
        .collect())
}
