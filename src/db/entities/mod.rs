//! SeaORM entities, one module per table.

pub mod dashboard;
pub mod reset_token;
pub mod source;
pub mod user;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::dashboard::Entity as Dashboard;
    pub use super::dashboard::Model as DashboardModel;
    pub use super::dashboard::ActiveModel as DashboardActiveModel;
    pub use super::dashboard::Column as DashboardColumn;

    pub use super::source::Entity as Source;
    pub use super::source::Model as SourceModel;
    pub use super::source::ActiveModel as SourceActiveModel;
    pub use super::source::Column as SourceColumn;

    pub use super::reset_token::Entity as ResetToken;
    pub use super::reset_token::Model as ResetTokenModel;
    pub use super::reset_token::ActiveModel as ResetTokenActiveModel;
    pub use super::reset_token::Column as ResetTokenColumn;
}
