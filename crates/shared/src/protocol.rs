use serde::{Deserialize, Serialize};

use crate::domain::{CardId, ColumnId, CommentId, DashboardId, UserId};

/// Body of `POST /cards`. `due_date` is already serialized by the client
/// as `"yyyy-MM-dd HH:mm"`; `image_url` is empty when no upload happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub assignee_user_id: i64,
    pub dashboard_id: i64,
    pub column_id: ColumnId,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub tags: Vec<String>,
    pub image_url: String,
}

/// Server-owned card representation returned by the create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPayload {
    pub card_id: CardId,
    pub assignee_user_id: i64,
    pub dashboard_id: DashboardId,
    pub column_id: ColumnId,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub tags: Vec<String>,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Read-only server copy of a comment; the client never mutates it
/// directly, only through the comment store callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub comment_id: CommentId,
    pub author: CommentAuthor,
    pub text: String,
    pub time: String,
}

/// One entry of the externally supplied assignee roster. The roster source
/// is a collaborator's concern; this type is only the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeSummary {
    pub user_id: UserId,
    pub name: String,
}
