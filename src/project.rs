use serde::Deserialize;

/// ユーザーに割り当てられたプロジェクト。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProject {
    pub project_id: String,
    pub project_name: String,
}

/// タスクに割り当てられたユーザー。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResource {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(default)]
    pub completed_task: bool,
}

/// ユーザーのタスク。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub task_name: String,
    #[serde(default)]
    pub wbs_id: Option<String>,
    #[serde(default)]
    pub resources: Vec<TaskResource>,
}

impl Task {
    /// WBSに属するタスクかどうか。
    pub fn has_wbs(&self) -> bool {
        self.wbs_id.as_deref().is_some_and(|wbs_id| !wbs_id.is_empty())
    }

    /// 指定したユーザーが未完了のまま割り当てられているかどうか。
    pub fn is_active_for(&self, user_id: &str) -> bool {
        self.resources
            .iter()
            .any(|resource| resource.user_id == user_id && !resource.completed_task)
    }
}
