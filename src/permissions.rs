use serde::Deserialize;

/// ロールの定義。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// 時間入力フォームを無効化する権限。
pub const DISABLED_DATA_TIMELOG: &str = "disabledDataTimelog";
/// 他のユーザーのtime entryを追加する権限。
pub const ADD_TIME_ENTRY_OTHERS: &str = "addTimeEntryOthers";
/// timelogの説明を編集する権限。
pub const EDIT_TIMELOG_INFO: &str = "editTimelogInfo";

/// ロールが権限を持つかどうかを判定する。
///
/// ユーザー個別の権限に含まれるか、ロールの定義に含まれる場合に権限ありとする。
///
/// # Arguments
///
/// * `role` - ユーザーのロール名
/// * `permission` - 判定する権限名
/// * `roles` - ロールの定義一覧
/// * `user_permissions` - ユーザー個別に付与された権限
pub fn has_permission(
    role: &str,
    permission: &str,
    roles: &[Role],
    user_permissions: &[String],
) -> bool {
    if user_permissions.iter().any(|granted| granted == permission) {
        return true;
    }

    roles
        .iter()
        .find(|definition| definition.role_name == role)
        .is_some_and(|definition| {
            definition
                .permissions
                .iter()
                .any(|granted| granted == permission)
        })
}
